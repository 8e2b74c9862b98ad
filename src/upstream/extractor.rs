//! Session-scoped façade over the fetcher and parsers.
//!
//! An [`Extractor`] owns one authenticated upstream session: the fetcher
//! carrying the session's cookies, the `lname` token scraped from the base
//! page, and the student id. All upstream POSTs are form-encoded and carry a
//! freshly computed millisecond-epoch `timer`, mimicking the upstream's own
//! frontend.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{cookie_header, Cookie};
use crate::parse::homework::parse_homework_html;
use crate::parse::session_token::extract_lname;
use crate::parse::teachers::parse_teacher_html;
use crate::upstream::errors::{BootstrapError, UpstreamError};
use crate::upstream::fetcher::UpstreamFetcher;

/// Path of the base timetable page, relative to the upstream base URL.
pub const TIMETABLE_PATH: &str = "/132n/";

/// Constant first-name field the upstream's frontend sends on every POST.
const FNAME_VALUE: &str = "Henry";

/// Fan-out cap for per-lesson homework fetches.
const HOMEWORK_CONCURRENCY: usize = 20;

fn timer_now() -> String {
    Utc::now().timestamp_millis().to_string()
}

pub struct Extractor {
    fetcher: UpstreamFetcher,
    lname: String,
    student_id: String,
}

impl Extractor {
    pub fn new(fetcher: UpstreamFetcher, lname: String, student_id: String) -> Self {
        Self {
            fetcher,
            lname,
            student_id,
        }
    }

    /// Validate a cookie set against the upstream's base timetable page and
    /// build an extractor for the session.
    ///
    /// The page is fetched once through the shared client (which never
    /// follows redirects): any non-200 status means the cookies are not an
    /// authenticated session. Returns the extractor together with the base
    /// page HTML so callers can reuse it for navigation parsing.
    pub async fn bootstrap(
        http: reqwest::Client,
        base: Url,
        cookies: &[Cookie],
        student_id: String,
    ) -> Result<(Self, String), BootstrapError> {
        let url = format!("{}{}", base.as_str().trim_end_matches('/'), TIMETABLE_PATH);
        let response = http
            .get(&url)
            .header(reqwest::header::COOKIE, cookie_header(cookies))
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if status.as_u16() != 200 {
            warn!(%url, status = status.as_u16(), "upstream rejected cookies on bootstrap");
            return Err(BootstrapError::AuthFailed(status.as_u16()));
        }

        let html = response.text().await.map_err(UpstreamError::Transport)?;
        let Some(lname) = extract_lname(&html) else {
            return Err(BootstrapError::MissingSessionToken);
        };
        debug!(lname, student_id, "upstream session bootstrapped");

        let fetcher = UpstreamFetcher::new(http, base, cookies);
        Ok((Self::new(fetcher, lname, student_id), html))
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Fetch the teacher directory and parse it to `{initials → full name}`.
    /// Any failure degrades to an empty map; the caller can still produce
    /// events with initials-only teacher names.
    pub async fn fetch_teacher_map(&self) -> HashMap<String, String> {
        let form = [
            ("fname", FNAME_VALUE.to_string()),
            ("lname", self.lname.clone()),
            ("timer", timer_now()),
        ];
        match self.fetcher.post_form("/i/teachers.asp", &form).await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(html) => {
                    let map = parse_teacher_html(&html);
                    info!(teachers = map.len(), "fetched teacher directory");
                    map
                }
                Err(e) => {
                    warn!(error = %e, "failed to read teacher directory body");
                    HashMap::new()
                }
            },
            Ok(response) => {
                warn!(
                    status = response.status().as_u16(),
                    "unexpected status fetching teacher directory"
                );
                HashMap::new()
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch teacher directory");
                HashMap::new()
            }
        }
    }

    /// Fetch the raw HTML for one week offset.
    ///
    /// Redirect responses are passed through as their (usually empty) body:
    /// they indicate the session is no longer authenticated, which the
    /// timetable parser then reports as a structure error.
    pub async fn fetch_week_html(&self, offset: i32) -> Result<String, UpstreamError> {
        let form = [
            ("fname", FNAME_VALUE.to_string()),
            ("q", "stude".to_string()),
            ("v", offset.to_string()),
            ("lname", self.lname.clone()),
            ("timex", timer_now()),
            ("id", self.student_id.clone()),
        ];
        let response = self.fetcher.post_form("/i/udvalg.asp", &form).await?;
        if response.status().is_redirection() {
            warn!(
                offset,
                status = response.status().as_u16(),
                "redirect fetching week, session likely expired"
            );
        }
        response.text().await.map_err(UpstreamError::Transport)
    }

    /// Fetch homework notes for a set of lesson ids concurrently.
    ///
    /// Per-lesson failures are logged and omitted from the result; they never
    /// fail the surrounding week.
    pub async fn fetch_homework(&self, lesson_ids: &[String]) -> HashMap<String, String> {
        if lesson_ids.is_empty() {
            return HashMap::new();
        }
        debug!(lessons = lesson_ids.len(), "fetching homework notes");

        let results: Vec<HashMap<String, String>> = stream::iter(lesson_ids)
            .map(|lesson_id| self.fetch_homework_one(lesson_id))
            .buffer_unordered(HOMEWORK_CONCURRENCY)
            .collect()
            .await;

        let mut merged = HashMap::new();
        for map in results {
            merged.extend(map);
        }
        info!(
            found = merged.len(),
            requested = lesson_ids.len(),
            "homework fetch finished"
        );
        merged
    }

    async fn fetch_homework_one(&self, lesson_id: &str) -> HashMap<String, String> {
        let form = [
            ("fname", FNAME_VALUE.to_string()),
            ("q", lesson_id.to_string()),
            ("MyFunktion", "ReadNotesToLessonWithLessonRID".to_string()),
            ("lname", self.lname.clone()),
            ("timer", timer_now()),
        ];
        match self.fetcher.post_form("/i/note.asp", &form).await {
            Ok(response) if response.status().is_redirection() => {
                warn!(lesson_id, "redirect fetching homework, skipping");
                HashMap::new()
            }
            Ok(response) => match response.text().await {
                Ok(html) => parse_homework_html(&html),
                Err(e) => {
                    warn!(lesson_id, error = %e, "failed to read homework body");
                    HashMap::new()
                }
            },
            Err(e) => {
                warn!(lesson_id, error = %e, "failed to fetch homework");
                HashMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn extractor_for(server: &MockServer) -> Extractor {
        let fetcher = UpstreamFetcher::new(
            reqwest::Client::new(),
            Url::parse(&server.uri()).unwrap(),
            &[Cookie::new("sid", "abc")],
        )
        .with_retry_policy(2, Duration::from_millis(5));
        Extractor::new(fetcher, "TOK1".to_string(), "S1".to_string())
    }

    #[tokio::test]
    async fn bootstrap_extracts_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/132n/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<script>xmlhttp.send("lname=TOK1&x=1");</script>"#),
            )
            .mount(&server)
            .await;

        let (extractor, html) = Extractor::bootstrap(
            reqwest::Client::new(),
            Url::parse(&server.uri()).unwrap(),
            &[Cookie::new("sid", "abc")],
            "S1".to_string(),
        )
        .await
        .unwrap();
        assert_eq!(extractor.lname, "TOK1");
        assert!(html.contains("lname=TOK1"));
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/132n/"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
            .mount(&server)
            .await;

        let err = Extractor::bootstrap(
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
            Url::parse(&server.uri()).unwrap(),
            &[],
            "S1".to_string(),
        )
        .await
        .unwrap_err();
        match err {
            BootstrapError::AuthFailed(status) => assert_eq!(status, 302),
            other => panic!("expected AuthFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bootstrap_without_token_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/132n/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no token</html>"))
            .mount(&server)
            .await;

        let err = Extractor::bootstrap(
            reqwest::Client::new(),
            Url::parse(&server.uri()).unwrap(),
            &[],
            "S1".to_string(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BootstrapError::MissingSessionToken));
    }

    #[tokio::test]
    async fn teacher_map_posts_session_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/i/teachers.asp"))
            .and(body_string_contains("fname=Henry"))
            .and(body_string_contains("lname=TOK1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<select><option value="-1">Vel</option><option value="JOH">Jón</option></select>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let map = extractor_for(&server).fetch_teacher_map().await;
        assert_eq!(map.get("JOH").map(String::as_str), Some("Jón"));
    }

    #[tokio::test]
    async fn teacher_map_degrades_to_empty_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/i/teachers.asp"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(extractor_for(&server).fetch_teacher_map().await.is_empty());
    }

    #[tokio::test]
    async fn week_html_posts_offset_and_student() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/i/udvalg.asp"))
            .and(body_string_contains("q=stude"))
            .and(body_string_contains("v=-2"))
            .and(body_string_contains("id=S1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>week</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let html = extractor_for(&server).fetch_week_html(-2).await.unwrap();
        assert_eq!(html, "<html>week</html>");
    }

    #[tokio::test]
    async fn homework_fetch_merges_per_lesson_results() {
        let server = MockServer::start().await;
        for (id, text) in [("LES1", "Les kapittul 3"), ("LES2", "Rokna uppgávur")] {
            Mock::given(method("POST"))
                .and(path("/i/note.asp"))
                .and(body_string_contains(format!("q={id}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                    r#"<input type="hidden" id="LektionsID1" value="{id}">
                       <p><b>Heimaarbeiði</b><br>{text}</p>"#
                )))
                .mount(&server)
                .await;
        }
        // A failing lesson is simply omitted.
        Mock::given(method("POST"))
            .and(path("/i/note.asp"))
            .and(body_string_contains("q=LES3"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let ids = vec!["LES1".to_string(), "LES2".to_string(), "LES3".to_string()];
        let map = extractor_for(&server).fetch_homework(&ids).await;
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("LES1").map(String::as_str), Some("Les kapittul 3"));
        assert_eq!(map.get("LES2").map(String::as_str), Some("Rokna uppgávur"));
    }
}
