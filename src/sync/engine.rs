//! The sync engine: access-code-authenticated session model, baseline
//! storage, and per-week diffing.
//!
//! All three operations run at request scope. Database writes for one
//! request happen inside a single transaction; concurrent syncs for the same
//! student converge through the `(student_id, week_key)` unique constraint.

use chrono::{DateTime, Duration, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};
use url::Url;

use crate::data::{sessions, teacher_cache, weeks};
use crate::models::{Cookie, TimetableData, WeekDiff};
use crate::parse::navigation::parse_available_offsets;
use crate::sync::diff::diff_week;
use crate::sync::orchestrator::{
    fetch_weeks, resolve_selector, sorted_data, OffsetSelector, SymbolicSelector,
};
use crate::sync::SyncError;
use crate::upstream::Extractor;

/// Maximum age of stored upstream cookies before `sync` refuses to use them.
pub const COOKIE_MAX_AGE_HOURS: i64 = 24;

/// Access codes use the URL-safe nanoid alphabet (64 symbols); 43 characters
/// carry just over 256 bits of entropy.
const ACCESS_CODE_LENGTH: usize = 43;

fn mint_access_code() -> String {
    nanoid!(ACCESS_CODE_LENGTH)
}

/// Strict freshness cutoff: cookies exactly `COOKIE_MAX_AGE_HOURS` old are
/// still accepted; only ages beyond the window expire.
fn cookies_are_expired(cookies_updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(cookies_updated_at) > Duration::hours(COOKIE_MAX_AGE_HOURS)
}

/// One entry of the per-week diff map: either a diff or a captured per-offset
/// failure.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiffEntry {
    Diff(WeekDiff),
    Error { error: String },
}

/// Result of a `sync` call.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub diffs: BTreeMap<String, DiffEntry>,
    pub synced_at: DateTime<Utc>,
}

/// Week selection for the legacy read-only profile views.
#[derive(Debug, Clone, Copy)]
pub enum ProfileSelection {
    Offset(i32),
    All,
    CurrentForward,
    /// Offsets `0..=n`, without consulting the upstream navigation.
    Forward(u32),
}

/// Request-scoped façade over the whole core: upstream session, pipeline,
/// diffing, persistence.
#[derive(Clone)]
pub struct SyncService {
    pool: SqlitePool,
    http: reqwest::Client,
    upstream_base: Url,
}

impl SyncService {
    pub fn new(pool: SqlitePool, http: reqwest::Client, upstream_base: Url) -> Self {
        Self {
            pool,
            http,
            upstream_base,
        }
    }

    /// Validate cookies against the upstream and build a session extractor.
    async fn bootstrap<'a>(
        &'a self,
        cookies: &'a [Cookie],
        student_id: &'a str,
    ) -> Result<(Extractor, String), SyncError> {
        if cookies.is_empty() {
            return Err(SyncError::BadRequest(
                "at least one cookie is required".into(),
            ));
        }
        let (extractor, base_html) = Extractor::bootstrap(
            self.http.clone(),
            self.upstream_base.clone(),
            cookies,
            student_id.to_string(),
        )
        .await?;
        Ok((extractor, base_html))
    }

    /// Read-through teacher map: cached rows when fresh, otherwise a live
    /// fetch that refreshes the cache. Never fails; a fully degraded result
    /// is an empty map.
    async fn teacher_map<'a>(&'a self, extractor: &'a Extractor) -> HashMap<String, String> {
        match teacher_cache::get_teacher_map(&self.pool).await {
            Ok(Some(map)) => return map,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "teacher cache read failed"),
        }
        let fresh = extractor.fetch_teacher_map().await;
        if !fresh.is_empty() {
            if let Err(e) = teacher_cache::store_teacher_map(&self.pool, &fresh).await {
                warn!(error = %e, "teacher cache write failed");
            }
        }
        fresh
    }

    /// First sync for a student: validate cookies, fetch every available
    /// week, create the session, and store all baselines in one transaction.
    pub async fn initial_sync(
        &self,
        student_id: &str,
        cookies: Vec<Cookie>,
    ) -> Result<(String, Vec<TimetableData>), SyncError> {
        if student_id.is_empty() {
            return Err(SyncError::BadRequest("student_id is required".into()));
        }
        if sessions::get_by_student_id(&self.pool, student_id)
            .await?
            .is_some()
        {
            return Err(SyncError::AlreadyExists(student_id.to_string()));
        }

        let (extractor, base_html) = self.bootstrap(&cookies, student_id).await?;
        let available = parse_available_offsets(&base_html);
        if available.is_empty() {
            warn!(student_id, "no week offsets in upstream navigation");
        }

        let teacher_map = self.teacher_map(&extractor).await;
        let outcomes = fetch_weeks(&extractor, &teacher_map, &available).await;
        let all_weeks = sorted_data(&outcomes);

        let access_code = mint_access_code();
        let now = Utc::now();
        let cookies_json = serde_json::to_string(&cookies)?;

        let mut tx = self.pool.begin().await?;
        sessions::insert(&mut *tx, student_id, &access_code, &cookies_json, now).await?;
        let mut seen_keys: HashSet<&str> = HashSet::new();
        for week in &all_weeks {
            let week_key = week.week_info.week_key.as_str();
            if !seen_keys.insert(week_key) {
                warn!(
                    student_id,
                    week_key,
                    offset = week.week_info.offset,
                    "duplicate week key from distinct offsets, keeping first"
                );
                continue;
            }
            let timetable_json = serde_json::to_string(week)?;
            weeks::upsert(&mut *tx, student_id, week_key, &timetable_json, now).await?;
        }
        tx.commit().await?;

        info!(
            student_id,
            weeks = all_weeks.len(),
            offsets = available.len(),
            "initial sync complete"
        );
        Ok((access_code, all_weeks))
    }

    /// Subsequent sync: fetch the selected weeks, diff each against its
    /// stored baseline, and upsert the new snapshots.
    pub async fn sync<'a>(
        &'a self,
        access_code: &'a str,
        selector: OffsetSelector,
    ) -> Result<SyncReport, SyncError> {
        let Some(session) = sessions::get_by_access_code(&self.pool, access_code).await? else {
            return Err(SyncError::Forbidden);
        };
        let student_id = session.student_id.clone();

        let now = Utc::now();
        if cookies_are_expired(session.cookies_updated_at, now) {
            warn!(student_id, "sync refused, stored cookies too old");
            return Err(SyncError::CookiesExpired);
        }

        let cookies: Vec<Cookie> = serde_json::from_str(&session.cookies_json)?;
        let (extractor, _) = self.bootstrap(&cookies, &student_id).await?;
        let offsets = resolve_selector(&extractor, &selector).await?;

        let outcomes = if offsets.is_empty() {
            Vec::new()
        } else {
            let teacher_map = self.teacher_map(&extractor).await;
            fetch_weeks(&extractor, &teacher_map, &offsets).await
        };

        let mut diffs: BTreeMap<String, DiffEntry> = BTreeMap::new();
        let mut tx = self.pool.begin().await?;
        for outcome in &outcomes {
            match outcome.result.data() {
                Some(new_week) => {
                    let week_key = new_week.week_info.week_key.clone();
                    let old_row = weeks::get(&mut *tx, &student_id, &week_key).await?;
                    let old_week = old_row.and_then(|row| {
                        serde_json::from_str::<TimetableData>(&row.timetable_json)
                            .map_err(|e| {
                                warn!(week_key, error = %e, "stored snapshot unreadable, diffing from scratch");
                            })
                            .ok()
                    });
                    let week_diff = diff_week(old_week.as_ref(), new_week);
                    let timetable_json = serde_json::to_string(new_week)?;
                    weeks::upsert(&mut *tx, &student_id, &week_key, &timetable_json, now).await?;
                    diffs.insert(week_key, DiffEntry::Diff(week_diff));
                }
                None => {
                    let message = outcome
                        .result
                        .failure()
                        .map(|(_, m)| m.to_string())
                        .unwrap_or_else(|| "unknown failure".into());
                    diffs.insert(
                        format!("UNKNOWN-{}", outcome.offset),
                        DiffEntry::Error {
                            error: format!(
                                "Failed to fetch data for week offset {}: {message}",
                                outcome.offset
                            ),
                        },
                    );
                }
            }
        }
        sessions::touch_last_accessed(&mut *tx, &student_id, now).await?;
        tx.commit().await?;

        info!(student_id, weeks = diffs.len(), "sync complete");
        Ok(SyncReport {
            diffs,
            synced_at: now,
        })
    }

    /// Replace a session's cookies and rotate its access code atomically.
    pub async fn session_refresh(
        &self,
        student_id: &str,
        new_cookies: Vec<Cookie>,
    ) -> Result<String, SyncError> {
        if student_id.is_empty() {
            return Err(SyncError::BadRequest("student_id is required".into()));
        }
        // Validate the new cookies before touching the stored session.
        self.bootstrap(&new_cookies, student_id).await?;

        if sessions::get_by_student_id(&self.pool, student_id)
            .await?
            .is_none()
        {
            return Err(SyncError::NotFound(student_id.to_string()));
        }

        let new_access_code = mint_access_code();
        let now = Utc::now();
        let cookies_json = serde_json::to_string(&new_cookies)?;

        let mut tx = self.pool.begin().await?;
        sessions::rotate_credentials(&mut *tx, student_id, &new_access_code, &cookies_json, now)
            .await?;
        tx.commit().await?;

        info!(student_id, "session refreshed");
        Ok(new_access_code)
    }

    /// Legacy read-only views: fetch weeks for ad-hoc cookie credentials
    /// without touching persistence or diffing.
    pub async fn fetch_weeks_readonly<'a>(
        &'a self,
        cookies: Vec<Cookie>,
        student_id: &'a str,
        selection: ProfileSelection,
    ) -> Result<Vec<TimetableData>, SyncError> {
        let (extractor, _) = self.bootstrap(&cookies, student_id).await?;
        let offsets = match selection {
            ProfileSelection::Offset(offset) => vec![offset],
            ProfileSelection::Forward(count) => (0..=count as i32).collect(),
            ProfileSelection::All => {
                resolve_selector(&extractor, &OffsetSelector::Symbolic(SymbolicSelector::All))
                    .await?
            }
            ProfileSelection::CurrentForward => {
                resolve_selector(
                    &extractor,
                    &OffsetSelector::Symbolic(SymbolicSelector::CurrentForward),
                )
                .await?
            }
        };
        if offsets.is_empty() {
            return Ok(Vec::new());
        }

        let teacher_map = self.teacher_map(&extractor).await;
        let outcomes = fetch_weeks(&extractor, &teacher_map, &offsets).await;

        // The single-week view surfaces its failure; the multi-week views
        // return the weeks that worked.
        if matches!(selection, ProfileSelection::Offset(_)) {
            use crate::sync::pipeline::WeekResult;
            let Some(outcome) = outcomes.first() else {
                return Err(SyncError::internal("week fetch produced no outcome"));
            };
            return match &outcome.result {
                WeekResult::Success { data, .. } | WeekResult::NoData { data, .. } => {
                    Ok(vec![data.clone()])
                }
                WeekResult::FetchFailed {
                    status: Some(status),
                    ..
                } => Err(SyncError::UpstreamHttp(*status)),
                WeekResult::FetchFailed { .. } => Err(SyncError::UpstreamTransport),
                WeekResult::ParseFailed { .. } => Err(SyncError::UpstreamProtocolError),
            };
        }
        Ok(sorted_data(&outcomes))
    }
}
