//! The per-offset week pipeline: fetch → parse → homework sub-fetch → merge.

use std::collections::HashMap;
use tracing::debug;

use crate::models::{TimetableData, FORMAT_VERSION};
use crate::parse::timetable::parse_timetable_html;
use crate::parse::ParseOutcome;
use crate::upstream::errors::UpstreamError;
use crate::upstream::Extractor;

/// Result of processing one week offset. Warnings accumulated anywhere in
/// the pipeline travel with the success variants.
#[derive(Debug)]
pub enum WeekResult {
    Success {
        data: TimetableData,
        warnings: Vec<String>,
    },
    /// Structurally valid week with no events (holidays, empty weeks).
    NoData {
        data: TimetableData,
        warnings: Vec<String>,
    },
    FetchFailed {
        classifier: &'static str,
        status: Option<u16>,
        message: String,
    },
    ParseFailed {
        classifier: &'static str,
        message: String,
    },
}

impl WeekResult {
    pub fn data(&self) -> Option<&TimetableData> {
        match self {
            Self::Success { data, .. } | Self::NoData { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Grouping key and message for the orchestrator's failure summary.
    pub fn failure(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::FetchFailed {
                classifier, message, ..
            }
            | Self::ParseFailed {
                classifier, message,
            } => Some((*classifier, message.as_str())),
            _ => None,
        }
    }
}

/// One offset's outcome, tagged with the offset that produced it.
#[derive(Debug)]
pub struct WeekOutcome {
    pub offset: i32,
    pub result: WeekResult,
}

fn classify(error: &UpstreamError) -> &'static str {
    match error {
        UpstreamError::Http { .. } => "upstream_http",
        UpstreamError::Transport(_) => "upstream_transport",
        UpstreamError::InvalidUrl(_) => "invalid_url",
    }
}

/// Fetch and fully process one week offset.
///
/// Homework fetching and merging never fail the week; their problems become
/// warnings on the result.
pub async fn fetch_week(
    extractor: &Extractor,
    teacher_map: &HashMap<String, String>,
    offset: i32,
) -> WeekOutcome {
    let html = match extractor.fetch_week_html(offset).await {
        Ok(html) => html,
        Err(e) => {
            return WeekOutcome {
                offset,
                result: WeekResult::FetchFailed {
                    classifier: classify(&e),
                    status: e.status(),
                    message: e.to_string(),
                },
            };
        }
    };

    let (mut parsed, mut warnings) = match parse_timetable_html(&html, teacher_map, offset) {
        ParseOutcome::Success { data, warnings } => (data, warnings),
        ParseOutcome::StructureError(message) => {
            return WeekOutcome {
                offset,
                result: WeekResult::ParseFailed {
                    classifier: "structure",
                    message,
                },
            };
        }
        ParseOutcome::ParseFailed(message) => {
            return WeekOutcome {
                offset,
                result: WeekResult::ParseFailed {
                    classifier: "parse",
                    message,
                },
            };
        }
    };

    if !parsed.homework_ids.is_empty() {
        let homework = extractor.fetch_homework(&parsed.homework_ids).await;
        if homework.len() < parsed.homework_ids.len() {
            warnings.push(format!(
                "homework text found for {}/{} flagged lessons",
                homework.len(),
                parsed.homework_ids.len()
            ));
        }
        let mut merged = 0usize;
        for event in &mut parsed.events {
            if let Some(id) = &event.lesson_id {
                if let Some(text) = homework.get(id) {
                    event.description = Some(text.clone());
                    merged += 1;
                }
            }
        }
        debug!(offset, merged, "merged homework descriptions");
    }

    // Dates are already resolved into the week by the parser; anything that
    // still escaped the range is degraded to keep snapshots self-consistent.
    let week = &parsed.week_info;
    for event in &mut parsed.events {
        if let Some(date) = event.date {
            if date < week.start_date || date > week.end_date {
                warnings.push(format!(
                    "event '{}' dated {date} outside week {}, dropping its date",
                    event.title, week.week_key
                ));
                event.date = None;
            }
        }
    }

    let data = TimetableData {
        student_info: parsed.student_info,
        week_info: parsed.week_info,
        events: parsed.events,
        format_version: FORMAT_VERSION,
    };

    let result = if data.events.is_empty() {
        WeekResult::NoData { data, warnings }
    } else {
        WeekResult::Success { data, warnings }
    };
    WeekOutcome { offset, result }
}
