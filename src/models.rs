//! Core data model: events, week metadata, timetable snapshots, cookies, diffs.
//!
//! All wire serialization uses camelCase field names; persisted blobs
//! (`cookies_json`, `timetable_json`) are the same JSON representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire format version carried by every [`TimetableData`].
pub const FORMAT_VERSION: u8 = 2;

/// The slot an event occupies in the day grid: a numbered period (1..=6) or
/// the literal `"All day"` label used for full-day entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSlot {
    Number(u8),
    Label(String),
}

impl TimeSlot {
    pub fn all_day() -> Self {
        Self::Label("All day".to_string())
    }
}

/// One lesson occurrence as parsed from a week grid.
///
/// `lesson_id` is the upstream's opaque identifier when present; events
/// without one cannot be tracked across syncs and are excluded from diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub title: String,
    pub level: String,
    /// Academic year as "YYYY-YYYY" (or the raw upstream code if unformattable).
    #[serde(rename = "year")]
    pub academic_year: Option<String>,
    /// Calendar date; absent when the parse degraded for this cell.
    pub date: Option<NaiveDate>,
    pub day_of_week: String,
    #[serde(rename = "teacher")]
    pub teacher_full: String,
    pub teacher_short: String,
    pub location: String,
    pub time_slot: TimeSlot,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_range: String,
    pub cancelled: bool,
    pub lesson_id: Option<String>,
    /// Homework note rendered as markdown, when one was fetched.
    pub description: Option<String>,
    pub has_homework_note: bool,
}

/// Metadata for one timetable week. `week_key` is the canonical per-student
/// identifier, derived from the ISO week year and number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekInfo {
    pub week_number: u32,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Offset relative to the current week at fetch time (0 = current).
    pub offset: i32,
    pub week_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    pub student_name: String,
    #[serde(rename = "class")]
    pub class_name: String,
}

/// One fully parsed timetable week, the unit of persistence and diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableData {
    pub student_info: StudentInfo,
    pub week_info: WeekInfo,
    pub events: Vec<Event>,
    #[serde(default = "default_format_version")]
    pub format_version: u8,
}

fn default_format_version() -> u8 {
    FORMAT_VERSION
}

/// A single upstream cookie record. Serialized as a JSON array in
/// `user_sessions.cookies_json`. Extra fields from browser exports
/// (httpOnly, sameSite, ...) are accepted and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires: None,
        }
    }
}

/// Render cookie records as a `Cookie` request header value.
pub fn cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse a legacy `"name=value; name2=value2"` cookie string into records.
///
/// Accepted only at the API boundary; everything downstream works with
/// [`Cookie`] records.
pub fn parse_cookie_string(raw: &str) -> Vec<Cookie> {
    raw.split(';')
        .filter_map(|item| {
            let (name, value) = item.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Cookie::new(name, value.trim()))
        })
        .collect()
}

/// Per-week change set produced by the diff engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekDiff {
    pub added: Vec<Event>,
    pub updated: Vec<Event>,
    /// Lesson ids that disappeared from the week.
    pub removed: Vec<String>,
}

impl WeekDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_slot_serializes_untagged() {
        assert_eq!(
            serde_json::to_string(&TimeSlot::Number(2)).unwrap(),
            "2".to_string()
        );
        assert_eq!(
            serde_json::to_string(&TimeSlot::all_day()).unwrap(),
            "\"All day\"".to_string()
        );
        assert_eq!(
            serde_json::from_str::<TimeSlot>("4").unwrap(),
            TimeSlot::Number(4)
        );
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let cookies = vec![
            Cookie::new("ASP.NET_SessionId", "abc123"),
            Cookie::new("studentid", "S1"),
        ];
        assert_eq!(
            cookie_header(&cookies),
            "ASP.NET_SessionId=abc123; studentid=S1"
        );
    }

    #[test]
    fn parse_cookie_string_skips_malformed_items() {
        let cookies = parse_cookie_string("a=1; garbage ; b=2;");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0], Cookie::new("a", "1"));
        assert_eq!(cookies[1], Cookie::new("b", "2"));
    }

    #[test]
    fn cookie_record_accepts_browser_export_fields() {
        let raw = r#"{"name":"sid","value":"x","domain":".example.fo","path":"/","expires":1759276800.0,"httpOnly":true,"secure":true,"sameSite":"Lax"}"#;
        let cookie: Cookie = serde_json::from_str(raw).unwrap();
        assert_eq!(cookie.name, "sid");
        assert_eq!(cookie.domain.as_deref(), Some(".example.fo"));
    }
}
