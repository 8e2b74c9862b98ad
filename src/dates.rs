//! Date and format helpers for the upstream's heterogeneous date spellings.
//!
//! The upstream mixes `DD.MM.YYYY` ranges, bare `DD/MM` day headers, and a
//! four-digit academic-year code ("2425"); everything is normalized to ISO
//! here so the rest of the pipeline only ever sees `NaiveDate`.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static PERIOD_DATE_FULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})").unwrap());
static PERIOD_DATE_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})").unwrap());
static HYPHEN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})").unwrap());
static SLASH_DATE_WITH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})-(\d{4})").unwrap());
static SLASH_DATE_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})").unwrap());

/// Parse a date string in any of the known upstream spellings.
///
/// Supported: `DD.MM.YYYY`, `DD.MM`, `YYYY-MM-DD`, `DD/MM-YYYY`, `DD/MM`.
/// Spellings without a year require `assumed_year`. Returns `None` when no
/// pattern matches or the components do not form a real calendar date.
pub fn to_iso_date(date_str: &str, assumed_year: Option<i32>) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }

    // Year-carrying forms first so "24/3-2025" is not read as a bare "24/3".
    if let Some(caps) = PERIOD_DATE_FULL.captures(date_str) {
        return from_dmy(&caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = HYPHEN_DATE.captures(date_str) {
        return from_dmy(&caps[3], &caps[2], &caps[1]);
    }
    if let Some(caps) = SLASH_DATE_WITH_YEAR.captures(date_str) {
        return from_dmy(&caps[1], &caps[2], &caps[3]);
    }

    let year = assumed_year?;
    if let Some(caps) = PERIOD_DATE_SHORT.captures(date_str) {
        return from_dm(&caps[1], &caps[2], year);
    }
    if let Some(caps) = SLASH_DATE_SHORT.captures(date_str) {
        return from_dm(&caps[1], &caps[2], year);
    }

    None
}

fn from_dmy(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    from_dm(day, month, year.parse().ok()?)
}

fn from_dm(day: &str, month: &str, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

/// Split a `"HH:MM-HH:MM"` range into start and end strings.
pub fn parse_time_range(time_range: &str) -> (Option<String>, Option<String>) {
    match time_range.split_once('-') {
        Some((start, end)) if !start.trim().is_empty() && !end.trim().is_empty() => (
            Some(start.trim().to_string()),
            Some(end.trim().to_string()),
        ),
        _ => (None, None),
    }
}

/// Format a four-digit academic-year code ("2425") as "2024-2025".
///
/// The expansion applies only when the two halves are consecutive years;
/// anything else is passed through unchanged.
pub fn format_academic_year(year_code: &str) -> Option<String> {
    if year_code.is_empty() {
        return None;
    }
    if year_code.len() == 4 && year_code.chars().all(|c| c.is_ascii_digit()) {
        let start: u32 = 2000 + year_code[..2].parse::<u32>().unwrap_or(0);
        let end: u32 = 2000 + year_code[2..].parse::<u32>().unwrap_or(0);
        if end == start + 1 {
            return Some(format!("{start}-{end}"));
        }
    }
    Some(year_code.to_string())
}

/// ISO week year and week number of a date. The ISO calendar is authoritative
/// for week identity; at year boundaries it can disagree with the Gregorian
/// year of the same date.
pub fn iso_week_of(date: NaiveDate) -> (i32, u32) {
    let iso = date.iso_week();
    (iso.year(), iso.week())
}

/// Canonical per-student week identifier, e.g. "2025-W17".
pub fn week_key(year: i32, week_number: u32) -> String {
    format!("{year}-W{week_number:02}")
}

/// Combine a day header's `DD/MM` with the week's ISO year to get the event
/// date. On boundary weeks the ISO year can push the combination outside the
/// week; the start/end calendar years are tried as fallbacks so every dated
/// event stays inside `[start_date, end_date]`.
pub fn resolve_event_date(
    day_month: &str,
    iso_year: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<NaiveDate> {
    let in_week = |d: &NaiveDate| *d >= start_date && *d <= end_date;

    let mut candidate_years = vec![iso_year];
    for year in [start_date.year(), end_date.year()] {
        if !candidate_years.contains(&year) {
            candidate_years.push(year);
        }
    }

    let mut first: Option<NaiveDate> = None;
    for year in candidate_years {
        if let Some(date) = to_iso_date(day_month, Some(year)) {
            if in_week(&date) {
                return Some(date);
            }
            first.get_or_insert(date);
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn to_iso_date_all_spellings() {
        assert_eq!(to_iso_date("21.04.2025", None), Some(d(2025, 4, 21)));
        assert_eq!(to_iso_date("2025-04-21", None), Some(d(2025, 4, 21)));
        assert_eq!(to_iso_date("24/3-2025", None), Some(d(2025, 3, 24)));
        assert_eq!(to_iso_date("21.04", Some(2025)), Some(d(2025, 4, 21)));
        assert_eq!(to_iso_date("21/4", Some(2025)), Some(d(2025, 4, 21)));
    }

    #[test]
    fn to_iso_date_rejects_garbage() {
        assert_eq!(to_iso_date("", Some(2025)), None);
        assert_eq!(to_iso_date("not a date", Some(2025)), None);
        assert_eq!(to_iso_date("32/13", Some(2025)), None);
        // No year to assume for a bare day/month.
        assert_eq!(to_iso_date("21/4", None), None);
    }

    #[test]
    fn parse_time_range_splits() {
        assert_eq!(
            parse_time_range("08:10-09:40"),
            (Some("08:10".to_string()), Some("09:40".to_string()))
        );
        assert_eq!(parse_time_range("N/A"), (None, None));
        assert_eq!(parse_time_range(""), (None, None));
    }

    #[test]
    fn format_academic_year_consecutive() {
        assert_eq!(
            format_academic_year("2425").as_deref(),
            Some("2024-2025")
        );
        // Non-consecutive halves pass through untouched.
        assert_eq!(format_academic_year("2427").as_deref(), Some("2427"));
        assert_eq!(format_academic_year("24x5").as_deref(), Some("24x5"));
        assert_eq!(format_academic_year(""), None);
    }

    #[test]
    fn iso_week_uses_iso_calendar_at_year_boundary() {
        // 2024-12-30 is a Monday belonging to ISO week 1 of 2025.
        assert_eq!(iso_week_of(d(2024, 12, 30)), (2025, 1));
        assert_eq!(iso_week_of(d(2025, 4, 21)), (2025, 17));
    }

    #[test]
    fn week_key_zero_pads() {
        assert_eq!(week_key(2025, 1), "2025-W01");
        assert_eq!(week_key(2025, 17), "2025-W17");
    }

    #[test]
    fn resolve_event_date_stays_inside_boundary_week() {
        // ISO week 1 of 2025 runs 2024-12-30 .. 2025-01-05.
        let start = d(2024, 12, 30);
        let end = d(2025, 1, 5);
        // A December day must resolve against the start year, not the ISO year.
        assert_eq!(
            resolve_event_date("30/12", 2025, start, end),
            Some(d(2024, 12, 30))
        );
        // A January day resolves directly against the ISO year.
        assert_eq!(
            resolve_event_date("2/1", 2025, start, end),
            Some(d(2025, 1, 2))
        );
    }

    #[test]
    fn resolve_event_date_plain_week() {
        let start = d(2025, 4, 21);
        let end = d(2025, 4, 27);
        assert_eq!(
            resolve_event_date("21/4", 2025, start, end),
            Some(d(2025, 4, 21))
        );
    }
}
