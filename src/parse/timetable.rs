//! Week-grid parsing: one timetable page → student info, week info, events.
//!
//! The grid is a single `table.time_8_16` where each day is a row headed by a
//! `lektionslinje_1` cell and lessons are positioned by column index, with
//! `colspan` encoding their width. Column ranges map to the six teaching
//! slots. The markup is old and irregular, so individual cell oddities are
//! recorded as warnings instead of failing the page.

use html_scraper::{ElementRef, Html, Node, Selector};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::dates::{
    format_academic_year, iso_week_of, parse_time_range, resolve_event_date, to_iso_date, week_key,
};
use crate::models::{Event, StudentInfo, TimeSlot, WeekInfo};
use crate::parse::ParseOutcome;

/// Marker text in the td that carries the student's name and class.
const STUDENT_MARKER: &str = "Næmingatímatalva";

/// Phrases the upstream shows instead of a grid on weeks without teaching.
const NO_TEACHING_PHRASES: &[&str] = &["ongi skeið", "frídagur", "eingin undirvísing"];

/// Cell classes that mark a cancelled lesson.
const CANCELLED_CLASSES: &[&str] = &[
    "lektionslinje_lesson1",
    "lektionslinje_lesson2",
    "lektionslinje_lesson3",
    "lektionslinje_lesson4",
    "lektionslinje_lesson5",
    "lektionslinje_lesson7",
    "lektionslinje_lesson10",
    "lektionslinje_lessoncancelled",
];

static DATE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}\.\d{1,2}\.\d{4})\s*-\s*(\d{1,2}\.\d{1,2}\.\d{4})").unwrap());
static DAY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s+(\d{1,2}/\d{1,2})").unwrap());
static STUDENT_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Næmingatímatalva\s*:\s*(.+)\s*,\s*(\w+)").unwrap());
static LESSON_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^lektionslinje_lesson\d+").unwrap());
static COMPACT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\d]+?)(\d+|[A-Z])$").unwrap());

/// Everything extracted from one week page.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWeek {
    pub student_info: StudentInfo,
    pub week_info: WeekInfo,
    pub events: Vec<Event>,
    /// Lesson ids whose cells carried a homework-note icon, in grid order.
    pub homework_ids: Vec<String>,
}

/// Translate a Faroese day name to its English equivalent.
fn day_name_en(fo: &str) -> &str {
    match fo {
        "Mánadagur" => "Monday",
        "Týsdagur" => "Tuesday",
        "Mikudagur" => "Wednesday",
        "Hósdagur" => "Thursday",
        "Fríggjadagur" => "Friday",
        "Leygardagur" => "Saturday",
        "Sunnudagur" => "Sunday",
        other => other,
    }
}

/// Map a 1-based starting column index to its teaching slot and time range.
fn slot_for_column(start_col: u32) -> Option<(TimeSlot, &'static str)> {
    let (slot, time) = match start_col {
        2..=25 => (1, "08:10-09:40"),
        26..=50 => (2, "10:05-11:35"),
        51..=71 => (3, "12:10-13:40"),
        72..=90 => (4, "13:55-15:25"),
        91..=111 => (5, "15:30-17:00"),
        112..=131 => (6, "17:15-18:45"),
        _ => return None,
    };
    Some((TimeSlot::Number(slot), time))
}

/// Split a raw subject code into (title, level, academic-year code).
///
/// The upstream's format is unstable; each arity is handled by an explicit
/// branch so new shapes can be added without touching the others.
fn parse_subject_code(raw: &str) -> (String, String, Option<String>) {
    let parts: Vec<&str> = raw.split('-').collect();
    if parts[0] == "Várroynd" && parts.len() >= 5 {
        return (
            format!("{}-{}", parts[0], parts[1]),
            parts[2].to_string(),
            Some(parts[4].to_string()),
        );
    }
    if parts.len() >= 4 {
        return (
            parts[0].to_string(),
            parts[1].to_string(),
            Some(parts[3].to_string()),
        );
    }
    if parts.len() == 3 {
        // Compact form like "BV3-2425-22y": letters then a digit or level letter.
        if let Some(caps) = COMPACT_CODE.captures(parts[0]) {
            return (
                caps[1].to_string(),
                caps[2].to_string(),
                Some(parts[1].to_string()),
            );
        }
    }
    (raw.to_string(), String::new(), None)
}

fn classes_of<'a>(cell: &ElementRef<'a>) -> Vec<&'a str> {
    cell.value().classes().collect()
}

fn colspan_of(cell: &ElementRef) -> u32 {
    cell.attr("colspan")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1)
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Student name and class from the marker cell's leading text (the text nodes
/// before the nested layout table).
fn parse_student_info(doc: &Html) -> Option<StudentInfo> {
    let td_sel = Selector::parse("td").unwrap();
    let marker_td = doc
        .select(&td_sel)
        .find(|td| td.text().any(|t| t.contains(STUDENT_MARKER)))?;

    let mut leading = String::new();
    for child in marker_td.children() {
        match child.value() {
            Node::Text(text) => leading.push_str(text),
            Node::Element(el) if el.name() == "table" => break,
            _ => {}
        }
    }
    let leading = leading.trim();

    if let Some(caps) = STUDENT_INFO.captures(leading) {
        return Some(StudentInfo {
            student_name: caps[1].trim().to_string(),
            class_name: caps[2].trim().to_string(),
        });
    }

    // Fallback: everything after the colon, split at the last comma.
    let (_, rest) = leading.split_once(':')?;
    let (name, class) = rest.rsplit_once(',')?;
    let class: String = class
        .trim()
        .chars()
        .take_while(|c| c.is_alphanumeric())
        .collect();
    if name.trim().is_empty() || class.is_empty() {
        return None;
    }
    Some(StudentInfo {
        student_name: name.trim().to_string(),
        class_name: class,
    })
}

/// Parse one week page.
///
/// `teacher_map` resolves initials to full names; unknown initials fall
/// through as their own short form. `offset` is recorded on the resulting
/// [`WeekInfo`] as-is.
pub fn parse_timetable_html(
    html: &str,
    teacher_map: &HashMap<String, String>,
    offset: i32,
) -> ParseOutcome<ParsedWeek> {
    let doc = Html::parse_document(html);
    let mut warnings: Vec<String> = Vec::new();

    let Some(student_info) = parse_student_info(&doc) else {
        return ParseOutcome::StructureError(format!(
            "student info marker '{STUDENT_MARKER}' not found or unparsable"
        ));
    };

    let Some(range) = DATE_RANGE.captures(html) else {
        return ParseOutcome::StructureError("week date range (DD.MM.YYYY - DD.MM.YYYY) not found".into());
    };
    let (Some(start_date), Some(end_date)) =
        (to_iso_date(&range[1], None), to_iso_date(&range[2], None))
    else {
        return ParseOutcome::StructureError(format!(
            "week date range '{} - {}' is not a valid date pair",
            &range[1], &range[2]
        ));
    };

    // The ISO calendar of the start date is authoritative for week identity.
    let (iso_year, iso_week) = iso_week_of(start_date);

    // Cross-check the selected week button; a mismatch is only a warning.
    let week_link_sel = Selector::parse("a.UgeKnapValgt").unwrap();
    if let Some(link) = doc.select(&week_link_sel).next() {
        let text = cell_text(&link);
        match text.strip_prefix("Vika ").and_then(|n| n.trim().parse::<u32>().ok()) {
            Some(anchor_week) if anchor_week != iso_week => warnings.push(format!(
                "selected week anchor says week {anchor_week}, ISO calendar says {iso_week}"
            )),
            Some(_) => {}
            None => warnings.push(format!("unexpected selected-week anchor text: '{text}'")),
        }
    }

    let week_info = WeekInfo {
        week_number: iso_week,
        year: iso_year,
        start_date,
        end_date,
        offset,
        week_key: week_key(iso_year, iso_week),
    };

    let table_sel = Selector::parse("table.time_8_16").unwrap();
    let Some(table) = doc.select(&table_sel).next() else {
        if NO_TEACHING_PHRASES.iter().any(|p| html.contains(p)) {
            return ParseOutcome::Success {
                data: ParsedWeek {
                    student_info,
                    week_info,
                    events: Vec::new(),
                    homework_ids: Vec::new(),
                },
                warnings,
            };
        }
        return ParseOutcome::ParseFailed("timetable table (table.time_8_16) not found".into());
    };

    let tr_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();
    let a_sel = Selector::parse("a").unwrap();
    let lesson_span_sel = Selector::parse(r#"span[id^="MyWindow"][id$="Main"]"#).unwrap();
    let note_sel = Selector::parse(r#"input[type="image"][src*="note.gif"]"#).unwrap();

    let mut events: Vec<Event> = Vec::new();
    let mut homework_ids: Vec<String> = Vec::new();
    let mut current_day: Option<(String, String)> = None; // (Faroese day, DD/MM)

    for row in table.select(&tr_sel) {
        let cells: Vec<ElementRef> = row.select(&td_sel).collect();
        let Some(first_cell) = cells.first() else {
            continue;
        };
        let first_text = cell_text(first_cell);
        let day_match = DAY_DATE.captures(&first_text);
        let is_day_header = classes_of(first_cell)
            .iter()
            .any(|c| *c == "lektionslinje_1" || *c == "lektionslinje_1_aktuel");

        if is_day_header {
            match &day_match {
                Some(caps) => current_day = Some((caps[1].to_string(), caps[2].to_string())),
                None => {
                    // Header cell without a parsable day resets the context so
                    // stray lesson cells are not attributed to the wrong day.
                    if !first_text.is_empty() {
                        warnings.push(format!("day header without parsable date: '{first_text}'"));
                    }
                    current_day = None;
                }
            }
        } else if day_match.is_none() {
            // Pure spacer row.
            continue;
        }

        let Some((day_fo, date_part)) = current_day.clone() else {
            continue;
        };
        let day_en = day_name_en(&day_fo).to_string();

        let mut col: u32 = 1;
        for (cell_index, cell) in cells.iter().enumerate() {
            if cell_index == 0 {
                col += colspan_of(cell);
                continue;
            }
            let colspan = colspan_of(cell);
            let classes = classes_of(cell);
            let is_lesson = classes.iter().any(|c| LESSON_CLASS.is_match(c));
            if !is_lesson {
                col += colspan;
                continue;
            }
            let cancelled = classes.iter().any(|c| CANCELLED_CLASSES.contains(c));

            let anchors: Vec<String> = cell
                .select(&a_sel)
                .map(|a| a.text().collect::<String>().trim().to_string())
                .collect();
            if anchors.len() < 3 {
                warnings.push(format!(
                    "lesson cell on {day_fo} {date_part} has {} anchors, expected 3",
                    anchors.len()
                ));
                col += colspan;
                continue;
            }
            let (raw_code, teacher_short, room_raw) = (&anchors[0], &anchors[1], &anchors[2]);

            let (title, level, year_code) = parse_subject_code(raw_code);
            let academic_year = year_code.as_deref().and_then(format_academic_year);

            let teacher_full = teacher_map
                .get(teacher_short)
                .cloned()
                .unwrap_or_else(|| teacher_short.clone());
            // Directory entries sometimes repeat the initials: "Name (XX)".
            let teacher_full = match teacher_full.split_once(" (") {
                Some((name, _)) => name.to_string(),
                None => teacher_full,
            };

            let location = room_raw
                .strip_prefix("st.")
                .unwrap_or(room_raw)
                .trim()
                .to_string();

            let slot = if colspan >= 90 {
                Some((TimeSlot::all_day(), "08:10-15:25"))
            } else {
                slot_for_column(col)
            };
            let Some((time_slot, time_range)) = slot else {
                warnings.push(format!(
                    "no time slot for column {col} ({title} on {day_fo} {date_part})"
                ));
                col += colspan;
                continue;
            };
            let (start_time, end_time) = parse_time_range(time_range);
            if start_time.is_none() || end_time.is_none() {
                warnings.push(format!("unparsable time range '{time_range}' for {title}"));
                col += colspan;
                continue;
            }

            let Some(date) = resolve_event_date(&date_part, iso_year, start_date, end_date) else {
                warnings.push(format!("no resolvable date for '{date_part}' ({title})"));
                col += colspan;
                continue;
            };

            let lesson_id = cell
                .select(&lesson_span_sel)
                .next()
                .and_then(|span| span.attr("id"))
                .and_then(|id| {
                    // "MyWindow" (8) + id + "Main" (4)
                    if id.len() > 12 {
                        Some(id[8..id.len() - 4].to_string())
                    } else {
                        warnings.push(format!("lesson span with unexpected id format: '{id}'"));
                        None
                    }
                });
            if lesson_id.is_none() {
                warnings.push(format!("no lesson id for {title} on {date}"));
            }

            let has_homework_note = cell.select(&note_sel).next().is_some();
            if has_homework_note {
                if let Some(id) = &lesson_id {
                    if !homework_ids.contains(id) {
                        homework_ids.push(id.clone());
                    }
                } else {
                    warnings.push(format!(
                        "homework note without a lesson id for {title} on {date}"
                    ));
                }
            }

            events.push(Event {
                title,
                level,
                academic_year,
                date: Some(date),
                day_of_week: day_en.clone(),
                teacher_full,
                teacher_short: teacher_short.clone(),
                location,
                time_slot,
                start_time,
                end_time,
                time_range: time_range.to_string(),
                cancelled,
                lesson_id,
                description: None,
                has_homework_note,
            });
            col += colspan;
        }
    }

    ParseOutcome::Success {
        data: ParsedWeek {
            student_info,
            week_info,
            events,
            homework_ids,
        },
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn page(week_anchor: &str, date_range: &str, table: &str) -> String {
        format!(
            r#"<html><body>
            <table><tr><td>Næmingatímatalva : Rókur Meitilberg, 22y
                <table><tr><td>chrome</td></tr></table>
            </td></tr></table>
            <a class="UgeKnapValgt" onclick="v=0">{week_anchor}</a>
            <p>{date_range}</p>
            {table}
            </body></html>"#
        )
    }

    fn lesson_cell(colspan: u32, code: &str, teacher: &str, room: &str, lesson_id: &str) -> String {
        format!(
            r##"<td colspan="{colspan}" class="lektionslinje_lesson0">
                <a href="#">{code}</a><br>
                <a href="#">{teacher}</a><br>
                <a href="#">{room}</a>
                <span id="MyWindow{lesson_id}Main"></span>
            </td>"##
        )
    }

    fn teacher_map() -> HashMap<String, String> {
        HashMap::from([("JOH".to_string(), "Jón Johansen".to_string())])
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_full_week() {
        let table = format!(
            r#"<table class="time_8_16">
                <tr><td class="lektionslinje_1">Mánadagur 21/04</td>
                    {}
                    {}
                </tr>
                <tr><td class="mellem">spacer</td></tr>
            </table>"#,
            lesson_cell(24, "MAT-A-TEAM-2425", "JOH", "st. 101", "LES1"),
            lesson_cell(24, "PHY-B-TEAM-2425", "PHY", "st. 201", "LES2"),
        );
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", &table);
        let (week, warnings) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();

        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(week.student_info.student_name, "Rókur Meitilberg");
        assert_eq!(week.student_info.class_name, "22y");
        assert_eq!(week.week_info.week_number, 17);
        assert_eq!(week.week_info.year, 2025);
        assert_eq!(week.week_info.week_key, "2025-W17");
        assert_eq!(week.week_info.start_date, d(2025, 4, 21));
        assert_eq!(week.week_info.end_date, d(2025, 4, 27));

        assert_eq!(week.events.len(), 2);
        let first = &week.events[0];
        assert_eq!(first.title, "MAT");
        assert_eq!(first.level, "A");
        assert_eq!(first.academic_year.as_deref(), Some("2024-2025"));
        assert_eq!(first.date, Some(d(2025, 4, 21)));
        assert_eq!(first.day_of_week, "Monday");
        assert_eq!(first.teacher_full, "Jón Johansen");
        assert_eq!(first.teacher_short, "JOH");
        assert_eq!(first.location, "101");
        assert_eq!(first.time_slot, TimeSlot::Number(1));
        assert_eq!(first.time_range, "08:10-09:40");
        assert_eq!(first.start_time.as_deref(), Some("08:10"));
        assert_eq!(first.end_time.as_deref(), Some("09:40"));
        assert_eq!(first.lesson_id.as_deref(), Some("LES1"));
        assert!(!first.cancelled);
        assert!(!first.has_homework_note);

        // Second cell starts at column 26 → slot 2; unknown initials fall through.
        let second = &week.events[1];
        assert_eq!(second.time_slot, TimeSlot::Number(2));
        assert_eq!(second.time_range, "10:05-11:35");
        assert_eq!(second.teacher_full, "PHY");
        assert_eq!(second.location, "201");
    }

    #[test]
    fn all_day_colspan_overrides_slot() {
        let table = format!(
            r#"<table class="time_8_16">
                <tr><td class="lektionslinje_1">Hósdagur 24/04</td>
                    {}
                </tr>
            </table>"#,
            lesson_cell(120, "MAT-A-TEAM-2425", "JOH", "st. 101", "LES1"),
        );
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", &table);
        let (week, _) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert_eq!(week.events.len(), 1);
        assert_eq!(week.events[0].time_slot, TimeSlot::all_day());
        assert_eq!(week.events[0].time_range, "08:10-15:25");
        assert_eq!(week.events[0].day_of_week, "Thursday");
    }

    #[test]
    fn cancelled_class_sets_flag() {
        let table = r##"<table class="time_8_16">
            <tr><td class="lektionslinje_1_aktuel">Týsdagur 22/04</td>
                <td colspan="24" class="lektionslinje_lesson2 lektionslinje_lessoncancelled">
                    <a href="#">MAT-A-TEAM-2425</a>
                    <a href="#">JOH</a>
                    <a href="#">st. 101</a>
                    <span id="MyWindowLES9Main"></span>
                </td>
            </tr>
        </table>"##;
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", table);
        let (week, _) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert!(week.events[0].cancelled);
    }

    #[test]
    fn cell_with_too_few_anchors_is_skipped_with_warning() {
        let table = r#"<table class="time_8_16">
            <tr><td class="lektionslinje_1">Mánadagur 21/04</td>
                <td colspan="24" class="lektionslinje_lesson0">Incomplete</td>
            </tr>
        </table>"#;
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", table);
        let (week, warnings) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert!(week.events.is_empty());
        assert!(warnings.iter().any(|w| w.contains("anchors")));
    }

    #[test]
    fn missing_lesson_id_span_yields_event_without_id() {
        let table = r##"<table class="time_8_16">
            <tr><td class="lektionslinje_1">Mánadagur 21/04</td>
                <td colspan="24" class="lektionslinje_lesson0">
                    <a href="#">MAT-A-TEAM-2425</a>
                    <a href="#">JOH</a>
                    <a href="#">st. 101</a>
                    <input type="image" src="/note.gif">
                </td>
            </tr>
        </table>"##;
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", table);
        let (week, warnings) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert_eq!(week.events.len(), 1);
        assert_eq!(week.events[0].lesson_id, None);
        assert!(week.events[0].has_homework_note);
        // Flagged but untracked: never queued for homework fetching.
        assert!(week.homework_ids.is_empty());
        assert!(warnings.iter().any(|w| w.contains("no lesson id")));
    }

    #[test]
    fn homework_icon_queues_lesson_id_once() {
        let cell = r##"<td colspan="24" class="lektionslinje_lesson0">
            <a href="#">MAT-A-TEAM-2425</a>
            <a href="#">JOH</a>
            <a href="#">st. 101</a>
            <span id="MyWindowLES1Main"></span>
            <input type="image" src="/i/note.gif">
        </td>"##;
        let table = format!(
            r#"<table class="time_8_16">
                <tr><td class="lektionslinje_1">Mánadagur 21/04</td>{cell}{cell}</tr>
            </table>"#
        );
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", &table);
        let (week, _) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert_eq!(week.events.len(), 2);
        assert_eq!(week.homework_ids, vec!["LES1".to_string()]);
    }

    #[test]
    fn absent_table_with_holiday_phrase_is_empty_success() {
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", "<p>frídagur</p>");
        let (week, _) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert!(week.events.is_empty());
        assert_eq!(week.week_info.week_key, "2025-W17");
    }

    #[test]
    fn absent_table_without_phrase_is_parse_failure() {
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", "<div>login</div>");
        match parse_timetable_html(&html, &teacher_map(), 0) {
            ParseOutcome::ParseFailed(msg) => assert!(msg.contains("time_8_16")),
            other => panic!("expected ParseFailed, got {other:?}"),
        }
    }

    #[test]
    fn missing_student_marker_is_structure_error() {
        let html = r#"<html><body><p>21.04.2025 - 27.04.2025</p></body></html>"#;
        match parse_timetable_html(html, &teacher_map(), 0) {
            ParseOutcome::StructureError(msg) => assert!(msg.contains(STUDENT_MARKER)),
            other => panic!("expected StructureError, got {other:?}"),
        }
    }

    #[test]
    fn week_anchor_mismatch_is_warning_and_iso_wins() {
        let table = r#"<table class="time_8_16">
            <tr><td class="lektionslinje_1">Mánadagur 21/04</td></tr>
        </table>"#;
        let html = page("Vika 16", "21.04.2025 - 27.04.2025", table);
        let (week, warnings) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert_eq!(week.week_info.week_number, 17);
        assert!(warnings.iter().any(|w| w.contains("week 16")));
    }

    #[test]
    fn year_boundary_week_uses_iso_year_for_key_and_real_dates() {
        let table = format!(
            r#"<table class="time_8_16">
                <tr><td class="lektionslinje_1">Mánadagur 30/12</td>
                    {}
                </tr>
                <tr><td class="lektionslinje_1">Hósdagur 2/1</td>
                    {}
                </tr>
            </table>"#,
            lesson_cell(24, "MAT-A-TEAM-2425", "JOH", "st. 101", "LESA"),
            lesson_cell(24, "MAT-A-TEAM-2425", "JOH", "st. 101", "LESB"),
        );
        let html = page("Vika 1", "30.12.2024 - 05.01.2025", &table);
        let (week, _) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert_eq!(week.week_info.week_key, "2025-W01");
        assert_eq!(week.week_info.year, 2025);
        assert_eq!(week.events[0].date, Some(d(2024, 12, 30)));
        assert_eq!(week.events[1].date, Some(d(2025, 1, 2)));
    }

    #[test]
    fn parsing_is_idempotent() {
        let table = format!(
            r#"<table class="time_8_16">
                <tr><td class="lektionslinje_1">Mánadagur 21/04</td>
                    {}
                </tr>
            </table>"#,
            lesson_cell(24, "MAT-A-TEAM-2425", "JOH", "st. 101", "LES1"),
        );
        let html = page("Vika 17", "21.04.2025 - 27.04.2025", &table);
        let (first, _) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        let (second, _) = parse_timetable_html(&html, &teacher_map(), 0).expect_success();
        assert_eq!(first, second);
    }

    #[test]
    fn subject_code_arities() {
        assert_eq!(
            parse_subject_code("MAT-A-TEAM-2425"),
            ("MAT".into(), "A".into(), Some("2425".into()))
        );
        assert_eq!(
            parse_subject_code("Várroynd-før-A-33-2425"),
            ("Várroynd-før".into(), "A".into(), Some("2425".into()))
        );
        assert_eq!(
            parse_subject_code("BV3-2425-22y"),
            ("BV".into(), "3".into(), Some("2425".into()))
        );
        assert_eq!(
            parse_subject_code("mystery"),
            ("mystery".into(), "".into(), None)
        );
    }
}
