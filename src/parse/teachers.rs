//! Teacher directory parsing: initials → full name.

use html_scraper::{Html, Selector};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TEACHER_WITH_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^<>]+?)\s*\(\s*<a[^>]*?>([A-Z]{2,4})</a>\s*\)").unwrap());
static TEACHER_NO_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^<>]+?)\s*\(\s*([A-Z]{2,4})\s*\)").unwrap());

/// Parse the teacher directory page into `{initials → full name}`.
///
/// The primary source is a `<select>` whose options carry initials as values
/// and full names as text (the `-1` placeholder is skipped). When that yields
/// nothing, two regex shapes over the raw HTML are tried:
/// `FullName (<a ...>INIT</a>)` and `FullName (INIT)`.
pub fn parse_teacher_html(html: &str) -> HashMap<String, String> {
    let mut teacher_map = HashMap::new();

    let doc = Html::parse_document(html);
    let option_sel = Selector::parse("select option").unwrap();
    for option in doc.select(&option_sel) {
        let Some(initials) = option.attr("value") else {
            continue;
        };
        let full_name = option.text().collect::<String>().trim().to_string();
        if !initials.is_empty() && initials != "-1" && !full_name.is_empty() {
            teacher_map.insert(initials.to_string(), full_name);
        }
    }

    if teacher_map.is_empty() {
        for pattern in [&*TEACHER_WITH_LINK, &*TEACHER_NO_LINK] {
            for caps in pattern.captures_iter(html) {
                let full_name = caps[1].trim().to_string();
                let initials = caps[2].trim().to_string();
                if !initials.is_empty()
                    && !full_name.is_empty()
                    && !teacher_map.contains_key(&initials)
                {
                    teacher_map.insert(initials, full_name);
                }
            }
        }
    }

    if teacher_map.is_empty() {
        tracing::warn!("no teacher entries found in directory HTML");
    }
    teacher_map
}
