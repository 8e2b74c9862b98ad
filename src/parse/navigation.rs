//! Week-navigation parsing: the set of week offsets reachable from a page.

use html_scraper::{Html, Selector};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static WEEK_OFFSET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"v=(-?\d+)").unwrap());

/// Collect every signed week offset from `v=N` assignments inside navigation
/// anchors. Returns a sorted, deduplicated list; a page without navigation
/// yields an empty list.
pub fn parse_available_offsets(html: &str) -> Vec<i32> {
    let doc = Html::parse_document(html);
    let nav_sel = Selector::parse(r#"a[onclick*="v="]"#).unwrap();

    let mut offsets = BTreeSet::new();
    for link in doc.select(&nav_sel) {
        let Some(onclick) = link.attr("onclick") else {
            continue;
        };
        for caps in WEEK_OFFSET.captures_iter(onclick) {
            if let Ok(offset) = caps[1].parse::<i32>() {
                offsets.insert(offset);
            }
        }
    }
    offsets.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_sorted_unique_offsets() {
        let html = r#"
            <a onclick="MyUpdate('/i/udvalg.asp','q=stude&v=1&id=x',1)">Vika 18</a>
            <a onclick="MyUpdate('/i/udvalg.asp','q=stude&v=-1&id=x',1)">Vika 16</a>
            <a onclick="MyUpdate('/i/udvalg.asp','q=stude&v=0&id=x',1)">Vika 17</a>
            <a onclick="MyUpdate('/i/udvalg.asp','q=stude&v=1&id=x',1)">Vika 18 again</a>
        "#;
        assert_eq!(parse_available_offsets(html), vec![-1, 0, 1]);
    }

    #[test]
    fn no_navigation_yields_empty() {
        assert!(parse_available_offsets("<a href='#'>plain link</a>").is_empty());
    }
}
