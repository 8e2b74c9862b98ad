//! Extraction of the `lname` session token from upstream HTML.
//!
//! The upstream embeds the token in several places depending on the page;
//! the patterns are tried in order of how reliably they have matched and the
//! first hit wins.

use regex::Regex;
use std::sync::LazyLock;

static LNAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Query-string or simple assignment form: lname=TOKEN
        Regex::new(r#"lname=([^&"'\s]+)"#).unwrap(),
        // Inside an xmlhttp.send("...lname=TOKEN...") call
        Regex::new(r#"xmlhttp\.send\("[^"]*lname=([^&"'\s]+)""#).unwrap(),
        // Positional argument of the MyUpdate JS helper
        Regex::new(r"MyUpdate\('[^']*','[^']*','[^']*',\d+,(\d+)\)").unwrap(),
        // Hidden form input
        Regex::new(r#"name=['"]lname['"]\s*value=['"]([^'"]+)['"]"#).unwrap(),
    ]
});

/// Scan HTML for the `lname` session token.
///
/// A captured token containing a comma is truncated at the first comma (the
/// upstream sometimes appends a secondary value). Returns `None` when no
/// pattern matches; the caller decides whether that is fatal.
pub fn extract_lname(html: &str) -> Option<String> {
    for pattern in LNAME_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(html) {
            let raw = caps.get(1)?.as_str();
            let token = raw.split(',').next().unwrap_or(raw);
            return Some(token.to_string());
        }
    }
    None
}
