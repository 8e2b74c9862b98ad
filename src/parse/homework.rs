//! Homework note parsing: one note page → `{lesson_id → markdown text}`.

use ego_tree::NodeRef;
use html_scraper::{ElementRef, Html, Node, Selector};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Bold header the upstream places above the homework body.
const HOMEWORK_HEADER: &str = "Heimaarbeiði";

static SPACE_BEFORE_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +\n").unwrap());
static SPACE_AFTER_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n +").unwrap());

/// Parse a note page into a lesson-id → homework-text map.
///
/// The lesson id comes from the hidden `LektionsID*` input; the text is the
/// paragraph under the `Heimaarbeiði` header, rendered to markdown
/// (`<b>` → `**`, `<i>` → `*`, `<br>` → newline). The header itself and the
/// `<br>` immediately after it are dropped. An empty map means the page
/// carried no homework, which is the common case.
pub fn parse_homework_html(html: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();
    let doc = Html::parse_document(html);

    let id_sel = Selector::parse(r#"input[type="hidden"][id^="LektionsID"]"#).unwrap();
    let lesson_id = match doc.select(&id_sel).next().and_then(|input| input.attr("value")) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            tracing::debug!("no LektionsID input in note page");
            return result;
        }
    };

    let b_sel = Selector::parse("b").unwrap();
    let Some(header) = doc
        .select(&b_sel)
        .find(|b| b.text().collect::<String>().trim() == HOMEWORK_HEADER)
    else {
        // Lessons commonly have no homework section at all.
        return result;
    };

    let Some(paragraph) = header
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "p")
    else {
        tracing::warn!(lesson_id, "homework header without an enclosing <p>");
        return result;
    };

    let mut text = String::new();
    let mut header_skipped = false;
    let mut first_br_skipped = false;
    for child in paragraph.children() {
        if !header_skipped {
            if is_element(child, "b")
                && ElementRef::wrap(child)
                    .map(|el| el.text().collect::<String>().trim() == HOMEWORK_HEADER)
                    .unwrap_or(false)
            {
                header_skipped = true;
                continue;
            }
        } else if !first_br_skipped && is_element(child, "br") {
            first_br_skipped = true;
            continue;
        }
        render_node(child, &mut text);
    }

    let text = SPACE_BEFORE_NEWLINE.replace_all(&text, "\n");
    let text = SPACE_AFTER_NEWLINE.replace_all(&text, "\n");
    let text = text.trim();
    if !text.is_empty() {
        result.insert(lesson_id, text.to_string());
    }
    result
}

fn is_element(node: NodeRef<'_, Node>, name: &str) -> bool {
    matches!(node.value(), Node::Element(el) if el.name() == name)
}

/// Render one node tree to markdown-ish text.
fn render_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&text),
        Node::Element(el) => match el.name() {
            "br" => out.push('\n'),
            "b" => render_wrapped(node, "**", out),
            "i" => render_wrapped(node, "*", out),
            _ => {
                for child in node.children() {
                    render_node(child, out);
                }
            }
        },
        _ => {}
    }
}

fn render_wrapped(node: NodeRef<'_, Node>, marker: &str, out: &mut String) {
    let mut inner = String::new();
    for child in node.children() {
        render_node(child, &mut inner);
    }
    let inner = inner.trim();
    if !inner.is_empty() {
        out.push_str(marker);
        out.push_str(inner);
        out.push_str(marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_page(body: &str) -> String {
        format!(
            r#"<html><body>
                <input type="hidden" id="LektionsID1" value="LES1">
                <p><b>Heimaarbeiði</b><br>{body}</p>
            </body></html>"#
        )
    }

    #[test]
    fn extracts_plain_homework() {
        let map = parse_homework_html(&note_page("Les síðu 10-12."));
        assert_eq!(map.get("LES1").map(String::as_str), Some("Les síðu 10-12."));
    }

    #[test]
    fn converts_markup_to_markdown() {
        let html = note_page("Read <b>chapter 4</b><br>and <i>take notes</i>.");
        let map = parse_homework_html(&html);
        assert_eq!(
            map.get("LES1").map(String::as_str),
            Some("Read **chapter 4**\nand *take notes*.")
        );
    }

    #[test]
    fn skips_header_and_first_break_only() {
        let html = note_page("line one<br>line two");
        let map = parse_homework_html(&html);
        assert_eq!(
            map.get("LES1").map(String::as_str),
            Some("line one\nline two")
        );
    }

    #[test]
    fn no_homework_header_yields_empty() {
        let html = r#"<html><body>
            <input type="hidden" id="LektionsID1" value="LES1">
            <p>Nothing to see.</p>
        </body></html>"#;
        assert!(parse_homework_html(html).is_empty());
    }

    #[test]
    fn missing_lesson_id_yields_empty() {
        let html = r#"<html><body><p><b>Heimaarbeiði</b><br>text</p></body></html>"#;
        assert!(parse_homework_html(html).is_empty());
    }

    #[test]
    fn whitespace_around_newlines_is_collapsed() {
        let html = note_page("fyrsta   <br>   næsta");
        let map = parse_homework_html(&html);
        assert_eq!(map.get("LES1").map(String::as_str), Some("fyrsta\nnæsta"));
    }
}
