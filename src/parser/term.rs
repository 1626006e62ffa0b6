//! Requirements written as definition-list terms:
//!
//! ```text
//! SR-001::
//! Optional title:
//! +
//! Req. text1
//! Req. text2
//! +
//! Child: R-01, R-02; Parent: UR-01
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    domain::{Category, Diagnostics, Document, Requirement, fields},
    parser::{CONTINUATION, Line, LineStream, validate_requirement},
};

static ATTRIBUTE_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[^\s:;][^:;]*:[^;]*(?:;\s*(?:[^\s:;][^:;]*:[^;]*)?)*$")
        .expect("static regex is valid")
});

fn is_continuation(line: &Line<'_>) -> bool {
    line.text.trim() == CONTINUATION
}

/// Parses a `;`-separated list of `name: value` pairs into `req`.
///
/// Fails (recording why) on a pair without a colon, an empty name, or a name
/// already defined on the requirement.
pub fn parse_term_attributes(
    line: Line<'_>,
    req: &mut Requirement,
    diagnostics: &mut Diagnostics,
) -> bool {
    for pair in line.text.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let Some((name, value)) = pair.split_once(':').filter(|(name, _)| !name.trim().is_empty())
        else {
            diagnostics.error(
                Category::Structure,
                Some(line.number),
                format!("Incorrect format for requirement attribute: {pair}"),
            );
            return false;
        };
        if let Err(error) = req.insert(name.trim(), value.trim()) {
            diagnostics.error(Category::Structure, Some(line.number), error.to_string());
            return false;
        }
    }
    true
}

/// Consumes a title line and the `+` after it, if present.
fn read_title<'a>(lines: &mut LineStream<'a>) -> Option<&'a str> {
    let candidate = lines.next()?;
    let title = candidate.text.trim();
    if title.len() > 1 && title.ends_with(':') {
        match lines.peek() {
            Some(next) if is_continuation(&next) => {
                lines.next();
                return Some(title.trim_end_matches(':').trim_end());
            }
            _ => {}
        }
    }
    lines.push_back(candidate);
    None
}

/// Reads the requirement whose label `<id>::` was found on `label`.
///
/// Consumes the optional title, the body up to a blank line or `+`, and after
/// a `+` the attribute lines that follow. The first line that does not look
/// like an attribute list is left in the stream.
pub fn req_from_term(
    id: &str,
    label: Line<'_>,
    lines: &mut LineStream<'_>,
    doc: &Document,
    diagnostics: &mut Diagnostics,
) -> Option<Requirement> {
    let mut req = Requirement::new();
    req.set(fields::ID, id);
    req.set(fields::LINE, label.number.to_string());
    if let Some(title) = read_title(lines) {
        req.set(fields::TITLE, title);
    }

    let mut body = Vec::new();
    let mut has_attributes = false;
    for line in lines.by_ref() {
        if line.text.trim().is_empty() {
            break;
        }
        if is_continuation(&line) {
            has_attributes = true;
            break;
        }
        body.push(line.text.trim_end());
    }
    if !body.is_empty() {
        req.set(fields::TEXT, body.join("\n"));
    }

    if has_attributes {
        let Some(first) = lines.next() else {
            diagnostics.error(
                Category::Structure,
                Some(label.number),
                "Expected requirement attributes after '+'",
            );
            return None;
        };
        if !parse_term_attributes(first, &mut req, diagnostics) {
            return None;
        }
        while let Some(line) = lines.next() {
            if !ATTRIBUTE_LIST.is_match(line.text) {
                lines.push_back(line);
                break;
            }
            if !parse_term_attributes(line, &mut req, diagnostics) {
                return None;
            }
        }
    }

    validate_requirement(&req, doc, label.number, diagnostics).then_some(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IdPattern;

    fn doc() -> Document {
        let mut doc = Document::new("sw.adoc");
        doc.set_id_pattern(IdPattern::new(r"SR-\d+").unwrap());
        doc
    }

    fn req(pairs: &[(&str, &str)]) -> Requirement {
        Requirement::try_from_pairs(pairs.iter().copied()).unwrap()
    }

    /// Reads a term requirement from `text`, whose first line is the label.
    fn read(text: &str) -> (Option<Requirement>, Diagnostics, Vec<String>) {
        let mut lines = LineStream::new(text);
        let label = lines.next().unwrap();
        let pattern = IdPattern::new(r"SR-\d+").unwrap();
        let id = pattern.term_label(label.text).unwrap();
        let mut diagnostics = Diagnostics::new();
        let found = req_from_term(id, label, &mut lines, &doc(), &mut diagnostics);
        let rest = lines.map(|line| line.text.to_string()).collect();
        (found, diagnostics, rest)
    }

    #[test]
    fn body_and_attributes() {
        let (found, diagnostics, _) = read(
            "SR-001::\nReq. text1\nReq. text2\n+\nChild: R-01, R-02; Parent: UR-01",
        );
        assert_eq!(
            found.unwrap(),
            req(&[
                ("ID", "SR-001"),
                ("Text", "Req. text1\nReq. text2"),
                ("Parent", "UR-01"),
                ("Child", "R-01, R-02"),
                ("line", "1"),
            ])
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn blank_line_ends_requirement() {
        let (found, _, rest) = read("SR-001::\nThe text\n\nMore prose");
        assert_eq!(
            found.unwrap(),
            req(&[("ID", "SR-001"), ("Text", "The text"), ("line", "1")])
        );
        assert_eq!(rest, vec!["More prose"]);
    }

    #[test]
    fn title() {
        let (found, _, _) = read("SR-001::\nA title:\n+\nThe text");
        assert_eq!(
            found.unwrap(),
            req(&[
                ("ID", "SR-001"),
                ("Title", "A title"),
                ("Text", "The text"),
                ("line", "1"),
            ])
        );
    }

    #[test]
    fn colon_without_continuation_is_body_text() {
        let (found, _, _) = read("SR-001::\nThe following applies:\nall of it");
        let found = found.unwrap();
        assert_eq!(found.title(), None);
        assert_eq!(found.text(), Some("The following applies:\nall of it"));
    }

    #[test]
    fn attributes_over_several_lines() {
        let (found, diagnostics, rest) =
            read("SR-001::\nText\n+\nParent: UR-1;\nTags: a, b\nSome prose without colon");
        let found = found.unwrap();
        assert_eq!(found.get("Parent"), Some("UR-1"));
        assert_eq!(found.get("Tags"), Some("a, b"));
        assert!(diagnostics.is_empty());
        assert_eq!(rest, vec!["Some prose without colon"]);
    }

    #[test]
    fn duplicate_attribute_discards_requirement() {
        let (found, diagnostics, _) = read("SR-001::\nText\n+\nTags: a; Tags: b");
        assert!(found.is_none());
        assert_eq!(diagnostics.count(Category::Structure), 1);
    }

    #[test]
    fn reserved_attribute_cannot_be_redefined() {
        let (found, _, _) = read("SR-001::\nText\n+\nID: SR-002");
        assert!(found.is_none());
    }

    #[test]
    fn malformed_attribute_discards_requirement() {
        let (found, diagnostics, _) = read("SR-001::\nText\n+\nno colon here");
        assert!(found.is_none());
        assert_eq!(diagnostics.iter().next().unwrap().line, Some(4));
    }

    #[test]
    fn missing_text_is_invalid() {
        let (found, diagnostics, _) = read("SR-001::\n\nprose");
        assert!(found.is_none());
        assert_eq!(diagnostics.count(Category::Validation), 1);
    }

    #[test]
    fn end_of_input_ends_body() {
        let (found, _, _) = read("SR-001::\nLast line");
        assert_eq!(found.unwrap().text(), Some("Last line"));
    }

    #[test]
    fn attribute_list_shapes() {
        for line in ["Parent: UR-1", "a: 1; b: 2", "a: 1;", " Tags: x, y ; Verified: yes"] {
            assert!(ATTRIBUTE_LIST.is_match(line), "{line}");
        }
        for line in ["", "plain text", ": value", "a; b: 1"] {
            assert!(!ATTRIBUTE_LIST.is_match(line), "{line}");
        }
    }
}
