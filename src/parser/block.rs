//! Fenced listing blocks holding requirements as YAML.
//!
//! A block either holds a single requirement:
//!
//! ```text
//! [.reqy]
//! ----
//! ID: SR-001
//! Text: Some requirement
//! ----
//! ```
//!
//! or several, keyed by ID:
//!
//! ```text
//! [.reqy]
//! ----
//! SR-001:
//!   Text: Some requirement
//! SR-002:
//!   Text: Another requirement
//! ----
//! ```

use serde_yaml::{Mapping, Value};

use crate::{
    domain::{Category, Diagnostics, Document, Requirement, fields},
    parser::{BLOCK_DELIMITER, LineStream, validate_requirement},
};

/// The content of a fenced block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceBlock<'a> {
    /// The lines between the fences.
    pub lines: Vec<&'a str>,
    /// The line number of the first content line.
    pub first_line: usize,
}

/// Consumes a `----` fenced block from `lines`.
///
/// Blank lines before the opening fence are skipped. If the first non-blank
/// line is not a fence it is left in the stream and `None` is returned. An
/// unterminated block is consumed to the end of the document and reported.
pub fn read_source_block<'a>(
    lines: &mut LineStream<'a>,
    diagnostics: &mut Diagnostics,
) -> Option<SourceBlock<'a>> {
    let opening = lines.find(|line| !line.text.trim().is_empty())?;
    if opening.text.trim() != BLOCK_DELIMITER {
        diagnostics.error(
            Category::Structure,
            Some(opening.number),
            "Not a YAML block: expected '----'",
        );
        lines.push_back(opening);
        return None;
    }

    let mut block = SourceBlock {
        lines: Vec::new(),
        first_line: opening.number + 1,
    };
    for line in lines.by_ref() {
        let text = line.text.trim_end();
        if text == BLOCK_DELIMITER {
            return Some(block);
        }
        block.lines.push(text);
    }
    diagnostics.error(
        Category::Structure,
        Some(opening.number),
        "YAML block not terminated before end of document",
    );
    None
}

/// Renders a YAML scalar (or list of scalars) as an attribute value.
fn attribute_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Sequence(items) => items
            .iter()
            .map(attribute_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Tagged(tagged) => attribute_value(&tagged.value),
        Value::Mapping(_) => serde_yaml::to_string(value)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(attribute_value(key)),
        _ => None,
    }
}

fn requirement_from_mapping(
    id: Option<&str>,
    mapping: &Mapping,
    line_no: usize,
    diagnostics: &mut Diagnostics,
) -> Option<Requirement> {
    let mut req = Requirement::new();
    if let Some(id) = id {
        req.set(fields::ID, id);
    }
    for (key, value) in mapping {
        let Some(name) = key_name(key) else {
            diagnostics.error(
                Category::Structure,
                Some(line_no),
                "Attribute names in YAML block must be plain scalars",
            );
            return None;
        };
        if let Err(error) = req.insert(name, attribute_value(value)) {
            diagnostics.error(Category::Structure, Some(line_no), error.to_string());
            return None;
        }
    }
    Some(req)
}

/// The first content line mentioning `id`, also catching IDs split over two
/// lines. Falls back to the first line of the block.
fn line_of(id: &str, lines: &[&str], first_line: usize) -> usize {
    if let Some(i) = lines.iter().position(|line| line.contains(id)) {
        return first_line + i;
    }
    lines
        .windows(2)
        .position(|pair| format!("{}{}", pair[0].trim_end(), pair[1].trim_start()).contains(id))
        .map_or(first_line, |i| first_line + i)
}

/// Decodes the lines of a YAML block into requirements without validating
/// them.
///
/// If the first key matches the document's identifier pattern the block is
/// taken to be a mapping of IDs to attributes, otherwise a single
/// requirement. Each requirement's `line` is the first content line
/// mentioning its ID.
pub fn decode_yaml_lines(
    lines: &[&str],
    doc: &Document,
    first_line: usize,
    diagnostics: &mut Diagnostics,
) -> Vec<Requirement> {
    let parsed: Value = match serde_yaml::from_str(&lines.join("\n")) {
        Ok(value) => value,
        Err(error) => {
            diagnostics.error(
                Category::Structure,
                Some(first_line),
                format!("Failed to parse YAML: {error}"),
            );
            return Vec::new();
        }
    };
    let Some(attributes) = parsed.as_mapping().filter(|mapping| !mapping.is_empty()) else {
        diagnostics.error(
            Category::Structure,
            Some(first_line),
            "Failed to parse YAML: expected a non-empty mapping",
        );
        return Vec::new();
    };

    let keyed_by_id = attributes
        .keys()
        .next()
        .and_then(key_name)
        .zip(doc.id_pattern())
        .is_some_and(|(key, pattern)| pattern.is_match(&key));

    let mut candidates = Vec::new();
    if keyed_by_id {
        for (key, value) in attributes {
            let id = key_name(key).unwrap_or_default();
            let Some(inner) = value.as_mapping() else {
                diagnostics.error(
                    Category::Structure,
                    Some(line_of(&id, lines, first_line)),
                    format!("Attributes of {id} must be a mapping"),
                );
                continue;
            };
            candidates.extend(requirement_from_mapping(Some(&id), inner, first_line, diagnostics));
        }
    } else {
        candidates.extend(requirement_from_mapping(None, attributes, first_line, diagnostics));
    }

    for req in &mut candidates {
        let line_no = req
            .id()
            .map_or(first_line, |id| line_of(id, lines, first_line));
        req.set(fields::LINE, line_no.to_string());
    }
    candidates
}

/// Decodes the lines of a YAML block into validated requirements.
///
/// See [`decode_yaml_lines`] for the two accepted layouts. Requirements that
/// fail validation are reported and left out.
pub fn reqs_from_yaml_lines(
    lines: &[&str],
    doc: &Document,
    first_line: usize,
    diagnostics: &mut Diagnostics,
) -> Vec<Requirement> {
    decode_yaml_lines(lines, doc, first_line, diagnostics)
        .into_iter()
        .filter(|req| {
            let line_no = req.line().unwrap_or(first_line);
            validate_requirement(req, doc, line_no, diagnostics)
        })
        .collect()
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

    #[test]
    fn reads_block_between_fences() {
        let mut lines = LineStream::new("\n----\nID: SR-001\n----\nafter");
        let mut diagnostics = Diagnostics::new();
        let block = read_source_block(&mut lines, &mut diagnostics).unwrap();
        assert_eq!(block.lines, vec!["ID: SR-001"]);
        assert_eq!(block.first_line, 3);
        assert_eq!(lines.next().unwrap().text, "after");
    }

    #[test]
    fn malformed_fence_is_left_in_stream() {
        let mut lines = LineStream::new("ID: SR-001\n----");
        let mut diagnostics = Diagnostics::new();
        assert!(read_source_block(&mut lines, &mut diagnostics).is_none());
        assert_eq!(lines.next().unwrap().text, "ID: SR-001");
        assert_eq!(diagnostics.count(Category::Structure), 1);
    }

    #[test]
    fn unterminated_block() {
        let mut lines = LineStream::new("----\nID: SR-001");
        let mut diagnostics = Diagnostics::new();
        assert!(read_source_block(&mut lines, &mut diagnostics).is_none());
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn single_requirement() {
        let mut diagnostics = Diagnostics::new();
        let reqs = reqs_from_yaml_lines(
            &["ID: SR-001", "Text: Some requirement"],
            &doc(),
            7,
            &mut diagnostics,
        );
        assert_eq!(
            reqs,
            vec![req(&[("ID", "SR-001"), ("Text", "Some requirement"), ("line", "7")])]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn keyed_requirements_get_the_line_of_their_id() {
        let lines = [
            "SR-001:",
            "  Text: First",
            "  Parent: [UR-1, UR-2]",
            "SR-002:",
            "  Text: >",
            "    Second",
        ];
        let mut diagnostics = Diagnostics::new();
        let reqs = reqs_from_yaml_lines(&lines, &doc(), 10, &mut diagnostics);
        assert_eq!(
            reqs,
            vec![
                req(&[
                    ("ID", "SR-001"),
                    ("Text", "First"),
                    ("Parent", "UR-1, UR-2"),
                    ("line", "10"),
                ]),
                req(&[("ID", "SR-002"), ("Text", "Second"), ("line", "13")]),
            ]
        );
    }

    #[test]
    fn non_string_values_are_stringified() {
        let mut diagnostics = Diagnostics::new();
        let reqs = reqs_from_yaml_lines(
            &["ID: SR-1", "Text: t", "Priority: 2", "Safety: true", "Note:"],
            &doc(),
            1,
            &mut diagnostics,
        );
        let found = &reqs[0];
        assert_eq!(found.get("Priority"), Some("2"));
        assert_eq!(found.get("Safety"), Some("true"));
        assert_eq!(found.get("Note"), Some(""));
    }

    #[test]
    fn invalid_yaml_yields_nothing() {
        let mut diagnostics = Diagnostics::new();
        let reqs = reqs_from_yaml_lines(&["ID: [SR-1", "Text: x"], &doc(), 4, &mut diagnostics);
        assert!(reqs.is_empty());
        assert_eq!(diagnostics.iter().next().unwrap().line, Some(4));
    }

    #[test]
    fn empty_yaml_yields_nothing() {
        let mut diagnostics = Diagnostics::new();
        assert!(reqs_from_yaml_lines(&[], &doc(), 4, &mut diagnostics).is_empty());
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn invalid_requirement_is_dropped() {
        let mut diagnostics = Diagnostics::new();
        let reqs = reqs_from_yaml_lines(&["ID: SR-1"], &doc(), 4, &mut diagnostics);
        assert!(reqs.is_empty());
        assert_eq!(diagnostics.count(Category::Validation), 1);
    }

    #[test]
    fn id_split_over_two_lines() {
        assert_eq!(line_of("SR-001", &["Text: x", "ID: SR-", "001"], 5), 6);
    }
}
