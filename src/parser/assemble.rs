//! Turning scanned cells into requirements, and the validation every
//! requirement has to pass before it is added to a document.

use crate::{
    domain::{Category, Diagnostics, Document, Requirement, fields},
    parser::{Row, Table},
};

/// Checks that a requirement may be added to `doc`.
///
/// Fails (recording why) if the document has no identifier pattern, if the
/// requirement has no ID or no text, or if the ID does not match the
/// document's pattern. Attributes other than ID and text are not looked at.
pub fn validate_requirement(
    req: &Requirement,
    doc: &Document,
    line_no: usize,
    diagnostics: &mut Diagnostics,
) -> bool {
    let Some(pattern) = doc.id_pattern() else {
        diagnostics.error(
            Category::Validation,
            Some(line_no),
            "Document has no req-id attribute",
        );
        return false;
    };
    let Some(id) = req.id().filter(|id| !id.is_empty()) else {
        diagnostics.error(
            Category::Validation,
            Some(line_no),
            format!("Missing {} attribute", fields::ID),
        );
        return false;
    };
    if req.text().is_none_or(str::is_empty) {
        diagnostics.error(
            Category::Validation,
            Some(line_no),
            format!("Missing {} attribute", fields::TEXT),
        );
        return false;
    }
    if !pattern.is_match(id) {
        diagnostics.error(
            Category::Validation,
            Some(line_no),
            format!("Wrong ID format: '{id}' does not match {pattern}"),
        );
        return false;
    }
    true
}

/// The text of each heading cell.
#[must_use]
pub fn heading_names(heading: &Row) -> Vec<&str> {
    heading.iter().map(|cell| cell.data.as_str()).collect()
}

/// Checks that a requirement table heading has columns for ID and text.
pub fn heading_has_required_fields(
    heading: &Row,
    line_no: usize,
    diagnostics: &mut Diagnostics,
) -> bool {
    let names = heading_names(heading);
    for required in [fields::ID, fields::TEXT] {
        if !names.contains(&required) {
            diagnostics.error(
                Category::Structure,
                Some(line_no),
                format!("Table must contain a column named '{required}'"),
            );
            return false;
        }
    }
    true
}

/// Builds one requirement per table row, naming attributes by the heading.
///
/// Empty cells leave the attribute undefined. Rows that fail validation, or
/// whose heading repeats a name, are reported and skipped.
pub fn reqs_from_req_table(
    heading: &Row,
    rows: &Table,
    doc: &Document,
    diagnostics: &mut Diagnostics,
) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    for row in rows {
        let Some(line_no) = row.first().map(|cell| cell.location.line) else {
            continue;
        };
        let mut req = Requirement::new();
        let mut duplicate = None;
        for (name, cell) in heading.iter().zip(row).filter(|(_, cell)| !cell.is_empty()) {
            if let Err(error) = req.insert(name.data.as_str(), cell.data.as_str()) {
                duplicate = Some(error);
                break;
            }
        }
        if let Some(error) = duplicate {
            diagnostics.error(Category::Structure, Some(line_no), error.to_string());
            continue;
        }
        req.set(fields::LINE, line_no.to_string());
        if validate_requirement(&req, doc, line_no, diagnostics) {
            requirements.push(req);
        }
    }
    requirements
}

/// Builds the requirement held by a single-requirement table.
///
/// The first cell is the ID. Each later non-empty cell is either a
/// `name: value` attribute or, at most once, the requirement text.
pub fn req_from_single_req_table(
    rows: &Table,
    doc: &Document,
    diagnostics: &mut Diagnostics,
) -> Option<Requirement> {
    let mut cells = rows.iter().flatten();
    let first = cells.next()?;
    let line_no = first.location.line;

    let mut req = Requirement::new();
    req.set(fields::ID, first.data.as_str());
    req.set(fields::LINE, line_no.to_string());

    for cell in cells.filter(|cell| !cell.is_empty()) {
        let at = Some(cell.location.line);
        match cell.data.split_once(':') {
            None if req.contains(fields::TEXT) => {
                diagnostics.error(
                    Category::Structure,
                    at,
                    format!(
                        "Error in single req. table: second text cell found (only one allowed): {}",
                        cell.data
                    ),
                );
                return None;
            }
            None => req.set(fields::TEXT, cell.data.as_str()),
            Some((name, _)) if name.trim().is_empty() => {
                diagnostics.error(
                    Category::Structure,
                    at,
                    format!("Error in single req. table: property name not found: {}", cell.data),
                );
                return None;
            }
            Some((name, value)) => {
                if let Err(error) = req.insert(name.trim(), value.trim()) {
                    diagnostics.error(Category::Structure, at, error.to_string());
                    return None;
                }
            }
        }
    }

    validate_requirement(&req, doc, line_no, diagnostics).then_some(req)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{domain::IdPattern, parser::Cell};

    fn row(cells: &[(&str, usize)]) -> Row {
        cells.iter().map(|&(data, line)| Cell::new(data, line)).collect()
    }

    fn doc() -> Document {
        let mut doc = Document::new("sw.adoc");
        doc.set_id_pattern(IdPattern::new(r"SR-\d+").unwrap());
        doc
    }

    fn req(pairs: &[(&str, &str)]) -> Requirement {
        Requirement::try_from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test_case(&[("ID", "SR-1"), ("Text", "t")], true; "valid")]
    #[test_case(&[("ID", "SR-1"), ("Text", "t"), ("Tags", "x")], true; "extra attributes")]
    #[test_case(&[("Text", "t")], false; "missing id")]
    #[test_case(&[("ID", "SR-1")], false; "missing text")]
    #[test_case(&[("ID", "SR-1"), ("Text", "")], false; "empty text")]
    #[test_case(&[("ID", "UR-1"), ("Text", "t")], false; "id does not match")]
    fn validation(pairs: &[(&str, &str)], expected: bool) {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(validate_requirement(&req(pairs), &doc(), 1, &mut diagnostics), expected);
        assert_eq!(diagnostics.is_empty(), expected);
    }

    #[test]
    fn validation_needs_a_pattern() {
        let mut diagnostics = Diagnostics::new();
        let valid = req(&[("ID", "SR-1"), ("Text", "t")]);
        assert!(!validate_requirement(&valid, &Document::new("d"), 3, &mut diagnostics));
        assert_eq!(diagnostics.iter().next().unwrap().line, Some(3));
    }

    #[test]
    fn reqs_from_table_rows() {
        let heading = row(&[("ID", 2), ("Text", 2), ("Tags", 2)]);
        let rows = vec![
            row(&[("SR-1", 3), ("B", 3), ("C", 3)]),
            row(&[("SR-2", 4), ("E", 4), ("", 4)]),
        ];
        let mut diagnostics = Diagnostics::new();
        let reqs = reqs_from_req_table(&heading, &rows, &doc(), &mut diagnostics);
        assert_eq!(
            reqs,
            vec![
                req(&[("ID", "SR-1"), ("Text", "B"), ("Tags", "C"), ("line", "3")]),
                req(&[("ID", "SR-2"), ("Text", "E"), ("line", "4")]),
            ]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn invalid_rows_are_skipped() {
        let heading = row(&[("ID", 2), ("Text", 2)]);
        let rows = vec![
            row(&[("XX-1", 3), ("B", 3)]),
            row(&[("SR-2", 4), ("E", 4)]),
        ];
        let mut diagnostics = Diagnostics::new();
        let reqs = reqs_from_req_table(&heading, &rows, &doc(), &mut diagnostics);
        assert_eq!(reqs.len(), 1);
        assert_eq!(diagnostics.count(Category::Validation), 1);
    }

    #[test]
    fn heading_requires_id_and_text() {
        let mut diagnostics = Diagnostics::new();
        assert!(heading_has_required_fields(&row(&[("ID", 1), ("Text", 1)]), 1, &mut diagnostics));
        assert!(!heading_has_required_fields(&row(&[("ID", 1), ("Body", 1)]), 1, &mut diagnostics));
        assert_eq!(diagnostics.count(Category::Structure), 1);
    }

    #[test]
    fn single_req_table() {
        let rows = vec![
            row(&[("SR-1", 5), ("The text", 5)]),
            row(&[("Parent: UR-1", 6), ("Tags: a, b", 6)]),
        ];
        let mut diagnostics = Diagnostics::new();
        let found = req_from_single_req_table(&rows, &doc(), &mut diagnostics).unwrap();
        assert_eq!(
            found,
            req(&[
                ("ID", "SR-1"),
                ("Text", "The text"),
                ("Parent", "UR-1"),
                ("Tags", "a, b"),
                ("line", "5"),
            ])
        );
    }

    #[test]
    fn single_req_table_second_text_is_an_error() {
        let rows = vec![row(&[("SR-1", 5), ("One", 5), ("Two", 5)])];
        let mut diagnostics = Diagnostics::new();
        assert!(req_from_single_req_table(&rows, &doc(), &mut diagnostics).is_none());
        assert_eq!(diagnostics.count(Category::Structure), 1);
    }

    #[test]
    fn single_req_table_empty_cells_are_skipped() {
        let rows = vec![row(&[("SR-1", 5), ("One", 5), ("", 5)])];
        let mut diagnostics = Diagnostics::new();
        assert!(req_from_single_req_table(&rows, &doc(), &mut diagnostics).is_some());
        assert!(diagnostics.is_empty());
    }

    #[test_case(": value"; "empty name")]
    #[test_case("Tags: a"; "duplicate name")]
    fn single_req_table_bad_attribute(cell: &str) {
        let rows = vec![row(&[("SR-1", 5), ("Text", 5), ("Tags: x", 5), (cell, 6)])];
        let mut diagnostics = Diagnostics::new();
        assert!(req_from_single_req_table(&rows, &doc(), &mut diagnostics).is_none());
        assert_eq!(diagnostics.iter().next().unwrap().line, Some(6));
    }
}
