use tracing::{debug, instrument};

use crate::{
    domain::{Category, Diagnostics, Document, IdPattern, fields},
    parser::{
        CHILDREN_ATTRIBUTE, ID_PATTERN_ATTRIBUTE, ID_PREFIX_ATTRIBUTE, LineStream,
        REQ_TABLE_MARKER, Row, SINGLE_REQ_TABLE_MARKER, ScannedTable, YAML_BLOCK_MARKER,
        heading_has_required_fields, heading_names, read_source_block, read_table,
        req_from_single_req_table, req_from_term, reqs_from_req_table, reqs_from_yaml_lines,
    },
};

/// The value of the document attribute `:<name>:` if `line` defines it.
#[must_use]
pub fn get_attribute<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.strip_prefix(':')?
        .strip_prefix(name)?
        .strip_prefix(':')
        .map(str::trim)
}

/// Parses the text of one document.
///
/// `inherited` is the identifier pattern of the parent document, used until
/// the document sets its own. Every defect found is recorded in
/// `diagnostics`; the offending construct is left out of the returned
/// document and scanning carries on.
#[instrument(skip(text, inherited, diagnostics))]
pub fn parse_document(
    name: &str,
    text: &str,
    inherited: Option<&IdPattern>,
    diagnostics: &mut Diagnostics,
) -> Document {
    let mut doc = Document::new(name);
    if let Some(pattern) = inherited {
        doc.set_id_pattern(pattern.clone());
    }

    let mut lines = LineStream::new(text);
    while let Some(line) = lines.next() {
        let text = line.text.trim_end();

        if let Some(id) = doc.id_pattern().and_then(|pattern| pattern.term_label(text)) {
            if let Some(req) = req_from_term(id, line, &mut lines, &doc, diagnostics) {
                doc.add_requirement(req, diagnostics);
            }
            continue;
        }

        match text.trim() {
            REQ_TABLE_MARKER => {
                if let Some(table) = read_table(&mut lines, diagnostics) {
                    add_table_requirements(&mut doc, table, line.number, diagnostics);
                }
            }
            SINGLE_REQ_TABLE_MARKER => {
                if let Some(ScannedTable { heading, mut rows }) =
                    read_table(&mut lines, diagnostics)
                {
                    if let Some(heading) = heading {
                        rows.insert(0, heading);
                    }
                    if let Some(req) = req_from_single_req_table(&rows, &doc, diagnostics) {
                        doc.add_requirement(req, diagnostics);
                    }
                }
            }
            YAML_BLOCK_MARKER => {
                if let Some(block) = read_source_block(&mut lines, diagnostics) {
                    let reqs =
                        reqs_from_yaml_lines(&block.lines, &doc, block.first_line, diagnostics);
                    doc.add_requirements(reqs, diagnostics);
                }
            }
            _ => apply_directive(&mut doc, text, line.number, diagnostics),
        }
    }

    debug!(
        requirements = doc.requirements().count(),
        children = doc.child_files().len(),
        "parsed document"
    );
    doc
}

fn add_table_requirements(
    doc: &mut Document,
    table: ScannedTable,
    marker_line: usize,
    diagnostics: &mut Diagnostics,
) {
    let ScannedTable { heading, mut rows } = table;
    let heading: Row = match heading {
        Some(heading) => heading,
        None if rows.first().is_some_and(names_required_fields) => rows.remove(0),
        None if rows.is_empty() => return,
        None => rows.first().cloned().unwrap_or_default(),
    };
    if !heading_has_required_fields(&heading, marker_line, diagnostics) {
        return;
    }
    let reqs = reqs_from_req_table(&heading, &rows, doc, diagnostics);
    doc.add_attribute_names(heading_names(&heading));
    doc.add_requirements(reqs, diagnostics);
}

fn names_required_fields(row: &Row) -> bool {
    let names = heading_names(row);
    names.contains(&fields::ID) && names.contains(&fields::TEXT)
}

fn apply_directive(doc: &mut Document, line: &str, line_no: usize, diagnostics: &mut Diagnostics) {
    if let Some(files) = get_attribute(line, CHILDREN_ATTRIBUTE) {
        let mut children: Vec<String> = Vec::new();
        for file in files.split(',').map(str::trim).filter(|file| !file.is_empty()) {
            if children.iter().any(|seen| seen == file) {
                diagnostics.warning(
                    Category::Structure,
                    Some(line_no),
                    format!("Child document {file} is listed more than once"),
                );
            } else {
                children.push(file.to_string());
            }
        }
        doc.set_child_files(children);
    } else if let Some(pattern) = get_attribute(line, ID_PATTERN_ATTRIBUTE) {
        match IdPattern::new(pattern) {
            Ok(pattern) => doc.set_id_pattern(pattern),
            Err(error) => diagnostics.error(Category::Structure, Some(line_no), error.to_string()),
        }
    } else if let Some(prefix) = get_attribute(line, ID_PREFIX_ATTRIBUTE) {
        match IdPattern::from_prefix(prefix) {
            Ok(pattern) => doc.set_id_pattern(pattern),
            Err(error) => diagnostics.error(Category::Structure, Some(line_no), error.to_string()),
        }
    }
}
