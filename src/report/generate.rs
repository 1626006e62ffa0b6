use std::collections::HashMap;

use serde_yaml::{Mapping, Value};

use crate::{
    domain::{Category, Diagnostics, Document, Project, Requirement, fields},
    parser::{BLOCK_DELIMITER, Line, LineStream, YAML_BLOCK_MARKER, decode_yaml_lines},
    report::{
        CrossLinker, TableMacro, document_hierarchy, insert_anchor, render_term, requirement_table,
    },
};

/// The hierarchy macro, alone on its line.
pub const HIERARCHY_MACRO: &str = "`asciireq-hierarchy`";

/// Expands the macros in a report template.
///
/// The hierarchy macro becomes a bullet list of the project's documents, a
/// table macro becomes a table of the requirements passing its filter, and
/// requirement identifiers on every other line are cross-linked.
pub fn generate_report(
    template: &str,
    project: &Project,
    linker: &CrossLinker,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    let mut out = Vec::new();
    for line in LineStream::new(template) {
        let trimmed = line.text.trim();
        if trimmed == HIERARCHY_MACRO {
            out.extend(document_hierarchy(project.root()));
            continue;
        }
        match TableMacro::parse(trimmed) {
            Some(Ok(table)) => out.extend(requirement_table(
                project,
                &table,
                linker,
                line.number,
                diagnostics,
            )),
            Some(Err(message)) => {
                diagnostics.error(Category::Expression, Some(line.number), message);
            }
            None => out.push(linker.link(line.text)),
        }
    }
    out
}

/// Rewrites one document of the project for publishing.
///
/// Lines that define a requirement get an anchor for it, and identifiers
/// everywhere else are cross-linked. In a YAML requirement block, each
/// requirement that was accepted when the document was parsed is rendered as
/// a term and the others stay YAML. A block with no accepted requirement is
/// copied through unchanged.
pub fn generate_document(doc: &Document, text: &str, linker: &CrossLinker) -> Vec<String> {
    let definitions: HashMap<usize, &str> = doc
        .requirements()
        .filter_map(|req| Some((req.line()?, req.id()?)))
        .collect();

    let mut out = Vec::new();
    let mut lines = LineStream::new(text);
    while let Some(line) = lines.next() {
        if line.text.trim() == YAML_BLOCK_MARKER {
            let block = FencedBlock::take(&mut lines);
            match yaml_block_as_terms(&block, doc, linker) {
                Some(terms) => out.extend(terms),
                None => {
                    out.push(line.text.to_string());
                    out.extend(block.taken.iter().map(|line| line.text.to_string()));
                }
            }
            continue;
        }
        match definitions.get(&line.number) {
            Some(id) => out.push(insert_anchor(line.text, id, linker)),
            None => out.push(linker.link(line.text)),
        }
    }
    out
}

/// The lines taken off the stream after a YAML block marker.
#[derive(Debug, Default)]
struct FencedBlock<'a> {
    /// Every line consumed, blank lines and fences included.
    taken: Vec<Line<'a>>,
    /// Index of the opening fence in `taken`.
    opening: Option<usize>,
    closed: bool,
}

impl<'a> FencedBlock<'a> {
    /// Consumes blank lines and a `----` fenced block. A line that does not
    /// open a block is left in the stream.
    fn take(lines: &mut LineStream<'a>) -> Self {
        let mut block = Self::default();
        while let Some(line) = lines.next() {
            if block.opening.is_none() {
                match line.text.trim() {
                    "" => {}
                    BLOCK_DELIMITER => block.opening = Some(block.taken.len()),
                    _ => {
                        lines.push_back(line);
                        break;
                    }
                }
                block.taken.push(line);
                continue;
            }
            block.taken.push(line);
            if line.text.trim_end() == BLOCK_DELIMITER {
                block.closed = true;
                break;
            }
        }
        block
    }

    /// The lines between the fences, with the number of the first one.
    fn content(&self) -> Option<(Vec<&'a str>, usize)> {
        let opening = self.opening.filter(|_| self.closed)?;
        let inner = &self.taken[opening + 1..self.taken.len() - 1];
        let first_line = self.taken[opening].number + 1;
        Some((inner.iter().map(|line| line.text.trim_end()).collect(), first_line))
    }
}

/// Renders a YAML block's requirements: terms for those accepted into `doc`
/// at this position, a YAML block each for the rest. `None` if nothing in
/// the block was accepted.
fn yaml_block_as_terms(
    block: &FencedBlock<'_>,
    doc: &Document,
    linker: &CrossLinker,
) -> Option<Vec<String>> {
    let (content, first_line) = block.content()?;
    // Problems with the block were reported when the document was parsed.
    let decoded = decode_yaml_lines(&content, doc, first_line, &mut Diagnostics::new());
    let registered: Vec<_> = decoded.iter().map(|req| registered_as(req, doc)).collect();
    if registered.iter().all(Option::is_none) {
        return None;
    }

    let mut out = Vec::new();
    for (req, registered) in decoded.iter().zip(registered) {
        if !out.is_empty() {
            out.push(String::new());
        }
        match registered {
            Some(registered) => out.extend(render_term(registered, linker)),
            None => out.extend(yaml_block(req)),
        }
    }
    Some(out)
}

/// The requirement `doc` holds for this definition, if it was accepted.
fn registered_as<'d>(req: &Requirement, doc: &'d Document) -> Option<&'d Requirement> {
    doc.requirement(req.id()?)
        .filter(|registered| registered.line() == req.line())
}

fn yaml_block(req: &Requirement) -> Vec<String> {
    let mapping: Mapping = req
        .iter()
        .filter(|(name, _)| *name != fields::LINE)
        .map(|(name, value)| (Value::String(name.to_string()), Value::String(value.to_string())))
        .collect();
    let yaml = serde_yaml::to_string(&mapping).unwrap_or_default();

    [YAML_BLOCK_MARKER, BLOCK_DELIMITER]
        .into_iter()
        .chain(yaml.lines())
        .chain([BLOCK_DELIMITER])
        .map(str::to_string)
        .collect()
}
