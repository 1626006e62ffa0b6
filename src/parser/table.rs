//! Cell and table scanning.
//!
//! Tables look like this:
//!
//! ```text
//! [cols="1,1,1"]
//! |===
//! | ID | Text | Tags
//!
//! | SR-001 | The first requirement | Rel-1
//! | SR-002
//! | The second requirement
//! | Rel-2
//! 3+| A merged row
//! |===
//! ```
//!
//! Cells are folded into rows of the table's column count, regardless of how
//! they are spread over lines.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    domain::{Category, Diagnostics},
    parser::{CELL_DELIMITER, COLS_DIRECTIVE, Line, LineStream, TABLE_DELIMITER},
};

static ATTRIBUTE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\w+=.+\]").expect("static regex is valid"));

static COLUMN_MERGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\+$").expect("static regex is valid"));

/// The widest merge accepted before the table's column count is known.
const MAX_MERGE_SPAN: usize = 256;

/// Where a fragment of text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
}

/// The trimmed content of one table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// The cell text.
    pub data: String,
    /// Where the cell started.
    pub location: Location,
}

impl Cell {
    /// Creates a cell.
    #[must_use]
    pub fn new(data: impl Into<String>, line: usize) -> Self {
        Self {
            data: data.into(),
            location: Location { line },
        }
    }

    /// Returns `true` if the cell has no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One row of cells.
pub type Row = Vec<Cell>;

/// Rows of cells, all of the same width.
pub type Table = Vec<Row>;

/// The result of scanning a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScannedTable {
    /// The first row, if it was separated from the rest by a blank line.
    pub heading: Option<Row>,
    /// The remaining rows.
    pub rows: Table,
}

/// Interprets an AsciiDoc `cols` attribute to get the number of table columns.
///
/// Accepts a width list (`[cols="1,2,1"]`) or a plain count (`[cols=3]`).
pub fn columns_from_attribute(
    line: &str,
    line_no: usize,
    diagnostics: &mut Diagnostics,
) -> Option<usize> {
    let widths = line.split(',').count();
    if widths >= 2 {
        return Some(widths);
    }
    if let (Some(eq), Some(bracket)) = (line.find('='), line.rfind(']')) {
        if eq < bracket {
            if let Ok(count) = line[eq + 1..bracket].trim().trim_matches('"').parse() {
                return Some(count);
            }
        }
    }
    diagnostics.error(
        Category::Structure,
        Some(line_no),
        format!("Failed to parse number of columns: {line}"),
    );
    None
}

/// What a line inside a table contributes.
#[derive(Debug, Default, PartialEq, Eq)]
struct Fragment {
    /// Text before the first delimiter, continuing the last open cell.
    continuation: Option<String>,
    /// Cells opened on this line.
    cells: Vec<Cell>,
    /// How many columns the first cell spans, from an `<n>+` marker.
    merge: Option<usize>,
}

fn scan_line(line: Line<'_>) -> Fragment {
    let mut parts = line.text.split(CELL_DELIMITER);
    let before = parts.next().unwrap_or_default().trim();
    let cells: Vec<Cell> = parts.map(|part| Cell::new(part.trim(), line.number)).collect();

    if let Some(merge) = COLUMN_MERGE.captures(before).filter(|_| !cells.is_empty()) {
        return Fragment {
            continuation: None,
            cells,
            merge: Some(merge[1].parse().unwrap_or(usize::MAX)),
        };
    }
    Fragment {
        continuation: (!before.is_empty()).then(|| before.to_string()),
        cells,
        merge: None,
    }
}

fn append_cells(rows: &mut Table, columns: usize, cells: Vec<Cell>) {
    for cell in cells {
        match rows.last_mut() {
            Some(row) if row.len() < columns => row.push(cell),
            _ => rows.push(vec![cell]),
        }
    }
}

/// Consumes a table from `lines`, starting just after a block-type marker.
///
/// Attribute lines (including a `cols` directive) may precede the opening
/// `|===`. Returns `None` after recording a diagnostic if the table is
/// malformed; nothing from a malformed table is returned.
pub fn read_table(
    lines: &mut LineStream<'_>,
    diagnostics: &mut Diagnostics,
) -> Option<ScannedTable> {
    let mut columns: Option<usize> = None;

    loop {
        let Some(line) = lines.next() else {
            diagnostics.error(
                Category::Structure,
                None,
                "Expected table start, but reached end of document",
            );
            return None;
        };
        let text = line.text.trim_end();
        if text == TABLE_DELIMITER {
            break;
        }
        if text.starts_with(COLS_DIRECTIVE) {
            columns = columns_from_attribute(text, line.number, diagnostics);
        } else if !ATTRIBUTE_LINE.is_match(text) {
            diagnostics.error(
                Category::Structure,
                Some(line.number),
                format!("Expected attributes or table start, but was: {text}"),
            );
            return None;
        }
    }

    read_table_body(lines, columns, diagnostics)
}

fn read_table_body(
    lines: &mut LineStream<'_>,
    mut columns: Option<usize>,
    diagnostics: &mut Diagnostics,
) -> Option<ScannedTable> {
    let mut heading: Option<Row> = None;
    let mut rows: Table = Vec::new();

    for line in lines.by_ref() {
        let text = line.text.trim_end();
        if text == TABLE_DELIMITER {
            if let Some(width) = heading.as_ref().or_else(|| rows.first()).map(Vec::len) {
                if let Some(short) = rows.iter().find(|row| row.len() != width) {
                    let at = short.last().map_or(line.number, |cell| cell.location.line);
                    diagnostics.error(
                        Category::Structure,
                        Some(at),
                        "Table missing cell(s) on last row",
                    );
                    return None;
                }
            }
            return Some(ScannedTable { heading, rows });
        }
        if text.trim().is_empty() {
            if rows.len() == 1 && heading.is_none() {
                heading = rows.pop();
            }
            continue;
        }
        let fragment = scan_line(line);
        if let Some(more) = fragment.continuation {
            let Some(cell) = rows.last_mut().and_then(|row| row.last_mut()) else {
                diagnostics.error(
                    Category::Structure,
                    Some(line.number),
                    format!("Text outside of a table cell: {text}"),
                );
                return None;
            };
            cell.data.push('\n');
            cell.data.push_str(&more);
        }
        let mut cells = fragment.cells;
        if let Some(span) = fragment.merge {
            let limit = columns.unwrap_or(MAX_MERGE_SPAN);
            if span > limit {
                diagnostics.error(
                    Category::Structure,
                    Some(line.number),
                    format!("Cell merge of {span} columns exceeds the table width of {limit}"),
                );
                return None;
            }
            cells.splice(1..1, (1..span).map(|_| Cell::new("", line.number)));
        }
        if !cells.is_empty() {
            let columns = *columns.get_or_insert(cells.len());
            append_cells(&mut rows, columns, cells);
        }
    }

    diagnostics.error(Category::Structure, None, "Table not terminated before end of document");
    None
}
