//! Scanning AsciiDoc documents for requirements.
//!
//! A document is read top to bottom in a single pass over a [`LineStream`].
//! Each line is either a definition-list requirement label, a block-type
//! marker that hands the stream to a table or fenced-block reader, a document
//! attribute directive, or ordinary text that is ignored.

mod assemble;
mod block;
mod document;
mod lines;
mod loader;
mod table;
mod term;

pub use assemble::{
    heading_has_required_fields, heading_names, req_from_single_req_table, reqs_from_req_table,
    validate_requirement,
};
pub use block::{SourceBlock, decode_yaml_lines, read_source_block, reqs_from_yaml_lines};
pub use document::{get_attribute, parse_document};
pub use lines::{Line, LineStream};
pub use loader::{LoadError, read_and_parse, read_and_parse_project};
pub use table::{Cell, Location, Row, ScannedTable, Table, columns_from_attribute, read_table};
pub use term::{parse_term_attributes, req_from_term};

/// Marks a table of requirements, one per row.
pub const REQ_TABLE_MARKER: &str = "[.reqs]";
/// Marks a table holding a single requirement as key/value cells.
pub const SINGLE_REQ_TABLE_MARKER: &str = "[.req]";
/// Marks a YAML listing block of one or more requirements.
pub const YAML_BLOCK_MARKER: &str = "[.reqy]";

/// Opens and closes a table.
pub const TABLE_DELIMITER: &str = "|===";
/// Separates table cells.
pub const CELL_DELIMITER: char = '|';
/// Starts a column-count attribute line.
pub const COLS_DIRECTIVE: &str = "[cols";
/// Opens and closes a listing block.
pub const BLOCK_DELIMITER: &str = "----";
/// Ends the body of a term requirement; attributes follow.
pub const CONTINUATION: &str = "+";

/// Document attribute holding the identifier pattern.
pub const ID_PATTERN_ATTRIBUTE: &str = "req-id";
/// Document attribute holding a literal identifier prefix (older documents).
pub const ID_PREFIX_ATTRIBUTE: &str = "req-prefix";
/// Document attribute listing child document files.
pub const CHILDREN_ATTRIBUTE: &str = "req-children";
