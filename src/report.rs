//! Publishing a requirements project as cross-linked AsciiDoc.
//!
//! Two kinds of output are produced:
//!
//! - **Reports** expand macros in a template. `` `asciireq-hierarchy` ``
//!   lists the documents of the project and
//!   `` `asciireq-table:<columns>;<filter>` `` tabulates the requirements a
//!   [filter](crate::filter) selects.
//! - **Processed documents** are the project's own documents with an anchor
//!   at every requirement definition and YAML requirement blocks rendered as
//!   definition-list terms.
//!
//! In both, requirement identifiers in ordinary text become links to the
//! document that defines them.
//!
//! Requirement attributes can also be exported as CSV with [`write_csv`].

use std::{io, path::PathBuf};

mod export;
mod generate;
mod hierarchy;
mod links;
mod table;
mod term;
mod tree;

pub use export::{ExportScope, export_table, write_csv};
pub use generate::{HIERARCHY_MACRO, generate_document, generate_report};
pub use hierarchy::document_hierarchy;
pub use links::{CrossLinker, insert_anchor};
pub use table::{TABLE_MACRO_PREFIX, TableMacro, requirement_table};
pub use term::render_term;
pub use tree::{process_document_tree, write_report};

/// Errors that stop a report from being written.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A template or document could not be read, or an output could not be
    /// written.
    #[error("failed to access {}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}
