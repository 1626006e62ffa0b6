//! Requirements management for AsciiDoc documents
//!
//! Requirements are written inline in ordinary AsciiDoc, as table rows,
//! single-requirement tables, YAML listing blocks or definition-list terms.
//! A root document names its child documents, and the whole tree is loaded
//! into a [`Project`] that indexes every requirement by ID.
//!
//! From a project, [`report`] expands report templates and publishes
//! documents with anchors and cross-document links, selecting requirements
//! with [`filter`] expressions.

pub mod domain;
pub use domain::{
    Category, Config, Diagnostic, Diagnostics, Document, IdPattern, MergeDepth, Project,
    Requirement, Severity,
};

pub mod filter;
pub use filter::{Filter, FilterError};

pub mod parser;
pub use parser::{LoadError, read_and_parse_project};

pub mod report;
pub use report::ReportError;
