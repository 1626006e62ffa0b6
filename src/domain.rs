//! Domain models for requirements documents.
//!
//! This module contains the core domain types: requirements, documents and
//! their identifier patterns, the project-wide index, configuration and the
//! diagnostics sink.

/// Requirement records and reserved attribute names.
pub mod requirement;
pub use requirement::{DuplicateAttribute, Requirement, fields, split_links};

mod config;
pub use config::Config;

mod diagnostics;
pub use diagnostics::{Category, Diagnostic, Diagnostics, Severity};

mod document;
pub use document::Document;

mod pattern;
pub use pattern::{IdPattern, InvalidPattern};

mod project;
pub use project::{MergeDepth, Project};
