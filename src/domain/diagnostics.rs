//! Collected parse and evaluation diagnostics.
//!
//! Nothing in the core prints. Every parse entry point takes a
//! [`Diagnostics`] sink and records what went wrong, with the line it went
//! wrong on, and carries on with the next construct.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Something suspicious that did not cause data to be dropped.
    Warning,
    /// A construct was rejected and left out of the model.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// What kind of defect a diagnostic describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Malformed tables, blocks, attribute lines and directives.
    Structure,
    /// Requirements missing an ID or text, or with a badly formed ID.
    Validation,
    /// Duplicate requirement identifiers.
    Identity,
    /// Filter expressions that could not be compiled or evaluated.
    Expression,
}

/// A single recorded defect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The document the defect was found in, if known.
    pub source: Option<String>,
    /// The 1-based line the defect was found on, if known.
    pub line: Option<usize>,
    /// How serious the defect is.
    pub severity: Severity,
    /// Which part of the taxonomy the defect belongs to.
    pub category: Category,
    /// Human readable description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        match (&self.source, self.line) {
            (Some(source), Some(line)) => write!(f, " [{source}:{line}]")?,
            (Some(source), None) => write!(f, " [{source}]")?,
            (None, Some(line)) => write!(f, " [line {line}]")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// An ordered collection of [`Diagnostic`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records an error.
    pub fn error(&mut self, category: Category, line: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Error, category, line, message.into());
    }

    /// Records a warning.
    pub fn warning(
        &mut self,
        category: Category,
        line: Option<usize>,
        message: impl Into<String>,
    ) {
        self.push(Severity::Warning, category, line, message.into());
    }

    fn push(
        &mut self,
        severity: Severity,
        category: Category,
        line: Option<usize>,
        message: String,
    ) {
        tracing::debug!(?severity, ?category, line, "{message}");
        self.entries.push(Diagnostic {
            source: None,
            line,
            severity,
            category,
            message,
        });
    }

    /// Moves every entry of `other` into this sink, stamping entries that have
    /// no source yet with `source`.
    pub fn absorb(&mut self, other: Self, source: &str) {
        self.entries
            .extend(other.entries.into_iter().map(|mut diagnostic| {
                diagnostic.source.get_or_insert_with(|| source.to_string());
                diagnostic
            }));
    }

    /// Iterates over the recorded entries in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// The number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of entries with [`Severity::Error`].
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Returns `true` if any error has been recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// The number of entries in the given category.
    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        self.entries
            .iter()
            .filter(|d| d.category == category)
            .count()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
