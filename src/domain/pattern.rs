use std::fmt;

use regex::Regex;

/// The regular expression a document's requirement identifiers must match.
///
/// Three compiled forms are kept: one anchored at both ends for validation,
/// one matching a definition-list label (`<id>::`), and an unanchored one used
/// to find identifiers in running text.
#[derive(Debug, Clone)]
pub struct IdPattern {
    source: String,
    exact: Regex,
    term: Regex,
    search: Regex,
}

/// Returned when an identifier pattern is not a valid regular expression.
#[derive(Debug, thiserror::Error)]
#[error("invalid requirement identifier pattern '{pattern}'")]
pub struct InvalidPattern {
    pattern: String,
    #[source]
    source: regex::Error,
}

impl IdPattern {
    /// Compiles an identifier pattern.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPattern`] if `pattern` is not a valid regular
    /// expression.
    pub fn new(pattern: &str) -> Result<Self, InvalidPattern> {
        let compile = |regex: String| {
            Regex::new(&regex).map_err(|source| InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        };
        Ok(Self {
            source: pattern.to_string(),
            exact: compile(format!("^(?:{pattern})$"))?,
            term: compile(format!("^((?:{pattern}))::$"))?,
            search: compile(pattern.to_string())?,
        })
    }

    /// A pattern matching `prefix` followed by one or more digits.
    ///
    /// # Errors
    ///
    /// Never fails in practice, as the prefix is escaped.
    pub fn from_prefix(prefix: &str) -> Result<Self, InvalidPattern> {
        Self::new(&format!(r"{}\d+", regex::escape(prefix)))
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the whole of `id` matches.
    #[must_use]
    pub fn is_match(&self, id: &str) -> bool {
        self.exact.is_match(id)
    }

    /// If `line` is a definition-list label for a requirement, returns the
    /// identifier.
    #[must_use]
    pub fn term_label<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.term
            .captures(line.trim())
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str())
    }

    /// The unanchored form, for finding identifiers in text.
    #[must_use]
    pub const fn searcher(&self) -> &Regex {
        &self.search
    }
}

impl PartialEq for IdPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for IdPattern {}

impl fmt::Display for IdPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
