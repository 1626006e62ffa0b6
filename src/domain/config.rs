use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::MergeDepth;

/// Configuration for parsing and reporting on a requirements project.
///
/// Stored as TOML, usually in `asciireqs.toml` beside the root document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// How far down the document tree requirements are merged into the
    /// project-wide index.
    ///
    /// Documents are always loaded recursively. This only controls which of
    /// them contribute to the index used by filters and cross-checks.
    merge_depth: MergeDepth,

    /// Whether any error diagnostic should make a check fail.
    pub strict: bool,
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Returns the merge depth for the project-wide index.
    #[must_use]
    pub const fn merge_depth(&self) -> MergeDepth {
        self.merge_depth
    }

    /// Sets the merge depth for the project-wide index.
    pub const fn set_merge_depth(&mut self, depth: MergeDepth) {
        self.merge_depth = depth;
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        merge_depth: MergeDepth,

        #[serde(default)]
        strict: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                merge_depth,
                strict,
            } => Self {
                merge_depth,
                strict,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            merge_depth: config.merge_depth,
            strict: config.strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmerge_depth = \"recursive\"\nstrict = true\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.merge_depth(), MergeDepth::Recursive);
        assert!(config.strict);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmerge_depth = \"sideways\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }
}
