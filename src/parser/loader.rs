//! Reading documents and their children from disk.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};

use crate::{
    domain::{Config, Diagnostics, Document, IdPattern, Project},
    parser::parse_document,
};

/// Errors that stop a project from being loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A document could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The document that could not be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// A document lists itself among its own descendants.
    #[error("circular child document reference to {}", .0.display())]
    Cycle(PathBuf),
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Reads and parses a single document.
///
/// The document is named after its file name. Diagnostics are tagged with
/// that name.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read.
pub fn read_and_parse(
    path: &Path,
    inherited: Option<&IdPattern>,
    diagnostics: &mut Diagnostics,
) -> Result<Document, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = file_name(path);
    let mut found = Diagnostics::new();
    let mut doc = parse_document(&name, &text, inherited, &mut found);
    doc.set_path(path);
    diagnostics.absorb(found, &name);
    Ok(doc)
}

/// Loads `path` and, recursively, every child document it declares.
///
/// `ancestors` holds the canonical paths of the documents currently being
/// loaded, to catch a document that includes itself.
fn load_tree(
    path: &Path,
    inherited: Option<&IdPattern>,
    ancestors: &mut Vec<PathBuf>,
    diagnostics: &mut Diagnostics,
) -> Result<Document, LoadError> {
    let canonical = fs::canonicalize(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if ancestors.contains(&canonical) {
        return Err(LoadError::Cycle(path.to_path_buf()));
    }

    let mut doc = read_and_parse(path, inherited, diagnostics)?;
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let pattern = doc.id_pattern().cloned();

    ancestors.push(canonical);
    for child_file in doc.child_files().to_vec() {
        let child_path = dir.join(&child_file);
        debug!(parent = doc.name(), child = %child_path.display(), "loading child document");
        let child = load_tree(&child_path, pattern.as_ref(), ancestors, diagnostics)?;
        doc.add_child(child);
    }
    ancestors.pop();

    Ok(doc)
}

/// Loads the root document at `path`, its whole tree of child documents,
/// and builds the project-wide requirement index.
///
/// Child file names are resolved against the directory of the document that
/// declares them. Children start out with their parent's identifier pattern.
///
/// # Errors
///
/// Returns a [`LoadError`] if any document in the tree cannot be read, or if
/// a document is its own descendant.
#[instrument(skip(config, diagnostics))]
pub fn read_and_parse_project(
    path: &Path,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Result<Project, LoadError> {
    let root = load_tree(path, None, &mut Vec::new(), diagnostics)?;
    let project = Project::new(root, config.merge_depth(), diagnostics);
    debug!(requirements = project.len(), "loaded project");
    Ok(project)
}
