use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use tracing::{info, instrument};

use crate::{
    domain::{Category, Diagnostics, Document, Project},
    report::{CrossLinker, ReportError, generate_document, generate_report},
};

fn read(path: &Path) -> Result<String, ReportError> {
    fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), ReportError> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_dir(path: &Path) -> Result<(), ReportError> {
    fs::create_dir_all(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// The file name a document is published under.
fn output_name(doc: &Document) -> &str {
    doc.path()
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_else(|| doc.name())
}

/// Publishes every document of the project into `output_dir`.
///
/// Documents are processed depth first, each written under its own file
/// name. Returns the paths written, in that order.
///
/// A document whose file name was already used by an earlier one is not
/// written; the clash is recorded in `diagnostics`.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if a document cannot be read back or an
/// output file cannot be written.
#[instrument(skip(project, diagnostics), fields(root = project.root().name()))]
pub fn process_document_tree(
    project: &Project,
    output_dir: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<PathBuf>, ReportError> {
    create_dir(output_dir)?;
    let linker = CrossLinker::new(project.root());
    let mut used = HashSet::new();
    let mut written = Vec::new();
    for (_, doc) in project.root().walk() {
        let name = output_name(doc);
        if !used.insert(name) {
            let mut clash = Diagnostics::new();
            clash.error(
                Category::Structure,
                None,
                format!("Not published: {name} is already written by another document"),
            );
            diagnostics.absorb(clash, &doc.path().display().to_string());
            continue;
        }
        let text = read(doc.path())?;
        let target = output_dir.join(name);
        write_lines(&target, &generate_document(doc, &text, &linker))?;
        info!(document = doc.name(), output = %target.display(), "processed");
        written.push(target);
    }
    Ok(written)
}

/// Expands the report template at `template` into `output_dir`, under the
/// template's file name. Returns the path written.
///
/// Defects in the template's table macros are recorded in `diagnostics`,
/// tagged with the template's file name.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the template cannot be read or the report
/// cannot be written.
#[instrument(skip(project, diagnostics), fields(root = project.root().name()))]
pub fn write_report(
    project: &Project,
    template: &Path,
    output_dir: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<PathBuf, ReportError> {
    let text = read(template)?;
    let name = template
        .file_name()
        .ok_or_else(|| ReportError::Io {
            path: template.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
        })?
        .to_owned();

    let linker = CrossLinker::new(project.root());
    let mut found = Diagnostics::new();
    let lines = generate_report(&text, project, &linker, &mut found);
    diagnostics.absorb(found, &name.to_string_lossy());

    create_dir(output_dir)?;
    let target = output_dir.join(name);
    write_lines(&target, &lines)?;
    info!(output = %target.display(), "report written");
    Ok(target)
}
