use std::io;

use crate::domain::{Project, Requirement};

/// Which requirements an export covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportScope {
    /// The root document's requirements, with the root's attribute names as
    /// columns.
    #[default]
    Root,
    /// Every requirement in the project index, with the attribute names of
    /// every document as columns.
    Project,
}

/// The column names and requirements covered by an export.
#[must_use]
pub fn export_table(project: &Project, scope: ExportScope) -> (Vec<String>, Vec<&Requirement>) {
    match scope {
        ExportScope::Root => (
            project.root().attribute_names().to_vec(),
            project.root().requirements().collect(),
        ),
        ExportScope::Project => (project.attribute_names(), project.requirements().collect()),
    }
}

/// Writes requirements as CSV: a header row of attribute names, then one row
/// per requirement with blanks for attributes it does not have.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_csv<W: io::Write>(
    project: &Project,
    scope: ExportScope,
    writer: W,
) -> Result<(), csv::Error> {
    let (columns, requirements) = export_table(project, scope);
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&columns)?;
    for req in requirements {
        writer.write_record(columns.iter().map(|name| req.get(name).unwrap_or_default()))?;
    }
    writer.flush()?;
    Ok(())
}
