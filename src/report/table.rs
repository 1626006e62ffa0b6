use tracing::warn;

use crate::{
    domain::{Category, Diagnostics, Project},
    filter::{Filter, FilterError},
    report::CrossLinker,
};

/// The opening of a table macro, up to the column list.
pub const TABLE_MACRO_PREFIX: &str = "`asciireq-table:";

/// The parameters of a `` `asciireq-table:<columns>;<filter>` `` macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMacro<'a> {
    /// Attribute names, one per column.
    pub columns: Vec<&'a str>,
    /// The filter expression. Everything after the first `;`.
    pub filter: &'a str,
}

impl<'a> TableMacro<'a> {
    /// Recognises a table macro on a trimmed line.
    ///
    /// Returns `None` if the line is not a table macro at all, and
    /// `Some(Err(..))` if it is one but has no `;` separating the columns
    /// from the filter.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Result<Self, String>> {
        let inner = line.strip_prefix(TABLE_MACRO_PREFIX)?.strip_suffix('`')?;
        let Some((columns, filter)) = inner.split_once(';') else {
            return Some(Err(format!(
                "Table macro needs columns and a filter separated by ';': {line}"
            )));
        };
        let columns = columns
            .split(',')
            .map(str::trim)
            .filter(|column| !column.is_empty())
            .collect();
        Some(Ok(Self {
            columns,
            filter: filter.trim(),
        }))
    }
}

/// Renders the requirements of `project` that pass `filter` as a table.
///
/// Rows follow the project's merge order. Missing attributes are blank and
/// identifiers in cells are cross-linked. A requirement whose evaluation
/// fails on a lookup is left out quietly; type and pattern failures are
/// reported and the requirement is left out. A name the filter is not
/// allowed to use is reported and no table is produced at all.
pub fn requirement_table(
    project: &Project,
    table: &TableMacro<'_>,
    linker: &CrossLinker,
    line: usize,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    let source = if table.filter.is_empty() {
        "True"
    } else {
        table.filter
    };
    let filter = match Filter::compile(source) {
        Ok(filter) => filter,
        Err(error) => {
            diagnostics.error(Category::Expression, Some(line), format!("{error}"));
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for req in project.requirements() {
        match filter.evaluate(req, project) {
            Ok(true) => rows.push(req),
            Ok(false) | Err(FilterError::Lookup(_)) => {}
            Err(error @ FilterError::UnknownName(_)) => {
                diagnostics.error(Category::Expression, Some(line), format!("{error}"));
                return Vec::new();
            }
            Err(error) => {
                warn!(id = req.id(), %error, "filter failed");
                diagnostics.error(
                    Category::Expression,
                    Some(line),
                    format!("{error} (evaluating {})", req.id().unwrap_or_default()),
                );
            }
        }
    }

    let header: Vec<String> = table.columns.iter().map(|c| format!("|{c}")).collect();
    let mut out = vec!["|===".to_string(), header.join(" "), String::new()];
    for req in rows {
        for column in &table.columns {
            out.push(format!("|{}", linker.link(req.get(column).unwrap_or_default())));
        }
        out.push(String::new());
    }
    out.push("|===".to_string());
    out
}
