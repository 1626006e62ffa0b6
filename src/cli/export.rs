use std::{fs::File, path::PathBuf};

use anyhow::Context;
use asciireqs::report::{ExportScope, write_csv};
use clap::Parser;
use tracing::instrument;

use super::{
    ProjectArgs,
    terminal::{self, Colorize},
};

#[derive(Debug, Parser)]
#[command(about = "Export requirement attributes as CSV")]
pub struct Export {
    #[command(flatten)]
    project: ProjectArgs,

    /// The file to write (must end in .csv)
    output: PathBuf,

    /// Include the requirements of every merged document, not just the root
    #[arg(short, long)]
    recursive: bool,
}

impl Export {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        match self.output.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => {}
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => {
                anyhow::bail!("spreadsheet export is not supported, write a .csv file instead");
            }
            _ => anyhow::bail!("unsupported export format: {}", self.output.display()),
        }

        let (project, _, diagnostics) = self.project.load()?;
        terminal::print_diagnostics(&diagnostics);

        let scope = if self.recursive {
            ExportScope::Project
        } else {
            ExportScope::Root
        };
        let file = File::create(&self.output)
            .with_context(|| format!("failed to create {}", self.output.display()))?;
        write_csv(&project, scope, file)
            .with_context(|| format!("failed to write {}", self.output.display()))?;
        println!("{} {}", "Wrote".success(), self.output.display());
        Ok(())
    }
}
