use std::path::PathBuf;

use anyhow::Context;
use asciireqs::report::write_report;
use clap::Parser;
use tracing::instrument;

use super::{
    ProjectArgs,
    terminal::{self, Colorize},
};

#[derive(Debug, Parser)]
#[command(about = "Expand the macros in a report template")]
pub struct Report {
    #[command(flatten)]
    project: ProjectArgs,

    /// The report template
    #[arg(short, long)]
    template: PathBuf,

    /// Directory the report is written to, under the template's file name
    #[arg(short, long)]
    output_dir: PathBuf,
}

impl Report {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let (project, _, mut diagnostics) = self.project.load()?;
        let path = write_report(&project, &self.template, &self.output_dir, &mut diagnostics)
            .with_context(|| format!("failed to write report from {}", self.template.display()))?;
        terminal::print_diagnostics(&diagnostics);
        println!("{} {}", "Wrote".success(), path.display());
        Ok(())
    }
}
