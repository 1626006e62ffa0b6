use std::path::PathBuf;

use anyhow::Context;
use asciireqs::report::process_document_tree;
use clap::Parser;
use tracing::instrument;

use super::{
    ProjectArgs,
    terminal::{self, Colorize},
};

#[derive(Debug, Parser)]
#[command(about = "Publish every document of a project with anchors and cross-links")]
pub struct Process {
    #[command(flatten)]
    project: ProjectArgs,

    /// Directory the processed documents are written to
    #[arg(short, long)]
    output_dir: PathBuf,
}

impl Process {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let (project, _, mut diagnostics) = self.project.load()?;
        let written = process_document_tree(&project, &self.output_dir, &mut diagnostics)
            .with_context(|| format!("failed to publish into {}", self.output_dir.display()))?;
        terminal::print_diagnostics(&diagnostics);
        for path in written {
            println!("{} {}", "Wrote".success(), path.display());
        }
        Ok(())
    }
}
