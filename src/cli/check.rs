use clap::Parser;
use tracing::instrument;

use super::{
    ProjectArgs,
    terminal::{self, Colorize},
};

#[derive(Debug, Parser)]
#[command(about = "Parse a project and report every problem found")]
pub struct Check {
    #[command(flatten)]
    project: ProjectArgs,

    /// Fail if any error is found, whatever the configuration says
    #[arg(long)]
    strict: bool,
}

impl Check {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let (project, config, diagnostics) = self.project.load()?;
        terminal::print_diagnostics(&diagnostics);

        let documents = project.root().walk().len();
        println!(
            "{} requirement(s) in {} document(s): {}",
            project.len(),
            documents,
            terminal::summary(&diagnostics)
        );
        for (depth, doc) in project.root().walk() {
            let line = format!(
                "{}{} ({})",
                "  ".repeat(depth),
                doc.name(),
                doc.requirements().count()
            );
            println!("{}", line.dim());
        }

        if (self.strict || config.strict) && diagnostics.has_errors() {
            anyhow::bail!("{} error(s) found", diagnostics.error_count());
        }
        Ok(())
    }
}
