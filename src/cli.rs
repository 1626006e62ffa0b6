use std::path::{Path, PathBuf};

mod check;
mod export;
mod process;
mod report;
mod terminal;

use anyhow::Context;
use asciireqs::{Config, Diagnostics, Project, parser::read_and_parse_project};
use check::Check;
use clap::ArgAction;
use export::Export;
use process::Process;
use report::Report;
use tracing::{debug, instrument};

/// Name of the configuration file looked for beside the root document.
const CONFIG_FILE: &str = "asciireqs.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run()
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Parse a project and report every problem found
    Check(Check),

    /// Expand the macros in a report template
    ///
    /// `asciireq-hierarchy` lists the project's documents and
    /// `asciireq-table:<columns>;<filter>` tabulates matching requirements.
    Report(Report),

    /// Publish every document of a project with anchors and cross-links
    Process(Process),

    /// Export requirement attributes as CSV
    Export(Export),
}

impl Command {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(),
            Self::Report(command) => command.run(),
            Self::Process(command) => command.run(),
            Self::Export(command) => command.run(),
        }
    }
}

/// Arguments shared by every command that reads a project.
#[derive(Debug, clap::Args)]
pub struct ProjectArgs {
    /// The root requirements document
    document: PathBuf,

    /// Configuration file [default: asciireqs.toml beside the root document]
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ProjectArgs {
    fn config(&self) -> anyhow::Result<Config> {
        let (path, explicit) = self.config.as_ref().map_or_else(
            || {
                let dir = self.document.parent().unwrap_or_else(|| Path::new(""));
                (dir.join(CONFIG_FILE), false)
            },
            |path| (path.clone(), true),
        );
        if !explicit && !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Config::default());
        }
        Config::load(&path).map_err(|e| anyhow::anyhow!("{e} ({})", path.display()))
    }

    /// Loads the project along with the diagnostics collected on the way.
    #[instrument(level = "debug", skip(self), fields(document = %self.document.display()))]
    fn load(&self) -> anyhow::Result<(Project, Config, Diagnostics)> {
        let config = self.config()?;
        let mut diagnostics = Diagnostics::new();
        let project = read_and_parse_project(&self.document, &config, &mut diagnostics)
            .with_context(|| format!("failed to load {}", self.document.display()))?;
        Ok((project, config, diagnostics))
    }
}
