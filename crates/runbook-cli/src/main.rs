mod cmd;
mod document;
mod host;
mod output;
mod prompt;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, defaults::DefaultsSubcommand};
use runbook_core::config::{RunbookConfig, SessionBackend};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "runbook",
    about = "Run annotated shell blocks from Markdown runbooks",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ~/.runbook/config.yaml)
    #[arg(long, global = true, env = "RUNBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the fenced blocks of a document
    List {
        /// Markdown document
        doc: PathBuf,
        /// Include blocks that cannot be executed
        #[arg(long)]
        all: bool,
        /// Only blocks that ask for confirmation
        #[arg(long, conflicts_with = "all")]
        confirm_only: bool,
    },

    /// Execute one actionable block
    Exec {
        /// Markdown document (default: $RUNBOOK_DOC)
        #[arg(env = "RUNBOOK_DOC")]
        doc: Option<PathBuf>,
        /// Block number as shown by `runbook list`
        #[arg(long, conflicts_with = "line", required_unless_present = "line")]
        block: Option<usize>,
        /// Execute the block spanning this line
        #[arg(long)]
        line: Option<usize>,
        /// Where sessions live: tmux or print
        #[arg(long)]
        backend: Option<SessionBackend>,
        /// Interpreter for bash blocks
        #[arg(long, env = "RUNBOOK_BASH_SHELL")]
        shell: Option<String>,
    },

    /// Inspect remembered parameter values
    Defaults {
        #[command(subcommand)]
        subcommand: DefaultsSubcommand,
    },

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::List {
            doc,
            all,
            confirm_only,
        } => cmd::list::run(&doc, all, confirm_only, cli.json),
        Commands::Exec {
            doc,
            block,
            line,
            backend,
            shell,
        } => {
            let target = cmd::exec::Target::from_args(block, line)?;
            let mut config = config;
            if let Some(shell) = shell {
                config.default_bash_shell = shell;
            }
            cmd::exec::run(&config, doc.as_deref(), target, backend, cli.json)
        }
        Commands::Defaults { subcommand } => cmd::defaults::run(&config, subcommand, cli.json),
        Commands::Config { subcommand } => {
            cmd::config::run(&config, cli.config.as_deref(), subcommand, cli.json)
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> anyhow::Result<RunbookConfig> {
    use anyhow::Context;
    let config = match explicit {
        Some(path) => RunbookConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunbookConfig::load_default().context("failed to load config")?,
    };
    Ok(config)
}
