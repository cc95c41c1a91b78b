use crate::document::Document;
use crate::host::{PrintHost, TmuxHost};
use crate::output::print_json;
use crate::prompt::TerminalPrompter;
use anyhow::Context;
use runbook_core::blocks::{self, Block};
use runbook_core::config::{RunbookConfig, SessionBackend};
use runbook_core::context::{Prompter, SessionHost, ERROR_MESSAGE};
use runbook_core::defaults::FileDefaults;
use runbook_core::runner::{self, Collaborators, Outcome, Runner};
use runbook_core::script::FsScriptWriter;
use runbook_core::tokenizer;
use runbook_core::RunbookError;
use std::path::Path;
use std::time::Duration;

/// Script directories of other processes older than this are removed.
const STALE_SCRIPT_DIR_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Which block to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// 1-based block number as printed by `runbook list`.
    Block(usize),
    /// The block whose fences span this 1-based line.
    Line(usize),
}

impl Target {
    pub fn from_args(block: Option<usize>, line: Option<usize>) -> anyhow::Result<Self> {
        match (block, line) {
            (Some(n), None) => Ok(Target::Block(n)),
            (None, Some(l)) => Ok(Target::Line(l)),
            (Some(_), Some(_)) => anyhow::bail!("--block and --line cannot be combined"),
            (None, None) => anyhow::bail!("pass --block <N> or --line <L>"),
        }
    }

    fn select<'a>(self, blocks: &'a [Block]) -> runbook_core::Result<&'a Block> {
        let found = match self {
            Target::Block(n) => blocks.iter().find(|b| b.index == n),
            Target::Line(l) => blocks::block_at_line(blocks, l),
        };
        found.ok_or_else(|| RunbookError::BlockNotFound(self.to_string()))
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Block(n) => write!(f, "#{n}"),
            Target::Line(l) => write!(f, "at line {l}"),
        }
    }
}

pub fn run(
    config: &RunbookConfig,
    doc: Option<&Path>,
    target: Target,
    backend: Option<SessionBackend>,
    json: bool,
) -> anyhow::Result<()> {
    let mut prompter = TerminalPrompter::stdio();

    let Some(doc) = doc else {
        prompter.notify_error(ERROR_MESSAGE);
        return Err(RunbookError::NoActiveDocument.into());
    };
    let document = Document::load(doc)?;
    let block = target.select(&document.blocks)?;
    eprintln!("block {}: {}", block.index, echo_annotation(&block.annotation.raw));

    let defaults_path = config.defaults_path()?;
    let mut defaults = FileDefaults::open(&defaults_path)
        .with_context(|| format!("failed to open defaults {}", defaults_path.display()))?;
    let mut host = open_host(backend.or(config.backend))?;
    let script_root = config.script_root();
    match runner::prune_script_dirs(&script_root, STALE_SCRIPT_DIR_AGE) {
        Ok(0) => {}
        Ok(n) => tracing::debug!(removed = n, "pruned old script dirs"),
        Err(e) => tracing::warn!(
            error = %e,
            root = %script_root.display(),
            "failed to prune script dirs"
        ),
    }
    let mut runner = Runner::from_config(config);

    let outcome = runner.exec_block(
        block,
        Some(&document.path),
        Collaborators {
            prompter: &mut prompter,
            defaults: &mut defaults,
            sessions: host.as_mut(),
            scripts: &mut FsScriptWriter,
        },
    );
    let outcome = match outcome {
        Ok(o) => o,
        Err(e) => {
            if !matches!(e, RunbookError::NotActionable(_)) {
                prompter.notify_error(ERROR_MESSAGE);
            }
            return Err(e).with_context(|| format!("failed to execute block {}", block.index));
        }
    };

    report(&outcome, json)
}

/// The annotation re-joined from its tokens, so stray spacing is dropped.
fn echo_annotation(raw: &str) -> String {
    tokenizer::join_tokens(&tokenizer::tokenize(raw))
}

/// Explicit backend, else tmux when it is installed, else print.
fn open_host(backend: Option<SessionBackend>) -> anyhow::Result<Box<dyn SessionHost>> {
    let host: Box<dyn SessionHost> = match backend {
        Some(SessionBackend::Tmux) => Box::new(
            TmuxHost::detect().context("tmux backend selected but tmux is not on PATH")?,
        ),
        Some(SessionBackend::Print) => Box::new(PrintHost::stdout()),
        None => match TmuxHost::detect() {
            Some(tmux) => Box::new(tmux),
            None => {
                tracing::debug!("tmux not found, printing instead");
                Box::new(PrintHost::stdout())
            }
        },
    };
    Ok(host)
}

fn report(outcome: &Outcome, json: bool) -> anyhow::Result<()> {
    if json {
        let value = match outcome {
            Outcome::Cancelled => serde_json::json!({ "status": "cancelled" }),
            Outcome::Sent { session, text } => serde_json::json!({
                "status": "sent",
                "session": session,
                "text": text,
            }),
            Outcome::Ran {
                session,
                command,
                script,
            } => serde_json::json!({
                "status": "ran",
                "session": session,
                "command": command,
                "script": script,
            }),
        };
        return print_json(&value);
    }

    match outcome {
        Outcome::Cancelled => eprintln!("Cancelled."),
        Outcome::Sent { session, .. } => eprintln!("Sent block to '{session}'."),
        Outcome::Ran {
            session, script, ..
        } => eprintln!("Ran {} in '{session}'.", script.display()),
    }
    Ok(())
}
