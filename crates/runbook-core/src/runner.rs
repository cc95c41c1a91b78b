//! End-to-end execution of one block.
//!
//! Send mode types the raw body into the target session. Run mode writes
//! the assembled script to `<script dir>/<session>-<NNN>.sh` and sends
//! `<interpreter> <script>` instead.

use crate::annotation::ActionMode;
use crate::blocks::Block;
use crate::config::RunbookConfig;
use crate::context::{ContextBuilder, Invocation, Prompter, SessionHost};
use crate::defaults::DefaultsStore;
use crate::error::{Result, RunbookError};
use crate::script::{self, ScriptWriter};
use crate::session::{self, RunCounter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of the per-process script directories under the script root.
pub const SCRIPT_DIR_PREFIX: &str = "runbook-";

/// Borrowed collaborators for a single invocation.
pub struct Collaborators<'a> {
    pub prompter: &'a mut dyn Prompter,
    pub defaults: &'a mut dyn DefaultsStore,
    pub sessions: &'a mut dyn SessionHost,
    pub scripts: &'a mut dyn ScriptWriter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user backed out; nothing was written or sent.
    Cancelled,
    Sent { session: String, text: String },
    Ran { session: String, command: String, script: PathBuf },
}

#[derive(Debug)]
pub struct Runner {
    bash_shell: String,
    script_dir: PathBuf,
    runs: RunCounter,
}

impl Runner {
    pub fn new(bash_shell: impl Into<String>, script_dir: impl Into<PathBuf>) -> Self {
        Self {
            bash_shell: bash_shell.into(),
            script_dir: script_dir.into(),
            runs: RunCounter::new(),
        }
    }

    /// Scripts go to a per-process directory under the configured root so
    /// concurrent processes never share file names.
    pub fn from_config(config: &RunbookConfig) -> Self {
        let dir = config
            .script_root()
            .join(format!("{SCRIPT_DIR_PREFIX}{}", std::process::id()));
        Self::new(config.default_bash_shell.clone(), dir)
    }

    pub fn script_dir(&self) -> &Path {
        &self.script_dir
    }

    pub fn runs(&self) -> &RunCounter {
        &self.runs
    }

    /// Execute an actionable block.
    pub fn exec_block(
        &mut self,
        block: &Block,
        document: Option<&Path>,
        collab: Collaborators<'_>,
    ) -> Result<Outcome> {
        if !block.is_actionable() {
            return Err(RunbookError::NotActionable(block.index));
        }
        let action = block
            .annotation
            .action
            .as_ref()
            .ok_or(RunbookError::NotActionable(block.index))?;
        let invocation = Invocation {
            action,
            kind: &block.annotation.kind,
            body: &block.body,
            parameters: &block.parameters,
        };
        self.exec(&invocation, document, collab)
    }

    pub fn exec(
        &mut self,
        invocation: &Invocation<'_>,
        document: Option<&Path>,
        collab: Collaborators<'_>,
    ) -> Result<Outcome> {
        let Collaborators {
            prompter,
            defaults,
            sessions,
            scripts,
        } = collab;

        let ctx = ContextBuilder {
            prompter,
            defaults,
            sessions: &mut *sessions,
        }
        .build(invocation, document)?;
        let Some(mut ctx) = ctx else {
            return Ok(Outcome::Cancelled);
        };

        let session_name = ctx.action.session().to_string();
        match ctx.action.mode {
            ActionMode::Send => {
                sessions.send_text(&session_name, &ctx.body)?;
                tracing::info!(session = %session_name, "sent block body");
                Ok(Outcome::Sent {
                    session: session_name,
                    text: ctx.body,
                })
            }
            ActionMode::Run => {
                let run = self.runs.next(&session_name);
                let path = session::script_path(&self.script_dir, &session_name, run);
                ctx.script_path = Some(path.clone());

                let assembled = script::assemble(&ctx, &self.bash_shell, &*sessions);
                scripts.write(&path, &assembled.text)?;
                tracing::info!(script = %path.display(), session = %session_name, "wrote script");

                let command = assembled.command(&path);
                sessions.send_text(&session_name, &command)?;
                Ok(Outcome::Ran {
                    session: session_name,
                    command,
                    script: path,
                })
            }
        }
    }
}

/// Remove script directories left behind by other processes once they are
/// older than `max_age`. The current process's directory is kept. Returns
/// how many directories were removed.
pub fn prune_script_dirs(root: &Path, max_age: Duration) -> Result<usize> {
    let own = format!("{SCRIPT_DIR_PREFIX}{}", std::process::id());
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let is_script_dir = name
            .strip_prefix(SCRIPT_DIR_PREFIX)
            .is_some_and(|pid| !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit()));
        if !is_script_dir || name == own || !entry.file_type()?.is_dir() {
            continue;
        }
        let stale = entry
            .metadata()?
            .modified()?
            .elapsed()
            .is_ok_and(|age| age >= max_age);
        if stale {
            std::fs::remove_dir_all(entry.path())?;
            tracing::debug!(dir = name, "pruned stale script dir");
            removed += 1;
        }
    }
    Ok(removed)
}
