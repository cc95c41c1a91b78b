//! Building the execution context of one block invocation.
//!
//! The builder walks a fixed request/response sequence: resolve the working
//! directory, prompt for every declared parameter, ask for confirmation when
//! the block wants it, then make sure the target session exists. An empty
//! answer or a declined confirmation ends the sequence with `Ok(None)`
//! before any session is touched. Values already collected stay remembered.

use crate::annotation::Action;
use crate::defaults::DefaultsStore;
use crate::error::{Result, RunbookError};
use crate::form::{FormParameter, ParamKind};
use crate::paths;
use std::path::{Path, PathBuf};

pub const ERROR_MESSAGE: &str = "Runbook.md: Unexpected Error";
pub const CONFIRM_MESSAGE: &str = "Runbook.md: Are you sure you want to execute this script?";
pub const DEFAULT_LABEL: &str = "(default)";

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Single-line input request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRequest {
    pub prompt: String,
    pub placeholder: String,
    /// Pre-filled value (the remembered default).
    pub value: Option<String>,
    /// Hide typed characters.
    pub masked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: Option<String>,
}

impl PickItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }
}

/// Single-choice request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
    pub placeholder: String,
    pub items: Vec<PickItem>,
}

/// Interactive prompts. `None` means the user supplied nothing.
pub trait Prompter {
    fn input(&mut self, request: &InputRequest) -> Option<String>;
    fn pick(&mut self, request: &PickRequest) -> Option<String>;
    fn confirm(&mut self, message: &str) -> bool;
    fn notify_error(&mut self, message: &str);
}

/// Host-managed interactive sessions.
pub trait SessionHost {
    /// Shell the host starts sessions with.
    fn default_shell(&self) -> String;
    /// Find the session called `name` or create it rooted at `cwd`, then
    /// bring it to the foreground.
    fn open_or_create(&mut self, name: &str, cwd: &Path) -> Result<()>;
    /// Type `text` into the session followed by a newline.
    fn send_text(&mut self, name: &str, text: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// ExecutionContext
// ---------------------------------------------------------------------------

/// What is being executed: a resolved action plus the block it came from.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub action: &'a Action,
    pub kind: &'a str,
    pub body: &'a str,
    pub parameters: &'a [FormParameter],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub document: PathBuf,
    pub working_dir: PathBuf,
    /// Collected `(name, value)` pairs in prompt order.
    pub env: Vec<(String, String)>,
    /// Set for Run-mode executions once a script path is allocated.
    pub script_path: Option<PathBuf>,
    pub action: Action,
    pub parameters: Vec<FormParameter>,
    pub kind: String,
    pub body: String,
}

impl ExecutionContext {
    pub fn new(document: &Path, working_dir: PathBuf, invocation: &Invocation<'_>) -> Self {
        Self {
            document: document.to_path_buf(),
            working_dir,
            env: Vec::new(),
            script_path: None,
            action: invocation.action.clone(),
            parameters: invocation.parameters.to_vec(),
            kind: invocation.kind.to_string(),
            body: invocation.body.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct ContextBuilder<'a> {
    pub prompter: &'a mut dyn Prompter,
    pub defaults: &'a mut dyn DefaultsStore,
    pub sessions: &'a mut dyn SessionHost,
}

impl ContextBuilder<'_> {
    /// Run the collection sequence. `Ok(None)` means the user backed out.
    pub fn build(
        &mut self,
        invocation: &Invocation<'_>,
        document: Option<&Path>,
    ) -> Result<Option<ExecutionContext>> {
        let Some(document) = document else {
            self.prompter.notify_error(ERROR_MESSAGE);
            return Err(RunbookError::NoActiveDocument);
        };

        let doc_dir = paths::dirname(document);
        let working_dir = match invocation.action.params.cwd.as_deref() {
            Some(cwd) => paths::resolve(&doc_dir, Some(cwd))?,
            None => doc_dir.clone(),
        };

        let mut env = Vec::with_capacity(invocation.parameters.len());
        for param in invocation.parameters {
            let remembered = self.defaults.get(document, &param.name);
            let Some(value) = self.ask(param, remembered) else {
                tracing::debug!(param = %param.name, "no value supplied, aborting");
                return Ok(None);
            };
            self.defaults.set(document, &param.name, &value)?;
            env.push((param.name.clone(), value));
        }

        if invocation.action.confirm_required() && !self.prompter.confirm(CONFIRM_MESSAGE) {
            tracing::debug!("confirmation declined, aborting");
            return Ok(None);
        }

        self.sessions
            .open_or_create(invocation.action.session(), &doc_dir)?;

        let mut ctx = ExecutionContext::new(document, working_dir, invocation);
        ctx.env = env;
        Ok(Some(ctx))
    }

    fn ask(&mut self, param: &FormParameter, remembered: Option<String>) -> Option<String> {
        let answer = match param.kind {
            ParamKind::Choice => {
                let mut items = Vec::with_capacity(param.choices.len() + 1);
                if let Some(value) = remembered {
                    items.push(PickItem {
                        label: value,
                        description: Some(DEFAULT_LABEL.to_string()),
                    });
                }
                items.extend(param.choices.iter().map(PickItem::new));
                self.prompter.pick(&PickRequest {
                    placeholder: format!("Pick value for {}", param.name),
                    items,
                })
            }
            ParamKind::Text | ParamKind::Secret => self.prompter.input(&InputRequest {
                prompt: format!("Enter value for {}", param.name),
                placeholder: param.name.clone(),
                value: remembered,
                masked: param.kind == ParamKind::Secret,
            }),
        };
        answer.filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
