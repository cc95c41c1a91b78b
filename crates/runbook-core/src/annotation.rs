//! Fence annotation resolution.
//!
//! An annotation is the info string of a fenced block, e.g.
//! `bash run --terminal=ops --cwd=scripts --ask-confirm`. The first token is
//! the block kind; the rest is parsed against a small fixed flag grammar.
//! Parsing is fail-soft: anything unexpected leaves the annotation without an
//! action instead of returning an error, because most info strings are plain
//! language labels written for other renderers.

use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session name used when an annotation does not pick one.
pub const DEFAULT_SESSION: &str = "Runbook.md";

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// Type the block body into the session as-is.
    Send,
    /// Write the block to a script file and run it with a shell.
    Run,
}

impl ActionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionMode::Send => "send",
            ActionMode::Run => "run",
        }
    }

    /// Short label shown next to actionable blocks.
    pub fn label(self) -> &'static str {
        match self {
            ActionMode::Send => "Send",
            ActionMode::Run => "Run",
        }
    }
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub mode: ActionMode,
    #[serde(default)]
    pub params: ActionParams,
}

impl Action {
    pub fn new(mode: ActionMode) -> Self {
        Self {
            mode,
            params: ActionParams::default(),
        }
    }

    /// Target session, falling back to [`DEFAULT_SESSION`].
    pub fn session(&self) -> &str {
        self.params.session.as_deref().unwrap_or(DEFAULT_SESSION)
    }

    pub fn confirm_required(&self) -> bool {
        self.params.confirm_required.unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: String,
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

/// Resolve an annotation string. Never fails; a malformed directive simply
/// yields an annotation without an action.
pub fn resolve(annotation: &str) -> Annotation {
    let mut tokens = tokenize(annotation).into_iter();
    let Some(kind) = tokens.next() else {
        return Annotation {
            kind: String::new(),
            raw: annotation.to_string(),
            action: None,
        };
    };

    let rest: Vec<String> = tokens.collect();
    let action = parse_action(&rest);
    match &action {
        Some(a) => tracing::debug!(
            kind = %kind,
            mode = %a.mode,
            session = a.session(),
            "resolved annotation"
        ),
        None if !rest.is_empty() => {
            tracing::debug!(kind = %kind, raw = annotation, "annotation has no usable directive")
        }
        None => {}
    }

    Annotation {
        kind,
        raw: annotation.to_string(),
        action,
    }
}

// ---------------------------------------------------------------------------
// Flag grammar
// ---------------------------------------------------------------------------

enum Flag {
    Session,
    Cwd,
    AskConfirm,
}

fn lookup_flag(name: &str) -> Option<Flag> {
    match name {
        "-t" | "--terminal" => Some(Flag::Session),
        "-d" | "--cwd" => Some(Flag::Cwd),
        "--ask-confirm" => Some(Flag::AskConfirm),
        _ => None,
    }
}

fn parse_action(tokens: &[String]) -> Option<Action> {
    // A bare kind is just a language label.
    if tokens.is_empty() {
        return None;
    }

    let mut params = ActionParams::default();
    let mut positionals: Vec<&str> = Vec::new();
    let mut options_done = false;
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        if options_done || !token.starts_with('-') || token == "-" {
            positionals.push(token);
            continue;
        }
        if token == "--" {
            options_done = true;
            continue;
        }

        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (token.as_str(), None),
        };

        match lookup_flag(name)? {
            Flag::AskConfirm => {
                if inline.is_some() {
                    return None;
                }
                params.confirm_required = Some(true);
            }
            Flag::Session => params.session = Some(option_value(inline, &mut iter)?),
            Flag::Cwd => params.cwd = Some(option_value(inline, &mut iter)?),
        }
    }

    let mode = match positionals.as_slice() {
        [] => ActionMode::Run,
        ["send"] => ActionMode::Send,
        ["run"] => ActionMode::Run,
        _ => return None,
    };

    Some(Action { mode, params })
}

/// Value of a value-taking option: inline `--opt=value` or the next token.
/// Empty values are rejected.
fn option_value(
    inline: Option<String>,
    rest: &mut std::slice::Iter<'_, String>,
) -> Option<String> {
    let raw = match inline {
        Some(v) => v,
        None => rest.next()?.clone(),
    };
    let value = unquote(&raw);
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// Strip one matching pair of surrounding double or single quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
