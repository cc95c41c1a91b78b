//! Session identifiers and per-session run numbering.
//!
//! Every Run-mode execution writes its script to
//! `<script dir>/<session id>-<NNN>.sh`. The run number keeps a quickly
//! repeated run from overwriting a script the previous shell may still be
//! reading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Identifier used when a session name normalizes to nothing.
pub const FALLBACK_SESSION_ID: &str = "session";

/// Derive a lowercase, filesystem-safe identifier from a session name.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        let safe = ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_');
        let ch = if safe { ch.to_ascii_lowercase() } else { '_' };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_SESSION_ID.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Counts Run-mode executions per session for the lifetime of its owner.
///
/// Keyed by the normalized identifier so two names that map to the same
/// file prefix share one sequence.
#[derive(Debug, Default)]
pub struct RunCounter {
    runs: HashMap<String, u32>,
}

impl RunCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the run number for the next execution in `session` and advance
    /// the counter. The first run is 0.
    pub fn next(&mut self, session: &str) -> u32 {
        let slot = self.runs.entry(normalize(session)).or_insert(0);
        let current = *slot;
        *slot += 1;
        current
    }

    /// Runs issued so far for `session`.
    pub fn count(&self, session: &str) -> u32 {
        self.runs.get(&normalize(session)).copied().unwrap_or(0)
    }
}

/// File name of run `run` for `session`.
pub fn script_file_name(session: &str, run: u32) -> String {
    format!("{}-{run:03}.sh", normalize(session))
}

pub fn script_path(dir: &Path, session: &str, run: u32) -> PathBuf {
    dir.join(script_file_name(session, run))
}
