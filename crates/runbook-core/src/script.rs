//! Rendering an execution context into a shell script.

use crate::context::{ExecutionContext, SessionHost};
use crate::error::Result;
use crate::io;
use std::path::Path;

/// Block kind that runs with the configured bash shell.
pub const BASH_KIND: &str = "bash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledScript {
    pub interpreter: String,
    pub text: String,
}

impl AssembledScript {
    /// Command line that runs the script once it is written to `path`.
    pub fn command(&self, path: &Path) -> String {
        command_line(&self.interpreter, path)
    }
}

/// Destination for assembled scripts.
pub trait ScriptWriter {
    fn write(&mut self, path: &Path, text: &str) -> Result<()>;
}

/// Writes scripts atomically to the filesystem, creating parent directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsScriptWriter;

impl ScriptWriter for FsScriptWriter {
    fn write(&mut self, path: &Path, text: &str) -> Result<()> {
        io::atomic_write(path, text.as_bytes())
    }
}

/// Escape `"` as `\"`. Nothing else is touched.
pub fn escape_double_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Script text: exports, optional `cd`, then the body verbatim.
pub fn render(ctx: &ExecutionContext) -> String {
    let mut lines: Vec<String> = ctx
        .env
        .iter()
        .map(|(name, value)| format!("export {name}=\"{}\"", escape_double_quotes(value)))
        .collect();

    if ctx.action.params.cwd.is_some() {
        lines.push(format!(
            "cd \"{}\"",
            escape_double_quotes(&ctx.working_dir.to_string_lossy())
        ));
    }

    lines.push(ctx.body.clone());
    lines.join("\n")
}

/// `bash` blocks use the configured shell; anything else uses the host's.
pub fn interpreter_for(kind: &str, bash_shell: &str, host: &dyn SessionHost) -> String {
    if kind == BASH_KIND {
        bash_shell.to_string()
    } else {
        host.default_shell()
    }
}

pub fn assemble(ctx: &ExecutionContext, bash_shell: &str, host: &dyn SessionHost) -> AssembledScript {
    AssembledScript {
        interpreter: interpreter_for(&ctx.kind, bash_shell, host),
        text: render(ctx),
    }
}

/// `<interpreter> <path>`, quoting the path only when it needs it.
pub fn command_line(interpreter: &str, path: &Path) -> String {
    let path = path.to_string_lossy();
    if path.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        format!("{interpreter} \"{}\"", escape_double_quotes(&path))
    } else {
        format!("{interpreter} {path}")
    }
}
