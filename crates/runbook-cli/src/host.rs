//! Session hosts for the command line: named tmux sessions, or plain
//! output when there is nowhere to send text.

use runbook_core::context::SessionHost;
use runbook_core::session;
use runbook_core::RunbookError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Shell for non-bash blocks when `$SHELL` is unset.
const FALLBACK_SHELL: &str = "/bin/sh";

fn login_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SHELL.to_string())
}

// ---------------------------------------------------------------------------
// tmux
// ---------------------------------------------------------------------------

/// Sessions are tmux sessions named after the normalized session name.
pub struct TmuxHost {
    binary: PathBuf,
    /// Private server socket (`tmux -L`); the default server when unset.
    socket: Option<String>,
}

/// tmux session name for `name`. tmux rewrites `.` and `:` in session names
/// and reads them as window/pane separators in targets.
pub fn tmux_session_id(name: &str) -> String {
    session::normalize(name).replace(['.', ':'], "_")
}

/// `=` makes tmux match the session name exactly instead of by prefix.
fn session_target(id: &str) -> String {
    format!("={id}")
}

/// Active pane of the exactly-named session.
fn pane_target(id: &str) -> String {
    format!("={id}:")
}

impl TmuxHost {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            socket: None,
        }
    }

    /// Locate `tmux` on `PATH`.
    pub fn detect() -> Option<Self> {
        which::which("tmux").ok().map(Self::new)
    }

    #[cfg(test)]
    fn on_socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    fn tmux(&self, args: &[&str]) -> runbook_core::Result<std::process::Output> {
        tracing::debug!(?args, "tmux");
        let mut cmd = Command::new(&self.binary);
        if let Some(socket) = &self.socket {
            cmd.args(["-L", socket]);
        }
        cmd.args(args)
            .output()
            .map_err(|e| RunbookError::Session(format!("failed to run tmux: {e}")))
    }

    fn checked(&self, args: &[&str]) -> runbook_core::Result<()> {
        let out = self.tmux(args)?;
        if out.status.success() {
            Ok(())
        } else {
            Err(RunbookError::Session(format!(
                "tmux {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&out.stderr).trim()
            )))
        }
    }

    fn has_session(&self, id: &str) -> runbook_core::Result<bool> {
        Ok(self
            .tmux(&["has-session", "-t", &session_target(id)])?
            .status
            .success())
    }
}

impl SessionHost for TmuxHost {
    fn default_shell(&self) -> String {
        login_shell()
    }

    fn open_or_create(&mut self, name: &str, cwd: &Path) -> runbook_core::Result<()> {
        let id = tmux_session_id(name);
        if self.has_session(&id)? {
            tracing::debug!(session = %id, "reusing tmux session");
        } else {
            let cwd = cwd.to_string_lossy();
            self.checked(&["new-session", "-d", "-s", &id, "-c", &cwd])?;
            tracing::info!(session = %id, "created tmux session");
        }
        eprintln!("tmux session '{id}' (attach with: tmux attach -t ={id})");
        Ok(())
    }

    fn send_text(&mut self, name: &str, text: &str) -> runbook_core::Result<()> {
        let target = pane_target(&tmux_session_id(name));
        self.checked(&["send-keys", "-t", &target, "-l", text])?;
        self.checked(&["send-keys", "-t", &target, "Enter"])
    }
}

// ---------------------------------------------------------------------------
// print
// ---------------------------------------------------------------------------

/// Writes what would be sent to `out` instead of driving a terminal.
pub struct PrintHost<W: Write> {
    out: W,
    shell: String,
}

impl PrintHost<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> PrintHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shell: login_shell(),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SessionHost for PrintHost<W> {
    fn default_shell(&self) -> String {
        self.shell.clone()
    }

    fn open_or_create(&mut self, name: &str, cwd: &Path) -> runbook_core::Result<()> {
        writeln!(self.out, "# session: {name} (cwd: {})", cwd.display())?;
        Ok(())
    }

    fn send_text(&mut self, _name: &str, text: &str) -> runbook_core::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_host_writes_session_header_and_text() {
        let mut host = PrintHost::new(Vec::new());
        host.open_or_create("My Server", Path::new("/srv")).unwrap();
        host.send_text("My Server", "bash /tmp/x.sh").unwrap();
        let out = String::from_utf8(host.into_inner()).unwrap();
        assert_eq!(out, "# session: My Server (cwd: /srv)\nbash /tmp/x.sh\n");
    }

    #[test]
    fn missing_tmux_binary_is_a_session_error() {
        let mut host = TmuxHost::new(PathBuf::from("/nonexistent/tmux"));
        let err = host.send_text("ops", "echo").unwrap_err();
        assert!(matches!(err, RunbookError::Session(_)));
    }

    #[test]
    fn tmux_ids_avoid_target_separators() {
        assert_eq!(tmux_session_id("Runbook.md"), "runbook_md");
        assert_eq!(tmux_session_id("My Server: #1"), "my_server_1");
        assert_eq!(tmux_session_id("ops"), "ops");
        assert_eq!(session_target("ops"), "=ops");
        assert_eq!(pane_target("runbook_md"), "=runbook_md:");
    }

    /// Host on a private tmux server, killed on drop. `None` without tmux.
    struct IsolatedTmux {
        host: TmuxHost,
        socket: String,
    }

    impl IsolatedTmux {
        fn start(tag: &str) -> Option<Self> {
            let socket = format!("runbook-test-{}-{tag}", std::process::id());
            let host = TmuxHost::detect()?.on_socket(socket.clone());
            Some(Self { host, socket })
        }

        fn sessions(&self) -> Vec<String> {
            let out = self
                .host
                .tmux(&["list-sessions", "-F", "#{session_name}"])
                .unwrap();
            let mut names: Vec<String> = String::from_utf8_lossy(&out.stdout)
                .lines()
                .map(String::from)
                .collect();
            names.sort();
            names
        }
    }

    impl Drop for IsolatedTmux {
        fn drop(&mut self) {
            let _ = Command::new(&self.host.binary)
                .args(["-L", &self.socket, "kill-server"])
                .output();
        }
    }

    #[test]
    fn tmux_default_session_name_is_reusable() {
        let Some(mut tmux) = IsolatedTmux::start("dotted") else {
            return;
        };
        let dir = std::env::temp_dir();
        tmux.host.open_or_create("Runbook.md", &dir).unwrap();
        tmux.host.send_text("Runbook.md", "true").unwrap();
        tmux.host.open_or_create("Runbook.md", &dir).unwrap();
        assert_eq!(tmux.sessions(), ["runbook_md"]);
    }

    #[test]
    fn tmux_session_prefix_does_not_match() {
        let Some(mut tmux) = IsolatedTmux::start("prefix") else {
            return;
        };
        let dir = std::env::temp_dir();
        tmux.host.open_or_create("ops-prod", &dir).unwrap();
        tmux.host.open_or_create("ops", &dir).unwrap();
        tmux.host.send_text("ops", "true").unwrap();
        assert_eq!(tmux.sessions(), ["ops", "ops-prod"]);
    }
}
