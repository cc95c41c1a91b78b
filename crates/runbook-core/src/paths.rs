use crate::error::{Result, RunbookError};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RUNBOOK_DIR: &str = ".runbook";
pub const CONFIG_FILE: &str = "config.yaml";
pub const DEFAULTS_FILE: &str = "defaults.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `~/.runbook`
pub fn runbook_home() -> Result<PathBuf> {
    let home = home::home_dir().ok_or(RunbookError::HomeNotFound)?;
    Ok(home.join(RUNBOOK_DIR))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(runbook_home()?.join(CONFIG_FILE))
}

pub fn default_defaults_path() -> Result<PathBuf> {
    Ok(runbook_home()?.join(DEFAULTS_FILE))
}

/// Directory containing `file`, or `.` for a bare file name.
pub fn dirname(file: &Path) -> PathBuf {
    match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve `relative` against `base`.
///
/// - `None` returns `base` unchanged.
/// - A leading `~` is replaced by the home directory; the tilde and one
///   following separator are dropped before joining the rest.
/// - Anything else is joined onto `base` and normalized; an absolute
///   `relative` replaces `base`.
pub fn resolve(base: &Path, relative: Option<&str>) -> Result<PathBuf> {
    resolve_with_home(base, relative, home::home_dir().as_deref())
}

pub(crate) fn resolve_with_home(
    base: &Path,
    relative: Option<&str>,
    home: Option<&Path>,
) -> Result<PathBuf> {
    let Some(relative) = relative else {
        return Ok(base.to_path_buf());
    };

    if let Some(rest) = relative.strip_prefix('~') {
        let home = home.ok_or(RunbookError::HomeNotFound)?;
        let rest = rest
            .strip_prefix('/')
            .or_else(|| rest.strip_prefix(std::path::MAIN_SEPARATOR))
            .unwrap_or(rest);
        return Ok(normalize(&home.join(rest)));
    }

    Ok(normalize(&base.join(relative)))
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
/// Does not touch the file system.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
