use crate::error::Result;
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fallback interpreter for `bash` blocks.
pub const DEFAULT_BASH_SHELL: &str = "/bin/bash";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SessionBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    /// Named tmux sessions.
    Tmux,
    /// Print what would be sent instead of sending it.
    Print,
}

impl SessionBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionBackend::Tmux => "tmux",
            SessionBackend::Print => "print",
        }
    }
}

impl std::str::FromStr for SessionBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tmux" => Ok(SessionBackend::Tmux),
            "print" => Ok(SessionBackend::Print),
            _ => Err(format!("unknown session backend '{s}' (expected tmux or print)")),
        }
    }
}

// ---------------------------------------------------------------------------
// RunbookConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunbookConfig {
    /// Interpreter used to run `bash` blocks.
    #[serde(default = "default_bash_shell")]
    pub default_bash_shell: String,
    /// Where generated scripts are written (default: system temp dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_dir: Option<PathBuf>,
    /// Remembered parameter values (default: `~/.runbook/defaults.yaml`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<SessionBackend>,
}

fn default_bash_shell() -> String {
    DEFAULT_BASH_SHELL.to_string()
}

impl Default for RunbookConfig {
    fn default() -> Self {
        Self {
            default_bash_shell: default_bash_shell(),
            script_dir: None,
            defaults_file: None,
            backend: None,
        }
    }
}

impl RunbookConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: RunbookConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load from `~/.runbook/config.yaml`.
    pub fn load_default() -> Result<Self> {
        Self::load(&paths::default_config_path()?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(path, data.as_bytes())
    }

    /// Directory that receives generated scripts.
    pub fn script_root(&self) -> PathBuf {
        self.script_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn defaults_path(&self) -> Result<PathBuf> {
        match &self.defaults_file {
            Some(p) => Ok(p.clone()),
            None => paths::default_defaults_path(),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.default_bash_shell.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "default_bash_shell is empty".to_string(),
            });
        } else if !Path::new(&self.default_bash_shell).is_absolute() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "default_bash_shell '{}' is not an absolute path; it is resolved by the session's PATH",
                    self.default_bash_shell
                ),
            });
        }

        if let Some(dir) = &self.script_dir {
            if dir.is_relative() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "script_dir '{}' is relative; scripts land relative to the working directory",
                        dir.display()
                    ),
                });
            }
        }

        warnings
    }
}
