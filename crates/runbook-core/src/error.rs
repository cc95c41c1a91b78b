use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunbookError {
    #[error("no active document: open a runbook file first")]
    NoActiveDocument,

    #[error("block not found: {0}")]
    BlockNotFound(String),

    #[error("block {0} is not actionable: annotate it with e.g. 'bash run'")]
    NotActionable(usize),

    #[error("session error: {0}")]
    Session(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RunbookError>;
