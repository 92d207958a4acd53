use thiserror::Error;

/// Errors from the prompt data model and its persistence
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
