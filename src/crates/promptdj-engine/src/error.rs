//! Error types for the engine

use promptdj_audio::AudioError;

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to connect: {0}")]
    Connection(String),

    #[error("{0}")]
    Session(String),

    #[error("Invalid server message: {0}")]
    Message(#[from] serde_json::Error),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("Engine has shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, EngineError>;
