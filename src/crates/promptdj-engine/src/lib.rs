//! Streaming playback engine for promptdj
//!
//! The engine sits between a prompt-editing UI, a remote music generation
//! session and an audio output:
//!
//! - **Engine**: single-task event loop owning all mutable state
//! - **PlaybackScheduler**: playback state machine and gapless chunk scheduling
//! - **PromptSync**: pushes weighted prompts, restarting generation when playing
//! - **Throttle**: coalesces bursts of prompt edits into one send per window
//! - **SessionGateway** / **MusicSession**: the generation service seam

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod message;
pub mod scheduler;
pub mod sync;
pub mod throttle;

pub use config::EngineConfig;
pub use engine::{
    Engine, EngineCommand, EngineEvent, EngineHandle, EngineSnapshot, Notification, CONNECTION_ERROR_MESSAGE,
    NO_ACTIVE_PROMPT_MESSAGE, RESTARTING_MESSAGE,
};
pub use error::{EngineError, Result};
pub use gateway::{event_channel, forward_message, ConnectConfig, Connection, MusicSession, SessionGateway};
pub use message::{ServerMessage, SessionEvent, WeightedPromptsRequest};
pub use scheduler::{BufferTimer, ChunkOutcome, PlaybackScheduler};
pub use sync::{PromptSync, SyncOutcome};
pub use throttle::Throttle;
