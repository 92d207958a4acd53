//! The generation service seam
//!
//! The engine never talks to a transport directly. A [`SessionGateway`]
//! opens sessions; each [`Connection`] pairs the control half
//! ([`MusicSession`]) with a single-consumer channel of inbound
//! [`SessionEvent`]s. Transports that speak the service's JSON frames hand
//! them to [`forward_message`].

use crate::{EngineError, Result, ServerMessage, SessionEvent, WeightedPromptsRequest};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Capacity of a session's inbound event channel
pub const SESSION_EVENT_CAPACITY: usize = 64;

/// Parameters for opening a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    /// Model identifier
    pub model: String,
}

/// Control half of a live generation session
#[async_trait]
pub trait MusicSession: Send + Sync {
    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Replace the session's prompt state
    async fn set_weighted_prompts(&self, request: &WeightedPromptsRequest) -> Result<()>;
}

/// An open session and its inbound events
pub struct Connection {
    pub session: Box<dyn MusicSession>,
    pub events: mpsc::Receiver<SessionEvent>,
}

impl Connection {
    pub fn new(session: Box<dyn MusicSession>, events: mpsc::Receiver<SessionEvent>) -> Self {
        Connection { session, events }
    }
}

/// Opens generation sessions
#[async_trait]
pub trait SessionGateway: Send + Sync {
    async fn connect(&self, config: &ConnectConfig) -> Result<Connection>;
}

/// Create the event channel a gateway feeds a connection with
pub fn event_channel() -> (mpsc::Sender<SessionEvent>, mpsc::Receiver<SessionEvent>) {
    mpsc::channel(SESSION_EVENT_CAPACITY)
}

/// Parse one JSON frame and queue its events in handling order
pub async fn forward_message(events: &mpsc::Sender<SessionEvent>, frame: &str) -> Result<()> {
    for event in ServerMessage::parse(frame)?.into_events() {
        events.send(event).await.map_err(|_| EngineError::Closed)?;
    }
    Ok(())
}
