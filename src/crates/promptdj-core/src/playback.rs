use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback state of the streaming engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing requested; the initial state
    #[default]
    Stopped,
    /// Play requested, filling the buffer-ahead window
    Loading,
    /// Audio is being scheduled and heard
    Playing,
    /// Paused by the user or by a failed update
    Paused,
}

impl PlaybackState {
    /// Stopped or paused: inbound audio is discarded in these states
    pub fn is_idle(&self) -> bool {
        matches!(self, PlaybackState::Stopped | PlaybackState::Paused)
    }

    /// Loading or playing: the session is generating for us
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Loading | PlaybackState::Playing)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        };
        write!(f, "{}", s)
    }
}
