//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model requested when connecting a session
pub const DEFAULT_MODEL: &str = "lyria-realtime-exp";

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Model identifier passed to the gateway on connect
    pub model: String,
    /// Look-ahead before the first chunk of a window becomes audible
    pub buffer_time_secs: f64,
    /// Prompt sends are coalesced within this window
    pub throttle_window_ms: u64,
    /// Pause between stop and play when an edit restarts generation
    pub restart_delay_ms: u64,
    /// Pause between stop and the prompt resend on a manual restart
    pub force_restart_delay_ms: u64,
    /// Length of pause, stop and play gain ramps
    pub fade_secs: f64,
    /// Ceiling for prompt weights
    pub max_weight: f64,
    /// Sample rate of incoming PCM chunks
    pub sample_rate: u32,
    /// Channel count of incoming PCM chunks
    pub channels: u16,
    /// Output volume at startup
    pub initial_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            model: DEFAULT_MODEL.to_string(),
            buffer_time_secs: 2.0,
            throttle_window_ms: 300,
            restart_delay_ms: 100,
            force_restart_delay_ms: 200,
            fade_secs: 0.1,
            max_weight: 2.0,
            sample_rate: 48000,
            channels: 2,
            initial_volume: 0.8,
        }
    }
}

impl EngineConfig {
    /// Buffer-ahead window in seconds, never negative
    pub fn buffer_time(&self) -> f64 {
        self.buffer_time_secs.max(0.0)
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn force_restart_delay(&self) -> Duration {
        Duration::from_millis(self.force_restart_delay_ms)
    }

    pub fn fade(&self) -> f64 {
        self.fade_secs.max(0.0)
    }
}
