//! Scheduled audio output for promptdj
//!
//! This crate turns decoded chunks into gapless sound:
//! - Decode base64 PCM16 chunk payloads into [`AudioBuffer`]s
//! - Schedule buffers at exact start times on a frame clock
//! - Fade and volume stages with click-free gain ramps
//! - Drive the whole chain from the default cpal output device

pub mod buffer;
pub mod chain;
pub mod device;
pub mod gain;
pub mod output;
pub mod pcm;
pub mod voice;

pub use buffer::AudioBuffer;
pub use chain::OutputChain;
pub use device::DeviceOutput;
pub use gain::GainParam;
pub use output::AudioOutput;
pub use pcm::{decode_chunk, encode_chunk};
pub use voice::ScheduledVoice;

/// Audio output errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Audio device error: {0}")]
    DeviceError(String),

    #[error("Failed to decode audio: {0}")]
    DecodeError(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;
