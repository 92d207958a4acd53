//! Decoded audio ready for scheduling

use std::sync::Arc;

/// Decoded PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved f32 samples, normalized to [-1.0, 1.0]
    pub data: Arc<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl AudioBuffer {
    /// Wrap interleaved samples
    pub fn new(data: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        AudioBuffer {
            data: Arc::new(data),
            sample_rate,
            channels,
        }
    }

    /// A silent buffer of the given length
    pub fn silence(duration: f64, sample_rate: u32, channels: u16) -> Self {
        let frames = (duration * sample_rate as f64).round() as usize;
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    /// Get the duration of this buffer in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Get the number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.data.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
