//! The audio output seam used by the playback scheduler

use crate::{AudioBuffer, Result};

/// Audio output chain: scheduling clock, fade stage and volume stage
///
/// All methods take `&self` so one output can be shared between the
/// scheduler (fades) and a volume control; implementations use interior
/// mutability.
pub trait AudioOutput: Send + Sync {
    /// Seconds on the output clock; monotonically non-decreasing, never blocks
    fn current_time(&self) -> f64;

    /// Schedule a buffer to begin at `start_time` on the output clock
    ///
    /// Returns the buffer's duration in seconds.
    fn schedule_buffer(&self, buffer: AudioBuffer, start_time: f64) -> f64;

    /// Ramp the fade stage linearly from `from` to `to`, starting now
    fn ramp_gain(&self, from: f32, to: f32, duration: f64);

    /// Route later buffers to a fresh fade stage at unity gain
    ///
    /// Buffers already scheduled stay on the old stage and keep its gain
    /// automation, so a fade-out in progress is not disturbed by audio
    /// scheduled afterwards. The old stage is dropped once it has faded to
    /// silence.
    fn replace_stage(&self);

    /// Set the volume stage directly (0.0 when muted)
    fn set_volume(&self, volume: f32);

    /// Start or resume the clock and the underlying device
    fn resume(&self) -> Result<()>;
}
