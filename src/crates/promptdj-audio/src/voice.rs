//! A buffer scheduled to start at an exact frame of the output clock

use crate::AudioBuffer;

/// Playback of one scheduled buffer
pub struct ScheduledVoice {
    /// The buffer being played
    buffer: AudioBuffer,
    /// Output frame at which playback begins
    start_frame: u64,
    /// Current read position in the buffer (in source frames)
    position: f64,
    /// Whether this voice still has frames to play
    active: bool,
}

impl ScheduledVoice {
    /// Schedule a buffer to begin at `start_frame` of the output clock
    pub fn new(buffer: AudioBuffer, start_frame: u64) -> Self {
        let active = buffer.frames() > 0;
        ScheduledVoice {
            buffer,
            start_frame,
            position: 0.0,
            active,
        }
    }

    /// Check if this voice is still active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mix this voice into an interleaved output block
    ///
    /// `first_frame` is the output-clock frame of the block's first frame.
    /// Frames before the voice's start are left untouched.
    pub fn fill_buffer(&mut self, output: &mut [f32], channels: u16, first_frame: u64, output_sample_rate: u32) {
        if !self.active || channels == 0 {
            return;
        }

        let channels = channels as usize;
        let frames = output.len() / channels;
        let end_frame = first_frame + frames as u64;
        if self.start_frame >= end_frame {
            return;
        }

        let skip = self.start_frame.saturating_sub(first_frame) as usize;
        let source_frames = self.buffer.frames() as f64;
        let rate_ratio = self.buffer.sample_rate as f64 / output_sample_rate as f64;
        let source_channels = self.buffer.channels as usize;

        for frame in output.chunks_mut(channels).skip(skip) {
            if self.position >= source_frames {
                self.active = false;
                return;
            }
            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample += self.interpolate_sample_at_position(self.position, channel % source_channels);
            }
            self.position += rate_ratio;
        }

        if self.position >= source_frames {
            self.active = false;
        }
    }

    /// Interpolate sample at the given fractional position using linear interpolation
    ///
    /// Needed whenever the buffer's sample rate differs from the output rate.
    fn interpolate_sample_at_position(&self, frame_position: f64, channel_offset: usize) -> f32 {
        let data = &self.buffer.data;
        let channels = self.buffer.channels as usize;

        // For stereo: frame 0 has indices [0, 1], frame 1 has indices [2, 3], etc.
        let base_index = (frame_position.floor() as usize) * channels + channel_offset;

        if base_index >= data.len() {
            return 0.0;
        }

        let fraction = (frame_position - frame_position.floor()) as f32;
        let sample_current = data[base_index];

        // Last frame: nothing to interpolate towards
        let next_index = base_index + channels;
        if next_index >= data.len() {
            return sample_current;
        }

        let sample_next = data[next_index];
        sample_current + (sample_next - sample_current) * fraction
    }
}
