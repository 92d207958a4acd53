//! Playback state machine and buffer-ahead scheduling
//!
//! The scheduler owns the playback state and the next start time on the
//! output clock. The first chunk of a window is placed `buffer_time` seconds
//! ahead of now; each later chunk starts where the previous one ends. A
//! chunk that arrives after its slot has passed is an underrun: it is
//! dropped and the next chunk opens a fresh window.
//!
//! Every method runs to completion without awaiting, so the state and the
//! next start time are always read and written together.

use promptdj_audio::{decode_chunk, AudioError, AudioOutput};
use promptdj_core::PlaybackState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Request to flip Loading to Playing once the buffer window has elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferTimer {
    /// Identifies the request; stale generations are ignored
    pub generation: u64,
    pub delay: Duration,
}

/// What happened to an inbound chunk
#[derive(Debug)]
pub enum ChunkOutcome {
    /// Placed on the output clock
    Scheduled {
        start: f64,
        duration: f64,
        /// Set when this chunk opened a new buffer window
        timer: Option<BufferTimer>,
    },
    /// Arrived after its slot; dropped, state is Loading
    Underrun { late_by: f64 },
    /// Discarded because playback is paused or stopped
    Ignored,
    /// Payload could not be decoded; skipped
    DecodeFailed(AudioError),
}

/// Owns the playback state and places chunks on the output clock
pub struct PlaybackScheduler {
    output: Arc<dyn AudioOutput>,
    state: PlaybackState,
    /// Where the next chunk starts; `None` when no window is open
    next_start_time: Option<f64>,
    buffer_time: f64,
    fade: f64,
    sample_rate: u32,
    channels: u16,
    timer_generation: u64,
}

impl PlaybackScheduler {
    /// Create a stopped scheduler for chunks in the given format
    pub fn new(output: Arc<dyn AudioOutput>, buffer_time: f64, fade: f64, sample_rate: u32, channels: u16) -> Self {
        PlaybackScheduler {
            output,
            state: PlaybackState::Stopped,
            next_start_time: None,
            buffer_time,
            fade,
            sample_rate,
            channels,
            timer_generation: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn next_start_time(&self) -> Option<f64> {
        self.next_start_time
    }

    pub fn buffer_time(&self) -> f64 {
        self.buffer_time
    }

    pub fn output(&self) -> &Arc<dyn AudioOutput> {
        &self.output
    }

    /// Start loading: resume the output and fade in
    ///
    /// On a device failure the state is left unchanged.
    pub fn play(&mut self) -> crate::Result<()> {
        self.output.resume()?;
        self.output.ramp_gain(0.0, 1.0, self.fade);
        self.set_state(PlaybackState::Loading);
        Ok(())
    }

    /// Fade out and isolate the fade from anything scheduled later
    pub fn pause(&mut self) {
        self.output.ramp_gain(1.0, 0.0, self.fade);
        self.output.replace_stage();
        self.cancel_timer();
        self.next_start_time = None;
        self.set_state(PlaybackState::Paused);
    }

    /// Silence pending audio and restore the fade stage to unity
    pub fn stop(&mut self) {
        self.output.ramp_gain(1.0, 0.0, self.fade);
        self.output.replace_stage();
        self.output.ramp_gain(0.0, 1.0, self.fade);
        self.cancel_timer();
        self.next_start_time = None;
        self.set_state(PlaybackState::Stopped);
    }

    /// Forget the open window; the next chunk opens a new one
    pub fn reset_clock(&mut self) {
        self.next_start_time = None;
    }

    /// Reset the clock and wait for a fresh window
    pub fn restart_loading(&mut self) {
        self.reset_clock();
        self.set_state(PlaybackState::Loading);
    }

    /// Handle an inbound chunk payload
    pub fn on_chunk(&mut self, encoded: &str) -> ChunkOutcome {
        if self.state.is_idle() {
            trace!(state = %self.state, "Discarding chunk while idle");
            return ChunkOutcome::Ignored;
        }

        let buffer = match decode_chunk(encoded, self.sample_rate, self.channels) {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("Skipping undecodable chunk: {}", e);
                return ChunkOutcome::DecodeFailed(e);
            }
        };

        let now = self.output.current_time();
        let mut timer = None;
        let start = match self.next_start_time {
            Some(start) => start,
            None => {
                let start = now + self.buffer_time;
                debug!(now, start, "Opening buffer window");
                timer = Some(self.arm_timer());
                start
            }
        };

        if start < now {
            let late_by = now - start;
            info!(late_by, "Playback underrun, rebuffering");
            self.next_start_time = None;
            self.set_state(PlaybackState::Loading);
            return ChunkOutcome::Underrun { late_by };
        }

        let duration = self.output.schedule_buffer(buffer, start);
        self.next_start_time = Some(start + duration);
        trace!(start, duration, "Scheduled chunk");

        ChunkOutcome::Scheduled { start, duration, timer }
    }

    /// The buffer window for `generation` has elapsed
    ///
    /// Returns true when this moved the state to Playing.
    pub fn on_buffer_elapsed(&mut self, generation: u64) -> bool {
        if generation != self.timer_generation || self.state.is_idle() {
            return false;
        }
        let changed = self.state != PlaybackState::Playing;
        self.set_state(PlaybackState::Playing);
        changed
    }

    fn arm_timer(&mut self) -> BufferTimer {
        self.timer_generation += 1;
        BufferTimer {
            generation: self.timer_generation,
            delay: Duration::from_secs_f64(self.buffer_time),
        }
    }

    fn cancel_timer(&mut self) {
        self.timer_generation += 1;
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Playback state changed");
            self.state = state;
        }
    }
}
