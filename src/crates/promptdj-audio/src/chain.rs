//! The output chain: scheduled voices, fade stages, volume and the frame clock
//!
//! The chain is driven by whoever pulls audio out of it. The cpal device
//! calls [`OutputChain::render`] from its callback; tests and offline tools
//! call it directly. The clock only advances as frames are rendered.

use crate::{AudioBuffer, AudioOutput, GainParam, Result, ScheduledVoice};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// A fade stage and the voices routed through it
struct Stage {
    fade: GainParam,
    voices: Vec<ScheduledVoice>,
    /// No longer receives new voices
    retired: bool,
}

impl Stage {
    fn new() -> Self {
        Stage {
            fade: GainParam::new(1.0),
            voices: Vec::new(),
            retired: false,
        }
    }

    /// A retired stage is finished once it has nothing left to make audible
    fn is_finished(&self, time: f64) -> bool {
        self.retired
            && (self.voices.is_empty() || (!self.fade.is_ramping(time) && self.fade.target() == 0.0))
    }
}

struct ChainState {
    /// Frames rendered since creation; the clock
    frames_rendered: u64,
    /// Retired stages first, the active stage last
    stages: Vec<Stage>,
    /// Volume stage applied after every fade stage
    volume: f32,
    /// Per-stage mix buffer, reused between callbacks
    scratch: Vec<f32>,
}

/// Sample-accurate output chain shared between the scheduler and the device
#[derive(Clone)]
pub struct OutputChain {
    state: Arc<Mutex<ChainState>>,
    sample_rate: u32,
    channels: u16,
}

impl OutputChain {
    /// Create a chain running at the given output format
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        OutputChain {
            state: Arc::new(Mutex::new(ChainState {
                frames_rendered: 0,
                stages: vec![Stage::new()],
                volume: 1.0,
                scratch: Vec::new(),
            })),
            sample_rate,
            channels,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Fill an interleaved output block and advance the clock
    pub fn render(&self, output: &mut [f32]) {
        output.fill(0.0);
        if self.channels == 0 || self.sample_rate == 0 {
            return;
        }

        let channels = self.channels as usize;
        let frames = output.len() / channels;
        let sample_rate = self.sample_rate as f64;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let first_frame = state.frames_rendered;
        state.scratch.resize(output.len(), 0.0);

        for stage in state.stages.iter_mut() {
            state.scratch.fill(0.0);
            stage.voices.retain_mut(|voice| {
                voice.fill_buffer(&mut state.scratch, self.channels, first_frame, self.sample_rate);
                voice.is_active()
            });

            for (index, frame) in state.scratch.chunks(channels).take(frames).enumerate() {
                let time = (first_frame + index as u64) as f64 / sample_rate;
                let gain = stage.fade.value_at(time) * state.volume;
                let out = &mut output[index * channels..(index + 1) * channels];
                for (o, s) in out.iter_mut().zip(frame) {
                    *o += s * gain;
                }
            }
        }

        state.frames_rendered += frames as u64;
        let now = state.frames_rendered as f64 / sample_rate;
        let before = state.stages.len();
        state.stages.retain(|stage| !stage.is_finished(now));
        if state.stages.len() != before {
            trace!(dropped = before - state.stages.len(), "Dropped finished stages");
        }
    }

    /// Number of voices still waiting or playing, across all stages
    pub fn pending_voices(&self) -> usize {
        self.state.lock().stages.iter().map(|s| s.voices.len()).sum()
    }

    /// Number of fade stages, including retired ones still fading
    pub fn stage_count(&self) -> usize {
        self.state.lock().stages.len()
    }

    fn seconds_to_frame(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate as f64).round() as u64
    }
}

impl AudioOutput for OutputChain {
    fn current_time(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.state.lock().frames_rendered as f64 / self.sample_rate as f64
    }

    fn schedule_buffer(&self, buffer: AudioBuffer, start_time: f64) -> f64 {
        let duration = buffer.duration();
        let start_frame = self.seconds_to_frame(start_time);

        let mut state = self.state.lock();
        if let Some(stage) = state.stages.last_mut() {
            stage.voices.push(ScheduledVoice::new(buffer, start_frame));
        }
        duration
    }

    fn ramp_gain(&self, from: f32, to: f32, duration: f64) {
        let now = self.current_time();
        let mut state = self.state.lock();
        if let Some(stage) = state.stages.last_mut() {
            stage.fade.linear_ramp(from, to, now, duration);
        }
    }

    fn replace_stage(&self) {
        let mut state = self.state.lock();
        if let Some(stage) = state.stages.last_mut() {
            stage.retired = true;
        }
        state.stages.push(Stage::new());
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().volume = volume.max(0.0);
    }

    fn resume(&self) -> Result<()> {
        Ok(())
    }
}
