//! Audio output device using cpal
//!
//! Owns the default output device and drives an [`OutputChain`] from the
//! stream callback. A cpal stream cannot leave the thread that built it, so
//! the stream lives on a dedicated thread and is controlled over a channel.

use crate::{AudioBuffer, AudioError, AudioOutput, OutputChain, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;
use tracing::{debug, error, info};

enum StreamCommand {
    Play(mpsc::Sender<Result<()>>),
    Shutdown,
}

/// The default output device driving an output chain
pub struct DeviceOutput {
    chain: OutputChain,
    control: mpsc::Sender<StreamCommand>,
    /// Serializes resume requests so the stream is started once
    resume_lock: Mutex<()>,
    running: AtomicBool,
    thread: Option<JoinHandle<()>>,
}

impl DeviceOutput {
    /// Open the default output device
    ///
    /// The stream is built paused; the clock starts on the first
    /// [`AudioOutput::resume`].
    pub fn open() -> Result<Self> {
        let (control, commands) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("promptdj-audio".to_string())
            .spawn(move || run_stream_thread(ready_tx, commands))
            .map_err(|e| AudioError::DeviceError(format!("Failed to spawn audio thread: {}", e)))?;

        let chain = ready_rx
            .recv()
            .map_err(|_| AudioError::DeviceError("Audio thread exited during setup".to_string()))??;

        info!(
            sample_rate = chain.sample_rate(),
            channels = chain.channels(),
            "Opened audio output device"
        );

        Ok(DeviceOutput {
            chain,
            control,
            resume_lock: Mutex::new(()),
            running: AtomicBool::new(false),
            thread: Some(thread),
        })
    }

    /// Get the sample rate of the output device
    pub fn sample_rate(&self) -> u32 {
        self.chain.sample_rate()
    }

    /// Check if the audio stream is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

fn run_stream_thread(ready: mpsc::Sender<Result<OutputChain>>, commands: mpsc::Receiver<StreamCommand>) {
    let (stream, chain) = match build_stream() {
        Ok(built) => built,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready.send(Ok(chain)).is_err() {
        return;
    }

    while let Ok(command) = commands.recv() {
        match command {
            StreamCommand::Play(reply) => {
                let result = stream
                    .play()
                    .map_err(|e| AudioError::DeviceError(format!("Failed to play stream: {}", e)));
                let _ = reply.send(result);
            }
            StreamCommand::Shutdown => break,
        }
    }

    if let Err(e) = stream.pause() {
        debug!("Failed to pause stream on shutdown: {}", e);
    }
}

fn build_stream() -> Result<(cpal::Stream, OutputChain)> {
    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceError("No output device available".to_string()))?;

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceError(format!("Failed to get default config: {}", e)))?;

    let chain = OutputChain::new(config.sample_rate().0, config.channels());
    let config: cpal::StreamConfig = config.into();

    let render_chain = chain.clone();
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                render_chain.render(data);
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::DeviceError(format!("Failed to build stream: {}", e)))?;

    Ok((stream, chain))
}

impl AudioOutput for DeviceOutput {
    fn current_time(&self) -> f64 {
        self.chain.current_time()
    }

    fn schedule_buffer(&self, buffer: AudioBuffer, start_time: f64) -> f64 {
        self.chain.schedule_buffer(buffer, start_time)
    }

    fn ramp_gain(&self, from: f32, to: f32, duration: f64) {
        self.chain.ramp_gain(from, to, duration)
    }

    fn replace_stage(&self) {
        self.chain.replace_stage()
    }

    fn set_volume(&self, volume: f32) {
        self.chain.set_volume(volume)
    }

    fn resume(&self) -> Result<()> {
        let _guard = self.resume_lock.lock();
        if self.is_running() {
            return Ok(());
        }

        let (reply_tx, reply_rx) = mpsc::channel();
        self.control
            .send(StreamCommand::Play(reply_tx))
            .map_err(|_| AudioError::DeviceError("Audio thread is gone".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| AudioError::DeviceError("Audio thread is gone".to_string()))??;

        self.running.store(true, Ordering::Release);
        debug!("Audio stream started");
        Ok(())
    }
}

impl Drop for DeviceOutput {
    fn drop(&mut self) {
        let _ = self.control.send(StreamCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
