//! A local stand-in for the generation service
//!
//! `ToneGateway` opens sessions that synthesize a chord from the active
//! prompts: each prompt text picks a pitch, each weight sets its level.
//! Everything inbound travels as the service's JSON frames: setup, filtered
//! prompts and real-time base64 PCM16 chunks.

use async_trait::async_trait;
use parking_lot::Mutex;
use promptdj_audio::{encode_chunk, AudioBuffer};
use promptdj_core::WeightedPrompt;
use promptdj_engine::message::{AudioChunk, FilteredPrompt, ServerContent, SetupComplete};
use promptdj_engine::{
    event_channel, forward_message, ConnectConfig, Connection, MusicSession, ServerMessage, SessionEvent,
    SessionGateway, WeightedPromptsRequest,
};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A minor pentatonic scale over two octaves from A3
const SCALE_HZ: [f64; 10] = [
    220.0, 261.63, 293.66, 329.63, 392.0, 440.0, 523.25, 587.33, 659.25, 783.99,
];

/// Seconds of audio per chunk
const CHUNK_SECS: f64 = 0.5;

/// Peak level of the whole chord
const LEVEL: f64 = 0.2;

/// Opens synthetic sessions
pub struct ToneGateway {
    sample_rate: u32,
    channels: u16,
    /// Prompt texts every session rejects
    blocked: Vec<String>,
}

impl ToneGateway {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        ToneGateway {
            sample_rate,
            channels,
            blocked: Vec::new(),
        }
    }

    pub fn with_blocked(mut self, blocked: Vec<String>) -> Self {
        self.blocked = blocked;
        self
    }
}

#[async_trait]
impl SessionGateway for ToneGateway {
    async fn connect(&self, config: &ConnectConfig) -> promptdj_engine::Result<Connection> {
        info!(model = %config.model, "Opening local tone session");

        let (sender, events) = event_channel();
        let setup = ServerMessage {
            setup_complete: Some(SetupComplete {}),
            ..ServerMessage::default()
        };
        send_frame(&sender, &setup).await?;

        let state = Arc::new(Mutex::new(Synth::new(self.sample_rate, self.channels)));
        tokio::spawn(generate(state.clone(), sender.clone()));

        let session = ToneSession {
            state,
            events: sender,
            blocked: self.blocked.clone(),
        };
        Ok(Connection::new(Box::new(session), events))
    }
}

struct ToneSession {
    state: Arc<Mutex<Synth>>,
    events: mpsc::Sender<SessionEvent>,
    blocked: Vec<String>,
}

#[async_trait]
impl MusicSession for ToneSession {
    async fn play(&self) -> promptdj_engine::Result<()> {
        self.state.lock().playing = true;
        Ok(())
    }

    async fn pause(&self) -> promptdj_engine::Result<()> {
        self.state.lock().playing = false;
        Ok(())
    }

    async fn stop(&self) -> promptdj_engine::Result<()> {
        let mut synth = self.state.lock();
        synth.playing = false;
        synth.phases.clear();
        Ok(())
    }

    async fn set_weighted_prompts(&self, request: &WeightedPromptsRequest) -> promptdj_engine::Result<()> {
        let mut allowed = Vec::new();
        for prompt in &request.weighted_prompts {
            if self.blocked.iter().any(|b| b.eq_ignore_ascii_case(&prompt.text)) {
                let rejected = ServerMessage {
                    filtered_prompt: Some(FilteredPrompt {
                        text: prompt.text.clone(),
                        filtered_reason: format!("\"{}\" is not allowed in this session", prompt.text),
                    }),
                    ..ServerMessage::default()
                };
                send_frame(&self.events, &rejected).await?;
            } else {
                allowed.push(prompt.clone());
            }
        }
        debug!(count = allowed.len(), "Tone session prompts updated");
        self.state.lock().set_prompts(allowed);
        Ok(())
    }
}

impl Drop for ToneSession {
    fn drop(&mut self) {
        self.state.lock().closed = true;
    }
}

/// Produce one chunk per chunk duration while the session plays
async fn generate(state: Arc<Mutex<Synth>>, events: mpsc::Sender<SessionEvent>) {
    let mut ticks = tokio::time::interval(Duration::from_secs_f64(CHUNK_SECS));
    loop {
        ticks.tick().await;
        let chunk = {
            let mut synth = state.lock();
            if synth.closed {
                break;
            }
            if synth.playing {
                Some(synth.render(CHUNK_SECS))
            } else {
                None
            }
        };
        if let Some(data) = chunk {
            let content = ServerMessage {
                server_content: Some(ServerContent {
                    audio_chunks: vec![AudioChunk { data }],
                }),
                ..ServerMessage::default()
            };
            if let Err(e) = send_frame(&events, &content).await {
                debug!("Tone generator stopped: {}", e);
                return;
            }
        }
    }
    debug!("Tone generator stopped");
}

/// Encode a message as a wire frame and hand it to the engine
async fn send_frame(events: &mpsc::Sender<SessionEvent>, message: &ServerMessage) -> promptdj_engine::Result<()> {
    let frame = serde_json::to_string(message)?;
    forward_message(events, &frame).await
}

/// Additive synthesizer state
struct Synth {
    sample_rate: u32,
    channels: u16,
    playing: bool,
    closed: bool,
    /// (frequency, level) per voice
    voices: Vec<(f64, f64)>,
    /// Phase per voice in cycles, carried across chunks
    phases: Vec<f64>,
}

impl Synth {
    fn new(sample_rate: u32, channels: u16) -> Self {
        Synth {
            sample_rate,
            channels,
            playing: false,
            closed: false,
            voices: Vec::new(),
            phases: Vec::new(),
        }
    }

    fn set_prompts(&mut self, prompts: Vec<WeightedPrompt>) {
        let total: f64 = prompts.iter().map(|p| p.weight).sum();
        self.voices = prompts
            .iter()
            .filter(|p| p.weight > 0.0)
            .map(|p| (pitch_for(&p.text), LEVEL * p.weight / total.max(1.0)))
            .collect();
        self.phases.resize(self.voices.len(), 0.0);
    }

    /// Render `seconds` of the chord as a base64 PCM16 chunk
    fn render(&mut self, seconds: f64) -> String {
        let frames = (seconds * self.sample_rate as f64).round() as usize;
        let channels = self.channels as usize;
        let mut data = vec![0.0f32; frames * channels];
        self.phases.resize(self.voices.len(), 0.0);

        for ((frequency, level), phase) in self.voices.iter().zip(self.phases.iter_mut()) {
            let step = frequency / self.sample_rate as f64;
            for frame in data.chunks_mut(channels) {
                let sample = (level * (TAU * *phase).sin()) as f32;
                for s in frame.iter_mut() {
                    *s += sample;
                }
                *phase = (*phase + step).fract();
            }
        }

        encode_chunk(&AudioBuffer::new(data, self.sample_rate, self.channels))
    }
}

/// Stable pitch for a prompt text
fn pitch_for(text: &str) -> f64 {
    let hash = text
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b.to_ascii_lowercase() as u32));
    SCALE_HZ[hash as usize % SCALE_HZ.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptdj_audio::decode_chunk;

    fn weighted(text: &str, weight: f64) -> WeightedPrompt {
        WeightedPrompt {
            text: text.to_string(),
            weight,
        }
    }

    #[test]
    fn test_pitch_is_stable_and_in_scale() {
        assert_eq!(pitch_for("Funk"), pitch_for("funk"));
        assert!(SCALE_HZ.contains(&pitch_for("Shoegaze")));
    }

    #[test]
    fn test_render_chunk_shape() {
        let mut synth = Synth::new(1000, 2);
        synth.set_prompts(vec![weighted("Funk", 1.0), weighted("Disco", 0.0)]);
        assert_eq!(synth.voices.len(), 1);

        let chunk = synth.render(0.5);
        let buffer = decode_chunk(&chunk, 1000, 2).unwrap();
        assert_eq!(buffer.frames(), 500);
        assert!(buffer.data.iter().any(|&s| s != 0.0));
        assert!(buffer.data.iter().all(|&s| s.abs() <= LEVEL as f32 + 1e-3));
    }

    #[test]
    fn test_silent_without_prompts() {
        let mut synth = Synth::new(1000, 1);
        let buffer = decode_chunk(&synth.render(0.1), 1000, 1).unwrap();
        assert!(buffer.data.iter().all(|&s| s == 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_streams_while_playing() {
        let gateway = ToneGateway::new(1000, 2);
        let config = ConnectConfig {
            model: "local".to_string(),
        };
        let Connection { session, mut events } = gateway.connect(&config).await.unwrap();

        assert_eq!(events.recv().await, Some(SessionEvent::SetupComplete));

        session
            .set_weighted_prompts(&WeightedPromptsRequest::new(vec![weighted("Funk", 1.0)]))
            .await
            .unwrap();
        session.play().await.unwrap();

        match events.recv().await {
            Some(SessionEvent::AudioChunk(data)) => {
                assert_eq!(decode_chunk(&data, 1000, 2).unwrap().frames(), 500);
            }
            other => panic!("expected a chunk, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_prompt_is_filtered() {
        let gateway = ToneGateway::new(1000, 2).with_blocked(vec!["disco".to_string()]);
        let config = ConnectConfig {
            model: "local".to_string(),
        };
        let Connection { session, mut events } = gateway.connect(&config).await.unwrap();
        events.recv().await;

        session
            .set_weighted_prompts(&WeightedPromptsRequest::new(vec![
                weighted("Funk", 1.0),
                weighted("Disco", 1.0),
            ]))
            .await
            .unwrap();

        match events.recv().await {
            Some(SessionEvent::FilteredPrompt { text, .. }) => assert_eq!(text, "Disco"),
            other => panic!("expected a filtered prompt, got {:?}", other),
        }
    }
}
