//! The engine event loop
//!
//! One task owns every piece of mutable state: the prompt set, the filtered
//! texts, the scheduler and the live session. It reacts to one input at a
//! time, checked in order: session events, UI commands, the throttle
//! deadline, then the buffer-window timer. Handlers that await (connecting,
//! restart delays) hold up the loop, so session events queue behind them in
//! arrival order.

use crate::{
    BufferTimer, ChunkOutcome, ConnectConfig, EngineConfig, EngineError, MusicSession, PlaybackScheduler, PromptSync,
    Result, SessionEvent, SessionGateway, SyncOutcome, Throttle,
};
use chrono::{DateTime, Utc};
use promptdj_audio::AudioOutput;
use promptdj_core::{default_prompts, FilteredPrompts, PlaybackState, PromptChange, PromptSet};
use serde::Serialize;
use std::future::pending;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Shown when the session fails or closes
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error, please restart audio.";
/// Shown when there is nothing to send
pub const NO_ACTIVE_PROMPT_MESSAGE: &str = "There needs to be one active prompt to play.";
/// Shown when a manual restart begins
pub const RESTARTING_MESSAGE: &str = "Restarting generation to apply new weights...";

const COMMAND_CAPACITY: usize = 64;

/// A user-visible message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Notification {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Requests from the UI
#[derive(Debug)]
pub enum EngineCommand {
    /// Toggle: play when idle, pause when playing, stop when loading
    PlayPause,
    /// Restart generation now; ignored unless playing
    ForceRestart,
    /// A control edited a prompt
    PromptChanged(PromptChange),
    /// Replace the prompts with a fresh default set
    ResetPrompts,
    /// Volume control moved
    VolumeChanged { volume: f32, muted: bool },
    /// Report the current state
    Snapshot(oneshot::Sender<EngineSnapshot>),
    /// Stop the loop
    Shutdown,
}

/// Notifications to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// The prompt set changed
    PromptsChanged(PromptSet),
    /// The playback state changed
    PlaybackState(PlaybackState),
    /// Something to show the user
    Notification(Notification),
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub prompts: PromptSet,
    pub filtered: FilteredPrompts,
    pub playback_state: PlaybackState,
    /// A session exists and has reported setup complete
    pub connected: bool,
    pub volume: f32,
    pub muted: bool,
}

/// Cloneable sender of [`EngineCommand`]s
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn play_pause(&self) -> Result<()> {
        self.send(EngineCommand::PlayPause).await
    }

    pub async fn force_restart(&self) -> Result<()> {
        self.send(EngineCommand::ForceRestart).await
    }

    pub async fn prompt_changed(&self, change: PromptChange) -> Result<()> {
        self.send(EngineCommand::PromptChanged(change)).await
    }

    pub async fn reset_prompts(&self) -> Result<()> {
        self.send(EngineCommand::ResetPrompts).await
    }

    pub async fn set_volume(&self, volume: f32, muted: bool) -> Result<()> {
        self.send(EngineCommand::VolumeChanged { volume, muted }).await
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(EngineCommand::Snapshot(reply)).await?;
        response.await.map_err(|_| EngineError::Closed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(EngineCommand::Shutdown).await
    }

    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands.send(command).await.map_err(|_| EngineError::Closed)
    }
}

/// What woke the loop
enum Wake {
    Command(Option<EngineCommand>),
    Session(SessionEvent),
    SyncDue,
    BufferElapsed(u64),
}

/// The playback engine
pub struct Engine {
    config: EngineConfig,
    gateway: Arc<dyn SessionGateway>,
    scheduler: PlaybackScheduler,
    sync: PromptSync,
    throttle: Throttle<PromptSet>,
    prompts: PromptSet,
    filtered: FilteredPrompts,
    session: Option<Box<dyn MusicSession>>,
    session_events: Option<mpsc::Receiver<SessionEvent>>,
    /// Set until the live session reports setup complete
    connection_error: bool,
    buffer_deadline: Option<(Instant, u64)>,
    volume: f32,
    muted: bool,
    published_state: PlaybackState,
    commands: mpsc::Receiver<EngineCommand>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl Engine {
    /// Create an engine, its command handle and its event stream
    pub fn new(
        config: EngineConfig,
        gateway: Arc<dyn SessionGateway>,
        output: Arc<dyn AudioOutput>,
        prompts: PromptSet,
    ) -> (Engine, EngineHandle, mpsc::UnboundedReceiver<EngineEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        output.set_volume(config.initial_volume);
        let scheduler = PlaybackScheduler::new(
            output,
            config.buffer_time(),
            config.fade(),
            config.sample_rate,
            config.channels,
        );

        let engine = Engine {
            sync: PromptSync::new(config.restart_delay(), config.force_restart_delay()),
            throttle: Throttle::latest(config.throttle_window()),
            volume: config.initial_volume,
            config,
            gateway,
            scheduler,
            prompts,
            filtered: FilteredPrompts::new(),
            session: None,
            session_events: None,
            connection_error: true,
            buffer_deadline: None,
            muted: false,
            published_state: PlaybackState::Stopped,
            commands: command_rx,
            events: event_tx,
        };

        (engine, EngineHandle { commands: command_tx }, event_rx)
    }

    /// Connect, then process inputs until shutdown
    ///
    /// Returns the final prompt set so the caller can persist it.
    pub async fn run(mut self) -> PromptSet {
        self.connect_and_sync().await;

        loop {
            let throttle_deadline = self.throttle.deadline();
            let buffer_deadline = self.buffer_deadline;

            let wake = tokio::select! {
                biased;
                event = next_session_event(&mut self.session_events) => Wake::Session(event),
                command = self.commands.recv() => Wake::Command(command),
                _ = sleep_until_opt(throttle_deadline) => Wake::SyncDue,
                generation = sleep_until_timer(buffer_deadline) => Wake::BufferElapsed(generation),
            };

            match wake {
                Wake::Command(None) | Wake::Command(Some(EngineCommand::Shutdown)) => break,
                Wake::Command(Some(command)) => self.handle_command(command).await,
                Wake::Session(event) => self.handle_session_event(event).await,
                Wake::SyncDue => {
                    if let Some(prompts) = self.throttle.poll(Instant::now()) {
                        self.sync_prompts(&prompts).await;
                    }
                }
                Wake::BufferElapsed(generation) => {
                    self.buffer_deadline = None;
                    self.scheduler.on_buffer_elapsed(generation);
                }
            }
            self.publish_state();
        }

        info!("Engine shut down");
        self.prompts
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::PlayPause => self.play_pause().await,
            EngineCommand::ForceRestart => self.force_restart().await,
            EngineCommand::PromptChanged(change) => {
                match self.prompts.apply_change(&change, self.config.max_weight) {
                    Ok(prompt) => debug!(prompt = %prompt, "Prompt changed"),
                    Err(e) => {
                        warn!("Ignoring prompt change: {}", e);
                        return;
                    }
                }
                self.prompts_changed();
            }
            EngineCommand::ResetPrompts => {
                self.prompts = default_prompts(&mut rand::thread_rng());
                info!("Reset prompts to defaults");
                self.prompts_changed();
            }
            EngineCommand::VolumeChanged { volume, muted } => {
                self.volume = volume.clamp(0.0, 1.0);
                self.muted = muted;
                let effective = if muted { 0.0 } else { self.volume };
                self.scheduler.output().set_volume(effective);
            }
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            // Handled by the loop
            EngineCommand::Shutdown => {}
        }
    }

    async fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SetupComplete => {
                info!("Session setup complete");
                self.connection_error = false;
            }
            SessionEvent::FilteredPrompt { text, reason } => {
                warn!(text = %text, reason = %reason, "Prompt filtered");
                self.filtered.insert(text);
                self.notify(reason);
            }
            SessionEvent::AudioChunk(data) => match self.scheduler.on_chunk(&data) {
                ChunkOutcome::Scheduled {
                    timer: Some(BufferTimer { generation, delay }),
                    ..
                } => {
                    self.buffer_deadline = Some((Instant::now() + delay, generation));
                }
                ChunkOutcome::DecodeFailed(e) => debug!("Chunk skipped: {}", e),
                _ => {}
            },
            SessionEvent::Error(message) | SessionEvent::Closed(message) => {
                error!("Session ended: {}", message);
                self.connection_error = true;
                self.session_events = None;
                self.stop().await;
                self.notify(CONNECTION_ERROR_MESSAGE);
            }
        }
    }

    async fn play_pause(&mut self) {
        match self.scheduler.state() {
            PlaybackState::Playing => self.pause().await,
            PlaybackState::Loading => self.stop().await,
            PlaybackState::Paused | PlaybackState::Stopped => self.play().await,
        }
    }

    async fn play(&mut self) {
        if !self.prompts.has_active(&self.filtered) {
            self.notify(NO_ACTIVE_PROMPT_MESSAGE);
            self.pause().await;
            return;
        }
        if self.connection_error && !self.connect_and_sync().await {
            return;
        }

        if let Err(e) = self.scheduler.play() {
            error!("Failed to start audio output: {}", e);
            self.notify(e.to_string());
            return;
        }

        let Some(session) = self.session.as_deref() else {
            return;
        };
        if let Err(e) = session.play().await {
            self.notify(e.to_string());
            self.pause().await;
        }
    }

    async fn pause(&mut self) {
        if let Some(session) = self.session.as_deref() {
            if let Err(e) = session.pause().await {
                debug!("Session pause failed: {}", e);
            }
        }
        self.scheduler.pause();
        self.buffer_deadline = None;
    }

    async fn stop(&mut self) {
        if let Some(session) = self.session.as_deref() {
            if let Err(e) = session.stop().await {
                debug!("Session stop failed: {}", e);
            }
        }
        self.scheduler.stop();
        self.buffer_deadline = None;
    }

    async fn force_restart(&mut self) {
        if self.scheduler.state() != PlaybackState::Playing {
            debug!("Ignoring restart while {}", self.scheduler.state());
            return;
        }
        let Some(session) = self.session.as_deref() else {
            return;
        };

        self.notify(RESTARTING_MESSAGE);
        let prompts = self.prompts.weighted_prompts(&self.filtered);
        let outcome = self.sync.force_restart(session, &mut self.scheduler, prompts).await;
        self.handle_sync_outcome(outcome).await;
    }

    /// Open a session and hand it the current prompts right away
    ///
    /// A new session has no prompt state, so the send skips the throttle.
    /// False when the gateway refused or the send failed.
    async fn connect_and_sync(&mut self) -> bool {
        if !self.connect().await {
            return false;
        }
        self.throttle.cancel();
        let prompts = self.prompts.clone();
        self.sync_prompts(&prompts).await
    }

    /// Open a fresh session; false when the gateway refused
    async fn connect(&mut self) -> bool {
        let config = ConnectConfig {
            model: self.config.model.clone(),
        };
        info!(model = %config.model, "Connecting to session");

        match self.gateway.connect(&config).await {
            Ok(connection) => {
                self.session = Some(connection.session);
                self.session_events = Some(connection.events);
                true
            }
            Err(e) => {
                error!("Failed to connect: {}", e);
                self.connection_error = true;
                self.notify(e.to_string());
                false
            }
        }
    }

    fn prompts_changed(&mut self) {
        let _ = self.events.send(EngineEvent::PromptsChanged(self.prompts.clone()));
        self.queue_sync();
    }

    fn queue_sync(&mut self) {
        self.throttle.call(Instant::now(), self.prompts.clone());
    }

    /// Push prompts to the live session; true when they were accepted
    async fn sync_prompts(&mut self, prompts: &PromptSet) -> bool {
        let weighted = prompts.weighted_prompts(&self.filtered);
        let Some(session) = self.session.as_deref() else {
            debug!("No session, dropping prompt update");
            return false;
        };
        let outcome = self.sync.push(session, &mut self.scheduler, weighted).await;
        self.handle_sync_outcome(outcome).await
    }

    async fn handle_sync_outcome(&mut self, outcome: SyncOutcome) -> bool {
        match outcome {
            SyncOutcome::Sent(count) => {
                info!(count, "Weighted prompts sent");
                true
            }
            SyncOutcome::Skipped => false,
            SyncOutcome::NoActivePrompts => {
                self.notify(NO_ACTIVE_PROMPT_MESSAGE);
                self.pause().await;
                false
            }
            SyncOutcome::Failed(e) => {
                error!("Prompt sync failed: {}", e);
                self.notify(e.to_string());
                self.pause().await;
                false
            }
        }
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            prompts: self.prompts.clone(),
            filtered: self.filtered.clone(),
            playback_state: self.scheduler.state(),
            connected: self.session.is_some() && !self.connection_error,
            volume: self.volume,
            muted: self.muted,
        }
    }

    fn notify(&self, message: impl Into<String>) {
        let _ = self.events.send(EngineEvent::Notification(Notification::new(message)));
    }

    fn publish_state(&mut self) {
        let state = self.scheduler.state();
        if state != self.published_state {
            self.published_state = state;
            let _ = self.events.send(EngineEvent::PlaybackState(state));
        }
    }
}

async fn next_session_event(events: &mut Option<mpsc::Receiver<SessionEvent>>) -> SessionEvent {
    match events {
        Some(receiver) => receiver
            .recv()
            .await
            .unwrap_or_else(|| SessionEvent::Closed("Session event stream ended".to_string())),
        None => pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn sleep_until_timer(timer: Option<(Instant, u64)>) -> u64 {
    match timer {
        Some((deadline, generation)) => {
            sleep_until(deadline).await;
            generation
        }
        None => pending().await,
    }
}
