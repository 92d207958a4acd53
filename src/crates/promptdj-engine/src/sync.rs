//! Pushing prompt state to the generation session
//!
//! While audio is playing, a plain prompt update would only steer the
//! generation already in flight. Updates sent during playback therefore
//! bracket the send with a stop/play pair so the model regenerates against
//! the new weights.

use crate::{EngineError, MusicSession, PlaybackScheduler, WeightedPromptsRequest};
use promptdj_core::{PlaybackState, WeightedPrompt};
use std::time::Duration;
use tracing::{debug, info};

/// Result of a prompt push
#[derive(Debug)]
pub enum SyncOutcome {
    /// The session accepted this many weighted prompts
    Sent(usize),
    /// Nothing active to send; the session was not contacted
    NoActivePrompts,
    /// The session rejected a call
    Failed(EngineError),
    /// A manual restart was requested while not playing
    Skipped,
}

/// Decides how prompt updates reach the session
#[derive(Debug, Clone)]
pub struct PromptSync {
    restart_delay: Duration,
    force_restart_delay: Duration,
}

impl PromptSync {
    pub fn new(restart_delay: Duration, force_restart_delay: Duration) -> Self {
        PromptSync {
            restart_delay,
            force_restart_delay,
        }
    }

    /// Send the weighted prompts, restarting generation when playing
    pub async fn push(
        &self,
        session: &dyn MusicSession,
        scheduler: &mut PlaybackScheduler,
        prompts: Vec<WeightedPrompt>,
    ) -> SyncOutcome {
        if prompts.is_empty() {
            return SyncOutcome::NoActivePrompts;
        }
        match self.try_push(session, scheduler, prompts).await {
            Ok(count) => SyncOutcome::Sent(count),
            Err(e) => SyncOutcome::Failed(e),
        }
    }

    async fn try_push(
        &self,
        session: &dyn MusicSession,
        scheduler: &mut PlaybackScheduler,
        prompts: Vec<WeightedPrompt>,
    ) -> crate::Result<usize> {
        let summary = summarize(&prompts);

        if scheduler.state() == PlaybackState::Playing {
            info!("Restarting generation to apply new weights");
            session.stop().await?;
            scheduler.reset_clock();
            tokio::time::sleep(self.restart_delay).await;
            session.play().await?;
        }

        let count = prompts.len();
        session
            .set_weighted_prompts(&WeightedPromptsRequest::new(prompts))
            .await?;
        debug!(prompts = %summary, "Sent weighted prompts");
        Ok(count)
    }

    /// Manually restart generation while playing
    ///
    /// Stop, rebuffer, wait, resend the prompts, then play. A no-op unless
    /// the scheduler is Playing.
    pub async fn force_restart(
        &self,
        session: &dyn MusicSession,
        scheduler: &mut PlaybackScheduler,
        prompts: Vec<WeightedPrompt>,
    ) -> SyncOutcome {
        if scheduler.state() != PlaybackState::Playing {
            return SyncOutcome::Skipped;
        }

        info!("Manual restart of generation");
        if let Err(e) = session.stop().await {
            return SyncOutcome::Failed(e);
        }
        scheduler.restart_loading();
        tokio::time::sleep(self.force_restart_delay).await;

        let count = match self.push(session, scheduler, prompts).await {
            SyncOutcome::Sent(count) => count,
            other => return other,
        };
        match session.play().await {
            Ok(()) => SyncOutcome::Sent(count),
            Err(e) => SyncOutcome::Failed(e),
        }
    }
}

fn summarize(prompts: &[WeightedPrompt]) -> String {
    prompts.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use promptdj_audio::{AudioBuffer, AudioOutput};
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSession {
        calls: Mutex<Vec<String>>,
        fail_send: bool,
    }

    #[async_trait]
    impl MusicSession for RecordingSession {
        async fn play(&self) -> crate::Result<()> {
            self.calls.lock().push("play".into());
            Ok(())
        }

        async fn pause(&self) -> crate::Result<()> {
            self.calls.lock().push("pause".into());
            Ok(())
        }

        async fn stop(&self) -> crate::Result<()> {
            self.calls.lock().push("stop".into());
            Ok(())
        }

        async fn set_weighted_prompts(&self, request: &WeightedPromptsRequest) -> crate::Result<()> {
            if self.fail_send {
                return Err(EngineError::Session("rejected".into()));
            }
            self.calls.lock().push(format!("set:{}", summarize(&request.weighted_prompts)));
            Ok(())
        }
    }

    struct SilentOutput;

    impl AudioOutput for SilentOutput {
        fn current_time(&self) -> f64 {
            0.0
        }
        fn schedule_buffer(&self, buffer: AudioBuffer, _start_time: f64) -> f64 {
            buffer.duration()
        }
        fn ramp_gain(&self, _from: f32, _to: f32, _duration: f64) {}
        fn replace_stage(&self) {}
        fn set_volume(&self, _volume: f32) {}
        fn resume(&self) -> promptdj_audio::Result<()> {
            Ok(())
        }
    }

    fn sync() -> PromptSync {
        PromptSync::new(Duration::from_millis(100), Duration::from_millis(200))
    }

    fn scheduler() -> PlaybackScheduler {
        PlaybackScheduler::new(Arc::new(SilentOutput), 2.0, 0.1, 48000, 2)
    }

    /// Drive a scheduler to Playing with one chunk of silence
    fn playing_scheduler() -> PlaybackScheduler {
        let mut scheduler = scheduler();
        scheduler.play().unwrap();
        let chunk = promptdj_audio::encode_chunk(&AudioBuffer::silence(0.5, 48000, 2));
        scheduler.on_chunk(&chunk);
        assert!(scheduler.on_buffer_elapsed(1));
        scheduler
    }

    fn funk() -> Vec<WeightedPrompt> {
        vec![WeightedPrompt {
            text: "Funk".into(),
            weight: 1.0,
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_when_not_playing_sends_directly() {
        let session = RecordingSession::default();
        let mut scheduler = scheduler();

        let outcome = sync().push(&session, &mut scheduler, funk()).await;
        assert!(matches!(outcome, SyncOutcome::Sent(1)));
        assert_eq!(*session.calls.lock(), vec!["set:Funk=1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_while_playing_restarts() {
        let session = RecordingSession::default();
        let mut scheduler = playing_scheduler();

        let started = tokio::time::Instant::now();
        let outcome = sync().push(&session, &mut scheduler, funk()).await;

        assert!(matches!(outcome, SyncOutcome::Sent(1)));
        assert_eq!(*session.calls.lock(), vec!["stop", "play", "set:Funk=1"]);
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(scheduler.next_start_time(), None);
        assert_eq!(scheduler.state(), PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_list_never_contacts_session() {
        let session = RecordingSession::default();
        let mut scheduler = playing_scheduler();

        let outcome = sync().push(&session, &mut scheduler, vec![]).await;
        assert!(matches!(outcome, SyncOutcome::NoActivePrompts));
        assert!(session.calls.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_is_reported() {
        let session = RecordingSession {
            fail_send: true,
            ..Default::default()
        };
        let mut scheduler = scheduler();

        let outcome = sync().push(&session, &mut scheduler, funk()).await;
        match outcome {
            SyncOutcome::Failed(e) => assert_eq!(e.to_string(), "rejected"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_restart_sequence() {
        let session = RecordingSession::default();
        let mut scheduler = playing_scheduler();

        let started = tokio::time::Instant::now();
        let outcome = sync().force_restart(&session, &mut scheduler, funk()).await;

        assert!(matches!(outcome, SyncOutcome::Sent(1)));
        assert_eq!(*session.calls.lock(), vec!["stop", "set:Funk=1", "play"]);
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(scheduler.state(), PlaybackState::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_restart_requires_playing() {
        let session = RecordingSession::default();
        let mut scheduler = scheduler();

        let outcome = sync().force_restart(&session, &mut scheduler, funk()).await;
        assert!(matches!(outcome, SyncOutcome::Skipped));
        assert!(session.calls.lock().is_empty());
    }
}
