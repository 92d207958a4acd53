//! Prints engine events to the console
//!
//! Plays the part of the toast surface and the play button: notifications
//! and state changes are shown as they happen.

use chrono::Local;
use promptdj_engine::EngineEvent;
use tokio::sync::mpsc;

/// Console line for an event
pub fn describe(event: &EngineEvent) -> String {
    match event {
        EngineEvent::Notification(notification) => format!(
            "[{}] {}",
            notification.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            notification.message
        ),
        EngineEvent::PlaybackState(state) => format!("> {}", state),
        EngineEvent::PromptsChanged(prompts) => {
            let active: Vec<String> = prompts
                .iter()
                .filter(|p| p.is_active())
                .map(|p| p.to_string())
                .collect();
            if active.is_empty() {
                "prompts: (none active)".to_string()
            } else {
                format!("prompts: {}", active.join(", "))
            }
        }
    }
}

/// Print events until the engine goes away
pub async fn print_events(mut events: mpsc::UnboundedReceiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        println!("{}", describe(&event));
    }
}
