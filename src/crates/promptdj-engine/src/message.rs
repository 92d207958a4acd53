//! Session wire messages and the events derived from them

use crate::Result;
use promptdj_core::WeightedPrompt;
use serde::{Deserialize, Serialize};

/// A message from the generation service
///
/// Every field is optional; one message may carry several of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_complete: Option<SetupComplete>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_prompt: Option<FilteredPrompt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_content: Option<ServerContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupComplete {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredPrompt {
    pub text: String,
    #[serde(default)]
    pub filtered_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub audio_chunks: Vec<AudioChunk>,
}

/// One encoded audio slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChunk {
    /// Base64 PCM16 payload
    pub data: String,
}

impl ServerMessage {
    /// Parse a JSON message
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Split into session events in the order the engine must handle them
    pub fn into_events(self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.setup_complete.is_some() {
            events.push(SessionEvent::SetupComplete);
        }
        if let Some(filtered) = self.filtered_prompt {
            events.push(SessionEvent::FilteredPrompt {
                text: filtered.text,
                reason: filtered.filtered_reason,
            });
        }
        if let Some(content) = self.server_content {
            events.extend(content.audio_chunks.into_iter().map(|chunk| SessionEvent::AudioChunk(chunk.data)));
        }
        events
    }
}

/// Inbound session event, delivered to the engine in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Session is ready
    SetupComplete,
    /// A prompt text was rejected
    FilteredPrompt { text: String, reason: String },
    /// Base64 PCM16 payload for the next slice of audio
    AudioChunk(String),
    /// Transport error; terminal for the session
    Error(String),
    /// Session closed; terminal for the session
    Closed(String),
}

/// Body of a weighted-prompt update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedPromptsRequest {
    pub weighted_prompts: Vec<WeightedPrompt>,
}

impl WeightedPromptsRequest {
    pub fn new(weighted_prompts: Vec<WeightedPrompt>) -> Self {
        WeightedPromptsRequest { weighted_prompts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setup_complete() {
        let message = ServerMessage::parse(r#"{"setupComplete": {}}"#).unwrap();
        assert_eq!(message.into_events(), vec![SessionEvent::SetupComplete]);
    }

    #[test]
    fn test_parse_filtered_prompt() {
        let json = r#"{"filteredPrompt": {"text": "Shoegaze", "filteredReason": "blocked"}}"#;
        let events = ServerMessage::parse(json).unwrap().into_events();
        assert_eq!(
            events,
            vec![SessionEvent::FilteredPrompt {
                text: "Shoegaze".to_string(),
                reason: "blocked".to_string()
            }]
        );
    }

    #[test]
    fn test_every_audio_chunk_becomes_an_event() {
        let json = r#"{"serverContent": {"audioChunks": [{"data": "AAA="}, {"data": "AQE="}]}}"#;
        let events = ServerMessage::parse(json).unwrap().into_events();
        assert_eq!(
            events,
            vec![
                SessionEvent::AudioChunk("AAA=".to_string()),
                SessionEvent::AudioChunk("AQE=".to_string())
            ]
        );
    }

    #[test]
    fn test_combined_message_order() {
        let json = r#"{
            "serverContent": {"audioChunks": [{"data": "AAA="}]},
            "filteredPrompt": {"text": "X"},
            "setupComplete": {}
        }"#;
        let events = ServerMessage::parse(json).unwrap().into_events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], SessionEvent::SetupComplete);
        assert!(matches!(events[1], SessionEvent::FilteredPrompt { .. }));
        assert!(matches!(events[2], SessionEvent::AudioChunk(_)));
    }

    #[test]
    fn test_empty_message_has_no_events() {
        assert!(ServerMessage::parse("{}").unwrap().into_events().is_empty());
        assert!(ServerMessage::parse("not json").is_err());
    }

    #[test]
    fn test_weighted_prompts_request_json() {
        let request = WeightedPromptsRequest::new(vec![WeightedPrompt {
            text: "Funk".to_string(),
            weight: 1.0,
        }]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["weightedPrompts"][0]["text"], "Funk");
        assert_eq!(json["weightedPrompts"][0]["weight"], 1.0);
    }
}
