use serde::{Deserialize, Serialize};
use std::fmt;

/// A single weighted text prompt steering the generation session
///
/// Field names follow the persisted JSON layout
/// (`{promptId, text, weight, cc, color}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    /// Stable identifier, unique within a prompt set
    pub prompt_id: String,
    /// Text sent to the generation session
    pub text: String,
    /// Optional label shown instead of `text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    /// Influence weight; 0 disables the prompt
    pub weight: f64,
    /// MIDI control-change number bound to this prompt
    pub cc: u8,
    /// Color token used by the controls
    pub color: String,
}

impl Prompt {
    /// Create an inactive prompt
    pub fn new(prompt_id: impl Into<String>, text: impl Into<String>, cc: u8, color: impl Into<String>) -> Self {
        Prompt {
            prompt_id: prompt_id.into(),
            text: text.into(),
            display_text: None,
            weight: 0.0,
            cc,
            color: color.into(),
        }
    }

    /// Set the weight (builder style)
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the display text (builder style)
    pub fn with_display_text(mut self, display_text: impl Into<String>) -> Self {
        self.display_text = Some(display_text.into());
        self
    }

    /// Whether this prompt contributes to generation
    pub fn is_active(&self) -> bool {
        self.weight != 0.0
    }

    /// Label for rendering: the display text when present, otherwise the text
    pub fn label(&self) -> &str {
        self.display_text.as_deref().unwrap_or(&self.text)
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.text, self.weight)
    }
}

/// The `{text, weight}` pair sent to the generation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPrompt {
    pub text: String,
    pub weight: f64,
}

impl From<&Prompt> for WeightedPrompt {
    fn from(prompt: &Prompt) -> Self {
        WeightedPrompt {
            text: prompt.text.clone(),
            weight: prompt.weight,
        }
    }
}

impl fmt::Display for WeightedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.text, self.weight)
    }
}

/// An edit to one prompt, as emitted by a control (`prompt-changed`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptChange {
    pub prompt_id: String,
    pub text: String,
    pub weight: f64,
    pub cc: u8,
}
