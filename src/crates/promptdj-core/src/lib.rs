//! Prompt data model for promptdj
//!
//! This crate holds the plain data the streaming engine steers with:
//!
//! - **Prompt** / **PromptSet**: user-edited weighted text prompts, in display order
//! - **FilteredPrompts**: texts the generation session has rejected
//! - **WeightedPrompt**: the `{text, weight}` pair sent to the session
//! - **PlaybackState**: the engine's four playback states
//! - **PromptStore**: JSON persistence with a built-in default catalogue
//!
//! # Examples
//!
//! ```
//! use promptdj_core::{FilteredPrompts, Prompt, PromptSet};
//!
//! let prompts = PromptSet::from_prompts(vec![
//!     Prompt::new("a", "Funk", 0, "#2af6de").with_weight(1.0),
//!     Prompt::new("b", "Disco", 1, "#ffdd28"),
//! ]);
//!
//! let sent = prompts.weighted_prompts(&FilteredPrompts::new());
//! assert_eq!(sent.len(), 1);
//! ```

pub mod defaults;
pub mod error;
pub mod filtered;
pub mod playback;
pub mod prompt;
pub mod prompt_set;
pub mod store;

pub use defaults::{default_prompts, DEFAULT_PROMPTS};
pub use error::{CoreError, Result};
pub use filtered::FilteredPrompts;
pub use playback::PlaybackState;
pub use prompt::{Prompt, PromptChange, WeightedPrompt};
pub use prompt_set::PromptSet;
pub use store::{PromptStore, STORAGE_KEY};
