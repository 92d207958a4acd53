//! JSON file persistence for the prompt set
//!
//! The file is a JSON object; the prompt set lives under a single key as an
//! array of `{promptId, text, weight, cc, color}`. Other keys are preserved
//! on save.

use crate::{default_prompts, PromptSet, Result};
use rand::Rng;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Storage key holding the prompt set
pub const STORAGE_KEY: &str = "prompts";

/// Loads and saves the prompt set
#[derive(Debug, Clone)]
pub struct PromptStore {
    path: PathBuf,
}

impl PromptStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PromptStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored prompt set
    ///
    /// Returns `Ok(None)` when the file or the key does not exist.
    pub fn load(&self) -> Result<Option<PromptSet>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let mut root: Map<String, Value> = serde_json::from_str(&contents)?;
        match root.remove(STORAGE_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Load the stored prompt set, or build the defaults if it is missing or unreadable
    pub fn load_or_default<R: Rng + ?Sized>(&self, rng: &mut R) -> PromptSet {
        match self.load() {
            Ok(Some(prompts)) => {
                info!(path = %self.path.display(), count = prompts.len(), "Loaded stored prompts");
                prompts
            }
            Ok(None) => {
                info!("No stored prompts, using defaults");
                default_prompts(rng)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse stored prompts, using defaults");
                default_prompts(rng)
            }
        }
    }

    /// Write the prompt set under the storage key
    pub fn save(&self, prompts: &PromptSet) -> Result<()> {
        // Keep unrelated keys; an unreadable file is simply overwritten
        let mut root: Map<String, Value> = fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        root.insert(STORAGE_KEY.to_string(), serde_json::to_value(prompts)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&root)?)?;
        debug!(path = %self.path.display(), count = prompts.len(), "Saved prompts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prompt;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("promptdj-store-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("state.json")
    }

    #[test]
    fn test_missing_file_loads_none() {
        let store = PromptStore::new(temp_path("missing"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let store = PromptStore::new(temp_path("roundtrip"));
        let prompts = PromptSet::from_prompts(vec![
            Prompt::new("prompt-0", "Funk", 5, "#2af6de").with_weight(1.25),
            Prompt::new("prompt-1", "Disco", 11, "#ffdd28"),
        ]);

        store.save(&prompts).unwrap();
        assert_eq!(store.load().unwrap(), Some(prompts));
    }

    #[test]
    fn test_save_keeps_other_keys() {
        let path = temp_path("otherkeys");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"volume": 0.5}"#).unwrap();

        let store = PromptStore::new(&path);
        store.save(&PromptSet::new()).unwrap();

        let root: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(root["volume"], 0.5);
        assert!(root[STORAGE_KEY].is_array());
    }

    #[test]
    fn test_unparsable_falls_back_to_defaults() {
        let path = temp_path("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json at all").unwrap();

        let store = PromptStore::new(&path);
        assert!(store.load().is_err());

        let mut rng = StdRng::seed_from_u64(1);
        let prompts = store.load_or_default(&mut rng);
        assert_eq!(prompts.len(), 16);
    }

    fn arb_prompt() -> impl Strategy<Value = Prompt> {
        ("[a-z]{1,8}", "[A-Za-z ]{1,16}", 0u32..=200, any::<u8>(), "#[0-9a-f]{6}").prop_map(
            |(id, text, centi, cc, color)| {
                Prompt::new(id, text, cc, color).with_weight(centi as f64 / 100.0)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_json_round_trip(prompts in prop::collection::vec(arb_prompt(), 0..12)) {
            let set = PromptSet::from_prompts(prompts);
            let json = serde_json::to_string(&set).unwrap();
            let back: PromptSet = serde_json::from_str(&json).unwrap();

            prop_assert_eq!(back.len(), set.len());
            for prompt in set.iter() {
                let loaded = back.get(&prompt.prompt_id).unwrap();
                prop_assert_eq!(&loaded.text, &prompt.text);
                prop_assert_eq!(loaded.weight, prompt.weight);
                prop_assert_eq!(loaded.cc, prompt.cc);
                prop_assert_eq!(&loaded.color, &prompt.color);
            }
        }
    }
}
