use crate::{CoreError, FilteredPrompts, Prompt, PromptChange, Result, WeightedPrompt};
use serde::{Deserialize, Serialize};

/// Ordered collection of prompts keyed by `prompt_id`
///
/// Insertion order is kept for rendering; it has no effect on what is sent.
/// Serializes as a plain JSON array of prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Prompt>", into = "Vec<Prompt>")]
pub struct PromptSet {
    prompts: Vec<Prompt>,
}

impl PromptSet {
    /// Create an empty prompt set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from prompts; a repeated id replaces the earlier entry in place
    pub fn from_prompts<I>(prompts: I) -> Self
    where
        I: IntoIterator<Item = Prompt>,
    {
        let mut set = PromptSet::new();
        for prompt in prompts {
            set.insert(prompt);
        }
        set
    }

    /// Insert or replace a prompt, returning the replaced one
    pub fn insert(&mut self, prompt: Prompt) -> Option<Prompt> {
        match self.position(&prompt.prompt_id) {
            Some(index) => Some(std::mem::replace(&mut self.prompts[index], prompt)),
            None => {
                self.prompts.push(prompt);
                None
            }
        }
    }

    /// Look up a prompt by id
    pub fn get(&self, prompt_id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.prompt_id == prompt_id)
    }

    /// Apply a control edit to an existing prompt
    ///
    /// The weight is clamped to `[0, max_weight]`; NaN becomes 0.
    pub fn apply_change(&mut self, change: &PromptChange, max_weight: f64) -> Result<&Prompt> {
        let index = self
            .position(&change.prompt_id)
            .ok_or_else(|| CoreError::UnknownPrompt(change.prompt_id.clone()))?;

        let prompt = &mut self.prompts[index];
        prompt.text = change.text.clone();
        prompt.weight = clamp_weight(change.weight, max_weight);
        prompt.cc = change.cc;
        Ok(prompt)
    }

    /// Prompts to send: non-zero weight and text not rejected by the session
    pub fn weighted_prompts(&self, filtered: &FilteredPrompts) -> Vec<WeightedPrompt> {
        self.prompts
            .iter()
            .filter(|p| p.is_active() && !filtered.contains(&p.text))
            .map(WeightedPrompt::from)
            .collect()
    }

    /// Whether at least one prompt would be sent
    pub fn has_active(&self, filtered: &FilteredPrompts) -> bool {
        self.prompts
            .iter()
            .any(|p| p.is_active() && !filtered.contains(&p.text))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    fn position(&self, prompt_id: &str) -> Option<usize> {
        self.prompts.iter().position(|p| p.prompt_id == prompt_id)
    }
}

fn clamp_weight(weight: f64, max_weight: f64) -> f64 {
    if weight.is_nan() {
        return 0.0;
    }
    weight.clamp(0.0, max_weight.max(0.0))
}

impl From<Vec<Prompt>> for PromptSet {
    fn from(prompts: Vec<Prompt>) -> Self {
        PromptSet::from_prompts(prompts)
    }
}

impl From<PromptSet> for Vec<Prompt> {
    fn from(set: PromptSet) -> Self {
        set.prompts
    }
}

impl<'a> IntoIterator for &'a PromptSet {
    type Item = &'a Prompt;
    type IntoIter = std::slice::Iter<'a, Prompt>;

    fn into_iter(self) -> Self::IntoIter {
        self.prompts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(id: &str, text: &str, weight: f64) -> PromptChange {
        PromptChange {
            prompt_id: id.into(),
            text: text.into(),
            weight,
            cc: 0,
        }
    }

    fn sample_set() -> PromptSet {
        PromptSet::from_prompts(vec![
            Prompt::new("a", "Bossa Nova", 0, "#9900ff").with_weight(1.0),
            Prompt::new("b", "Synthwave", 1, "#5200ff"),
            Prompt::new("c", "Drum and Bass", 2, "#ff25f6").with_weight(0.5),
        ])
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let set = sample_set();
        let ids: Vec<_> = set.iter().map(|p| p.prompt_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = sample_set();
        let old = set.insert(Prompt::new("b", "Chiptune", 1, "#9900ff"));

        assert_eq!(old.map(|p| p.text), Some("Synthwave".to_string()));
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().nth(1).map(|p| p.text.as_str()), Some("Chiptune"));
    }

    #[test]
    fn test_weighted_prompts_skip_inactive() {
        let set = sample_set();
        let sent = set.weighted_prompts(&FilteredPrompts::new());

        assert_eq!(
            sent,
            vec![
                WeightedPrompt { text: "Bossa Nova".into(), weight: 1.0 },
                WeightedPrompt { text: "Drum and Bass".into(), weight: 0.5 },
            ]
        );
    }

    #[test]
    fn test_weighted_prompts_skip_filtered_text() {
        let mut set = sample_set();
        let mut filtered = FilteredPrompts::new();
        filtered.insert("Bossa Nova");

        // A prompt added later with the same text is excluded too
        set.insert(Prompt::new("d", "Bossa Nova", 3, "#2af6de").with_weight(2.0));

        let sent = set.weighted_prompts(&filtered);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "Drum and Bass");
    }

    #[test]
    fn test_has_active() {
        let mut set = sample_set();
        let mut filtered = FilteredPrompts::new();
        assert!(set.has_active(&filtered));

        set.apply_change(&change("a", "Bossa Nova", 0.0), 2.0).unwrap();
        filtered.insert("Drum and Bass");
        assert!(!set.has_active(&filtered));
    }

    #[test]
    fn test_apply_change_clamps_weight() {
        let mut set = sample_set();
        let change = PromptChange {
            prompt_id: "b".into(),
            text: "Shoegaze".into(),
            weight: 7.0,
            cc: 9,
        };

        let prompt = set.apply_change(&change, 2.0).unwrap();
        assert_eq!(prompt.text, "Shoegaze");
        assert_eq!(prompt.weight, 2.0);
        assert_eq!(prompt.cc, 9);
        // Color is not part of an edit
        assert_eq!(prompt.color, "#5200ff");
    }

    #[test]
    fn test_apply_change_rejects_nan_and_negative() {
        let mut set = sample_set();
        let nan = change("a", "Bossa Nova", f64::NAN);
        assert_eq!(set.apply_change(&nan, 2.0).unwrap().weight, 0.0);
        let negative = change("a", "Bossa Nova", -1.0);
        assert_eq!(set.apply_change(&negative, 2.0).unwrap().weight, 0.0);
    }

    #[test]
    fn test_apply_change_unknown_id() {
        let mut set = sample_set();
        let change = PromptChange {
            prompt_id: "missing".into(),
            text: "x".into(),
            weight: 1.0,
            cc: 0,
        };

        assert!(matches!(
            set.apply_change(&change, 2.0),
            Err(CoreError::UnknownPrompt(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_serializes_as_array() {
        let set = sample_set();
        let json = serde_json::to_value(&set).unwrap();

        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 3);

        let back: PromptSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }
}
