//! Built-in prompt catalogue used when nothing is stored

use crate::{Prompt, PromptSet};
use rand::seq::SliceRandom;
use rand::Rng;

/// Number of default prompts switched on at startup
pub const DEFAULT_ACTIVE_COUNT: usize = 3;

/// (color, text, display text) for each default prompt
pub const DEFAULT_PROMPTS: [(&str, &str, &str); 16] = [
    ("#9900ff", "Bossa Nova", "波萨诺瓦"),
    ("#5200ff", "Synthwave", "电波音乐"),
    ("#ff25f6", "Drum and Bass", "鼓打贝斯"),
    ("#2af6de", "Post Punk", "后朋克"),
    ("#ffdd28", "Shoegaze", "鞋履凝视"),
    ("#2af6de", "Funk", "放克"),
    ("#9900ff", "Chiptune", "芯片音乐"),
    ("#3dffab", "Rich Strings", "丰富弦乐"),
    ("#d8ff3e", "Sparkling Arpeggios", "闪亮琶音"),
    ("#d9b2ff", "Staccato Beats", "断奏节拍"),
    ("#3dffab", "Powerful Kick Drum", "有力底鼓"),
    ("#ffdd28", "Disco", "迪斯科"),
    ("#ff25f6", "K-POP", "K-POP"),
    ("#d8ff3e", "Neo Soul", "新灵魂乐"),
    ("#5200ff", "Trance", "神游舞曲"),
    ("#d9b2ff", "Thrash Metal", "激流金属"),
];

/// Build the default prompt set with a random few prompts at weight 1
///
/// Ids are `prompt-<index>` and the control number is the index.
pub fn default_prompts<R: Rng + ?Sized>(rng: &mut R) -> PromptSet {
    let mut indices: Vec<usize> = (0..DEFAULT_PROMPTS.len()).collect();
    indices.shuffle(rng);
    let start_on = &indices[..DEFAULT_ACTIVE_COUNT];

    let prompts = DEFAULT_PROMPTS
        .iter()
        .enumerate()
        .map(|(i, (color, text, display_text))| {
            let weight = if start_on.contains(&i) { 1.0 } else { 0.0 };
            Prompt::new(format!("prompt-{}", i), *text, i as u8, *color)
                .with_display_text(*display_text)
                .with_weight(weight)
        });

    PromptSet::from_prompts(prompts)
}
