//! Line-based console controls
//!
//! Stands in for the knobs, the play button and the volume slider. Each
//! line is one command; prompts are addressed by id or by position.

use anyhow::{anyhow, bail, Result};
use promptdj_core::{PromptChange, PromptSet};
use promptdj_engine::{EngineHandle, EngineSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

pub const HELP: &str = "\
Commands:
  p, play            play / pause (stops while loading)
  r, restart         restart generation with the current weights
  w <prompt> <w>     set a prompt's weight (prompt = id or list position)
  t <prompt> <text>  change a prompt's text
  v <0..1>           set volume
  m, mute            toggle mute
  reset              restore the default prompts
  s, status          show prompts and playback state
  h, help            show this help
  q, quit            save and exit";

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    PlayPause,
    Restart,
    Weight { prompt: String, weight: f64 },
    Text { prompt: String, text: String },
    Volume(f32),
    ToggleMute,
    Reset,
    Status,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse a line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let Some((word, rest)) = split_word(line) else {
            return Ok(None);
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "p" | "play" | "pause" => ConsoleCommand::PlayPause,
            "r" | "restart" => ConsoleCommand::Restart,
            "w" | "weight" => {
                let (prompt, value) = split_word(rest).ok_or_else(|| anyhow!("usage: w <prompt> <weight>"))?;
                let weight = value
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("invalid weight '{}'", value.trim()))?;
                ConsoleCommand::Weight {
                    prompt: prompt.to_string(),
                    weight,
                }
            }
            "t" | "text" => {
                let (prompt, text) = split_word(rest).ok_or_else(|| anyhow!("usage: t <prompt> <text>"))?;
                if text.trim().is_empty() {
                    bail!("usage: t <prompt> <text>");
                }
                ConsoleCommand::Text {
                    prompt: prompt.to_string(),
                    text: text.trim().to_string(),
                }
            }
            "v" | "volume" => {
                let volume: f32 = rest.trim().parse().map_err(|_| anyhow!("usage: v <0..1>"))?;
                ConsoleCommand::Volume(volume.clamp(0.0, 1.0))
            }
            "m" | "mute" => ConsoleCommand::ToggleMute,
            "reset" => ConsoleCommand::Reset,
            "s" | "status" => ConsoleCommand::Status,
            "h" | "help" | "?" => ConsoleCommand::Help,
            "q" | "quit" | "exit" => ConsoleCommand::Quit,
            other => bail!("unknown command '{}', try 'help'", other),
        };
        Ok(Some(command))
    }
}

fn split_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(s.split_once(char::is_whitespace).unwrap_or((s, "")))
}

/// Find a prompt by id, or by 0-based position in display order
fn find_prompt<'a>(prompts: &'a PromptSet, key: &str) -> Option<&'a promptdj_core::Prompt> {
    prompts
        .get(key)
        .or_else(|| key.parse::<usize>().ok().and_then(|i| prompts.iter().nth(i)))
}

/// Render the status table
pub fn format_status(snapshot: &EngineSnapshot) -> String {
    let mut out = format!(
        "state: {}  connected: {}  volume: {:.2}{}\n",
        snapshot.playback_state,
        snapshot.connected,
        snapshot.volume,
        if snapshot.muted { " (muted)" } else { "" }
    );
    for (i, prompt) in snapshot.prompts.iter().enumerate() {
        let filtered = if snapshot.filtered.contains(&prompt.text) {
            "  [filtered]"
        } else {
            ""
        };
        out.push_str(&format!(
            "{:>3}  {:<12} {:<22} {:>5.2}{}\n",
            i,
            prompt.prompt_id,
            prompt.label(),
            prompt.weight,
            filtered
        ));
    }
    out
}

/// Read commands from stdin until quit or end of input
pub async fn run_console(handle: EngineHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);
    while let Some(line) = lines.next_line().await? {
        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        debug!(?command, "Console command");

        match command {
            ConsoleCommand::PlayPause => handle.play_pause().await?,
            ConsoleCommand::Restart => handle.force_restart().await?,
            ConsoleCommand::Weight { prompt, weight } => {
                let snapshot = handle.snapshot().await?;
                match find_prompt(&snapshot.prompts, &prompt) {
                    Some(p) => {
                        handle
                            .prompt_changed(PromptChange {
                                prompt_id: p.prompt_id.clone(),
                                text: p.text.clone(),
                                weight,
                                cc: p.cc,
                            })
                            .await?
                    }
                    None => println!("no prompt '{}'", prompt),
                }
            }
            ConsoleCommand::Text { prompt, text } => {
                let snapshot = handle.snapshot().await?;
                match find_prompt(&snapshot.prompts, &prompt) {
                    Some(p) => {
                        handle
                            .prompt_changed(PromptChange {
                                prompt_id: p.prompt_id.clone(),
                                text,
                                weight: p.weight,
                                cc: p.cc,
                            })
                            .await?
                    }
                    None => println!("no prompt '{}'", prompt),
                }
            }
            ConsoleCommand::Volume(volume) => {
                let snapshot = handle.snapshot().await?;
                handle.set_volume(volume, snapshot.muted).await?;
            }
            ConsoleCommand::ToggleMute => {
                let snapshot = handle.snapshot().await?;
                handle.set_volume(snapshot.volume, !snapshot.muted).await?;
            }
            ConsoleCommand::Reset => handle.reset_prompts().await?,
            ConsoleCommand::Status => print!("{}", format_status(&handle.snapshot().await?)),
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => break,
        }
    }
    debug!("Console closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptdj_core::{FilteredPrompts, PlaybackState, Prompt};

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(ConsoleCommand::parse("p").unwrap(), Some(ConsoleCommand::PlayPause));
        assert_eq!(ConsoleCommand::parse(" RESTART ").unwrap(), Some(ConsoleCommand::Restart));
        assert_eq!(ConsoleCommand::parse("m").unwrap(), Some(ConsoleCommand::ToggleMute));
        assert_eq!(ConsoleCommand::parse("quit").unwrap(), Some(ConsoleCommand::Quit));
        assert_eq!(ConsoleCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(
            ConsoleCommand::parse("w prompt-3 1.25").unwrap(),
            Some(ConsoleCommand::Weight {
                prompt: "prompt-3".to_string(),
                weight: 1.25
            })
        );
        assert!(ConsoleCommand::parse("w prompt-3").is_err());
        assert!(ConsoleCommand::parse("w prompt-3 loud").is_err());
    }

    #[test]
    fn test_parse_text_keeps_spaces() {
        assert_eq!(
            ConsoleCommand::parse("t 2 Drum and Bass").unwrap(),
            Some(ConsoleCommand::Text {
                prompt: "2".to_string(),
                text: "Drum and Bass".to_string()
            })
        );
        assert!(ConsoleCommand::parse("t 2").is_err());
    }

    #[test]
    fn test_parse_volume_is_clamped() {
        assert_eq!(ConsoleCommand::parse("v 3").unwrap(), Some(ConsoleCommand::Volume(1.0)));
        assert!(ConsoleCommand::parse("v").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(ConsoleCommand::parse("dance").is_err());
    }

    #[test]
    fn test_find_prompt_by_id_or_position() {
        let prompts = PromptSet::from_prompts(vec![
            Prompt::new("prompt-0", "Funk", 0, "#2af6de"),
            Prompt::new("prompt-1", "Disco", 1, "#ffdd28"),
        ]);
        assert_eq!(find_prompt(&prompts, "prompt-1").unwrap().text, "Disco");
        assert_eq!(find_prompt(&prompts, "0").unwrap().text, "Funk");
        assert!(find_prompt(&prompts, "7").is_none());
    }

    #[test]
    fn test_status_marks_filtered_prompts() {
        let mut filtered = FilteredPrompts::new();
        filtered.insert("Disco");
        let snapshot = EngineSnapshot {
            prompts: PromptSet::from_prompts(vec![
                Prompt::new("prompt-0", "Funk", 0, "#2af6de").with_weight(1.0),
                Prompt::new("prompt-1", "Disco", 1, "#ffdd28"),
            ]),
            filtered,
            playback_state: PlaybackState::Playing,
            connected: true,
            volume: 0.8,
            muted: false,
        };

        let status = format_status(&snapshot);
        assert!(status.starts_with("state: playing"));
        assert!(status.lines().nth(2).unwrap().ends_with("[filtered]"));
        assert!(!status.lines().nth(1).unwrap().contains("[filtered]"));
    }
}
