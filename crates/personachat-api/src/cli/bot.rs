//! Bot catalogue CLI command.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use personachat_types::persona::Persona;

use crate::state::AppState;

/// List the available bots with their effective instruction.
///
/// # Examples
///
/// ```bash
/// pchat bots
/// pchat bots --json
/// ```
pub fn list_bots(state: &AppState, json: bool) -> Result<()> {
    if json {
        let bots: Vec<serde_json::Value> = Persona::ALL
            .iter()
            .map(|p| {
                serde_json::json!({
                    "bot_id": p.bot_id(),
                    "slug": p.slug(),
                    "instruction": state.personas.instruction(*p),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&bots)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Bot").fg(Color::White),
        Cell::new("Slug").fg(Color::White),
        Cell::new("Instruction").fg(Color::White),
    ]);

    for persona in Persona::ALL {
        table.add_row(vec![
            Cell::new(persona.bot_id()).fg(Color::Cyan),
            Cell::new(persona.slug()).fg(Color::DarkGrey),
            Cell::new(truncate(state.personas.instruction(persona), 60)).fg(Color::White),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  Start a conversation with: {}",
        style("pchat chat <slug>").yellow()
    );
    println!();

    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "🔹 You are in Rainmaker Mode";
        let out = truncate(text, 8);
        assert_eq!(out.chars().count(), 8);
        assert!(out.ends_with("..."));
        assert!(out.starts_with('🔹'));
    }
}
