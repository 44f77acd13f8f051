//! Session management CLI commands: list, resume, history, context, delete.
//!
//! Provides session browsing with rich tables, Markdown/JSON transcripts,
//! and deletion with confirmation prompt.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use personachat_types::chat::MessageRole;

use crate::cli::bot::truncate;
use crate::cli::parse_bot;
use crate::state::AppState;

/// List sessions with a bot, oldest first.
///
/// # Examples
///
/// ```bash
/// pchat sessions rainmaker
/// pchat sessions rainmaker --json
/// ```
pub async fn list_sessions(state: &AppState, user_id: &str, bot: &str, json: bool) -> Result<()> {
    let bot = parse_bot(bot)?;
    let sessions = state.conversation.list_sessions(user_id, bot).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions found with '{}'. Start one with: {}",
            style("i").blue().bold(),
            style(bot.bot_id()).cyan(),
            style(format!("pchat chat {}", bot.slug())).yellow()
        );
        println!();
        return Ok(());
    }

    let last_active = state.conversation.resume(user_id, bot).await?;

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Session").fg(Color::White),
        Cell::new("Started").fg(Color::White),
        Cell::new("").fg(Color::White),
    ]);

    for session in &sessions {
        let marker = if last_active.as_deref() == Some(session.session_id.as_str()) {
            Cell::new("last active").fg(Color::Green)
        } else {
            Cell::new("")
        };

        table.add_row(vec![
            Cell::new(&session.session_id).fg(Color::Cyan),
            Cell::new(session.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::White),
            marker,
        ]);
    }

    println!();
    println!("  Sessions with '{}'", style(bot.bot_id()).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print the most recently active session id, if any.
pub async fn resume_session(state: &AppState, user_id: &str, bot: &str, json: bool) -> Result<()> {
    let bot = parse_bot(bot)?;
    let session_id = state.conversation.resume(user_id, bot).await?;

    if json {
        println!("{}", serde_json::json!({ "session_id": session_id }));
        return Ok(());
    }

    match session_id {
        Some(id) => println!("{id}"),
        None => println!(
            "  {} No active session with '{}'.",
            style("i").blue().bold(),
            style(bot.bot_id()).cyan()
        ),
    }
    Ok(())
}

/// Print a session transcript as Markdown (default) or JSON.
///
/// # Examples
///
/// ```bash
/// pchat history rainmaker <session-id>
/// pchat history rainmaker <session-id> --json
/// ```
pub async fn show_history(
    state: &AppState,
    user_id: &str,
    bot: &str,
    session_id: &str,
    json: bool,
) -> Result<()> {
    let bot = parse_bot(bot)?;
    let messages = state
        .conversation
        .history(user_id, bot, session_id)
        .await?;

    if json {
        let export = serde_json::json!({
            "session_id": session_id,
            "bot": bot.bot_id(),
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    println!("# {} / {session_id}", bot.bot_id());
    println!();
    println!("- **Messages:** {}", messages.len());
    if let (Some(first), Some(last)) = (messages.first(), messages.last()) {
        println!(
            "- **Span:** {} to {}",
            first.timestamp.format("%Y-%m-%d %H:%M UTC"),
            last.timestamp.format("%Y-%m-%d %H:%M UTC")
        );
    }
    println!();
    println!("---");
    println!();

    for msg in &messages {
        let role_label = match msg.role {
            MessageRole::User => "**You**".to_string(),
            MessageRole::Assistant => format!("**{}**", bot.bot_id()),
            MessageRole::System => "**System**".to_string(),
        };

        let timestamp = msg.timestamp.format("%H:%M");
        println!("### {role_label} ({timestamp})");
        println!();
        println!("{}", msg.content);
        println!();
    }

    Ok(())
}

/// Print the context that would precede the next user message.
pub async fn show_context(
    state: &AppState,
    user_id: &str,
    bot: &str,
    session_id: &str,
    json: bool,
) -> Result<()> {
    let bot = parse_bot(bot)?;
    let context = state
        .conversation
        .context_for(user_id, bot, session_id)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Content").fg(Color::White),
    ]);

    for (i, msg) in context.iter().enumerate() {
        let role = match msg.role {
            MessageRole::System => Cell::new("system").fg(Color::Yellow),
            MessageRole::User => Cell::new("user").fg(Color::Green),
            MessageRole::Assistant => Cell::new("assistant").fg(Color::Cyan),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            role,
            Cell::new(truncate(&msg.content, 80)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Delete a session with confirmation.
///
/// # Examples
///
/// ```bash
/// pchat delete rainmaker <session-id>
/// pchat delete rainmaker <session-id> --force
/// ```
pub async fn delete_session(
    state: &AppState,
    user_id: &str,
    bot: &str,
    session_id: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let bot = parse_bot(bot)?;

    if !force && !json {
        let count = state
            .conversation
            .history(user_id, bot, session_id)
            .await?
            .len();
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete session '{}' ({count} messages)?",
                style(session_id).red().bold(),
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state
        .conversation
        .delete_session(user_id, bot, session_id)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "session_id": session_id})
        );
    } else {
        println!(
            "  {} Session '{}' deleted.",
            style("x").red().bold(),
            session_id
        );
    }

    Ok(())
}
