//! Chat CLI command: one-shot send or an interactive loop.
//!
//! The session id is resolved up front so that a failed turn in the loop
//! does not lose the session; the next message continues it.

use std::time::Duration;

use anyhow::Result;
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use personachat_core::chat::registry::SessionRegistry;
use personachat_types::chat::{ChatReply, ChatRequest};
use personachat_types::error::ConversationError;
use personachat_types::persona::Persona;

use crate::cli::parse_bot;
use crate::http::error::COMPLETION_FAILED_MESSAGE;
use crate::state::AppState;

/// Commands recognised inside the interactive loop.
const EXIT_COMMANDS: [&str; 3] = ["/exit", "/quit", "/q"];

/// Send a message, or start an interactive loop when `message` is `None`.
///
/// # Examples
///
/// ```bash
/// pchat chat rainmaker "How do I pitch this?"
/// pchat chat rainmaker --resume
/// pchat chat insight-magus --session "Insight-Magus_2024-05-01T10:00:00.000000"
/// ```
pub async fn run_chat(
    state: &AppState,
    user_id: &str,
    bot: &str,
    message: Option<String>,
    session: Option<String>,
    resume: bool,
    json: bool,
) -> Result<()> {
    let bot = parse_bot(bot)?;
    let conversation = &state.conversation;

    let requested = if resume {
        conversation.resume(user_id, bot).await?
    } else {
        session
    };
    let session_id = conversation
        .registry()
        .resolve_or_create(user_id, bot, requested.as_deref());

    match message {
        Some(text) => {
            let reply = send(state, user_id, bot, &session_id, text, !json)
                .await
                .map_err(|e| match e {
                    ConversationError::CompletionFailed(detail) => {
                        tracing::debug!(%detail, "completion failed");
                        anyhow::anyhow!(COMPLETION_FAILED_MESSAGE)
                    }
                    other => other.into(),
                })?;
            print_reply(bot, &reply, json)?;
            Ok(())
        }
        None => interactive(state, user_id, bot, session_id).await,
    }
}

async fn interactive(state: &AppState, user_id: &str, bot: Persona, session_id: String) -> Result<()> {
    println!();
    println!(
        "  Chatting with {} {}",
        style(bot.bot_id()).cyan().bold(),
        style(format!("(session {session_id})")).dim()
    );
    println!(
        "  {}",
        style(format!("Type {} to leave.", EXIT_COMMANDS.join(", "))).dim()
    );
    println!();

    loop {
        let line = match Input::<String>::new()
            .with_prompt(style("You").green().bold().to_string())
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            // Ctrl+C / closed stdin
            Err(_) => break,
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&text) {
            break;
        }

        match send(state, user_id, bot, &session_id, text.to_string(), true).await {
            Ok(reply) => print_reply(bot, &reply, false)?,
            Err(ConversationError::CompletionFailed(detail)) => {
                tracing::debug!(%detail, "completion failed");
                println!(
                    "  {} {}",
                    style("!").red().bold(),
                    COMPLETION_FAILED_MESSAGE
                );
                println!();
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!(
        "  {} Resume later with: {}",
        style("i").blue().bold(),
        style(format!("pchat chat {} --session \"{session_id}\"", bot.slug())).yellow()
    );
    Ok(())
}

async fn send(
    state: &AppState,
    user_id: &str,
    bot: Persona,
    session_id: &str,
    text: String,
    show_spinner: bool,
) -> Result<ChatReply, ConversationError> {
    let spinner = show_spinner.then(|| {
        let spinner = ProgressBar::new_spinner();
        if let Ok(tpl) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(tpl);
        }
        spinner.set_message(format!("{} is thinking...", bot.bot_id()));
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    });

    let result = state
        .conversation
        .send_message(ChatRequest {
            user_id: user_id.to_string(),
            bot,
            session_id: Some(session_id.to_string()),
            text,
        })
        .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    result
}

fn print_reply(bot: Persona, reply: &ChatReply, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
        return Ok(());
    }

    println!("{} {}", style(format!("{}:", bot.bot_id())).cyan().bold(), reply.reply);
    println!();
    Ok(())
}
