//! CLI command definitions and dispatch for the `pchat` binary.
//!
//! Uses clap derive macros for argument parsing. Every command acts on
//! behalf of one user, taken from `--user` or `PERSONACHAT_USER`.

pub mod bot;
pub mod chat;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with persona bots from the terminal or over HTTP.
#[derive(Parser)]
#[command(name = "pchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also emit OpenTelemetry spans (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// User the CLI acts as.
    #[arg(long, global = true, env = "PERSONACHAT_USER", default_value = "local")]
    pub user: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Chat with a bot. Sends one message, or starts an interactive loop
    /// when no message is given.
    Chat {
        /// Bot id or slug (e.g. rainmaker, "Voice Sculptor").
        bot: String,

        /// Message to send.
        message: Option<String>,

        /// Continue this session instead of starting a new one.
        #[arg(long, short)]
        session: Option<String>,

        /// Continue the most recently active session.
        #[arg(long, conflicts_with = "session")]
        resume: bool,
    },

    /// List the available bots.
    Bots,

    /// List sessions with a bot, oldest first.
    Sessions {
        /// Bot id or slug.
        bot: String,
    },

    /// Show the full transcript of a session as Markdown or JSON.
    History {
        /// Bot id or slug.
        bot: String,

        /// Session ID.
        session: String,
    },

    /// Show the context the bot would see before the next message.
    Context {
        /// Bot id or slug.
        bot: String,

        /// Session ID.
        session: String,
    },

    /// Print the most recently active session with a bot.
    #[command(alias = "last")]
    Resume {
        /// Bot id or slug.
        bot: String,
    },

    /// Delete a session and its transcript.
    #[command(alias = "rm")]
    Delete {
        /// Bot id or slug.
        bot: String,

        /// Session ID.
        session: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Parse a bot argument into a persona, with a helpful error.
pub(crate) fn parse_bot(raw: &str) -> anyhow::Result<personachat_types::persona::Persona> {
    raw.parse()
        .map_err(|e: String| anyhow::anyhow!("{e}. Run `pchat bots` to see the available bots"))
}
