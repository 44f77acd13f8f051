//! personachat CLI and REST API entry point.
//!
//! Binary name: `pchat`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let serving = matches!(cli.command, Commands::Serve { .. });
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 if serving => "info",
        0 => "warn",
        1 => "info,personachat_core=debug,personachat_infra=debug,personachat_api=debug",
        _ => "trace",
    };

    personachat_observe::tracing_setup::init_tracing(cli.otel, filter)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "pchat", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, services)
    let state = AppState::init().await?;
    let user = cli.user.as_str();

    match cli.command {
        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(
                %addr,
                data_dir = %state.data_dir.display(),
                model = %state.config.completion.model,
                context_window = state.config.chat.context_window,
                "starting API server"
            );

            if !cli.quiet {
                println!(
                    "  {} personachat API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Chat {
            bot,
            message,
            session,
            resume,
        } => {
            cli::chat::run_chat(&state, user, &bot, message, session, resume, cli.json).await?;
        }

        Commands::Bots => {
            cli::bot::list_bots(&state, cli.json)?;
        }

        Commands::Sessions { bot } => {
            cli::session::list_sessions(&state, user, &bot, cli.json).await?;
        }

        Commands::History { bot, session } => {
            cli::session::show_history(&state, user, &bot, &session, cli.json).await?;
        }

        Commands::Context { bot, session } => {
            cli::session::show_context(&state, user, &bot, &session, cli.json).await?;
        }

        Commands::Resume { bot } => {
            cli::session::resume_session(&state, user, &bot, cli.json).await?;
        }

        Commands::Delete {
            bot,
            session,
            force,
        } => {
            cli::session::delete_session(&state, user, &bot, &session, force, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    personachat_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
