//! Guardian proxy server binary.
//!
//! Launchable by any application that wants its AI completion traffic
//! intercepted: start the proxy, point the client-side hook at its port,
//! and watch the telemetry log.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guardian_server::{Server, ServerConfig, VERSION};

#[derive(Parser, Debug)]
#[command(name = "guardian", version, about = "Intercepting proxy for AI completion traffic")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to a rules document (JSON or YAML). Built-in rules are used
    /// when omitted or unreadable.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Composite score threshold for automatically blocking requests.
    #[arg(long, default_value_t = 0.85)]
    threshold: f64,

    /// Enable content analysis.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    nlp: bool,

    /// Service name, reported in startup logs.
    #[arg(long, default_value = "guardian-app")]
    service: String,

    /// Environment (development, staging, production).
    #[arg(long, default_value = "development")]
    env: String,

    /// Enable verbose logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Guardian v{VERSION} starting...");
    info!(service = %cli.service, environment = %cli.env, "configuration loaded");

    let mut config = ServerConfig::default()
        .with_port(cli.port)
        .with_threshold(cli.threshold);
    if let Some(rules) = cli.rules {
        config = config.with_rules_path(rules);
    }
    if !cli.nlp {
        config = config.without_analysis();
    }

    let handle = Server::new(config)?.spawn()?;
    info!("ready to protect AI endpoints on {}", handle.addr());

    shutdown_signal().await;
    info!("shutting down");
    handle.shutdown().await?;
    info!("Guardian shutdown complete");
    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
