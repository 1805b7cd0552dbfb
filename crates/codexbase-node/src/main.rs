//! CodexBase node - Git hosting and social coding server.
//!
//! This is the main entry point for running a CodexBase node.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codexbase_ai::AiClient;
use codexbase_node::{create_router, AppState, Config};
use codexbase_types::UserId;

/// CodexBase Node - Git hosting and social coding backend
#[derive(Parser, Debug)]
#[command(name = "codexbase-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// API listen address (overrides the configuration file)
    #[arg(long)]
    listen_addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("codexbase={}", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting CodexBase node");

    let mut state = AppState::new();
    for (token, user) in &config.tokens {
        state.tokens.register(token, UserId::new(user.as_str()));
    }
    if let Some(ai) = &config.ai {
        tracing::info!(endpoint = %ai.endpoint, model = %ai.model, "AI collaborator enabled");
        state = state.with_ai(AiClient::new(&ai.endpoint, ai.model.as_str())?);
    }

    let listen_addr: SocketAddr = match args.listen_addr {
        Some(addr) => addr,
        None => config.listen_addr.parse()?,
    };

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "API server listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
