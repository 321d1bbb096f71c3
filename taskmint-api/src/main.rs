//! taskmint - meeting transcript to task list service
//!
//! Turns pasted meeting transcripts into prioritized, tagged action items
//! using a hosted language model, and serves per-user task CRUD over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskmint_api::auth::TokenKeys;
use taskmint_api::extraction::build_language_model;
use taskmint_api::{build_router, cors_layer, AppState};
use taskmint_common::config::TomlConfig;
use taskmint_common::db::init_database;

/// Command-line arguments for taskmint
#[derive(Parser, Debug)]
#[command(name = "taskmint")]
#[command(about = "Meeting transcript to task list service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "TASKMINT_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind (overrides config and environment)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config and environment)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file (overrides config and environment)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config before tracing init so the configured level can seed the filter
    let mut config = TomlConfig::load(args.config.as_deref()).context("Failed to load config")?;
    config
        .apply_env_overrides()
        .context("Invalid environment configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = args.database {
        config.database_path = Some(path);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "taskmint={level},taskmint_api={level},taskmint_common={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting taskmint v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let jwt_secret = config.jwt_secret().context("Authentication not configured")?;
    let ttl_hours = config.token_ttl_hours().context("Authentication not configured")?;
    let tokens = TokenKeys::new(jwt_secret, ttl_hours).context("Authentication not configured")?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    if config.llm.api_key.is_none() {
        warn!("No LLM API key configured; requests to the model may be rejected");
    }
    let llm = build_language_model(&config.llm).context("Failed to configure language model")?;
    info!(
        "Language model: {} ({} at {})",
        llm.name(),
        config.llm.effective_model(),
        config.llm.effective_base_url()
    );

    let cors = cors_layer(config.cors.allowed_origin.as_deref()).context("Invalid CORS setting")?;

    let state = AppState::new(pool, llm, tokens);
    let app = build_router(state).layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("taskmint listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires; the other one still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
