//! tastematch-api - matching service entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tastematch_api::services::SpotifyClient;
use tastematch_api::{build_router, AppState};
use tastematch_common::api::auth::load_token_secret;
use tastematch_common::config::{self, TomlConfig};
use tastematch_common::db::init_database;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tastematch-api
#[derive(Parser, Debug)]
#[command(name = "tastematch-api")]
#[command(about = "Nearby people and venue matching service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "TASTEMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "TASTEMATCH_PORT")]
    port: Option<u16>,

    /// Folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tastematch_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting tastematch-api v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let mut toml_config = TomlConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    toml_config.spotify.apply_env();
    toml_config.matching.validate()?;

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let token_secret = load_token_secret(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load token secret: {}", e))?;
    info!("✓ Token signing secret ready");

    if toml_config.spotify.client_id.is_empty() {
        warn!("Spotify client id not configured; /spotify/login and /spotify/callback will fail");
    }
    let spotify = SpotifyClient::new(toml_config.spotify.clone())
        .context("Failed to build Spotify client")?;

    info!(
        user_radius_km = toml_config.matching.user_radius_km,
        venue_radius_km = toml_config.matching.venue_radius_km,
        "Matching radii"
    );

    let state = AppState::new(pool, token_secret, &toml_config, Arc::new(spotify));
    let app = build_router(state);

    let host: std::net::IpAddr = toml_config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server.host '{}'", toml_config.server.host))?;
    let port = args.port.unwrap_or(toml_config.server.port);
    let addr = SocketAddr::new(host, port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("tastematch-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
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
            Ok(mut sig) => {
                sig.recv().await;
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
