use anyhow::{Context, Result};
use clap::Parser;
use roundcast::SchedulerService;
use roundcast::auth::SharedSecret;
use roundcast::clock::SystemClock;
use roundcast::config::StationConfig;
use roundcast_server::api::{AppState, create_router};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for roundcast-server
#[derive(Parser, Debug)]
#[command(name = "roundcast-server")]
#[command(about = "HTTP server for the 24-hour rolling broadcast scheduler")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "ROUNDCAST_BIND")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "ROUNDCAST_PORT")]
    port: u16,

    /// Key required on playlist and override changes
    #[arg(long, env = "ROUNDCAST_BROADCAST_KEY", hide_env_values = true)]
    broadcast_key: String,

    /// Station config (JSON)
    #[arg(short, long, env = "ROUNDCAST_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "roundcast=info,roundcast_server=info,tower_http=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => StationConfig::load_from(path).context("Failed to load station config")?,
        None => StationConfig::default(),
    };
    info!(
        default_track_secs = config.default_track_secs,
        max_playlist_secs = config.max_playlist_secs,
        "Station config loaded"
    );

    let service = Arc::new(SchedulerService::new(
        config,
        Arc::new(SystemClock),
        Arc::new(SharedSecret::new(args.broadcast_key)),
    ));
    let app = create_router(AppState { service });

    let addr = SocketAddr::new(args.bind, args.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
