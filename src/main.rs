//! Portico -- S3-compatible object storage gateway.
//!
//! The binary wires the dispatch core to the in-memory reference
//! backend.  Deployments with real storage swap the backend behind
//! [`portico::backend::Backend`] and mount their signature verifier in
//! front of the router.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

/// Command-line arguments for the Portico gateway.
#[derive(Parser, Debug)]
#[command(
    name = "portico",
    version,
    about = "S3-compatible object storage gateway"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "portico.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = if std::path::Path::new(&cli.config).exists() {
        info!("Loading configuration from {}", cli.config);
        portico::config::load_config(&cli.config)?
    } else {
        info!("No configuration file at {}; using defaults", cli.config);
        portico::config::Config::default()
    };

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    if config.observability.metrics {
        portico::metrics::init_metrics();
        portico::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    let backend = Arc::new(portico::backend::memory::MemoryBackend::new(
        &config.gateway.owner,
    ));
    info!("In-memory backend initialized, owner {}", config.gateway.owner);

    let state = Arc::new(portico::AppState { config, backend });
    let app = portico::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Portico listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Portico shut down");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful
/// shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
