use std::sync::Arc;
use tokio::net::UnixListener;
use tokio::signal;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod audit;
mod config;
mod core;
mod docker;
mod runtime;
mod service;
mod state;

use config::Config;
use docker::client::DockerClient;
use runtime::DockerRuntime;
use service::{TransmissionControllerImpl, TransmissionControllerServer};
use state::AppState;

const MAX_CONCURRENT_STREAMS: usize = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transctrl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting transctrl v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        error!("Invalid configuration: {e}");
        e
    })?;
    info!(socket_path = %config.socket_path, "Loaded configuration");

    info!(
        docker_host = if config.docker_host.is_empty() { "default socket" } else { &config.docker_host },
        "Connecting to Docker daemon"
    );
    let docker_client = DockerClient::new(&config.docker_host).map_err(|e| {
        error!("Failed to connect to Docker: {e}");
        e
    })?;
    info!("Connected to Docker daemon");

    let runtime: Arc<dyn runtime::ContainerRuntime> = Arc::new(DockerRuntime::new(docker_client));
    let state = Arc::new(AppState::new(config.clone(), runtime));

    let service = TransmissionControllerImpl::new(state);

    if let Some(parent) = std::path::Path::new(&config.socket_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    if std::path::Path::new(&config.socket_path).exists() {
        std::fs::remove_file(&config.socket_path)?;
    }

    let listener = UnixListener::bind(&config.socket_path)?;
    let incoming = UnixListenerStream::new(listener);

    info!(socket_path = %config.socket_path, "transctrl is ready, listening for RPCs");

    Server::builder()
        .concurrency_limit_per_connection(MAX_CONCURRENT_STREAMS)
        .add_service(TransmissionControllerServer::new(service))
        .serve_with_incoming_shutdown(incoming, shutdown_signal())
        .await?;

    let _ = std::fs::remove_file(&config.socket_path);
    info!("Server shutdown complete");
    Ok(())
}

/// Listens for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
