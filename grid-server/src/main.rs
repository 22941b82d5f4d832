use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::info;

use grid_core::WordLibrary;
use grid_server::{
    arbitration::{ArbitrationPipeline, HttpJudgeClient, InMemoryVerdictStore},
    bus::InMemoryBus,
    config::Config,
    create_routes,
    registry::RoomRegistry,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting grid session server...");

    let config = Arc::new(Config::new());
    let connections = Arc::new(ConnectionManager::new());

    info!("Loading word lists from directory: {}", config.word_lists_dir);
    let library = match WordLibrary::load_dir(&config.word_lists_dir) {
        Ok(library) => {
            info!("Word lists loaded");
            Arc::new(library)
        }
        Err(e) => {
            tracing::error!(
                "Failed to load word lists from '{}': {}",
                config.word_lists_dir,
                e
            );
            tracing::error!("The server requires at least one word list to arbitrate words.");
            tracing::error!(
                "Set WORD_LISTS_DIR to a directory containing en.txt / es.txt files."
            );
            std::process::exit(1);
        }
    };

    let judge = Arc::new(HttpJudgeClient::new(
        config.judge_url.clone(),
        config.judge_timeout(),
    ));
    let arbitration = Arc::new(ArbitrationPipeline::new(
        library,
        Arc::new(InMemoryVerdictStore::new()),
        judge,
        config.crowd_vote_threshold,
        config.judge_confidence_threshold,
    ));

    let bus = Arc::new(InMemoryBus::new());
    let registry = Arc::new(RoomRegistry::new(
        arbitration,
        bus,
        connections.clone(),
        config.clone(),
    ));

    let routes = create_routes(connections.clone(), registry.clone());

    // Background cleanup: stale sockets and finished room tasks.
    {
        let connections = connections.clone();
        let registry = registry.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
                connections
                    .cleanup_inactive_connections(connection_timeout)
                    .await;
                registry.sweep().await;
            }
        });
    }

    info!("Server starting on {}:{}", config.host, config.port);

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), async {
            // Wait for SIGINT (Ctrl+C) or SIGTERM
            #[cfg(unix)]
            {
                let mut sigint =
                    match signal::unix::signal(signal::unix::SignalKind::interrupt()) {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::error!("Failed to install SIGINT handler: {}", e);
                            return;
                        }
                    };
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::error!("Failed to install SIGTERM handler: {}", e);
                            return;
                        }
                    };

                tokio::select! {
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                }
            }

            #[cfg(not(unix))]
            {
                if signal::ctrl_c().await.is_err() {
                    tracing::error!("Failed to listen for ctrl+c");
                    return;
                }
                info!("Received Ctrl+C, shutting down gracefully...");
            }
        });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
