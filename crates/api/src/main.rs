use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use autobahn_db::models::connection::KIND_TEAM_CONNECTIONS;
use autobahn_db::repositories::ConnectionRepo;
use autobahn_events::{DispatchBus, HttpTopicPublisher, InProcessDispatchBus};
use autobahn_pipeline::{ExecutionOrchestrator, PgConnectionDirectory, PgExecutionStore};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autobahn_api::config::{LogFormat, ServerConfig};
use autobahn_api::router::build_app_router;
use autobahn_api::state::AppState;
use autobahn_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let (json_layer, text_layer) = match config.log_format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "autobahn_api=debug,autobahn_pipeline=debug,autobahn_events=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = autobahn_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    autobahn_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    autobahn_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // Ids in the directory belong to sockets of a previous process.
    match ConnectionRepo::clear_kind(&pool, KIND_TEAM_CONNECTIONS).await {
        Ok(purged) => tracing::info!(purged, "Purged stale team connection records"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge stale team connection records"),
    }

    let background = CancellationToken::new();

    // --- Dispatch bus ---
    let (bus, local_dispatch_handle) = match &config.dispatch_topic_url {
        Some(url) => {
            let publisher =
                HttpTopicPublisher::new(url.clone()).expect("Failed to build topic publisher");
            tracing::info!(topic_url = %url, "Dispatching to topic endpoint");
            let bus: Arc<dyn DispatchBus> = Arc::new(publisher);
            (bus, None)
        }
        None => {
            let bus = InProcessDispatchBus::default();
            let handle = tokio::spawn(log_local_dispatches(bus.subscribe(), background.clone()));
            tracing::warn!("DISPATCH_TOPIC_URL not set, dispatching in-process");
            let bus: Arc<dyn DispatchBus> = Arc::new(bus);
            (bus, Some(handle))
        }
    };

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), background.clone());

    // --- Orchestrator ---
    let directory = Arc::new(PgConnectionDirectory::new(pool.clone()));
    let orchestrator = Arc::new(ExecutionOrchestrator::new(
        Arc::new(PgExecutionStore::new(pool.clone())),
        bus,
        directory.clone(),
        ws_manager.clone(),
    ));

    if config.worker_token.is_none() {
        tracing::warn!("WORKER_TOKEN not set, worker result callbacks are disabled");
    }

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        orchestrator,
        directory,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let budget = Duration::from_secs(config.shutdown_timeout_secs);
    background.cancel();
    let _ = tokio::time::timeout(budget, heartbeat_handle).await;
    tracing::info!("Heartbeat task stopped");

    if let Some(handle) = local_dispatch_handle {
        let _ = tokio::time::timeout(budget, handle).await;
        tracing::info!("Local dispatch listener stopped");
    }

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Keep a subscriber on the in-process bus so publishes succeed without an
/// external topic, logging each message a worker would have received.
async fn log_local_dispatches(
    mut rx: tokio::sync::broadcast::Receiver<(String, autobahn_events::DispatchMessage)>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok((message_id, message)) => {
                    tracing::info!(
                        message_id = %message_id,
                        execution_id = %message.execution_id,
                        mode = %message.mode,
                        url = %message.url,
                        "Dispatch published in-process",
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Local dispatch listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
