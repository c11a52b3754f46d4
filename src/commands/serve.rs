use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

use crate::{
    api::health_checks::ok,
    app::App,
    boot::BootError,
    config::Config,
    database::setup_database,
    environment::Environment,
    jobs::{
        job_supervisor::{register_scheduled_jobs, start_scheduler},
        store::DatabaseStore,
        JobHandlers, JobRegistry,
    },
    router::router,
};

pub async fn handle_serve_command(
    environment: Environment,
    config: Config,
    handlers: JobHandlers,
) -> Result<(), BootError> {
    let port = config.server.port;

    // Temporary liveness server so orchestrators see the process alive during migrations
    let liveness_server_task = tokio::spawn(start_liveness_server(port));

    let db = setup_database(&config.database).await;

    // Stop the temporary liveness server before binding the real one
    liveness_server_task.abort();
    let _ = liveness_server_task.await;

    let registry = JobRegistry::new(Arc::new(DatabaseStore::new(db?)));
    register_scheduled_jobs(&config.jobs, &registry, &handlers).await?;

    let app = App::new(config.clone(), environment, registry.clone())?;
    let (scheduler, scheduler_task) = start_scheduler(&config.jobs, registry);

    let served = start_server(router(app), port).await;

    info!("🛑 Stopping job scheduler");
    scheduler.shutdown();
    if let Err(e) = scheduler_task.await {
        error!("❌ Scheduler task ended abnormally: {}", e);
    }

    served
}

// Minimal server that only serves liveness endpoint during migrations
async fn start_liveness_server(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!("⚠️ Liveness server could not bind {}: {}", addr, e);
            return;
        }
    };

    let migration_router = Router::new().route("/liveness", get(ok));
    if let Err(e) = axum::serve(listener, migration_router).await {
        warn!("⚠️ Liveness server stopped: {}", e);
    }
}

async fn start_server(router: Router, port: u16) -> Result<(), BootError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("🌐 Server starting on http://{}", addr);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("📴 Shutdown signal received");
}
