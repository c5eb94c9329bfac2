use domain::Services;
use log::*;
use migration::{Migrator, MigratorTrait};
use service::config::{Config, StorageBackend};
use service::logging::Logger;
use std::sync::Arc;
use tokio::signal;
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(err) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {err}");
    }

    info!(
        "Starting sensor platform [{}] with {} storage",
        config.runtime_env(),
        config.storage
    );

    let services = match init_services(&config).await {
        Ok(services) => services,
        Err(err) => {
            error!("Failed to initialize storage: {err}");
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config, services);
    let live = Arc::clone(&app_state.live);
    let shutdown_timeout = app_state.config.shutdown_timeout();

    let shutdown = async move {
        wait_for_shutdown().await;
        info!(
            "Shutdown signal received, closing {} live stream(s)",
            live.active_sessions()
        );

        match tokio::time::timeout(shutdown_timeout, live.shutdown()).await {
            Ok(Ok(())) => info!("All live streams closed"),
            Ok(Err(err)) => warn!("Live streams closed with errors: {err}"),
            Err(_) => warn!("Timed out after {shutdown_timeout:?} closing live streams"),
        }
    };

    if let Err(err) = web::init_server(app_state, shutdown).await {
        error!("Server stopped with an error: {err}");
        std::process::exit(1);
    }

    info!("Server stopped");
}

async fn init_services(config: &Config) -> Result<Services, migration::DbErr> {
    match config.storage {
        StorageBackend::Memory => Ok(Services::in_memory()),
        StorageBackend::Postgres => {
            let db = service::init_database(config).await?;
            Migrator::up(&db, None).await?;
            info!("Database migrations are up to date");
            Ok(Services::postgres(Arc::new(db)))
        }
    }
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
