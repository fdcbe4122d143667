use std::sync::Arc;

use mockable::DefaultClock;
use tokio::net::TcpListener;
use tracing::{error, info};
use trip_backup::config::AppConfig;
use trip_backup::error::AppError;
use trip_backup::routes::create_router;
use trip_backup::services::{
    backup::BackupService,
    store::{open_store, SnapshotStore},
};
use trip_backup::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(err) => {
            error!("opening store failed: {err}");
            return Err(err);
        }
    };

    let backup = BackupService::new(store.clone(), Arc::new(DefaultClock));
    let state = AppState::new(config.clone(), backup);
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;
    info!("store closed");
    served?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,trip_backup=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
