use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use binwatch_common::config::AppConfig;
use binwatch_common::db;
use binwatch_notifier::LinePushDispatcher;
use binwatch_queue::PgTaskStore;
use binwatch_worker::{NotificationWorker, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "binwatch_worker=info,binwatch_queue=info,binwatch_notifier=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("BinWatch worker starting...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let dispatcher = LinePushDispatcher::from_config(&config)?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let worker = NotificationWorker::new(
        Arc::new(PgTaskStore::new(pool)),
        Arc::new(dispatcher),
        WorkerConfig::from_app_config(&config),
    );

    // Stop between ticks on Ctrl+C so an in-flight claim commits or rolls back
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Received shutdown signal, stopping gracefully...");
            shutdown.cancel();
        }
    });

    worker.run(shutdown).await;

    tracing::info!("BinWatch worker stopped.");
    Ok(())
}
