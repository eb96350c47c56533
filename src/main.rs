use anyhow::{Context, Result};
use content_translation_sync::{config::Config, scheduler, server, sync::SyncDriver};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_translation_sync=info".parse()?),
        )
        .init();

    info!("Starting content translation sync service");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Syncing {:?} from '{}' into {} locales",
        config.document_types,
        config.locales.source().code,
        config.locales.targets().count()
    );

    let driver = Arc::new(SyncDriver::from_config(&config)?);

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = if config.schedule_times.is_empty() {
        info!("No SCHEDULE_TIMES configured, scheduled syncs disabled");
        None
    } else {
        Some(scheduler::start_scheduler(Arc::clone(&driver), &config.schedule_times).await?)
    };

    let app = server::router(server::AppState::new(driver, &config));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("✓ Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
