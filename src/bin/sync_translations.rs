//! One-shot translation sync: reconcile every canonical document, print the
//! summary and exit.
//!
//! Usage:
//!   cargo run --bin sync-translations
//!
//! Required environment variables:
//! - SANITY_PROJECT_ID
//! - SANITY_API_TOKEN
//! - AI_API_KEY
//!
//! Optional:
//! - SANITY_DATASET (defaults to production)
//! - SYNC_LOCALES / SOURCE_LOCALE
//! - SYNC_DOCUMENT_TYPES (defaults to post)
//!
//! Exits non-zero only if the canonical documents could not be listed.
//! Per-locale failures are reported in the summary.

use anyhow::{Context, Result};
use content_translation_sync::{config::Config, sync::SyncDriver};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_translation_sync=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let driver = SyncDriver::from_config(&config)?;

    info!("Starting batch translation sync");
    let report = driver
        .run_sync()
        .await
        .context("Failed to fetch canonical documents")?;

    let counts = report.counts();
    println!("\n{}", "=".repeat(60));
    println!("TRANSLATION SYNC SUMMARY");
    println!("{}", "=".repeat(60));
    for document in &report.documents {
        let c = document.counts();
        println!(
            "{:<50} created {:>2}  updated {:>2}  failed {:>2}{}",
            document.key.to_string(),
            c.created,
            c.updated,
            c.failed,
            if document.is_skipped() { "  (skipped)" } else { "" }
        );
    }
    for invalid in &report.rejected {
        println!("{:<50} not synced: {}", invalid.id, invalid.reason);
    }
    println!("{}", "-".repeat(60));
    println!(
        "{} documents: {} created, {} updated, {} failed, {} skipped, {} invalid",
        report.documents.len(),
        counts.created,
        counts.updated,
        counts.failed,
        counts.skipped,
        counts.invalid
    );
    println!(
        "Translation calls: {} ({:.1}% success)",
        report.metrics.api_calls, report.metrics.api_success_rate
    );
    println!("{}", "=".repeat(60));

    Ok(())
}
