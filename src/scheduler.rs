use crate::sync::SyncDriver;
use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Initialize and start the scheduler
pub async fn start_scheduler(
    driver: Arc<SyncDriver>,
    schedule_times: &[String],
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Create scheduled jobs for each time in schedule_times
    for time in schedule_times {
        let cron_expr = time_to_cron(time)?;
        info!("Scheduling translation sync for {} UTC (cron: {})", time, cron_expr);

        let driver_clone = Arc::clone(&driver);

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
            let driver = Arc::clone(&driver_clone);

            Box::pin(async move {
                info!("⏰ Scheduled translation sync triggered");
                match driver.run_sync().await {
                    Ok(report) if report.has_failures() => {
                        error!(
                            "Scheduled sync finished with {} failed locales",
                            report.counts().failed
                        );
                    }
                    Ok(_) => info!("✓ Scheduled sync completed"),
                    Err(e) => error!("Scheduled sync failed: {}", e),
                }
            })
        })?;

        scheduler.add(job).await?;
    }

    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}

/// Convert a UTC time string (HH:MM) to a daily cron expression
pub fn time_to_cron(time: &str) -> Result<String> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() != 2 {
        anyhow::bail!("Invalid time format: {}. Expected HH:MM", time);
    }

    let hour: u8 = parts[0].trim().parse()?;
    let minute: u8 = parts[1].trim().parse()?;

    if hour > 23 || minute > 59 {
        anyhow::bail!("Invalid time: {}. Hour must be 0-23, minute 0-59", time);
    }

    // Cron format: "second minute hour day month day_of_week"
    Ok(format!("0 {} {} * * *", minute, hour))
}
