use crate::store::StatusStore;
use crate::workspace::Workspace;
use anyhow::Result;
use chrono::Duration;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Evict every job older than `retention` from the store and delete its files.
///
/// Returns the evicted job ids.
pub fn run_sweep(store: &dyn StatusStore, workspace: &Workspace, retention: Duration) -> Vec<String> {
    let evicted = store.sweep_older_than(retention);

    for job_id in &evicted {
        if let Err(e) = workspace.remove_job(job_id) {
            warn!("Failed to remove files of expired job {}: {:#}", job_id, e);
        }
    }

    if !evicted.is_empty() {
        info!("Sweep removed {} expired job(s)", evicted.len());
    }
    evicted
}

/// Initialize and start the periodic retention sweep
pub async fn start_sweeper(
    schedule: &str,
    store: Arc<dyn StatusStore>,
    workspace: Workspace,
    retention: Duration,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    info!("Scheduling retention sweep (cron: {})", schedule);

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let store = Arc::clone(&store);
        let workspace = workspace.clone();

        Box::pin(async move {
            info!("⏰ Retention sweep triggered");
            let result = tokio::task::spawn_blocking(move || {
                run_sweep(store.as_ref(), &workspace, retention)
            })
            .await;
            if let Err(e) = result {
                error!("Retention sweep failed: {}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Sweeper started");

    Ok(scheduler)
}
