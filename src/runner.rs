//! Background execution of translation jobs.

use crate::pipeline::{Pipeline, StartError};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// A job the runner should execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub job_id: String,
    pub target_language: String,
    pub source_language: String,
}

/// Runs jobs as tokio tasks, at most `max_concurrent` at a time.
///
/// Submitting never waits: excess jobs queue on the semaphore. Jobs are
/// never cancelled; progress is observed through the status store.
pub struct JobRunner {
    pipeline: Arc<Pipeline>,
    permits: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
}

impl JobRunner {
    pub fn new(pipeline: Arc<Pipeline>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        info!("Job runner allows {} concurrent job(s)", max_concurrent);
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim a job and queue it. The claim happens before returning, so a
    /// job that is unknown or already started is refused here and never
    /// reaches a worker. Must be called from within a tokio runtime.
    pub fn submit(&self, request: TranslationRequest) -> Result<(), StartError> {
        let job = self.pipeline.claim(&request.job_id)?;
        let pipeline = Arc::clone(&self.pipeline);
        let permits = Arc::clone(&self.permits);

        let mut tasks = self.tasks();
        reap(&mut tasks);

        debug!("Queued job {}", job.job_id);
        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                error!("Job runner closed before job {} could start", job.job_id);
                return;
            };
            pipeline
                .execute(&job, &request.target_language, &request.source_language)
                .await;
        });
        Ok(())
    }

    /// Jobs submitted and not yet reaped.
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks();
        reap(&mut tasks);
        tasks.len()
    }

    /// Wait for every job submitted so far to finish.
    pub async fn wait_idle(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks());
        while let Some(result) = tasks.join_next().await {
            log_outcome(result);
        }
    }
}

fn reap(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        log_outcome(result);
    }
}

fn log_outcome(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!("Job task panicked: {}", e);
    }
}
