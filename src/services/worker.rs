use std::sync::Arc;

use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::generation::GenerationJobManager;

/// Decides when a freshly queued job runs. Implementations must not block
/// the caller on the job's completion.
pub trait JobScheduler: Send + Sync {
    fn schedule(&self, job_id: Uuid);
}

/// Runs each job on its own tokio task, optionally behind a concurrency ceiling.
#[derive(Clone)]
pub struct TokioScheduler {
    manager: GenerationJobManager,
    permits: Option<Arc<Semaphore>>,
}

impl TokioScheduler {
    pub fn new(manager: GenerationJobManager, max_concurrent: Option<usize>) -> Self {
        Self {
            manager,
            permits: max_concurrent.map(|n| Arc::new(Semaphore::new(n.max(1)))),
        }
    }

    /// Settle jobs left behind by a previous process: running jobs become
    /// failed, never-claimed queued jobs are scheduled once.
    pub async fn recover(&self) -> AppResult<()> {
        let failed = self.manager.fail_interrupted_jobs().await?;
        if failed > 0 {
            tracing::warn!(count = failed, "Failed jobs interrupted by a restart");
        }

        let queued = self.manager.queued_job_ids().await?;
        if !queued.is_empty() {
            tracing::info!(count = queued.len(), "Scheduling jobs queued before restart");
        }
        for job_id in queued {
            self.schedule(job_id);
        }

        Ok(())
    }
}

impl JobScheduler for TokioScheduler {
    fn schedule(&self, job_id: Uuid) {
        let manager = self.manager.clone();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            let _permit = match permits {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        tracing::error!(job_id = %job_id, "Job scheduler closed");
                        return;
                    }
                },
                None => None,
            };

            // Inner task so a panic still ends in a recorded failure.
            let execution = tokio::spawn({
                let manager = manager.clone();
                async move { manager.execute_job(job_id).await }
            });

            match execution.await {
                Ok(Ok(job)) => {
                    tracing::debug!(job_id = %job_id, status = ?job.status, "Job execution finished");
                }
                Ok(Err(e @ (AppError::StateConflict { .. } | AppError::NotFound { .. }))) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Job was not executed");
                }
                Ok(Err(e)) => {
                    tracing::error!(job_id = %job_id, error = %e, "Job execution errored");
                    if let Err(e) = manager.mark_failed(job_id, &e.to_string()).await {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to record errored job");
                    }
                }
                Err(join_error) => {
                    let message = format!("Generation task aborted: {join_error}");
                    tracing::error!(job_id = %job_id, error = %message, "Generation task crashed");
                    if let Err(e) = manager.mark_failed(job_id, &message).await {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to record crashed job");
                    }
                }
            }
        });
    }
}
