use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::api::{ClientError, GenerationApi};
use crate::entities::generation_job::JobStatus;
use crate::models::api::{CandidateResponse, GenerateRequest, JobResponse, VersionResponse};

pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);
/// 120 polls at 1.5 s is roughly three minutes.
pub const MAX_POLLS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_polls: MAX_POLLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Succeeded {
        job: JobResponse,
        candidates: Vec<CandidateResponse>,
    },
    Failed {
        job: JobResponse,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcilerState {
    Idle,
    Generating {
        job_id: Uuid,
        polls: u32,
        status: JobStatus,
    },
    Completed(GenerationOutcome),
    /// The poll ceiling was reached. The server may still be running the job.
    TimedOut { job_id: Uuid, polls: u32 },
}

impl ReconcilerState {
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ReconcilerState::Completed(_) | ReconcilerState::TimedOut { .. }
        )
    }
}

/// Publish unless this loop has been torn down. The check runs under the
/// channel lock, so a replaced loop can never overwrite its successor.
fn publish(state: &watch::Sender<ReconcilerState>, cancel: &CancellationToken, next: ReconcilerState) {
    state.send_if_modified(|current| {
        if cancel.is_cancelled() {
            return false;
        }
        *current = next;
        true
    });
}

/// Poll a job until it is terminal, the poll ceiling is hit, or `cancel` fires.
///
/// The first fetch is immediate; later fetches follow `config.interval`.
/// Fetch errors count as polls. Returns the settled state, or `None` when
/// cancelled.
pub async fn poll_job<A: GenerationApi + ?Sized>(
    api: &A,
    job_id: Uuid,
    config: PollConfig,
    state: &watch::Sender<ReconcilerState>,
    cancel: &CancellationToken,
) -> Option<ReconcilerState> {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls = 0;
    let mut last_status = JobStatus::Queued;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = ticker.tick() => {}
        }

        polls += 1;
        match api.get_job(job_id).await {
            Ok(snapshot) => {
                last_status = snapshot.job.status;
                let settled = match snapshot.job.status {
                    JobStatus::Succeeded => Some(GenerationOutcome::Succeeded {
                        candidates: snapshot.candidates.unwrap_or_default(),
                        job: snapshot.job,
                    }),
                    JobStatus::Failed => Some(GenerationOutcome::Failed {
                        message: snapshot
                            .job
                            .error_message
                            .clone()
                            .unwrap_or_else(|| "Generation failed".to_string()),
                        job: snapshot.job,
                    }),
                    JobStatus::Queued | JobStatus::Running => None,
                };

                if let Some(outcome) = settled {
                    let done = ReconcilerState::Completed(outcome);
                    publish(state, cancel, done.clone());
                    return Some(done);
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, polls, error = %e, "Job status fetch failed");
            }
        }

        if polls >= config.max_polls {
            tracing::warn!(job_id = %job_id, polls, "Stopped polling, job still not terminal");
            let timed_out = ReconcilerState::TimedOut { job_id, polls };
            publish(state, cancel, timed_out.clone());
            return Some(timed_out);
        }

        publish(
            state,
            cancel,
            ReconcilerState::Generating {
                job_id,
                polls,
                status: last_status,
            },
        );
    }
}

struct ActivePoll {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// One user's generation session: at most one polling loop, plus the
/// locally held version list.
pub struct GenerationSession<A: GenerationApi + 'static> {
    api: Arc<A>,
    config: PollConfig,
    state: watch::Sender<ReconcilerState>,
    active: Option<ActivePoll>,
    versions: Vec<VersionResponse>,
}

impl<A: GenerationApi + 'static> GenerationSession<A> {
    pub fn new(api: Arc<A>, config: PollConfig) -> Self {
        let (state, _) = watch::channel(ReconcilerState::Idle);
        Self {
            api,
            config,
            state,
            active: None,
            versions: Vec::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReconcilerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ReconcilerState {
        self.state.borrow().clone()
    }

    pub fn versions(&self) -> &[VersionResponse] {
        &self.versions
    }

    pub async fn load_versions(&mut self, project_id: Uuid) -> Result<(), ClientError> {
        self.versions = self.api.list_versions(project_id).await?;
        Ok(())
    }

    /// Create a job and start polling it, replacing any loop already running.
    pub async fn generate(
        &mut self,
        project_id: Uuid,
        request: &GenerateRequest,
    ) -> Result<JobResponse, ClientError> {
        let job = self.api.create_job(project_id, request).await?;
        self.watch_job(job.id, job.status);
        Ok(job)
    }

    /// Start polling an existing job.
    pub fn watch_job(&mut self, job_id: Uuid, status: JobStatus) {
        self.stop_polling();

        self.state.send_replace(ReconcilerState::Generating {
            job_id,
            polls: 0,
            status,
        });

        let cancel = CancellationToken::new();
        let api = Arc::clone(&self.api);
        let state = self.state.clone();
        let config = self.config;
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            poll_job(api.as_ref(), job_id, config, &state, &token).await;
        });

        self.active = Some(ActivePoll { cancel, handle });
    }

    /// Stop polling locally. The server-side job is not affected.
    pub fn cancel(&mut self) {
        self.stop_polling();
        self.state.send_replace(ReconcilerState::Idle);
    }

    pub fn is_polling(&self) -> bool {
        self.active
            .as_ref()
            .map(|a| !a.handle.is_finished())
            .unwrap_or(false)
    }

    /// Promote a candidate and apply the returned version to the local list
    /// without re-fetching.
    pub async fn confirm_selection(
        &mut self,
        project_id: Uuid,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<VersionResponse, ClientError> {
        let version = self
            .api
            .select_candidate(project_id, job_id, candidate_id)
            .await?;
        self.apply_version(version.clone());
        self.stop_polling();
        self.state.send_replace(ReconcilerState::Idle);
        Ok(version)
    }

    pub fn apply_version(&mut self, version: VersionResponse) {
        self.versions.retain(|v| v.id != version.id);
        self.versions.insert(0, version);
    }

    fn stop_polling(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            active.handle.abort();
        }
    }
}

impl<A: GenerationApi + 'static> Drop for GenerationSession<A> {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
