//! Client side of the generation flow: an HTTP client for the service and
//! the polling state machine that turns job snapshots into visible progress.

pub mod api;
pub mod reconciler;

pub use api::{ApiClient, ClientError, GenerationApi};
pub use reconciler::{
    poll_job, GenerationOutcome, GenerationSession, PollConfig, ReconcilerState, MAX_POLLS,
    POLL_INTERVAL,
};
