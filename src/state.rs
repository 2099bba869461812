use std::sync::Arc;

use crate::services::generation::GenerationJobManager;
use crate::services::versions::VersionStore;
use crate::services::worker::JobScheduler;

#[derive(Clone)]
pub struct AppState {
    pub versions: VersionStore,
    pub generations: GenerationJobManager,
    pub scheduler: Arc<dyn JobScheduler>,
}
