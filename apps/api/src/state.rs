use std::sync::Arc;

use crate::config::Config;
use crate::matching::orchestrator::ScoreOrchestrator;
use crate::matching::store::ScoreStore;
use crate::profiles::repository::ProfileRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Tenant-scoped candidates, companies and jobs.
    pub profiles: Arc<dyn ProfileRepository>,
    /// Read side of the Score Store. Score fields are written only by the orchestrator.
    pub scores: Arc<dyn ScoreStore>,
    pub orchestrator: Arc<ScoreOrchestrator>,
}
