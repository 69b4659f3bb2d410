pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::matching::handlers as ats;
use crate::profiles::handlers as directory;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Directory API
        .route(
            "/api/v1/companies",
            get(directory::handle_list_companies).post(directory::handle_create_company),
        )
        .route(
            "/api/v1/candidates",
            get(directory::handle_list_candidates).post(directory::handle_create_candidate),
        )
        .route(
            "/api/v1/candidates/:id",
            get(directory::handle_get_candidate).put(directory::handle_update_candidate),
        )
        .route(
            "/api/v1/jobs",
            get(directory::handle_list_jobs).post(directory::handle_create_job),
        )
        .route("/api/v1/jobs/:id", get(directory::handle_get_job))
        .route(
            "/api/v1/jobs/:id/status",
            patch(directory::handle_update_job_status),
        )
        // ATS API
        .route(
            "/api/v1/ats/candidate/:candidate_id",
            get(ats::handle_rank_jobs_for_candidate),
        )
        .route(
            "/api/v1/ats/candidate/:candidate_id/scores",
            get(ats::handle_candidate_scores),
        )
        .route(
            "/api/v1/ats/job/:job_id",
            get(ats::handle_rank_candidates_for_job),
        )
        .route("/api/v1/ats/job/:job_id/scores", get(ats::handle_job_scores))
        .route(
            "/api/v1/ats/score/:candidate_id/:job_id",
            get(ats::handle_score_pair),
        )
        .route(
            "/api/v1/ats/ensure/:candidate_id/:job_id",
            get(ats::handle_ensure_pair),
        )
        .route(
            "/api/v1/ats/ensure-bulk/:job_id",
            post(ats::handle_ensure_bulk),
        )
        .route(
            "/api/v1/ats/assign/:candidate_id/:job_id",
            put(ats::handle_assign),
        )
        .with_state(state)
}
