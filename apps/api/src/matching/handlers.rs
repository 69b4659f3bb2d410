//! Axum route handlers for the ATS API.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::orchestrator::{PairScore, RankedCandidate, RankedJob};
use crate::models::score::{CandidateJobMapRow, CandidateScoreView, JobScoreView, MatchStatus};
use crate::state::AppState;
use crate::tenant::TenantContext;

const MAX_BULK_CANDIDATES: usize = 500;

#[derive(Debug, Deserialize)]
pub struct BulkEnsureRequest {
    pub candidate_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub status: MatchStatus,
}

/// GET /api/v1/ats/candidate/:candidate_id
///
/// Recomputes the candidate against every open job of the tenant, best first.
pub async fn handle_rank_jobs_for_candidate(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<Vec<RankedJob>>, AppError> {
    let ranked = state
        .orchestrator
        .match_candidate_across_jobs(tenant.client_id, candidate_id)
        .await?;
    Ok(Json(ranked))
}

/// GET /api/v1/ats/job/:job_id
///
/// Recomputes the job against every candidate of the tenant, best first.
pub async fn handle_rank_candidates_for_job(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<RankedCandidate>>, AppError> {
    let ranked = state
        .orchestrator
        .match_job_across_candidates(tenant.client_id, job_id)
        .await?;
    Ok(Json(ranked))
}

/// GET /api/v1/ats/candidate/:candidate_id/scores
///
/// Cached rows only, no recomputation.
pub async fn handle_candidate_scores(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<Vec<CandidateScoreView>>, AppError> {
    if !state
        .profiles
        .candidate_exists(tenant.client_id, candidate_id)
        .await?
    {
        return Err(AppError::candidate_not_found(candidate_id));
    }
    let scores = state
        .scores
        .candidate_scores(tenant.client_id, candidate_id)
        .await?;
    Ok(Json(scores))
}

/// GET /api/v1/ats/job/:job_id/scores
///
/// Cached rows only, no recomputation.
pub async fn handle_job_scores(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<JobScoreView>>, AppError> {
    if !state.profiles.job_exists(tenant.client_id, job_id).await? {
        return Err(AppError::job_not_found(job_id));
    }
    let scores = state.scores.job_scores(tenant.client_id, job_id).await?;
    Ok(Json(scores))
}

/// GET /api/v1/ats/score/:candidate_id/:job_id
///
/// Always recomputes the pair.
pub async fn handle_score_pair(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path((candidate_id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PairScore>, AppError> {
    let score = state
        .orchestrator
        .compute_score(tenant.client_id, candidate_id, job_id)
        .await?;
    Ok(Json(score))
}

/// GET /api/v1/ats/ensure/:candidate_id/:job_id
///
/// Serves the cached score when fresh, otherwise recomputes.
pub async fn handle_ensure_pair(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path((candidate_id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PairScore>, AppError> {
    let score = state
        .orchestrator
        .ensure_score(tenant.client_id, candidate_id, job_id)
        .await?;
    Ok(Json(score))
}

/// POST /api/v1/ats/ensure-bulk/:job_id
///
/// Cache-aware scores for a set of candidates against one job, keyed by candidate id.
pub async fn handle_ensure_bulk(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(job_id): Path<Uuid>,
    Json(request): Json<BulkEnsureRequest>,
) -> Result<Json<HashMap<Uuid, PairScore>>, AppError> {
    if request.candidate_ids.is_empty() {
        return Err(AppError::Validation(
            "candidate_ids cannot be empty".to_string(),
        ));
    }
    if request.candidate_ids.len() > MAX_BULK_CANDIDATES {
        return Err(AppError::Validation(format!(
            "at most {MAX_BULK_CANDIDATES} candidate_ids per request"
        )));
    }

    let scores = state
        .orchestrator
        .ensure_scores_bulk(tenant.client_id, &request.candidate_ids, job_id)
        .await?;
    Ok(Json(scores))
}

/// PUT /api/v1/ats/assign/:candidate_id/:job_id
///
/// Sets the sourcing status of a pair, creating the row on first assignment.
pub async fn handle_assign(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path((candidate_id, job_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<CandidateJobMapRow>, AppError> {
    if !state
        .profiles
        .candidate_exists(tenant.client_id, candidate_id)
        .await?
    {
        return Err(AppError::candidate_not_found(candidate_id));
    }
    if !state.profiles.job_exists(tenant.client_id, job_id).await? {
        return Err(AppError::job_not_found(job_id));
    }

    let row = state
        .scores
        .set_status(candidate_id, job_id, request.status)
        .await?;
    Ok(Json(row))
}
