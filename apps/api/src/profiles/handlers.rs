use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{CandidateProfile, CandidateRow};
use crate::models::job::{CompanyRow, JobProfile, JobStatus};
use crate::profiles::validation::{CandidateInput, CompanyInput, JobInput};
use crate::state::AppState;
use crate::tenant::TenantContext;

/// POST /api/v1/companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(input): Json<CompanyInput>,
) -> Result<(StatusCode, Json<CompanyRow>), AppError> {
    let company = input.validate()?;
    let row = state
        .profiles
        .create_company(tenant.client_id, &company)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<CompanyRow>>, AppError> {
    Ok(Json(state.profiles.companies(tenant.client_id).await?))
}

/// POST /api/v1/candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(input): Json<CandidateInput>,
) -> Result<(StatusCode, Json<CandidateProfile>), AppError> {
    let draft = input.validate()?;
    let profile = state
        .profiles
        .create_candidate(tenant.client_id, &draft)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<CandidateRow>>, AppError> {
    let candidates = state
        .profiles
        .tenant_candidates(tenant.client_id)
        .await?
        .into_iter()
        .map(|p| p.candidate)
        .collect();
    Ok(Json(candidates))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateProfile>, AppError> {
    let profile = state
        .profiles
        .candidate_profile(tenant.client_id, id)
        .await?
        .ok_or_else(|| AppError::candidate_not_found(id))?;
    Ok(Json(profile))
}

/// PUT /api/v1/candidates/:id
///
/// Replaces the profile, then rescores the candidate against all open jobs in
/// the background. The response does not wait for rescoring.
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(input): Json<CandidateInput>,
) -> Result<Json<CandidateProfile>, AppError> {
    let draft = input.validate()?;
    let profile = state
        .profiles
        .update_candidate(tenant.client_id, id, &draft)
        .await?
        .ok_or_else(|| AppError::candidate_not_found(id))?;

    let orchestrator = state.orchestrator.clone();
    let client_id = tenant.client_id;
    tokio::spawn(async move {
        match orchestrator.match_candidate_across_jobs(client_id, id).await {
            Ok(ranked) => info!("Rescored candidate {id} against {} jobs", ranked.len()),
            Err(e) => error!("Background rescoring failed for candidate {id}: {e}"),
        }
    });

    Ok(Json(profile))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(input): Json<JobInput>,
) -> Result<(StatusCode, Json<JobProfile>), AppError> {
    let draft = input.validate()?;
    let job = state
        .profiles
        .create_job(tenant.client_id, &draft)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {} not found", draft.company_id)))?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<JobProfile>>, AppError> {
    Ok(Json(state.profiles.jobs(tenant.client_id).await?))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<JobProfile>, AppError> {
    let job = state
        .profiles
        .job_profile(tenant.client_id, id)
        .await?
        .ok_or_else(|| AppError::job_not_found(id))?;
    Ok(Json(job))
}

#[derive(Deserialize)]
pub struct JobStatusUpdate {
    pub status: JobStatus,
}

/// PATCH /api/v1/jobs/:id/status
pub async fn handle_update_job_status(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(req): Json<JobStatusUpdate>,
) -> Result<Json<JobProfile>, AppError> {
    let job = state
        .profiles
        .update_job_status(tenant.client_id, id, req.status)
        .await?
        .ok_or_else(|| AppError::job_not_found(id))?;
    Ok(Json(job))
}
