//! Score Store: persistence of `candidate_job_maps` rows.
//!
//! Writes are single `INSERT ... ON CONFLICT (candidate_id, job_id) DO UPDATE`
//! statements against the `uq_candidate_job` constraint, so concurrent scorers
//! of the same pair converge on one row (last write wins).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::matcher::MatchResult;
use crate::models::score::{CandidateJobMapRow, CandidateScoreView, JobScoreView, MatchStatus};

/// A score to persist for one pair. `scored_at = None` marks a result that
/// must not be served from cache.
#[derive(Debug, Clone)]
pub struct ScoreWrite {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub result: MatchResult,
    pub scored_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn find(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<CandidateJobMapRow>, AppError>;

    /// Rows for `job_id` restricted to the given candidates.
    async fn find_for_job(
        &self,
        job_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> Result<Vec<CandidateJobMapRow>, AppError>;

    /// Inserts or updates the score fields of a pair. Never touches `status`.
    async fn upsert_score(&self, write: &ScoreWrite) -> Result<CandidateJobMapRow, AppError>;

    /// Inserts or updates the sourcing status of a pair. Never touches scores.
    async fn set_status(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: MatchStatus,
    ) -> Result<CandidateJobMapRow, AppError>;

    /// All rows for a tenant's candidate, joined with the job summary,
    /// highest score first.
    async fn candidate_scores(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<CandidateScoreView>, AppError>;

    /// All rows for a tenant's job, joined with the candidate summary,
    /// highest score first.
    async fn job_scores(&self, client_id: Uuid, job_id: Uuid)
        -> Result<Vec<JobScoreView>, AppError>;
}

pub struct PgScoreStore {
    pool: PgPool,
}

impl PgScoreStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreStore for PgScoreStore {
    async fn find(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<CandidateJobMapRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateJobMapRow>(
            "SELECT * FROM candidate_job_maps WHERE candidate_id = $1 AND job_id = $2",
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_for_job(
        &self,
        job_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> Result<Vec<CandidateJobMapRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateJobMapRow>(
            "SELECT * FROM candidate_job_maps WHERE job_id = $1 AND candidate_id = ANY($2)",
        )
        .bind(job_id)
        .bind(candidate_ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn upsert_score(&self, write: &ScoreWrite) -> Result<CandidateJobMapRow, AppError> {
        Ok(sqlx::query_as::<_, CandidateJobMapRow>(
            r#"
            INSERT INTO candidate_job_maps
                (id, candidate_id, job_id, status, ats_score, skills_match,
                 experience_match, education_match, ats_analysis, last_scored_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (candidate_id, job_id) DO UPDATE SET
                ats_score = EXCLUDED.ats_score,
                skills_match = EXCLUDED.skills_match,
                experience_match = EXCLUDED.experience_match,
                education_match = EXCLUDED.education_match,
                ats_analysis = EXCLUDED.ats_analysis,
                last_scored_at = EXCLUDED.last_scored_at,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(write.candidate_id)
        .bind(write.job_id)
        .bind(MatchStatus::default().as_str())
        .bind(write.result.ats_score)
        .bind(write.result.skills_match)
        .bind(write.result.experience_match)
        .bind(write.result.education_match)
        .bind(&write.result.analysis)
        .bind(write.scored_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn set_status(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: MatchStatus,
    ) -> Result<CandidateJobMapRow, AppError> {
        Ok(sqlx::query_as::<_, CandidateJobMapRow>(
            r#"
            INSERT INTO candidate_job_maps (id, candidate_id, job_id, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (candidate_id, job_id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(job_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn candidate_scores(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<CandidateScoreView>, AppError> {
        Ok(sqlx::query_as::<_, CandidateScoreView>(
            r#"
            SELECT m.candidate_id, m.job_id, m.status, m.ats_score, m.skills_match,
                   m.experience_match, m.education_match, m.ats_analysis, m.last_scored_at,
                   j.title AS job_title, j.status AS job_status, co.name AS company_name
            FROM candidate_job_maps m
            JOIN candidates c ON c.id = m.candidate_id
            JOIN jobs j ON j.id = m.job_id
            JOIN companies co ON co.id = j.company_id
            WHERE m.candidate_id = $1 AND c.client_id = $2 AND co.client_id = $2
            ORDER BY m.ats_score DESC NULLS LAST, m.created_at
            "#,
        )
        .bind(candidate_id)
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn job_scores(
        &self,
        client_id: Uuid,
        job_id: Uuid,
    ) -> Result<Vec<JobScoreView>, AppError> {
        Ok(sqlx::query_as::<_, JobScoreView>(
            r#"
            SELECT m.candidate_id, m.job_id, m.status, m.ats_score, m.skills_match,
                   m.experience_match, m.education_match, m.ats_analysis, m.last_scored_at,
                   c.name AS candidate_name, c.email AS candidate_email
            FROM candidate_job_maps m
            JOIN candidates c ON c.id = m.candidate_id
            JOIN jobs j ON j.id = m.job_id
            JOIN companies co ON co.id = j.company_id
            WHERE m.job_id = $1 AND c.client_id = $2 AND co.client_id = $2
            ORDER BY m.ats_score DESC NULLS LAST, m.created_at
            "#,
        )
        .bind(job_id)
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
