//! Profile repository: tenant-scoped access to candidates, companies and jobs.
//!
//! Every query filters on `client_id` (jobs through their company). A record
//! owned by another tenant is indistinguishable from a missing one.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{CandidateProfile, CandidateRow, EducationRow, ExperienceRow};
use crate::models::job::{CompanyRow, JobProfile, JobStatus};
use crate::profiles::validation::{CandidateDraft, JobDraft, NewCompany};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn candidate_exists(&self, client_id: Uuid, candidate_id: Uuid)
        -> Result<bool, AppError>;

    async fn job_exists(&self, client_id: Uuid, job_id: Uuid) -> Result<bool, AppError>;

    async fn candidate_profile(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateProfile>, AppError>;

    /// Profiles for the given ids that belong to the tenant; unknown ids are skipped.
    async fn candidate_profiles(
        &self,
        client_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> Result<Vec<CandidateProfile>, AppError>;

    /// Every candidate of the tenant, oldest first.
    async fn tenant_candidates(&self, client_id: Uuid) -> Result<Vec<CandidateProfile>, AppError>;

    async fn job_profile(&self, client_id: Uuid, job_id: Uuid)
        -> Result<Option<JobProfile>, AppError>;

    /// Tenant jobs in a rankable status (new, active, closing soon), oldest first.
    async fn open_jobs(&self, client_id: Uuid) -> Result<Vec<JobProfile>, AppError>;

    async fn jobs(&self, client_id: Uuid) -> Result<Vec<JobProfile>, AppError>;

    async fn companies(&self, client_id: Uuid) -> Result<Vec<CompanyRow>, AppError>;

    async fn create_company(
        &self,
        client_id: Uuid,
        company: &NewCompany,
    ) -> Result<CompanyRow, AppError>;

    async fn create_candidate(
        &self,
        client_id: Uuid,
        draft: &CandidateDraft,
    ) -> Result<CandidateProfile, AppError>;

    /// Replaces the profile and its nested lists. `None` if not in the tenant.
    async fn update_candidate(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
        draft: &CandidateDraft,
    ) -> Result<Option<CandidateProfile>, AppError>;

    /// `None` if the company does not belong to the tenant.
    async fn create_job(
        &self,
        client_id: Uuid,
        draft: &JobDraft,
    ) -> Result<Option<JobProfile>, AppError>;

    async fn update_job_status(
        &self,
        client_id: Uuid,
        job_id: Uuid,
        status: JobStatus,
    ) -> Result<Option<JobProfile>, AppError>;
}

const JOB_PROFILE_SELECT: &str = r#"
    SELECT j.id, j.company_id, co.name AS company_name, co.client_id, j.title,
           j.description, j.required_skills, j.required_experience,
           j.required_education, j.status, j.created_at, j.updated_at
    FROM jobs j
    JOIN companies co ON co.id = j.company_id
"#;

pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attaches skills, experiences and educations to candidate rows with one
    /// query per association.
    async fn attach_associations(
        &self,
        rows: Vec<CandidateRow>,
    ) -> Result<Vec<CandidateProfile>, AppError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let skills: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT cs.candidate_id, s.name
            FROM candidate_skills cs
            JOIN skills s ON s.id = cs.skill_id
            WHERE cs.candidate_id = ANY($1)
            ORDER BY s.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let experiences = sqlx::query_as::<_, ExperienceRow>(
            "SELECT * FROM experiences WHERE candidate_id = ANY($1) ORDER BY start_date DESC NULLS LAST",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let educations = sqlx::query_as::<_, EducationRow>(
            "SELECT * FROM educations WHERE candidate_id = ANY($1) ORDER BY graduation_year DESC NULLS LAST",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut skills_by: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (candidate_id, name) in skills {
            skills_by.entry(candidate_id).or_default().push(name);
        }
        let mut experiences_by: HashMap<Uuid, Vec<ExperienceRow>> = HashMap::new();
        for exp in experiences {
            experiences_by.entry(exp.candidate_id).or_default().push(exp);
        }
        let mut educations_by: HashMap<Uuid, Vec<EducationRow>> = HashMap::new();
        for edu in educations {
            educations_by.entry(edu.candidate_id).or_default().push(edu);
        }

        Ok(rows
            .into_iter()
            .map(|candidate| CandidateProfile {
                skills: skills_by.remove(&candidate.id).unwrap_or_default(),
                experiences: experiences_by.remove(&candidate.id).unwrap_or_default(),
                educations: educations_by.remove(&candidate.id).unwrap_or_default(),
                candidate,
            })
            .collect())
    }

    async fn reload_candidate(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<CandidateProfile, AppError> {
        self.candidate_profile(client_id, candidate_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Candidate {candidate_id} vanished after write"
                ))
            })
    }
}

/// Writes the skills, experiences and educations of a draft for one candidate.
async fn insert_associations(
    tx: &mut Transaction<'_, Postgres>,
    candidate_id: Uuid,
    draft: &CandidateDraft,
) -> Result<(), sqlx::Error> {
    for skill in &draft.skills {
        let skill_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO skills (id, name) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(skill)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO candidate_skills (candidate_id, skill_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(candidate_id)
        .bind(skill_id)
        .execute(&mut **tx)
        .await?;
    }

    for exp in &draft.experiences {
        sqlx::query(
            r#"
            INSERT INTO experiences (id, candidate_id, title, company, start_date, end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(&exp.title)
        .bind(&exp.company)
        .bind(exp.start_date)
        .bind(exp.end_date)
        .bind(&exp.description)
        .execute(&mut **tx)
        .await?;
    }

    for edu in &draft.educations {
        sqlx::query(
            r#"
            INSERT INTO educations (id, candidate_id, institution, degree, field_of_study, graduation_year)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(&edu.institution)
        .bind(&edu.degree)
        .bind(&edu.field_of_study)
        .bind(edu.graduation_year)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn candidate_exists(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM candidates WHERE id = $1 AND client_id = $2)",
        )
        .bind(candidate_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn job_exists(&self, client_id: Uuid, job_id: Uuid) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM jobs j JOIN companies co ON co.id = j.company_id
                WHERE j.id = $1 AND co.client_id = $2
            )
            "#,
        )
        .bind(job_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn candidate_profile(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateProfile>, AppError> {
        let row = sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates WHERE id = $1 AND client_id = $2",
        )
        .bind(candidate_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_associations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn candidate_profiles(
        &self,
        client_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> Result<Vec<CandidateProfile>, AppError> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates WHERE id = ANY($1) AND client_id = $2",
        )
        .bind(candidate_ids)
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_associations(rows).await
    }

    async fn tenant_candidates(&self, client_id: Uuid) -> Result<Vec<CandidateProfile>, AppError> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates WHERE client_id = $1 ORDER BY created_at, id",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_associations(rows).await
    }

    async fn job_profile(
        &self,
        client_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<JobProfile>, AppError> {
        let sql = format!("{JOB_PROFILE_SELECT} WHERE j.id = $1 AND co.client_id = $2");
        Ok(sqlx::query_as::<_, JobProfile>(&sql)
            .bind(job_id)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn open_jobs(&self, client_id: Uuid) -> Result<Vec<JobProfile>, AppError> {
        let open: Vec<&str> = JobStatus::OPEN.iter().map(JobStatus::as_str).collect();
        let sql = format!(
            "{JOB_PROFILE_SELECT} WHERE co.client_id = $1 AND j.status = ANY($2) ORDER BY j.created_at, j.id"
        );
        Ok(sqlx::query_as::<_, JobProfile>(&sql)
            .bind(client_id)
            .bind(open)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn jobs(&self, client_id: Uuid) -> Result<Vec<JobProfile>, AppError> {
        let sql = format!("{JOB_PROFILE_SELECT} WHERE co.client_id = $1 ORDER BY j.created_at, j.id");
        Ok(sqlx::query_as::<_, JobProfile>(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn companies(&self, client_id: Uuid) -> Result<Vec<CompanyRow>, AppError> {
        Ok(sqlx::query_as::<_, CompanyRow>(
            "SELECT * FROM companies WHERE client_id = $1 ORDER BY name",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_company(
        &self,
        client_id: Uuid,
        company: &NewCompany,
    ) -> Result<CompanyRow, AppError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            INSERT INTO companies (id, client_id, name, industry, website)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(&company.name)
        .bind(&company.industry)
        .bind(&company.website)
        .fetch_one(&self.pool)
        .await?;

        info!("Created company {} for client {client_id}", row.id);
        Ok(row)
    }

    async fn create_candidate(
        &self,
        client_id: Uuid,
        draft: &CandidateDraft,
    ) -> Result<CandidateProfile, AppError> {
        let candidate_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO candidates
                (id, client_id, name, email, phone, location, years_experience, linkedin_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(candidate_id)
        .bind(client_id)
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.location)
        .bind(draft.years_experience)
        .bind(&draft.linkedin_url)
        .execute(&mut *tx)
        .await?;

        insert_associations(&mut tx, candidate_id, draft).await?;
        tx.commit().await?;

        info!("Created candidate {candidate_id} for client {client_id}");
        self.reload_candidate(client_id, candidate_id).await
    }

    async fn update_candidate(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
        draft: &CandidateDraft,
    ) -> Result<Option<CandidateProfile>, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE candidates SET
                name = $3, email = $4, phone = $5, location = $6,
                years_experience = $7, linkedin_url = $8, updated_at = now()
            WHERE id = $1 AND client_id = $2
            "#,
        )
        .bind(candidate_id)
        .bind(client_id)
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.location)
        .bind(draft.years_experience)
        .bind(&draft.linkedin_url)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        for table in ["candidate_skills", "experiences", "educations"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE candidate_id = $1"))
                .bind(candidate_id)
                .execute(&mut *tx)
                .await?;
        }

        insert_associations(&mut tx, candidate_id, draft).await?;
        tx.commit().await?;

        info!("Updated candidate {candidate_id} for client {client_id}");
        Ok(Some(self.reload_candidate(client_id, candidate_id).await?))
    }

    async fn create_job(
        &self,
        client_id: Uuid,
        draft: &JobDraft,
    ) -> Result<Option<JobProfile>, AppError> {
        let company_visible: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE id = $1 AND client_id = $2)",
        )
        .bind(draft.company_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;

        if !company_visible {
            return Ok(None);
        }

        let job_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO jobs
                (id, company_id, title, description, required_skills,
                 required_experience, required_education, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(job_id)
        .bind(draft.company_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.required_skills)
        .bind(draft.required_experience.as_str())
        .bind(draft.required_education.as_str())
        .bind(draft.status.as_str())
        .execute(&self.pool)
        .await?;

        info!("Created job {job_id} for client {client_id}");
        self.job_profile(client_id, job_id).await
    }

    async fn update_job_status(
        &self,
        client_id: Uuid,
        job_id: Uuid,
        status: JobStatus,
    ) -> Result<Option<JobProfile>, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE jobs SET status = $3, updated_at = now()
            WHERE id = $1
              AND company_id IN (SELECT id FROM companies WHERE client_id = $2)
            "#,
        )
        .bind(job_id)
        .bind(client_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.job_profile(client_id, job_id).await
    }
}
