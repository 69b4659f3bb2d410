//! In-memory repositories and a counting matcher for unit and router tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::matcher::{MatchResult, Matcher};
use crate::matching::orchestrator::ScoreOrchestrator;
use crate::matching::store::{ScoreStore, ScoreWrite};
use crate::models::candidate::{CandidateProfile, CandidateRow, EducationRow, ExperienceRow};
use crate::models::job::{CompanyRow, JobProfile, JobStatus};
use crate::models::score::{CandidateJobMapRow, CandidateScoreView, JobScoreView, MatchStatus};
use crate::profiles::repository::ProfileRepository;
use crate::profiles::validation::{CandidateDraft, JobDraft, NewCompany};

pub fn fixed_result(skills: f64, experience: f64, education: f64) -> MatchResult {
    MatchResult::from_sub_scores(
        skills,
        experience,
        education,
        "Deterministic test analysis.".to_string(),
    )
}

#[derive(Default)]
struct Tables {
    companies: Vec<CompanyRow>,
    candidates: Vec<CandidateProfile>,
    jobs: Vec<JobProfile>,
    maps: Vec<CandidateJobMapRow>,
    failing_upserts: HashSet<Uuid>,
}

/// Implements both `ProfileRepository` and `ScoreStore` over shared tables.
#[derive(Default)]
pub struct InMemoryDb {
    tables: RwLock<Tables>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_candidate(&self, client_id: Uuid, name: &str, skills: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let profile = CandidateProfile {
            candidate: CandidateRow {
                id,
                client_id,
                name: name.to_string(),
                email: Some(format!("{}@example.com", name.to_lowercase())),
                phone: None,
                location: None,
                years_experience: Some(4.0),
                linkedin_url: None,
                created_at: now,
                updated_at: now,
            },
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experiences: vec![],
            educations: vec![],
        };
        self.tables.write().unwrap().candidates.push(profile);
        id
    }

    /// Inserts a job under the tenant's first company, creating one if needed.
    pub fn insert_job(&self, client_id: Uuid, title: &str, skills: &[&str], status: &str) -> Uuid {
        let mut tables = self.tables.write().unwrap();
        let now = Utc::now();
        let company = match tables.companies.iter().find(|c| c.client_id == client_id) {
            Some(company) => company.clone(),
            None => {
                let company = CompanyRow {
                    id: Uuid::new_v4(),
                    client_id,
                    name: "Acme".to_string(),
                    industry: None,
                    website: None,
                    created_at: now,
                };
                tables.companies.push(company.clone());
                company
            }
        };
        let id = Uuid::new_v4();
        tables.jobs.push(JobProfile {
            id,
            company_id: company.id,
            company_name: company.name,
            client_id,
            title: title.to_string(),
            description: format!("{title} role"),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            required_experience: "mid".to_string(),
            required_education: "bachelor".to_string(),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn backdate(&self, candidate_id: Uuid, job_id: Uuid, scored_at: DateTime<Utc>) {
        let mut tables = self.tables.write().unwrap();
        if let Some(row) = tables
            .maps
            .iter_mut()
            .find(|m| m.candidate_id == candidate_id && m.job_id == job_id)
        {
            row.last_scored_at = Some(scored_at);
        }
    }

    pub fn fail_upserts_for(&self, candidate_id: Uuid) {
        self.tables
            .write()
            .unwrap()
            .failing_upserts
            .insert(candidate_id);
    }

    pub fn score_rows(&self) -> usize {
        self.tables.read().unwrap().maps.len()
    }

    fn candidate_visible(tables: &Tables, client_id: Uuid, candidate_id: Uuid) -> bool {
        tables
            .candidates
            .iter()
            .any(|c| c.id() == candidate_id && c.candidate.client_id == client_id)
    }

    fn job_visible(tables: &Tables, client_id: Uuid, job_id: Uuid) -> bool {
        tables
            .jobs
            .iter()
            .any(|j| j.id == job_id && j.client_id == client_id)
    }

    fn upsert_row(
        tables: &mut Tables,
        candidate_id: Uuid,
        job_id: Uuid,
        apply: impl FnOnce(&mut CandidateJobMapRow),
    ) -> CandidateJobMapRow {
        let now = Utc::now();
        let index = match tables
            .maps
            .iter()
            .position(|m| m.candidate_id == candidate_id && m.job_id == job_id)
        {
            Some(index) => index,
            None => {
                tables.maps.push(CandidateJobMapRow {
                    id: Uuid::new_v4(),
                    candidate_id,
                    job_id,
                    status: MatchStatus::default().as_str().to_string(),
                    ats_score: None,
                    skills_match: None,
                    experience_match: None,
                    education_match: None,
                    ats_analysis: None,
                    last_scored_at: None,
                    created_at: now,
                    updated_at: now,
                });
                tables.maps.len() - 1
            }
        };
        let row = &mut tables.maps[index];
        apply(row);
        row.updated_at = now;
        row.clone()
    }

    fn profile_from_draft(
        id: Uuid,
        client_id: Uuid,
        draft: &CandidateDraft,
        created_at: DateTime<Utc>,
    ) -> CandidateProfile {
        CandidateProfile {
            candidate: CandidateRow {
                id,
                client_id,
                name: draft.name.clone(),
                email: draft.email.clone(),
                phone: draft.phone.clone(),
                location: draft.location.clone(),
                years_experience: draft.years_experience,
                linkedin_url: draft.linkedin_url.clone(),
                created_at,
                updated_at: Utc::now(),
            },
            skills: draft.skills.clone(),
            experiences: draft
                .experiences
                .iter()
                .map(|e| ExperienceRow {
                    id: Uuid::new_v4(),
                    candidate_id: id,
                    title: e.title.clone(),
                    company: e.company.clone(),
                    start_date: e.start_date,
                    end_date: e.end_date,
                    description: e.description.clone(),
                })
                .collect(),
            educations: draft
                .educations
                .iter()
                .map(|e| EducationRow {
                    id: Uuid::new_v4(),
                    candidate_id: id,
                    institution: e.institution.clone(),
                    degree: e.degree.clone(),
                    field_of_study: e.field_of_study.clone(),
                    graduation_year: e.graduation_year,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryDb {
    async fn candidate_exists(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<bool, AppError> {
        let tables = self.tables.read().unwrap();
        Ok(Self::candidate_visible(&tables, client_id, candidate_id))
    }

    async fn job_exists(&self, client_id: Uuid, job_id: Uuid) -> Result<bool, AppError> {
        let tables = self.tables.read().unwrap();
        Ok(Self::job_visible(&tables, client_id, job_id))
    }

    async fn candidate_profile(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateProfile>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .candidates
            .iter()
            .find(|c| c.id() == candidate_id && c.candidate.client_id == client_id)
            .cloned())
    }

    async fn candidate_profiles(
        &self,
        client_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> Result<Vec<CandidateProfile>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .candidates
            .iter()
            .filter(|c| c.candidate.client_id == client_id && candidate_ids.contains(&c.id()))
            .cloned()
            .collect())
    }

    async fn tenant_candidates(&self, client_id: Uuid) -> Result<Vec<CandidateProfile>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .candidates
            .iter()
            .filter(|c| c.candidate.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn job_profile(
        &self,
        client_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<JobProfile>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .jobs
            .iter()
            .find(|j| j.id == job_id && j.client_id == client_id)
            .cloned())
    }

    async fn open_jobs(&self, client_id: Uuid) -> Result<Vec<JobProfile>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .jobs
            .iter()
            .filter(|j| j.client_id == client_id)
            .filter(|j| JobStatus::OPEN.iter().any(|s| s.as_str() == j.status))
            .cloned()
            .collect())
    }

    async fn jobs(&self, client_id: Uuid) -> Result<Vec<JobProfile>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .jobs
            .iter()
            .filter(|j| j.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn companies(&self, client_id: Uuid) -> Result<Vec<CompanyRow>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .companies
            .iter()
            .filter(|c| c.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn create_company(
        &self,
        client_id: Uuid,
        company: &NewCompany,
    ) -> Result<CompanyRow, AppError> {
        let row = CompanyRow {
            id: Uuid::new_v4(),
            client_id,
            name: company.name.clone(),
            industry: company.industry.clone(),
            website: company.website.clone(),
            created_at: Utc::now(),
        };
        self.tables.write().unwrap().companies.push(row.clone());
        Ok(row)
    }

    async fn create_candidate(
        &self,
        client_id: Uuid,
        draft: &CandidateDraft,
    ) -> Result<CandidateProfile, AppError> {
        let profile = Self::profile_from_draft(Uuid::new_v4(), client_id, draft, Utc::now());
        self.tables
            .write()
            .unwrap()
            .candidates
            .push(profile.clone());
        Ok(profile)
    }

    async fn update_candidate(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
        draft: &CandidateDraft,
    ) -> Result<Option<CandidateProfile>, AppError> {
        let mut tables = self.tables.write().unwrap();
        let Some(existing) = tables
            .candidates
            .iter_mut()
            .find(|c| c.id() == candidate_id && c.candidate.client_id == client_id)
        else {
            return Ok(None);
        };
        *existing =
            Self::profile_from_draft(candidate_id, client_id, draft, existing.candidate.created_at);
        Ok(Some(existing.clone()))
    }

    async fn create_job(
        &self,
        client_id: Uuid,
        draft: &JobDraft,
    ) -> Result<Option<JobProfile>, AppError> {
        let mut tables = self.tables.write().unwrap();
        let Some(company) = tables
            .companies
            .iter()
            .find(|c| c.id == draft.company_id && c.client_id == client_id)
            .cloned()
        else {
            return Ok(None);
        };
        let now = Utc::now();
        let job = JobProfile {
            id: Uuid::new_v4(),
            company_id: company.id,
            company_name: company.name,
            client_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            required_skills: draft.required_skills.clone(),
            required_experience: draft.required_experience.as_str().to_string(),
            required_education: draft.required_education.as_str().to_string(),
            status: draft.status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.jobs.push(job.clone());
        Ok(Some(job))
    }

    async fn update_job_status(
        &self,
        client_id: Uuid,
        job_id: Uuid,
        status: JobStatus,
    ) -> Result<Option<JobProfile>, AppError> {
        let mut tables = self.tables.write().unwrap();
        Ok(tables
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.client_id == client_id)
            .map(|job| {
                job.status = status.as_str().to_string();
                job.updated_at = Utc::now();
                job.clone()
            }))
    }
}

#[async_trait]
impl ScoreStore for InMemoryDb {
    async fn find(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<CandidateJobMapRow>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .maps
            .iter()
            .find(|m| m.candidate_id == candidate_id && m.job_id == job_id)
            .cloned())
    }

    async fn find_for_job(
        &self,
        job_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> Result<Vec<CandidateJobMapRow>, AppError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .maps
            .iter()
            .filter(|m| m.job_id == job_id && candidate_ids.contains(&m.candidate_id))
            .cloned()
            .collect())
    }

    async fn upsert_score(&self, write: &ScoreWrite) -> Result<CandidateJobMapRow, AppError> {
        let mut tables = self.tables.write().unwrap();
        if tables.failing_upserts.contains(&write.candidate_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "simulated write failure for candidate {}",
                write.candidate_id
            )));
        }
        let result = &write.result;
        Ok(Self::upsert_row(
            &mut tables,
            write.candidate_id,
            write.job_id,
            |row| {
                row.ats_score = Some(result.ats_score);
                row.skills_match = Some(result.skills_match);
                row.experience_match = Some(result.experience_match);
                row.education_match = Some(result.education_match);
                row.ats_analysis = Some(result.analysis.clone());
                row.last_scored_at = write.scored_at;
            },
        ))
    }

    async fn set_status(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: MatchStatus,
    ) -> Result<CandidateJobMapRow, AppError> {
        let mut tables = self.tables.write().unwrap();
        Ok(Self::upsert_row(&mut tables, candidate_id, job_id, |row| {
            row.status = status.as_str().to_string();
        }))
    }

    async fn candidate_scores(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<CandidateScoreView>, AppError> {
        let tables = self.tables.read().unwrap();
        if !Self::candidate_visible(&tables, client_id, candidate_id) {
            return Ok(vec![]);
        }
        let mut views: Vec<CandidateScoreView> = tables
            .maps
            .iter()
            .filter(|m| m.candidate_id == candidate_id)
            .filter_map(|m| {
                let job = tables
                    .jobs
                    .iter()
                    .find(|j| j.id == m.job_id && j.client_id == client_id)?;
                Some(CandidateScoreView {
                    candidate_id: m.candidate_id,
                    job_id: m.job_id,
                    status: m.status.clone(),
                    ats_score: m.ats_score,
                    skills_match: m.skills_match,
                    experience_match: m.experience_match,
                    education_match: m.education_match,
                    ats_analysis: m.ats_analysis.clone(),
                    last_scored_at: m.last_scored_at,
                    job_title: job.title.clone(),
                    job_status: job.status.clone(),
                    company_name: job.company_name.clone(),
                })
            })
            .collect();
        views.sort_by(|a, b| b.ats_score.cmp(&a.ats_score));
        Ok(views)
    }

    async fn job_scores(
        &self,
        client_id: Uuid,
        job_id: Uuid,
    ) -> Result<Vec<JobScoreView>, AppError> {
        let tables = self.tables.read().unwrap();
        if !Self::job_visible(&tables, client_id, job_id) {
            return Ok(vec![]);
        }
        let mut views: Vec<JobScoreView> = tables
            .maps
            .iter()
            .filter(|m| m.job_id == job_id)
            .filter_map(|m| {
                let candidate = tables
                    .candidates
                    .iter()
                    .find(|c| c.id() == m.candidate_id && c.candidate.client_id == client_id)?;
                Some(JobScoreView {
                    candidate_id: m.candidate_id,
                    job_id: m.job_id,
                    status: m.status.clone(),
                    ats_score: m.ats_score,
                    skills_match: m.skills_match,
                    experience_match: m.experience_match,
                    education_match: m.education_match,
                    ats_analysis: m.ats_analysis.clone(),
                    last_scored_at: m.last_scored_at,
                    candidate_name: candidate.candidate.name.clone(),
                    candidate_email: candidate.candidate.email.clone(),
                })
            })
            .collect();
        views.sort_by(|a, b| b.ats_score.cmp(&a.ats_score));
        Ok(views)
    }
}

/// Matcher double: counts calls and returns configured results.
/// Lookup order: failing candidate, candidate override, job override, default.
pub struct CountingMatcher {
    calls: AtomicUsize,
    default: RwLock<MatchResult>,
    by_candidate: RwLock<HashMap<Uuid, MatchResult>>,
    by_job: RwLock<HashMap<Uuid, MatchResult>>,
    failing: RwLock<HashSet<Uuid>>,
}

impl Default for CountingMatcher {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            default: RwLock::new(fixed_result(70.0, 70.0, 70.0)),
            by_candidate: RwLock::default(),
            by_job: RwLock::default(),
            failing: RwLock::default(),
        }
    }
}

impl CountingMatcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_default(&self, result: MatchResult) {
        *self.default.write().unwrap() = result;
    }

    pub fn set_for_candidate(&self, candidate_id: Uuid, result: MatchResult) {
        self.by_candidate
            .write()
            .unwrap()
            .insert(candidate_id, result);
    }

    pub fn set_for_job(&self, job_id: Uuid, result: MatchResult) {
        self.by_job.write().unwrap().insert(job_id, result);
    }

    /// Makes the matcher degrade (zero score) for this candidate.
    pub fn fail_for(&self, candidate_id: Uuid) {
        self.failing.write().unwrap().insert(candidate_id);
    }
}

#[async_trait]
impl Matcher for CountingMatcher {
    async fn score(&self, candidate: &CandidateProfile, job: &JobProfile) -> MatchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.read().unwrap().contains(&candidate.id()) {
            return MatchResult::zeroed("Unable to compute ATS score: simulated outage");
        }
        if let Some(result) = self.by_candidate.read().unwrap().get(&candidate.id()) {
            return result.clone();
        }
        if let Some(result) = self.by_job.read().unwrap().get(&job.id) {
            return result.clone();
        }
        self.default.read().unwrap().clone()
    }
}

/// One tenant, one in-memory database, one counting matcher.
pub struct Fixture {
    pub tenant: Uuid,
    pub db: Arc<InMemoryDb>,
    pub matcher: Arc<CountingMatcher>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            tenant: Uuid::new_v4(),
            db: Arc::new(InMemoryDb::new()),
            matcher: Arc::new(CountingMatcher::default()),
        }
    }

    pub fn candidate(&self, client_id: Uuid, name: &str, skills: &[&str]) -> Uuid {
        self.db.insert_candidate(client_id, name, skills)
    }

    pub fn job(&self, client_id: Uuid, title: &str, skills: &[&str], status: &str) -> Uuid {
        self.db.insert_job(client_id, title, skills, status)
    }

    pub fn orchestrator(&self) -> ScoreOrchestrator {
        ScoreOrchestrator::new(
            self.db.clone(),
            self.db.clone(),
            self.matcher.clone(),
            Duration::days(7),
            4,
        )
    }
}
