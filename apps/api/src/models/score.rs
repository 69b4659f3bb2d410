use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Sourcing relationship between a candidate and a job. Independent of scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Candidate,
    Applicant,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Candidate => "candidate",
            MatchStatus::Applicant => "applicant",
            MatchStatus::Rejected => "rejected",
        }
    }
}

/// One `candidate_job_maps` row: the cached score for a (candidate, job) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateJobMapRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub ats_score: Option<i32>,
    pub skills_match: Option<f64>,
    pub experience_match: Option<f64>,
    pub education_match: Option<f64>,
    pub ats_analysis: Option<String>,
    pub last_scored_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cached score joined with a job summary, for the candidate-side read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateScoreView {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub ats_score: Option<i32>,
    pub skills_match: Option<f64>,
    pub experience_match: Option<f64>,
    pub education_match: Option<f64>,
    pub ats_analysis: Option<String>,
    pub last_scored_at: Option<DateTime<Utc>>,
    pub job_title: String,
    pub job_status: String,
    pub company_name: String,
}

/// Cached score joined with a candidate summary, for the job-side read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobScoreView {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub ats_score: Option<i32>,
    pub skills_match: Option<f64>,
    pub experience_match: Option<f64>,
    pub education_match: Option<f64>,
    pub ats_analysis: Option<String>,
    pub last_scored_at: Option<DateTime<Utc>>,
    pub candidate_name: String,
    pub candidate_email: Option<String>,
}
