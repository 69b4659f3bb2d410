//! Score Orchestrator: cache-aside scoring of candidate/job pairs.
//!
//! Flow per pair: staleness check against the Score Store -> on miss load both
//! profiles -> `Matcher::score` -> upsert -> return.
//!
//! Errors surface only for missing/cross-tenant entities and infrastructure
//! faults. Inside a batch, a failing item becomes a zero-score placeholder and
//! the batch carries on.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::matcher::{MatchResult, Matcher};
use crate::matching::store::{ScoreStore, ScoreWrite};
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobProfile;
use crate::models::score::CandidateJobMapRow;
use crate::profiles::repository::ProfileRepository;

/// Score for one pair as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairScore {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub ats_score: i32,
    pub skills_match: f64,
    pub experience_match: f64,
    pub education_match: f64,
    pub analysis: String,
    pub last_scored_at: Option<DateTime<Utc>>,
    /// True when served from the Score Store without calling the matcher.
    pub cached: bool,
}

impl PairScore {
    fn from_result(
        candidate_id: Uuid,
        job_id: Uuid,
        result: MatchResult,
        scored_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            candidate_id,
            job_id,
            ats_score: result.ats_score,
            skills_match: result.skills_match,
            experience_match: result.experience_match,
            education_match: result.education_match,
            analysis: result.analysis,
            last_scored_at: scored_at,
            cached: false,
        }
    }

    fn from_cached_row(row: &CandidateJobMapRow) -> Option<Self> {
        Some(Self {
            candidate_id: row.candidate_id,
            job_id: row.job_id,
            ats_score: row.ats_score?,
            skills_match: row.skills_match?,
            experience_match: row.experience_match?,
            education_match: row.education_match?,
            analysis: row.ats_analysis.clone()?,
            last_scored_at: row.last_scored_at,
            cached: true,
        })
    }

    fn placeholder(candidate_id: Uuid, job_id: Uuid, reason: String) -> Self {
        Self::from_result(candidate_id, job_id, MatchResult::zeroed(reason), None)
    }
}

/// A job ranked for one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct RankedJob {
    #[serde(flatten)]
    pub score: PairScore,
    pub job: JobProfile,
}

/// A candidate ranked for one job.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub score: PairScore,
    pub candidate: CandidateProfile,
}

/// A cached row is served iff it has complete scores, a non-empty analysis and
/// was stamped less than `window` ago.
pub fn is_fresh(row: &CandidateJobMapRow, now: DateTime<Utc>, window: Duration) -> bool {
    let Some(scored_at) = row.last_scored_at else {
        return false;
    };
    let has_analysis = row
        .ats_analysis
        .as_deref()
        .is_some_and(|a| !a.trim().is_empty());
    row.ats_score.is_some() && has_analysis && now - scored_at < window
}

/// Stable descending sort on `ats_score`; ties keep input order.
pub fn rank_by_score<T>(items: &mut [T], score: impl Fn(&T) -> i32) {
    items.sort_by(|a, b| score(b).cmp(&score(a)));
}

pub struct ScoreOrchestrator {
    profiles: Arc<dyn ProfileRepository>,
    store: Arc<dyn ScoreStore>,
    matcher: Arc<dyn Matcher>,
    staleness: Duration,
    concurrency: usize,
}

impl ScoreOrchestrator {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        store: Arc<dyn ScoreStore>,
        matcher: Arc<dyn Matcher>,
        staleness: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            profiles,
            store,
            matcher,
            staleness,
            concurrency: concurrency.max(1),
        }
    }

    /// Cache-aware score for one pair.
    pub async fn ensure_score(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<PairScore, AppError> {
        if !self.profiles.candidate_exists(client_id, candidate_id).await? {
            return Err(AppError::candidate_not_found(candidate_id));
        }
        if !self.profiles.job_exists(client_id, job_id).await? {
            return Err(AppError::job_not_found(job_id));
        }

        if let Some(row) = self.store.find(candidate_id, job_id).await? {
            if is_fresh(&row, Utc::now(), self.staleness) {
                if let Some(score) = PairScore::from_cached_row(&row) {
                    debug!("Cache hit for candidate {candidate_id} / job {job_id}");
                    return Ok(score);
                }
            }
        }

        self.compute_score(client_id, candidate_id, job_id).await
    }

    /// Always recomputes the pair and persists the result.
    pub async fn compute_score(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<PairScore, AppError> {
        let candidate = self
            .profiles
            .candidate_profile(client_id, candidate_id)
            .await?
            .ok_or_else(|| AppError::candidate_not_found(candidate_id))?;
        let job = self
            .profiles
            .job_profile(client_id, job_id)
            .await?
            .ok_or_else(|| AppError::job_not_found(job_id))?;

        self.score_and_store(&candidate, &job).await
    }

    /// Cache-aware scores for many candidates against one job, keyed by
    /// candidate id. Exactly one entry per distinct input id.
    pub async fn ensure_scores_bulk(
        &self,
        client_id: Uuid,
        candidate_ids: &[Uuid],
        job_id: Uuid,
    ) -> Result<HashMap<Uuid, PairScore>, AppError> {
        let job = self
            .profiles
            .job_profile(client_id, job_id)
            .await?
            .ok_or_else(|| AppError::job_not_found(job_id))?;

        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = candidate_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let now = Utc::now();
        let mut rows: HashMap<Uuid, CandidateJobMapRow> = self
            .store
            .find_for_job(job_id, &ids)
            .await?
            .into_iter()
            .map(|row| (row.candidate_id, row))
            .collect();

        let mut results = HashMap::with_capacity(ids.len());
        let mut stale = Vec::new();
        for id in ids {
            let cached = rows
                .remove(&id)
                .filter(|row| is_fresh(row, now, self.staleness))
                .and_then(|row| PairScore::from_cached_row(&row));
            match cached {
                Some(score) => {
                    results.insert(id, score);
                }
                None => stale.push(id),
            }
        }

        info!(
            "Bulk ensure for job {job_id}: {} cached, {} to score",
            results.len(),
            stale.len()
        );

        if stale.is_empty() {
            return Ok(results);
        }

        let candidates = self.profiles.candidate_profiles(client_id, &stale).await?;
        let found: HashSet<Uuid> = candidates.iter().map(CandidateProfile::id).collect();
        for id in stale.iter().filter(|id| !found.contains(id)) {
            warn!("Bulk ensure for job {job_id}: candidate {id} not visible to client");
            results.insert(
                *id,
                PairScore::placeholder(*id, job_id, format!("Candidate {id} not found")),
            );
        }

        let job = &job;
        let fresh: Vec<PairScore> = stream::iter(candidates)
            .map(|candidate| async move { self.score_item(&candidate, job).await })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for score in fresh {
            results.insert(score.candidate_id, score);
        }

        Ok(results)
    }

    /// Recomputes the candidate against every open tenant job, best first.
    pub async fn match_candidate_across_jobs(
        &self,
        client_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<RankedJob>, AppError> {
        let candidate = self
            .profiles
            .candidate_profile(client_id, candidate_id)
            .await?
            .ok_or_else(|| AppError::candidate_not_found(candidate_id))?;
        let jobs = self.profiles.open_jobs(client_id).await?;

        info!(
            "Matching candidate {candidate_id} across {} open jobs",
            jobs.len()
        );

        let candidate = &candidate;
        let mut ranked: Vec<RankedJob> = stream::iter(jobs)
            .map(|job| async move {
                let score = self.score_item(candidate, &job).await;
                RankedJob { score, job }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        rank_by_score(&mut ranked, |r| r.score.ats_score);
        Ok(ranked)
    }

    /// Recomputes the job against every tenant candidate, best first.
    pub async fn match_job_across_candidates(
        &self,
        client_id: Uuid,
        job_id: Uuid,
    ) -> Result<Vec<RankedCandidate>, AppError> {
        let job = self
            .profiles
            .job_profile(client_id, job_id)
            .await?
            .ok_or_else(|| AppError::job_not_found(job_id))?;
        let candidates = self.profiles.tenant_candidates(client_id).await?;

        info!(
            "Matching job {job_id} across {} candidates",
            candidates.len()
        );

        let job = &job;
        let mut ranked: Vec<RankedCandidate> = stream::iter(candidates)
            .map(|candidate| async move {
                let score = self.score_item(&candidate, job).await;
                RankedCandidate { score, candidate }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        rank_by_score(&mut ranked, |r| r.score.ats_score);
        Ok(ranked)
    }

    /// Calls the matcher and persists the result. Degraded results are stored
    /// without a timestamp so they are never served as fresh.
    async fn score_and_store(
        &self,
        candidate: &CandidateProfile,
        job: &JobProfile,
    ) -> Result<PairScore, AppError> {
        let result = self.matcher.score(candidate, job).await;
        let scored_at = if result.degraded {
            warn!(
                "Storing degraded score for candidate {} / job {}",
                candidate.id(),
                job.id
            );
            None
        } else {
            Some(Utc::now())
        };

        self.store
            .upsert_score(&ScoreWrite {
                candidate_id: candidate.id(),
                job_id: job.id,
                result: result.clone(),
                scored_at,
            })
            .await?;

        Ok(PairScore::from_result(
            candidate.id(),
            job.id,
            result,
            scored_at,
        ))
    }

    /// Batch item: never fails, substitutes a zero placeholder on error.
    async fn score_item(&self, candidate: &CandidateProfile, job: &JobProfile) -> PairScore {
        match self.score_and_store(candidate, job).await {
            Ok(score) => score,
            Err(e) => {
                error!(
                    "Scoring failed for candidate {} / job {}: {e}",
                    candidate.id(),
                    job.id
                );
                PairScore::placeholder(
                    candidate.id(),
                    job.id,
                    format!("Unable to compute ATS score: {e}"),
                )
            }
        }
    }
}
