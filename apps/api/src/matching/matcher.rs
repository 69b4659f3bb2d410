//! External Matcher: semantic candidate/job scoring via the generative-language API.
//!
//! Contract: `Matcher::score` always returns a well-formed `MatchResult`.
//! Transport, parse and validation failures degrade to a zeroed result with the
//! reason in `analysis`; they are never returned as errors.
//!
//! `AppState` holds the matcher as `Arc<dyn Matcher>`, built once at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::llm_client::{LlmClient, LlmError};
use crate::matching::prompts::{build_match_prompt, match_system_prompt};
use crate::matching::weights::{clamp_score, ATS_WEIGHTS};
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobProfile;

/// Sub-scores, composite score and analysis for one candidate/job pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub skills_match: f64,
    pub experience_match: f64,
    pub education_match: f64,
    pub ats_score: i32,
    pub analysis: String,
    /// Set when the result is a fail-soft placeholder rather than a real score.
    #[serde(skip)]
    pub degraded: bool,
}

impl MatchResult {
    /// Clamps each sub-score to [0, 100] and derives the composite score.
    pub fn from_sub_scores(skills: f64, experience: f64, education: f64, analysis: String) -> Self {
        let skills_match = clamp_score(skills);
        let experience_match = clamp_score(experience);
        let education_match = clamp_score(education);
        Self {
            skills_match,
            experience_match,
            education_match,
            ats_score: ATS_WEIGHTS.overall(skills_match, experience_match, education_match),
            analysis,
            degraded: false,
        }
    }

    /// Zero-score placeholder carrying the failure reason.
    pub fn zeroed(reason: impl Into<String>) -> Self {
        Self {
            skills_match: 0.0,
            experience_match: 0.0,
            education_match: 0.0,
            ats_score: 0,
            analysis: reason.into(),
            degraded: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("response contained no JSON object")]
    NoJsonObject,

    #[error("response JSON could not be parsed: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("field '{0}' is missing or not a number")]
    NonNumeric(&'static str),
}

/// The matcher trait. Implement this to swap backends (or inject a test double)
/// without touching the orchestrator or handlers.
#[async_trait]
pub trait Matcher: Send + Sync {
    async fn score(&self, candidate: &CandidateProfile, job: &JobProfile) -> MatchResult;
}

/// Matcher backed by the Gemini `generateContent` API.
pub struct GeminiMatcher {
    llm: LlmClient,
}

impl GeminiMatcher {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn try_score(
        &self,
        candidate: &CandidateProfile,
        job: &JobProfile,
    ) -> Result<MatchResult, MatchError> {
        let prompt = build_match_prompt(candidate, job);
        let text = self.llm.call_text(&prompt, &match_system_prompt()).await?;
        parse_match_response(&text)
    }
}

#[async_trait]
impl Matcher for GeminiMatcher {
    async fn score(&self, candidate: &CandidateProfile, job: &JobProfile) -> MatchResult {
        match self.try_score(candidate, job).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Matcher degraded to zero score for candidate {} / job {}: {e}",
                    candidate.id(),
                    job.id
                );
                MatchResult::zeroed(format!("Unable to compute ATS score: {e}"))
            }
        }
    }
}

/// Reads the first JSON object embedded in raw model output, tolerating prose
/// and code fences on either side, and validates the three numeric sub-scores.
pub fn parse_match_response(text: &str) -> Result<MatchResult, MatchError> {
    let value = first_json_object(text)?;

    let skills = numeric_field(&value, "skillsMatch")?;
    let experience = numeric_field(&value, "experienceMatch")?;
    let education = numeric_field(&value, "educationMatch")?;
    let analysis = value
        .get("analysis")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(MatchResult::from_sub_scores(
        skills, experience, education, analysis,
    ))
}

/// Tries each `{` in order and deserializes exactly one value from it, so
/// braces in trailing prose never widen the match. Reports the first parse
/// error when no candidate yields an object.
fn first_json_object(text: &str) -> Result<Value, MatchError> {
    let mut first_error = None;
    for (start, _) in text.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) if value.is_object() => return Ok(value),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            _ => {}
        }
    }
    Err(first_error.map_or(MatchError::NoJsonObject, MatchError::InvalidJson))
}

fn numeric_field(value: &Value, name: &'static str) -> Result<f64, MatchError> {
    value
        .get(name)
        .and_then(Value::as_f64)
        .ok_or(MatchError::NonNumeric(name))
}
