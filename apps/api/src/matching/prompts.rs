// All LLM prompt constants for the matching module.
// Reuses cross-cutting fragments from llm_client::prompts.

use serde_json::json;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobProfile;

/// Persona for candidate-job matching. Appended with `JSON_ONLY_SYSTEM`.
pub const MATCH_PERSONA: &str = "You are an expert technical recruiter and applicant \
    tracking system. You compare a candidate profile against a job profile and score \
    how well they match.";

/// Candidate-job matching prompt. Replace `{candidate_json}` and `{job_json}` before sending.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Evaluate how well the candidate matches the job.

CANDIDATE PROFILE:
{candidate_json}

JOB PROFILE:
{job_json}

Return a JSON object with this EXACT schema:
{
  "skillsMatch": 0,
  "experienceMatch": 0,
  "educationMatch": 0,
  "analysis": "Two to four sentences explaining strengths and gaps."
}

Scoring rules:
- Every score is a number from 0 to 100.
- skillsMatch: coverage of the job's required skills by the candidate's skills, counting close equivalents.
- experienceMatch: fit of the candidate's roles and seniority against the required experience level.
- educationMatch: fit of the candidate's degrees against the required education level. A candidate above the required level scores 100.
- analysis: plain text, no markdown."#;

pub fn match_system_prompt() -> String {
    format!("{MATCH_PERSONA} {JSON_ONLY_SYSTEM}")
}

/// Builds the matching prompt with both profiles serialized as JSON.
/// Contact details and ids are left out; the model only sees what it scores.
pub fn build_match_prompt(candidate: &CandidateProfile, job: &JobProfile) -> String {
    let candidate_json = json!({
        "skills": candidate.skills,
        "yearsOfExperience": candidate.candidate.years_experience,
        "experiences": candidate.experiences.iter().map(|e| json!({
            "title": e.title,
            "company": e.company,
            "startDate": e.start_date,
            "endDate": e.end_date,
            "description": e.description,
        })).collect::<Vec<_>>(),
        "educations": candidate.educations.iter().map(|e| json!({
            "degree": e.degree,
            "institution": e.institution,
            "fieldOfStudy": e.field_of_study,
            "graduationYear": e.graduation_year,
        })).collect::<Vec<_>>(),
    });

    let job_json = json!({
        "title": job.title,
        "description": job.description,
        "requiredSkills": job.required_skills,
        "requiredExperience": job.required_experience,
        "requiredEducation": job.required_education,
    });

    MATCH_PROMPT_TEMPLATE
        .replace(
            "{candidate_json}",
            &serde_json::to_string_pretty(&candidate_json).unwrap_or_default(),
        )
        .replace(
            "{job_json}",
            &serde_json::to_string_pretty(&job_json).unwrap_or_default(),
        )
}
