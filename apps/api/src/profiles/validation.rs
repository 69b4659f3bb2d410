//! Request bodies for the directory API and their validation into drafts.
//!
//! Enumerated fields (levels, statuses) are typed, so serde rejects unknown
//! values before these checks run.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{EducationLevel, ExperienceLevel, JobStatus};

const MAX_SKILLS: usize = 100;
const MAX_YEARS_EXPERIENCE: f64 = 80.0;

#[derive(Debug, Deserialize)]
pub struct CompanyInput {
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
}

impl CompanyInput {
    pub fn validate(self) -> Result<NewCompany, AppError> {
        Ok(NewCompany {
            name: required_text("name", &self.name)?,
            industry: optional_text(self.industry),
            website: optional_text(self.website),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExperienceInput {
    pub title: String,
    pub company: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EducationInput {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub years_experience: Option<f64>,
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experiences: Vec<ExperienceInput>,
    #[serde(default)]
    pub educations: Vec<EducationInput>,
}

/// A validated, normalized candidate profile ready to persist.
#[derive(Debug, Clone)]
pub struct CandidateDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub years_experience: Option<f64>,
    pub linkedin_url: Option<String>,
    pub skills: Vec<String>,
    pub experiences: Vec<ExperienceInput>,
    pub educations: Vec<EducationInput>,
}

impl CandidateInput {
    pub fn validate(self) -> Result<CandidateDraft, AppError> {
        let name = required_text("name", &self.name)?;

        let email = optional_text(self.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(AppError::Validation(format!("email '{email}' is invalid")));
            }
        }

        if let Some(years) = self.years_experience {
            if !years.is_finite() || !(0.0..=MAX_YEARS_EXPERIENCE).contains(&years) {
                return Err(AppError::Validation(format!(
                    "years_experience must be between 0 and {MAX_YEARS_EXPERIENCE}"
                )));
            }
        }

        let mut experiences = Vec::with_capacity(self.experiences.len());
        for exp in self.experiences {
            if let (Some(start), Some(end)) = (exp.start_date, exp.end_date) {
                if end < start {
                    return Err(AppError::Validation(format!(
                        "experience '{}' ends before it starts",
                        exp.title.trim()
                    )));
                }
            }
            experiences.push(ExperienceInput {
                title: required_text("experience title", &exp.title)?,
                company: required_text("experience company", &exp.company)?,
                start_date: exp.start_date,
                end_date: exp.end_date,
                description: optional_text(exp.description),
            });
        }

        let mut educations = Vec::with_capacity(self.educations.len());
        for edu in self.educations {
            if let Some(year) = edu.graduation_year {
                if !(1900..=2100).contains(&year) {
                    return Err(AppError::Validation(format!(
                        "graduation_year {year} is out of range"
                    )));
                }
            }
            educations.push(EducationInput {
                institution: required_text("education institution", &edu.institution)?,
                degree: required_text("education degree", &edu.degree)?,
                field_of_study: optional_text(edu.field_of_study),
                graduation_year: edu.graduation_year,
            });
        }

        Ok(CandidateDraft {
            name,
            email,
            phone: optional_text(self.phone),
            location: optional_text(self.location),
            years_experience: self.years_experience,
            linkedin_url: optional_text(self.linkedin_url),
            skills: normalize_skills(self.skills)?,
            experiences,
            educations,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct JobInput {
    pub company_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub required_experience: ExperienceLevel,
    pub required_education: EducationLevel,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone)]
pub struct JobDraft {
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub required_experience: ExperienceLevel,
    pub required_education: EducationLevel,
    pub status: JobStatus,
}

impl JobInput {
    pub fn validate(self) -> Result<JobDraft, AppError> {
        Ok(JobDraft {
            company_id: self.company_id,
            title: required_text("title", &self.title)?,
            description: self.description.trim().to_string(),
            required_skills: normalize_skills(self.required_skills)?,
            required_experience: self.required_experience,
            required_education: self.required_education,
            status: self.status.unwrap_or(JobStatus::New),
        })
    }
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping the
/// first spelling seen.
pub fn normalize_skills(skills: Vec<String>) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let normalized: Vec<String> = skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect();

    if normalized.len() > MAX_SKILLS {
        return Err(AppError::Validation(format!(
            "at most {MAX_SKILLS} skills are allowed"
        )));
    }
    Ok(normalized)
}

fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
