/// Fixed weighting of the three sub-scores into the composite ATS score.
/// Not configurable per tenant or job.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
}

pub const ATS_WEIGHTS: ScoringWeights = ScoringWeights {
    skills: 0.4,
    experience: 0.35,
    education: 0.25,
};

impl ScoringWeights {
    /// Weighted sum of the sub-scores, rounded to the nearest integer.
    /// Inputs are expected to be clamped to [0, 100] already.
    pub fn overall(&self, skills: f64, experience: f64, education: f64) -> i32 {
        (self.skills * skills + self.experience * experience + self.education * education).round()
            as i32
    }
}

/// Clamps a sub-score into [0, 100]. Non-finite input becomes 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
