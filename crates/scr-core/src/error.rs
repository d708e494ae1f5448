use thiserror::Error;

use crate::kpi::Feature;

/// Failures that make a single evaluation impossible. None of these are
/// recovered inside the engine; callers must report them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("reference population is empty")]
    EmptyPopulation,

    #[error("feature `{feature}` has zero variance across the population; cannot standardize")]
    DegenerateFeature { feature: Feature },

    #[error("feature `{feature}` contains a non-finite value")]
    NonFiniteValue { feature: Feature },

    #[error("recorded scores do not match the population: expected {expected}, got {actual}")]
    RecordedScoresMismatch { expected: usize, actual: usize },

    #[error("recorded score at position {index} is not finite")]
    NonFiniteRecordedScore { index: usize },

    #[error("invalid scoring profile: {0}")]
    InvalidProfile(String),
}
