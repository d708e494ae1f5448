use serde::Serialize;
use tracing::debug;

use crate::error::ScoreError;
use crate::kpi::KpiRow;
use crate::normalize::{fit_transform, NormalizationParams, ScaledRow};
use crate::profile::ScoringProfile;
use crate::scoring::{ScoreResult, Scorer, TargetStrength};
use crate::solver::{solve, RequirementResult};

/// Historical supplier rows used to fit the transform and rank the target.
///
/// When the dataset carries the scores it was published with, those form the
/// ranking distribution. Otherwise the rows are re-scored under each fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePopulation {
    rows: Vec<KpiRow>,
    recorded_scores: Option<Vec<f64>>,
}

impl ReferencePopulation {
    pub fn new(rows: Vec<KpiRow>) -> Result<Self, ScoreError> {
        if rows.is_empty() {
            return Err(ScoreError::EmptyPopulation);
        }
        Ok(Self {
            rows,
            recorded_scores: None,
        })
    }

    pub fn with_recorded_scores(mut self, scores: Vec<f64>) -> Result<Self, ScoreError> {
        if scores.len() != self.rows.len() {
            return Err(ScoreError::RecordedScoresMismatch {
                expected: self.rows.len(),
                actual: scores.len(),
            });
        }
        if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
            return Err(ScoreError::NonFiniteRecordedScore { index });
        }
        self.recorded_scores = Some(scores);
        Ok(self)
    }

    pub fn rows(&self) -> &[KpiRow] {
        &self.rows
    }

    pub fn recorded_scores(&self) -> Option<&[f64]> {
        self.recorded_scores.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub kpis: KpiRow,
    pub scaled: ScaledRow,
    pub params: NormalizationParams,
    pub result: ScoreResult,
    pub requirements: RequirementResult,
}

impl Evaluation {
    pub const fn target_strength(&self) -> TargetStrength {
        TargetStrength::from_tier(self.result.tier)
    }
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    scorer: Scorer,
}

impl Evaluator {
    pub fn new(profile: ScoringProfile) -> Result<Self, ScoreError> {
        Ok(Self {
            scorer: Scorer::new(profile)?,
        })
    }

    pub const fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Fits over `target` followed by the population, then scores, ranks and
    /// solves requirements for the target alone.
    pub fn evaluate(
        &self,
        target: &KpiRow,
        population: &ReferencePopulation,
    ) -> Result<Evaluation, ScoreError> {
        let mut combined = Vec::with_capacity(population.len() + 1);
        combined.push(*target);
        combined.extend_from_slice(population.rows());

        let (scaled_rows, params) = fit_transform(&combined)?;
        let mut scaled_rows = scaled_rows.into_iter();
        let scaled = scaled_rows.next().ok_or(ScoreError::EmptyPopulation)?;
        debug!(rows = combined.len(), "fitted normalization over target and reference rows");

        let distribution = match population.recorded_scores() {
            Some(recorded) => recorded.to_vec(),
            None => scaled_rows.map(|row| self.scorer.score(&row)).collect(),
        };

        let result = self.scorer.evaluate_row(&scaled, &distribution);
        let requirements = solve(&self.scorer, &params, target, &scaled, result.tier);
        debug!(
            score = result.score,
            tier = %result.tier,
            percentile = result.percentile,
            "evaluated supplier"
        );

        Ok(Evaluation {
            kpis: *target,
            scaled,
            params,
            result,
            requirements,
        })
    }
}
