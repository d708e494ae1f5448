use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::kpi::Feature;

// Published weights are rounded to three decimals and sum to 1.001.
const WEIGHT_SUM_TOLERANCE: f64 = 5e-3;

/// AHP-derived KPI weights. Must be positive and sum to 1.0 up to rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub lead_time: f64,
    pub distance: f64,
    pub fragility: f64,
    pub natural_disaster: f64,
    pub bcp_risk: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            lead_time: 0.205,
            distance: 0.117,
            fragility: 0.042,
            natural_disaster: 0.042,
            bcp_risk: 0.595,
        }
    }
}

impl WeightVector {
    pub const fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::LeadTime => self.lead_time,
            Feature::Distance => self.distance,
            Feature::Fragility => self.fragility,
            Feature::NaturalDisaster => self.natural_disaster,
            Feature::BcpRisk => self.bcp_risk,
        }
    }

    pub fn sum(&self) -> f64 {
        Feature::ALL.iter().map(|f| self.get(*f)).sum()
    }
}

/// Score boundaries between tiers. A score at or below `low` is LOW; a score at
/// or above `medium` is HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub low: f64,
    pub medium: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            low: -0.75,
            medium: -0.19,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringProfile {
    #[serde(default)]
    pub weights: WeightVector,
    #[serde(default)]
    pub thresholds: TierThresholds,
}

impl ScoringProfile {
    pub fn validate(&self) -> Result<(), ScoreError> {
        for feature in Feature::ALL {
            let w = self.weights.get(feature);
            if !w.is_finite() || w <= 0.0 {
                return Err(ScoreError::InvalidProfile(format!(
                    "weight for {feature} must be positive and finite, got {w}"
                )));
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoreError::InvalidProfile(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }
        let TierThresholds { low, medium } = self.thresholds;
        if !low.is_finite() || !medium.is_finite() || low >= medium {
            return Err(ScoreError::InvalidProfile(format!(
                "thresholds must satisfy low < medium, got low={low} medium={medium}"
            )));
        }
        Ok(())
    }
}
