use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ScoreError;
use crate::kpi::Feature;
use crate::normalize::ScaledRow;
use crate::profile::ScoringProfile;

/// Supply chain strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Low => Some(Self::Medium),
            Self::Medium => Some(Self::High),
            Self::High => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Strength the supplier would reach after one of the suggested KPI changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "tier", rename_all = "snake_case")]
pub enum TargetStrength {
    Next(Tier),
    AlreadyHigh,
}

impl TargetStrength {
    pub const fn from_tier(tier: Tier) -> Self {
        match tier.next() {
            Some(next) => Self::Next(next),
            None => Self::AlreadyHigh,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Next(tier) => tier.label(),
            Self::AlreadyHigh => "ALREADY HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub tier: Tier,
    /// Position of `score` within the reference score range, in `[0, 1]`.
    pub percentile: f64,
}

#[derive(Debug, Clone)]
pub struct Scorer {
    profile: ScoringProfile,
}

impl Scorer {
    pub fn new(profile: ScoringProfile) -> Result<Self, ScoreError> {
        profile.validate()?;
        Ok(Self { profile })
    }

    pub const fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    /// Negated weighted sum, so below-average raw KPIs score above zero.
    pub fn score(&self, scaled: &ScaledRow) -> f64 {
        -Feature::ALL
            .iter()
            .map(|f| self.profile.weights.get(*f) * scaled.get(*f))
            .sum::<f64>()
    }

    /// The LOW band is closed: a score equal to `thresholds.low` is LOW, not
    /// MEDIUM. A score equal to `thresholds.medium` is HIGH.
    pub fn classify(&self, score: f64) -> Tier {
        let thresholds = self.profile.thresholds;
        if score <= thresholds.low {
            Tier::Low
        } else if score < thresholds.medium {
            Tier::Medium
        } else {
            Tier::High
        }
    }

    /// Lowest score that classifies as `tier`. LOW has no lower bound.
    pub const fn threshold_to_reach(&self, tier: Tier) -> Option<f64> {
        match tier {
            Tier::Low => None,
            Tier::Medium => Some(self.profile.thresholds.low),
            Tier::High => Some(self.profile.thresholds.medium),
        }
    }

    /// Min-max rank of `score` against `distribution`, clamped to `[0, 1]`.
    pub fn percentile(&self, score: f64, distribution: &[f64]) -> f64 {
        let (min, max) = distribution
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });

        if distribution.is_empty() || max <= min {
            warn!(
                population = distribution.len(),
                "reference score range is empty; percentile pinned to 1.0"
            );
            return 1.0;
        }
        if score < min {
            0.0
        } else if score >= max {
            1.0
        } else {
            (score - min) / (max - min)
        }
    }

    pub fn evaluate_row(&self, scaled: &ScaledRow, distribution: &[f64]) -> ScoreResult {
        let score = self.score(scaled);
        ScoreResult {
            score,
            tier: self.classify(score),
            percentile: self.percentile(score, distribution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::FeatureVector;

    fn scorer() -> Scorer {
        Scorer::new(ScoringProfile::default()).unwrap()
    }

    fn scaled(values: [f64; 5]) -> ScaledRow {
        let [lead_time, distance, fragility, natural_disaster, bcp_risk] = values;
        ScaledRow::new(FeatureVector {
            lead_time,
            distance,
            fragility,
            natural_disaster,
            bcp_risk,
        })
    }

    #[test]
    fn score_is_negated_weighted_sum() {
        let s = scorer().score(&scaled([1.0, -2.0, 0.5, 0.0, 1.0]));
        let expected = -(0.205 - 2.0 * 0.117 + 0.5 * 0.042 + 0.595);
        assert!((s - expected).abs() < 1e-12);
        assert!(scorer().score(&scaled([0.0; 5])).abs() < f64::EPSILON);
    }

    #[test]
    fn tier_boundaries_follow_thresholds() {
        let scorer = scorer();
        assert_eq!(scorer.classify(-1.2), Tier::Low);
        assert_eq!(scorer.classify(-0.75), Tier::Low);
        assert_eq!(scorer.classify(-0.749_999), Tier::Medium);
        assert_eq!(scorer.classify(-0.2), Tier::Medium);
        assert_eq!(scorer.classify(-0.19), Tier::High);
        assert_eq!(scorer.classify(0.4), Tier::High);
    }

    #[test]
    fn raising_any_scaled_kpi_never_raises_score() {
        let scorer = scorer();
        let base = scaled([0.3, -0.4, 0.1, 0.2, -0.5]);
        let base_score = scorer.score(&base);
        for feature in Feature::ALL {
            let worse = ScaledRow::new(base.values().with(feature, base.get(feature) + 0.5));
            assert!(scorer.score(&worse) < base_score, "{feature}");
        }
    }

    #[test]
    fn percentile_is_linear_inside_range() {
        let distribution = [0.5, 0.3, -0.8, -1.0, 0.1];
        let p = scorer().percentile(-0.2, &distribution);
        assert!((p - 0.8 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn percentile_clamps_outside_range() {
        let scorer = scorer();
        let distribution = [0.5, 0.3, -0.8, -1.0, 0.1];
        assert!(scorer.percentile(-1.5, &distribution).abs() < f64::EPSILON);
        assert!((scorer.percentile(0.5, &distribution) - 1.0).abs() < f64::EPSILON);
        assert!((scorer.percentile(2.0, &distribution) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentile_guard_for_flat_distribution() {
        let scorer = scorer();
        assert!((scorer.percentile(-3.0, &[0.2, 0.2]) - 1.0).abs() < f64::EPSILON);
        assert!((scorer.percentile(0.0, &[]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn target_strength_labels() {
        assert_eq!(TargetStrength::from_tier(Tier::Low).label(), "MEDIUM");
        assert_eq!(TargetStrength::from_tier(Tier::Medium).label(), "HIGH");
        assert_eq!(TargetStrength::from_tier(Tier::High).label(), "ALREADY HIGH");
    }

    #[test]
    fn rejects_invalid_profile() {
        let mut profile = ScoringProfile::default();
        profile.weights.distance = -0.117;
        assert!(Scorer::new(profile).is_err());
    }
}
