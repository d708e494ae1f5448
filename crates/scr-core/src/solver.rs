//! Back-solves, one KPI at a time, the value that lifts a row to the next tier.
//!
//! With the other four scaled KPIs held fixed, the score is linear in the
//! remaining one, so the required scaled value is a closed-form rearrangement
//! of the weighted sum. The result is mapped back to raw units through the same
//! fitted transform that produced the score.

use serde::Serialize;

use crate::kpi::{BcpRisk, Feature, KpiRow};
use crate::normalize::{NormalizationParams, ScaledRow};
use crate::profile::WeightVector;
use crate::scoring::{Scorer, Tier};

/// Requirement for a continuous KPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KpiRequirement {
    /// The row is already in the top tier.
    NotApplicable,
    /// The required raw value falls at or below zero.
    NoChange,
    /// `delta` is `required - current`, negative when the KPI must shrink.
    Target { required: f64, delta: f64 },
}

/// Requirement for BCP risk, whose raw domain is the discrete {0, 1, 2}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "level", rename_all = "snake_case")]
pub enum BcpRequirement {
    NotApplicable,
    /// The required value lies below the scaled position of `LOW` under this fit.
    NoChange,
    Target(BcpRisk),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RequirementResult {
    pub target_tier: Option<Tier>,
    pub lead_time: KpiRequirement,
    pub distance: KpiRequirement,
    pub fragility: KpiRequirement,
    pub natural_disaster: KpiRequirement,
    pub bcp_risk: BcpRequirement,
}

impl RequirementResult {
    pub const fn not_applicable() -> Self {
        Self {
            target_tier: None,
            lead_time: KpiRequirement::NotApplicable,
            distance: KpiRequirement::NotApplicable,
            fragility: KpiRequirement::NotApplicable,
            natural_disaster: KpiRequirement::NotApplicable,
            bcp_risk: BcpRequirement::NotApplicable,
        }
    }

    /// Requirement for a continuous KPI; `None` for [`Feature::BcpRisk`].
    pub const fn continuous(&self, feature: Feature) -> Option<KpiRequirement> {
        match feature {
            Feature::LeadTime => Some(self.lead_time),
            Feature::Distance => Some(self.distance),
            Feature::Fragility => Some(self.fragility),
            Feature::NaturalDisaster => Some(self.natural_disaster),
            Feature::BcpRisk => None,
        }
    }
}

/// Scaled value `feature` must take, others fixed, for the score to equal `threshold`.
pub fn required_scaled(
    weights: &WeightVector,
    scaled: &ScaledRow,
    feature: Feature,
    threshold: f64,
) -> f64 {
    let others = Feature::ALL
        .iter()
        .filter(|f| **f != feature)
        .map(|f| weights.get(*f) * scaled.get(*f))
        .sum::<f64>();
    (threshold + others) / -weights.get(feature)
}

fn resolve_continuous(required_raw: f64, current_raw: f64) -> KpiRequirement {
    if required_raw <= 0.0 {
        KpiRequirement::NoChange
    } else {
        KpiRequirement::Target {
            required: required_raw,
            delta: required_raw - current_raw,
        }
    }
}

fn resolve_bcp(required_scaled: f64, params: &NormalizationParams) -> BcpRequirement {
    let low_boundary = params.forward(Feature::BcpRisk, BcpRisk::Low.as_f64());
    if required_scaled < low_boundary {
        return BcpRequirement::NoChange;
    }
    let raw = params.inverse(Feature::BcpRisk, required_scaled);
    BcpRequirement::Target(BcpRisk::floor_from_raw(raw))
}

/// Per-KPI requirements for `raw` (whose scaled form is `scaled`) to reach the tier above `tier`.
pub fn solve(
    scorer: &Scorer,
    params: &NormalizationParams,
    raw: &KpiRow,
    scaled: &ScaledRow,
    tier: Tier,
) -> RequirementResult {
    let Some(target_tier) = tier.next() else {
        return RequirementResult::not_applicable();
    };
    let Some(threshold) = scorer.threshold_to_reach(target_tier) else {
        return RequirementResult::not_applicable();
    };

    let weights = &scorer.profile().weights;
    let continuous = |feature: Feature| {
        let required = required_scaled(weights, scaled, feature, threshold);
        resolve_continuous(params.inverse(feature, required), raw.raw(feature))
    };

    RequirementResult {
        target_tier: Some(target_tier),
        lead_time: continuous(Feature::LeadTime),
        distance: continuous(Feature::Distance),
        fragility: continuous(Feature::Fragility),
        natural_disaster: continuous(Feature::NaturalDisaster),
        bcp_risk: resolve_bcp(
            required_scaled(weights, scaled, Feature::BcpRisk, threshold),
            params,
        ),
    }
}
