//! Dashboard-style rendering of an evaluation: the four card groups the
//! simulator shows (current KPIs, current strength, target KPIs, target strength).

use scr_core::{BcpRequirement, Evaluation, Feature, KpiRequirement, RequirementResult};
use serde::Serialize;

const NO_TARGET: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentKpis {
    pub lead_time: String,
    pub distance: String,
    pub bcp_risk: String,
    pub fragility_index: String,
    pub natural_disaster_risk: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCard {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

impl TargetCard {
    fn continuous(req: &RequirementResult, feature: Feature, unit: &str) -> Self {
        match req.continuous(feature).unwrap_or(KpiRequirement::NotApplicable) {
            KpiRequirement::Target { required, delta } => Self {
                value: format!("{required:.1}{unit}"),
                delta: Some(format!("{delta:.1}{unit}")),
            },
            KpiRequirement::NoChange | KpiRequirement::NotApplicable => Self::none(),
        }
    }

    fn from_bcp(req: BcpRequirement) -> Self {
        match req {
            BcpRequirement::Target(level) => Self {
                value: level.label().to_string(),
                delta: None,
            },
            BcpRequirement::NoChange | BcpRequirement::NotApplicable => Self::none(),
        }
    }

    fn none() -> Self {
        Self {
            value: NO_TARGET.to_string(),
            delta: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetKpis {
    pub lead_time: TargetCard,
    pub distance: TargetCard,
    pub bcp_risk: TargetCard,
    pub fragility_index: TargetCard,
    pub natural_disaster_risk: TargetCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub current_kpis: CurrentKpis,
    pub strength: String,
    pub strength_percentage: String,
    /// Absent when the supplier is already in the top tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_kpis: Option<TargetKpis>,
    pub target_strength: String,
}

impl SimulationReport {
    pub fn render(evaluation: &Evaluation, country: Option<&str>) -> Self {
        let kpis = &evaluation.kpis;
        let req = &evaluation.requirements;

        let current_kpis = CurrentKpis {
            lead_time: format!("{} days", kpis.lead_time_days),
            distance: format!("{:.1} km", kpis.distance_km),
            bcp_risk: kpis.bcp_risk.label().to_string(),
            fragility_index: format!("{}", kpis.fragility_index),
            natural_disaster_risk: format!("{:.1}%", kpis.natural_disaster_risk_pct),
            country: country.map(str::to_string),
        };

        let target_kpis = req.target_tier.map(|_| TargetKpis {
            lead_time: TargetCard::continuous(req, Feature::LeadTime, " days"),
            distance: TargetCard::continuous(req, Feature::Distance, " km"),
            bcp_risk: TargetCard::from_bcp(req.bcp_risk),
            fragility_index: TargetCard::continuous(req, Feature::Fragility, ""),
            natural_disaster_risk: TargetCard::continuous(req, Feature::NaturalDisaster, "%"),
        });

        Self {
            current_kpis,
            strength: evaluation.result.tier.label().to_string(),
            strength_percentage: format!("{:.1}%", evaluation.result.percentile * 100.0),
            target_kpis,
            target_strength: evaluation.target_strength().label().to_string(),
        }
    }

    /// One-line summary for the text content of a tool result.
    pub fn summary(&self) -> String {
        format!(
            "supply chain strength {} ({}), target strength {}",
            self.strength, self.strength_percentage, self.target_strength
        )
    }
}
