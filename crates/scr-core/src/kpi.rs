use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five KPIs, in the column order the transform is fitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    LeadTime,
    Distance,
    Fragility,
    NaturalDisaster,
    BcpRisk,
}

impl Feature {
    pub const ALL: [Self; 5] = [
        Self::LeadTime,
        Self::Distance,
        Self::Fragility,
        Self::NaturalDisaster,
        Self::BcpRisk,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::LeadTime => "lead_time",
            Self::Distance => "distance",
            Self::Fragility => "fragility",
            Self::NaturalDisaster => "natural_disaster",
            Self::BcpRisk => "bcp_risk",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `f64` per [`Feature`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    pub lead_time: f64,
    pub distance: f64,
    pub fragility: f64,
    pub natural_disaster: f64,
    pub bcp_risk: f64,
}

impl FeatureVector {
    pub fn from_fn(mut f: impl FnMut(Feature) -> f64) -> Self {
        Self {
            lead_time: f(Feature::LeadTime),
            distance: f(Feature::Distance),
            fragility: f(Feature::Fragility),
            natural_disaster: f(Feature::NaturalDisaster),
            bcp_risk: f(Feature::BcpRisk),
        }
    }

    pub const fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::LeadTime => self.lead_time,
            Feature::Distance => self.distance,
            Feature::Fragility => self.fragility,
            Feature::NaturalDisaster => self.natural_disaster,
            Feature::BcpRisk => self.bcp_risk,
        }
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        match feature {
            Feature::LeadTime => self.lead_time = value,
            Feature::Distance => self.distance = value,
            Feature::Fragility => self.fragility = value,
            Feature::NaturalDisaster => self.natural_disaster = value,
            Feature::BcpRisk => self.bcp_risk = value,
        }
    }

    /// Same vector with `feature` replaced by `value`.
    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    pub fn first_non_finite(&self) -> Option<Feature> {
        self.iter().find(|(_, v)| !v.is_finite()).map(|(f, _)| f)
    }
}

/// Business continuity plan risk for a supplier.
///
/// `LOW`: a backup supplier is identified. `MEDIUM`: no backup supplier, but the
/// primary supplier has another plant or an alternative material is qualified.
/// `HIGH`: no backup supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BcpRisk {
    Low,
    Medium,
    High,
}

impl BcpRisk {
    pub const fn level(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }

    /// Floors a non-negative raw requirement onto the discrete scale, saturating at `HIGH`.
    pub fn floor_from_raw(raw: f64) -> Self {
        let floored = raw.max(0.0).floor();
        if floored >= 2.0 {
            Self::High
        } else if floored >= 1.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.level())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for BcpRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown BCP risk level `{0}` (expected LOW, MEDIUM or HIGH)")]
pub struct ParseBcpRiskError(pub String);

impl FromStr for BcpRisk {
    type Err = ParseBcpRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" | "0" => Ok(Self::Low),
            "MEDIUM" | "1" => Ok(Self::Medium),
            "HIGH" | "2" => Ok(Self::High),
            _ => Err(ParseBcpRiskError(s.to_string())),
        }
    }
}

/// Raw KPI values for one supplier relationship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiRow {
    pub lead_time_days: f64,
    pub distance_km: f64,
    pub bcp_risk: BcpRisk,
    pub fragility_index: f64,
    pub natural_disaster_risk_pct: f64,
}

impl KpiRow {
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            lead_time: self.lead_time_days,
            distance: self.distance_km,
            fragility: self.fragility_index,
            natural_disaster: self.natural_disaster_risk_pct,
            bcp_risk: self.bcp_risk.as_f64(),
        }
    }

    pub fn raw(&self, feature: Feature) -> f64 {
        self.features().get(feature)
    }
}
