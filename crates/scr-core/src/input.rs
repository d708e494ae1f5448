use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kpi::{BcpRisk, KpiRow};

/// Country-level risk figures for the supplier's location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountryRisk {
    pub fragility_index: f64,
    pub natural_disaster_risk_pct: f64,
}

pub trait CountryRiskLookup {
    fn country_risk(&self, country: &str) -> Option<CountryRisk>;
}

impl CountryRiskLookup for HashMap<String, CountryRisk> {
    fn country_risk(&self, country: &str) -> Option<CountryRisk> {
        self.get(country).copied()
    }
}

impl CountryRiskLookup for BTreeMap<String, CountryRisk> {
    fn country_risk(&self, country: &str) -> Option<CountryRisk> {
        self.get(country).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    LeadTime,
    Distance,
    BcpRisk,
    Country,
}

impl InputField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LeadTime => "Lead Time (days)",
            Self::Distance => "Distance from Supplier to CM (km)",
            Self::BcpRisk => "BCP Risk",
            Self::Country => "Supplier Country",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Problems with what the user supplied. All of these are recoverable by
/// asking again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("please supply: {}", join_labels(.0))]
    Missing(Vec<InputField>),

    #[error(
        "`{0}` is not in the country risk table, so fragility index and natural disaster risk \
         cannot be retrieved; select a different country"
    )]
    CountryNotFound(String),

    #[error("{field} must be a finite, non-negative number, got {value}")]
    OutOfRange { field: InputField, value: f64 },
}

fn join_labels(fields: &[InputField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The simulator form: every field optional until validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiInput {
    #[serde(default)]
    pub lead_time_days: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub bcp_risk: Option<BcpRisk>,
    #[serde(default)]
    pub country: Option<String>,
}

impl KpiInput {
    pub fn missing_fields(&self) -> Vec<InputField> {
        let mut missing = Vec::new();
        if self.lead_time_days.is_none() {
            missing.push(InputField::LeadTime);
        }
        if self.distance_km.is_none() {
            missing.push(InputField::Distance);
        }
        if self.bcp_risk.is_none() {
            missing.push(InputField::BcpRisk);
        }
        if self.country.as_deref().map_or(true, |c| c.trim().is_empty()) {
            missing.push(InputField::Country);
        }
        missing
    }

    /// Validates the form and resolves the country into its risk figures.
    pub fn resolve(&self, lookup: &dyn CountryRiskLookup) -> Result<KpiRow, InputError> {
        let (Some(lead_time_days), Some(distance_km), Some(bcp_risk), Some(country)) = (
            self.lead_time_days,
            self.distance_km,
            self.bcp_risk,
            self.country.as_deref().map(str::trim).filter(|c| !c.is_empty()),
        ) else {
            return Err(InputError::Missing(self.missing_fields()));
        };

        non_negative(InputField::LeadTime, lead_time_days)?;
        non_negative(InputField::Distance, distance_km)?;

        let risk = lookup
            .country_risk(country)
            .ok_or_else(|| InputError::CountryNotFound(country.to_string()))?;

        Ok(KpiRow {
            lead_time_days,
            distance_km,
            bcp_risk,
            fragility_index: risk.fragility_index,
            natural_disaster_risk_pct: risk.natural_disaster_risk_pct,
        })
    }
}

fn non_negative(field: InputField, value: f64) -> Result<(), InputError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InputError::OutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HashMap<String, CountryRisk> {
        HashMap::from([(
            "Mexico".to_string(),
            CountryRisk {
                fragility_index: 66.4,
                natural_disaster_risk_pct: 11.6,
            },
        )])
    }

    #[test]
    fn resolves_complete_input() {
        let input = KpiInput {
            lead_time_days: Some(21.0),
            distance_km: Some(1158.2),
            bcp_risk: Some(BcpRisk::Medium),
            country: Some(" Mexico ".to_string()),
        };
        let row = input.resolve(&table()).unwrap();
        assert!((row.fragility_index - 66.4).abs() < f64::EPSILON);
        assert!((row.natural_disaster_risk_pct - 11.6).abs() < f64::EPSILON);
        assert_eq!(row.bcp_risk, BcpRisk::Medium);
    }

    #[test]
    fn reports_every_missing_field_at_once() {
        let input = KpiInput {
            distance_km: Some(10.0),
            country: Some("  ".to_string()),
            ..KpiInput::default()
        };
        let err = input.resolve(&table()).unwrap_err();
        assert_eq!(
            err,
            InputError::Missing(vec![
                InputField::LeadTime,
                InputField::BcpRisk,
                InputField::Country
            ])
        );
        assert_eq!(
            err.to_string(),
            "please supply: Lead Time (days), BCP Risk, Supplier Country"
        );
    }

    #[test]
    fn unknown_country_is_reported() {
        let input = KpiInput {
            lead_time_days: Some(21.0),
            distance_km: Some(100.0),
            bcp_risk: Some(BcpRisk::Low),
            country: Some("Atlantis".to_string()),
        };
        assert_eq!(
            input.resolve(&table()),
            Err(InputError::CountryNotFound("Atlantis".to_string()))
        );
    }

    #[test]
    fn negative_distance_is_out_of_range() {
        let input = KpiInput {
            lead_time_days: Some(21.0),
            distance_km: Some(-5.0),
            bcp_risk: Some(BcpRisk::Low),
            country: Some("Mexico".to_string()),
        };
        assert!(matches!(
            input.resolve(&table()),
            Err(InputError::OutOfRange {
                field: InputField::Distance,
                ..
            })
        ));
    }

    #[test]
    fn deserializes_partial_form() {
        let input: KpiInput =
            serde_json::from_str(r#"{"lead_time_days": 14, "bcp_risk": "HIGH"}"#).unwrap();
        assert_eq!(input.bcp_risk, Some(BcpRisk::High));
        assert_eq!(
            input.missing_fields(),
            vec![InputField::Distance, InputField::Country]
        );
    }
}
