use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use scr_core::{CountryRisk, CountryRiskLookup};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::NumericCell;
use crate::error::ReferenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRiskRecord {
    pub country: String,
    pub fragility_index: NumericCell,
    #[serde(alias = "natural_disaster_risk_pct")]
    pub natural_disaster_risk: NumericCell,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CountryRiskFile {
    countries: Vec<CountryRiskRecord>,
}

/// Fragility index and natural disaster risk per country name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryRiskTable {
    entries: BTreeMap<String, CountryRisk>,
}

impl CountryRiskTable {
    /// Later records for the same country replace earlier ones.
    pub fn from_records(records: &[CountryRiskRecord]) -> Result<Self, ReferenceError> {
        let mut entries = BTreeMap::new();
        for record in records {
            let country = record.country.trim();
            if country.is_empty() {
                return Err(ReferenceError::InvalidRecord(
                    "country risk record without a country name".to_string(),
                ));
            }
            let fragility_index = record.fragility_index.value().ok_or_else(|| {
                ReferenceError::InvalidRecord(format!("{country}: unreadable fragility index"))
            })?;
            let natural_disaster_risk_pct =
                record.natural_disaster_risk.value().ok_or_else(|| {
                    ReferenceError::InvalidRecord(format!(
                        "{country}: unreadable natural disaster risk"
                    ))
                })?;
            entries.insert(
                country.to_string(),
                CountryRisk {
                    fragility_index,
                    natural_disaster_risk_pct,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ReferenceError> {
        let file: CountryRiskFile = serde_json::from_slice(bytes)?;
        Self::from_records(&file.countries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let table = Self::from_json_slice(&fs::read(path)?)?;
        debug!(path = %path.display(), countries = table.len(), "loaded country risk table");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CountryRiskLookup for CountryRiskTable {
    fn country_risk(&self, country: &str) -> Option<CountryRisk> {
        let wanted = country.trim();
        self.entries.get(wanted).copied().or_else(|| {
            self.entries
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
                .map(|(_, risk)| *risk)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "countries": [
            {"country": "Mexico", "fragility_index": "66.4", "natural_disaster_risk": "11.6%"},
            {"country": "Germany", "fragility_index": 24.6, "natural_disaster_risk_pct": 3.92},
            {"country": "Mexico", "fragility_index": 66.1, "natural_disaster_risk": "11.2 %"}
        ]
    }"#;

    #[test]
    fn parses_scraped_cells_and_keeps_last_duplicate() {
        let table = CountryRiskTable::from_json_slice(TABLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let mexico = table.country_risk("Mexico").unwrap();
        assert!((mexico.fragility_index - 66.1).abs() < f64::EPSILON);
        assert!((mexico.natural_disaster_risk_pct - 11.2).abs() < f64::EPSILON);
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive_match() {
        let table = CountryRiskTable::from_json_slice(TABLE.as_bytes()).unwrap();
        assert!(table.country_risk(" germany ").is_some());
        assert!(table.country_risk("Atlantis").is_none());
    }

    #[test]
    fn unreadable_cell_names_the_country() {
        let raw = r#"{"countries": [{"country": "Chad", "fragility_index": "n/a", "natural_disaster_risk": 8.0}]}"#;
        assert!(matches!(
            CountryRiskTable::from_json_slice(raw.as_bytes()),
            Err(ReferenceError::InvalidRecord(msg)) if msg.starts_with("Chad")
        ));
    }
}
