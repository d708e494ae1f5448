use std::fs;
use std::path::Path;

use scr_core::{KpiRow, ReferencePopulation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::BcpCell;
use crate::error::ReferenceError;

/// One historical supplier row, optionally with the score it was published with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub lead_time_days: f64,
    pub distance_km: f64,
    pub bcp_risk: BcpCell,
    pub fragility_index: f64,
    pub natural_disaster_risk_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl ReferenceRecord {
    pub fn to_row(&self, position: usize) -> Result<KpiRow, ReferenceError> {
        let bcp_risk = self.bcp_risk.value().ok_or_else(|| {
            ReferenceError::InvalidRecord(format!(
                "record {position}: bcp_risk must be 0, 1, 2, LOW, MEDIUM or HIGH, got {:?}",
                self.bcp_risk
            ))
        })?;
        Ok(KpiRow {
            lead_time_days: self.lead_time_days,
            distance_km: self.distance_km,
            bcp_risk,
            fragility_index: self.fragility_index,
            natural_disaster_risk_pct: self.natural_disaster_risk_pct,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDataset {
    #[serde(default)]
    pub name: Option<String>,
    pub records: Vec<ReferenceRecord>,
}

impl ReferenceDataset {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ReferenceError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let dataset = Self::from_json_slice(&bytes)?;
        debug!(
            path = %path.display(),
            records = dataset.records.len(),
            "loaded reference dataset"
        );
        Ok(dataset)
    }

    /// Recorded scores are attached only when every record carries one.
    pub fn to_population(&self) -> Result<ReferencePopulation, ReferenceError> {
        let rows = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| r.to_row(i))
            .collect::<Result<Vec<_>, _>>()?;
        let population = ReferencePopulation::new(rows)?;

        let scores = self.records.iter().filter_map(|r| r.score).collect::<Vec<_>>();
        if scores.is_empty() {
            return Ok(population);
        }
        if scores.len() != self.records.len() {
            return Err(ReferenceError::InvalidRecord(format!(
                "{} of {} records carry a score; score all records or none",
                scores.len(),
                self.records.len()
            )));
        }
        Ok(population.with_recorded_scores(scores)?)
    }
}
