use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::kpi::{Feature, FeatureVector, KpiRow};

/// A row after standardization. Only meaningful together with the
/// [`NormalizationParams`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaledRow(FeatureVector);

impl ScaledRow {
    pub const fn new(values: FeatureVector) -> Self {
        Self(values)
    }

    pub const fn get(&self, feature: Feature) -> f64 {
        self.0.get(feature)
    }

    pub const fn values(&self) -> &FeatureVector {
        &self.0
    }
}

/// Per-feature mean and population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    mean: FeatureVector,
    std_dev: FeatureVector,
}

impl NormalizationParams {
    /// Fits over `rows`; standard deviation divides by N.
    pub fn fit(rows: &[KpiRow]) -> Result<Self, ScoreError> {
        if rows.is_empty() {
            return Err(ScoreError::EmptyPopulation);
        }
        let columns = rows.iter().map(KpiRow::features).collect::<Vec<_>>();
        if let Some(feature) = columns.iter().find_map(FeatureVector::first_non_finite) {
            return Err(ScoreError::NonFiniteValue { feature });
        }

        #[allow(clippy::cast_precision_loss)]
        let n = columns.len() as f64;
        let mean = FeatureVector::from_fn(|f| columns.iter().map(|c| c.get(f)).sum::<f64>() / n);
        let std_dev = FeatureVector::from_fn(|f| {
            let m = mean.get(f);
            let variance = columns
                .iter()
                .map(|c| {
                    let d = c.get(f) - m;
                    d * d
                })
                .sum::<f64>()
                / n;
            variance.sqrt()
        });

        // A constant column can still leave a rounding residue in the
        // computed deviation, so constancy is decided on the raw values.
        for feature in Feature::ALL {
            let first = columns.first().map_or(0.0, |c| c.get(feature));
            let constant = columns.iter().all(|c| c.get(feature) == first);
            if constant || !std_dev.get(feature).is_normal() {
                return Err(ScoreError::DegenerateFeature { feature });
            }
        }

        Ok(Self { mean, std_dev })
    }

    pub const fn mean(&self, feature: Feature) -> f64 {
        self.mean.get(feature)
    }

    pub const fn std_dev(&self, feature: Feature) -> f64 {
        self.std_dev.get(feature)
    }

    pub fn forward(&self, feature: Feature, raw: f64) -> f64 {
        (raw - self.mean(feature)) / self.std_dev(feature)
    }

    pub fn inverse(&self, feature: Feature, scaled: f64) -> f64 {
        scaled.mul_add(self.std_dev(feature), self.mean(feature))
    }

    pub fn transform(&self, row: &KpiRow) -> ScaledRow {
        let raw = row.features();
        ScaledRow(FeatureVector::from_fn(|f| self.forward(f, raw.get(f))))
    }
}

/// Fits the transform over `rows` and returns every row scaled, in input order.
pub fn fit_transform(rows: &[KpiRow]) -> Result<(Vec<ScaledRow>, NormalizationParams), ScoreError> {
    let params = NormalizationParams::fit(rows)?;
    let scaled = rows.iter().map(|r| params.transform(r)).collect();
    Ok((scaled, params))
}
