use std::path::PathBuf;

use scr_core::ReferencePopulation;

use crate::dataset::ReferenceDataset;
use crate::error::ReferenceError;

/// Where the historical population comes from. Implementations hand out an
/// immutable population; evaluation never writes back.
pub trait ReferenceSource: Send {
    fn population(&self) -> Result<ReferencePopulation, ReferenceError>;
    fn describe(&self) -> String;
}

/// A [`ReferenceDataset`] JSON file, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonReferenceFile {
    path: PathBuf,
}

impl JsonReferenceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReferenceSource for JsonReferenceFile {
    fn population(&self) -> Result<ReferencePopulation, ReferenceError> {
        ReferenceDataset::load(&self.path)?.to_population()
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

/// A population loaded once and shared immutably.
#[derive(Debug, Clone)]
pub struct InMemoryReference {
    population: ReferencePopulation,
}

impl InMemoryReference {
    pub const fn new(population: ReferencePopulation) -> Self {
        Self { population }
    }

    /// Loads `source` once so later evaluations skip the file read.
    pub fn cache(source: &dyn ReferenceSource) -> Result<Self, ReferenceError> {
        Ok(Self::new(source.population()?))
    }
}

impl ReferenceSource for InMemoryReference {
    fn population(&self) -> Result<ReferencePopulation, ReferenceError> {
        Ok(self.population.clone())
    }

    fn describe(&self) -> String {
        format!("memory:{} rows", self.population.len())
    }
}
