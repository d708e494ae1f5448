use std::fs;
use std::path::PathBuf;

use scr_core::{ScoreError, ScoringProfile};
use scr_reference::ReferenceError;
use thiserror::Error;

const DEFAULT_REFERENCE_DATA: &str = "./data/reference/historical_portfolio.json";
const DEFAULT_COUNTRY_RISK: &str = "./data/country_risk/country_risk.json";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("reference data: {0}")]
    Reference(#[from] ReferenceError),

    #[error("scoring profile: {0}")]
    Profile(#[from] ScoreError),

    #[error("scoring profile {path}: {source}")]
    ProfileFile {
        path: String,
        source: std::io::Error,
    },

    #[error("scoring profile {path}: {source}")]
    ProfileParse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub reference_data: PathBuf,
    pub country_risk: PathBuf,
    pub profile: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            reference_data: PathBuf::from(DEFAULT_REFERENCE_DATA),
            country_risk: PathBuf::from(DEFAULT_COUNTRY_RISK),
            profile: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl SimulatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        Self {
            reference_data: read("SCR_REFERENCE_DATA")
                .map_or(defaults.reference_data, PathBuf::from),
            country_risk: read("SCR_COUNTRY_RISK").map_or(defaults.country_risk, PathBuf::from),
            profile: read("SCR_PROFILE").map(PathBuf::from),
            log_filter: read("SCR_LOG").unwrap_or(defaults.log_filter),
        }
    }

    /// The configured profile, or the built-in weights when none is set.
    pub fn load_profile(&self) -> Result<ScoringProfile, StartupError> {
        let Some(path) = &self.profile else {
            return Ok(ScoringProfile::default());
        };
        let display = path.display().to_string();
        let bytes = fs::read(path).map_err(|source| StartupError::ProfileFile {
            path: display.clone(),
            source,
        })?;
        let profile: ScoringProfile = serde_json::from_slice(&bytes)
            .map_err(|source| StartupError::ProfileParse {
                path: display,
                source,
            })?;
        profile.validate()?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn blank_and_missing_values_use_defaults() {
        let vars = HashMap::from([("SCR_COUNTRY_RISK", "  "), ("SCR_LOG", "debug")]);
        let cfg = SimulatorConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(cfg.reference_data, PathBuf::from(DEFAULT_REFERENCE_DATA));
        assert_eq!(cfg.country_risk, PathBuf::from(DEFAULT_COUNTRY_RISK));
        assert_eq!(cfg.profile, None);
        assert_eq!(cfg.log_filter, "debug");
    }

    #[test]
    fn unset_profile_is_the_default_profile() {
        let cfg = SimulatorConfig::default();
        assert_eq!(cfg.load_profile().ok(), Some(ScoringProfile::default()));
    }

    #[test]
    fn missing_profile_file_is_reported_with_path() {
        let cfg = SimulatorConfig {
            profile: Some(PathBuf::from("/nonexistent/profile.json")),
            ..SimulatorConfig::default()
        };
        let err = cfg.load_profile().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/profile.json"));
    }

    #[test]
    fn bundled_default_profile_matches_builtin() {
        let cfg = SimulatorConfig {
            profile: Some(
                PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/profiles/default.json"),
            ),
            ..SimulatorConfig::default()
        };
        assert_eq!(cfg.load_profile().ok(), Some(ScoringProfile::default()));
    }
}
