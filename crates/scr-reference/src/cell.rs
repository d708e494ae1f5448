//! Lenient cell types for tables exported from spreadsheets or scraped pages.

use scr_core::BcpRisk;
use serde::{Deserialize, Serialize};

/// A number, or text such as `"9.37%"` or `"1,204.5"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericCell {
    Number(f64),
    Text(String),
}

impl NumericCell {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v).filter(|v| v.is_finite()),
            Self::Text(raw) => raw
                .trim()
                .trim_end_matches('%')
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
        }
    }
}

/// BCP risk as either its level (`0`, `1`, `2`) or its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BcpCell {
    Level(f64),
    Label(String),
}

impl BcpCell {
    pub fn value(&self) -> Option<BcpRisk> {
        match self {
            Self::Level(v) => {
                if v.fract() != 0.0 || !(0.0..=2.0).contains(v) {
                    return None;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                BcpRisk::from_level(*v as u8)
            }
            Self::Label(s) => s.parse().ok(),
        }
    }
}

impl From<BcpRisk> for BcpCell {
    fn from(risk: BcpRisk) -> Self {
        Self::Label(risk.label().to_string())
    }
}
