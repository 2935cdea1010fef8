use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeReport {
    pub fee_collected: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuesReport {
    pub dues: f64,
}

/// Dues across all users, with a per-user breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalDuesReport {
    pub total: f64,
    #[serde(default)]
    pub details: BTreeMap<String, f64>,
}

impl TotalDuesReport {
    /// Breakdown rows ordered by dues, largest first.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut rows: Vec<(&str, f64)> = self
            .details
            .iter()
            .map(|(name, dues)| (name.as_str(), *dues))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }
}

/// Response of the service root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    #[serde(default)]
    pub version: Option<String>,
}
