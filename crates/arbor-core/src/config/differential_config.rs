//! Differential (cross-cluster) comparison thresholds.

use serde::{Deserialize, Serialize};

/// Thresholds applied when comparing pattern support between clusters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DifferentialConfig {
    /// Minimum share of a cluster's trees a pattern must hit. Default: 0.5.
    pub min_similarity: Option<f64>,
    /// Maximum share of a cluster's trees a pattern may hit. Default: 1.0.
    pub max_similarity: Option<f64>,
    /// Minimum support difference between two clusters. Default: 0.5.
    pub min_differential: Option<f64>,
    /// Maximum support difference between two clusters. Default: 1.0.
    pub max_differential: Option<f64>,
}

impl DifferentialConfig {
    pub fn effective_min_similarity(&self) -> f64 {
        self.min_similarity.unwrap_or(0.5)
    }

    pub fn effective_max_similarity(&self) -> f64 {
        self.max_similarity.unwrap_or(1.0)
    }

    pub fn effective_min_differential(&self) -> f64 {
        self.min_differential.unwrap_or(0.5)
    }

    pub fn effective_max_differential(&self) -> f64 {
        self.max_differential.unwrap_or(1.0)
    }
}
