//! Metric configuration errors.

use super::error_code::{self, ArborErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error("Cluster {cluster} is both target and opposite; the difference would always be zero")]
    TargetInOpposites { cluster: u32 },

    #[error("Cluster {cluster} is not part of this mining run")]
    UnknownCluster { cluster: u32 },

    #[error("Invalid range for {field}: {min} > {max}")]
    InvalidRange { field: String, min: f64, max: f64 },
}

impl ArborErrorCode for MetricError {
    fn error_code(&self) -> &'static str {
        error_code::METRIC_ERROR
    }
}
