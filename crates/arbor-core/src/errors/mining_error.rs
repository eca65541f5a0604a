//! Mining errors and non-fatal error collection.

use super::error_code::{self, ArborErrorCode};
use super::{ConfigError, DetectionError, GrowthError, HierarchyError, MetricError};

/// Errors that can occur during a mining run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum MiningError {
    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Growth error: {0}")]
    Growth(#[from] GrowthError),

    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mining cancelled")]
    Cancelled,
}

impl ArborErrorCode for MiningError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Hierarchy(e) => e.error_code(),
            Self::Growth(e) => e.error_code(),
            Self::Metric(e) => e.error_code(),
            Self::Detection(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}

/// Result of a mining run that accumulates non-fatal errors.
#[derive(Debug, Default)]
pub struct MiningResult<T: Default = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal errors collected during the run.
    pub errors: Vec<MiningError>,
}

impl<T: Default> MiningResult<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: MiningError) {
        self.errors.push(error);
    }

    /// Returns true if there are no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
