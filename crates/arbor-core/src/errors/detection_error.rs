//! Detection errors.

use super::error_code::{self, ArborErrorCode};

/// Errors that can occur while orchestrating a mining run.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Differential comparison needs at least 2 clusters, got {found}")]
    InsufficientClusters { found: usize },

    #[error("No trees to mine")]
    EmptyCorpus,
}

impl ArborErrorCode for DetectionError {
    fn error_code(&self) -> &'static str {
        error_code::DETECTION_ERROR
    }
}
