//! Pattern growth errors.

use super::error_code::{self, ArborErrorCode};

/// Contract violations raised by `TracablePattern` growth and merging.
#[derive(Debug, thiserror::Error)]
pub enum GrowthError {
    #[error("Position {pos} is out of range for a pattern of size {size}")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Occurrence {occurrence} is out of range ({count} occurrences)")]
    OccurrenceOutOfRange { occurrence: usize, count: usize },

    #[error("Grow called without extension tuples")]
    EmptyExtension,

    #[error("Growth target must be a single-node pattern, got size {size}")]
    TargetNotSingleNode { size: usize },

    #[error("Growth points of this pattern were already released")]
    GrowthPointsReleased,

    #[error("Cannot merge occurrences of patterns with different shapes")]
    ShapeMismatch,
}

impl ArborErrorCode for GrowthError {
    fn error_code(&self) -> &'static str {
        error_code::GROWTH_ERROR
    }
}
