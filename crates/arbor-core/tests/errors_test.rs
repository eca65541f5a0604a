//! Tests for the arbor error handling system.

use std::collections::HashSet;

use arbor_core::errors::error_code::{self, ArborErrorCode};
use arbor_core::errors::*;

#[test]
fn test_all_errors_have_error_code() {
    let hierarchy = HierarchyError::MissingRoot { root: "Node".into() };
    assert_eq!(hierarchy.error_code(), error_code::HIERARCHY_ERROR);

    let collision = HierarchyError::MaskCollision {
        type_name: "AddNode".into(),
        mask: 1 << 63,
    };
    assert_eq!(collision.error_code(), error_code::MASK_COLLISION);

    let growth = GrowthError::EmptyExtension;
    assert_eq!(growth.error_code(), error_code::GROWTH_ERROR);

    let metric = MetricError::TargetInOpposites { cluster: 1 };
    assert_eq!(metric.error_code(), error_code::METRIC_ERROR);

    let detection = DetectionError::InsufficientClusters { found: 1 };
    assert_eq!(detection.error_code(), error_code::DETECTION_ERROR);

    let config = ConfigError::FileNotFound { path: "/tmp".into() };
    assert_eq!(config.error_code(), error_code::CONFIG_ERROR);
}

#[test]
fn test_mining_error_delegates_codes() {
    let from_growth: MiningError = GrowthError::ShapeMismatch.into();
    assert_eq!(from_growth.error_code(), error_code::GROWTH_ERROR);

    let from_metric: MiningError = MetricError::UnknownCluster { cluster: 9 }.into();
    assert_eq!(from_metric.error_code(), error_code::METRIC_ERROR);

    assert_eq!(MiningError::Cancelled.error_code(), error_code::CANCELLED);
}

#[test]
fn test_coded_string_format() {
    let err = GrowthError::OccurrenceOutOfRange {
        occurrence: 4,
        count: 2,
    };
    let coded = err.coded_string();
    assert!(coded.starts_with("[GROWTH_ERROR] "));
    assert!(coded.contains("Occurrence 4"));
}

#[test]
fn test_error_codes_are_distinct() {
    let codes: HashSet<&str> = [
        error_code::HIERARCHY_ERROR,
        error_code::MASK_COLLISION,
        error_code::GROWTH_ERROR,
        error_code::METRIC_ERROR,
        error_code::DETECTION_ERROR,
        error_code::CONFIG_ERROR,
        error_code::CANCELLED,
    ]
    .into_iter()
    .collect();
    assert_eq!(codes.len(), 7);
}

#[test]
fn test_mining_result_collects_non_fatal_errors() {
    let mut result: MiningResult<Vec<u32>> = MiningResult::new(vec![1, 2]);
    assert!(result.is_clean());
    result.add_error(GrowthError::GrowthPointsReleased.into());
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.data, vec![1, 2]);
}
