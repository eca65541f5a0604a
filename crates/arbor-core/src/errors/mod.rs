//! Error handling for arbor.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod detection_error;
pub mod error_code;
pub mod growth_error;
pub mod hierarchy_error;
pub mod metric_error;
pub mod mining_error;

pub use config_error::ConfigError;
pub use detection_error::DetectionError;
pub use error_code::ArborErrorCode;
pub use growth_error::GrowthError;
pub use hierarchy_error::HierarchyError;
pub use metric_error::MetricError;
pub use mining_error::{MiningError, MiningResult};
