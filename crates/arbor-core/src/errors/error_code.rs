//! ArborErrorCode trait for structured error reporting.

/// Every error enum implements this to expose a stable code string that
/// callers can match on without parsing messages.
pub trait ArborErrorCode {
    /// Returns the error code string (e.g., "GROWTH_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const HIERARCHY_ERROR: &str = "HIERARCHY_ERROR";
pub const MASK_COLLISION: &str = "MASK_COLLISION";
pub const GROWTH_ERROR: &str = "GROWTH_ERROR";
pub const METRIC_ERROR: &str = "METRIC_ERROR";
pub const DETECTION_ERROR: &str = "DETECTION_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CANCELLED: &str = "CANCELLED";
