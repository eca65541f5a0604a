//! Type hierarchy construction errors.
//!
//! Both variants indicate a defect in the supplied hierarchy or in mask
//! construction itself; callers must not try to recover a partial mask table.

use super::error_code::{self, ArborErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("Hierarchy root '{root}' does not exist")]
    MissingRoot { root: String },

    #[error("Mask {mask:#018x} for type '{type_name}' collides with an existing mask")]
    MaskCollision { type_name: String, mask: u64 },

    #[error("Hierarchy layer {layer} needs {bits} bits, exceeding the 64-bit mask budget")]
    BitBudgetExceeded { layer: usize, bits: u32 },
}

impl ArborErrorCode for HierarchyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MaskCollision { .. } => error_code::MASK_COLLISION,
            _ => error_code::HIERARCHY_ERROR,
        }
    }
}
