//! Type hierarchies and their bit-mask encoding.

pub mod mask;
pub mod source;

pub use mask::{
    TypeHierarchyMask, ANYWHERE_MASK, ANYWHERE_TYPE, ANY_MASK, API_TYPE, EXCLUDED_TYPE,
};
pub use source::{HierarchySet, TypeHierarchy, ANY_TYPE};
