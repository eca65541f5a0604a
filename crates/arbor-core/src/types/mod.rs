//! Id types and collection re-exports.

pub mod collections;
pub mod identifiers;

pub use collections::{FxHashMap, FxHashSet, SmallVec, SmallVec4};
pub use identifiers::{ClusterId, NodeId, PatternId, TreeId};
