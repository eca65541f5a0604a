//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;

/// SmallVec for per-node lists that are usually short (children, candidates).
pub type SmallVec4<T> = SmallVec<[T; 4]>;
