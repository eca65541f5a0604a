//! Patterns that know where they occur and how they can grow.

pub mod arena;
pub mod grow;
pub mod pattern;

pub use arena::PatternArena;
pub use grow::Extension;
pub use pattern::{
    ClusterSupportCount, NodeSeed, Occurrence, PatternKey, TracablePattern, WILDCARD_NODE_ID,
};

/// Granularity of capacity reservations when merging occurrences.
pub const GROWTH_CHUNK: usize = 20;
