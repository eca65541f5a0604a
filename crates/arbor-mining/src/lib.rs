//! Tree-pattern mining over forests of labelled, ordered syntax trees.
//!
//! Types are encoded as nested bit masks ([`hierarchy`]), patterns as a mask
//! array plus a packed open/close shape ([`codec`]). [`tracable`] patterns
//! remember where they occur and grow one node at a time; [`metrics`] decide
//! what is kept and what is grown, and [`detector`] drives the breadth-first
//! search, grouping and cross-cluster comparison. [`relations`] maps
//! containment and generalization between the mined patterns.

pub mod cluster;
pub mod codec;
pub mod detector;
pub mod hierarchy;
pub mod memo;
pub mod metrics;
pub mod relations;
pub mod tracable;
pub mod tree;

pub use cluster::{Cluster, ClusterRegistry};
pub use codec::{Pattern, PatternTree};
pub use detector::{MiningOutcome, PatternDetector, PatternGrowthDetector};
pub use hierarchy::{TypeHierarchy, TypeHierarchyMask};
pub use metrics::{Metric, MetricSet};
pub use relations::{PatternRelationMapper, PatternRelations};
pub use tracable::{Extension, PatternArena, TracablePattern};
pub use tree::{GrowthCandidates, SyntaxTree, TreeNode};
