//! Pattern encoding: masks in DFS preorder plus packed shape bits.

pub mod pattern;
pub mod shape;

pub use pattern::{Pattern, PatternTree};
pub use shape::{ShapeBits, Topology};
