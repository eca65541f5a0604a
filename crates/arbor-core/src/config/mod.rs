//! Configuration system for arbor.
//! TOML-based, 4-layer resolution: CLI > env > project > user > defaults.

pub mod arbor_config;
pub mod differential_config;
pub mod hierarchy_config;
pub mod mining_config;

pub use arbor_config::{ArborConfig, CliOverrides};
pub use differential_config::DifferentialConfig;
pub use hierarchy_config::{HierarchyConfig, HierarchySource};
pub use mining_config::{Grouping, MiningConfig, Specialization};
