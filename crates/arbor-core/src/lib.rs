//! Shared infrastructure for the arbor tree-pattern miner.
//!
//! Errors, layered configuration, tracing, cancellation, mining lifecycle
//! events and the id/collection types used across the workspace.

pub mod config;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod traits;
pub mod types;

pub use config::ArborConfig;
pub use errors::{ArborErrorCode, MiningError};
pub use traits::{Cancellable, CancellationToken};
