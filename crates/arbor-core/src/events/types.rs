//! Event payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningStartedEvent {
    pub clusters: usize,
    pub trees: usize,
    /// Seed patterns after merging and pre-pruning.
    pub seeds: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundCompletedEvent {
    pub round: usize,
    /// Patterns evaluated in this round.
    pub evaluated: usize,
    /// Patterns kept for the next round.
    pub frontier: usize,
    /// Result patterns accumulated so far.
    pub found: usize,
    /// Children discarded by the metrics in this round.
    pub pruned: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningCompleteEvent {
    pub rounds: usize,
    pub results: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}
