//! Mining orchestration: seeding, growth rounds, grouping and the
//! cross-cluster differential table.

pub mod differential;
pub mod facade;
pub mod grouping;
pub mod growth;
mod seeding;

use arbor_core::types::PatternId;
use serde::Serialize;

use crate::cluster::ClusterRegistry;
use crate::tracable::{PatternArena, TracablePattern};

pub use differential::{
    ClusterSupport, DifferentialFilter, DifferentialRow, DifferentialTable, PairDifferential,
};
pub use facade::{DifferentialReport, PatternDetector, PatternReport};
pub use grouping::{group, Footprint};
pub use growth::PatternGrowthDetector;

/// Counters of one mining run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MiningStats {
    pub rounds: usize,
    /// Frontier patterns expanded over all rounds.
    pub evaluated: usize,
    /// Patterns the metrics or the specialization filter stopped.
    pub pruned: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// Everything a mining run produced. `results` index into `arena`, which
/// also holds the intermediate patterns their lineage refers to.
#[derive(Debug, Default)]
pub struct MiningOutcome {
    pub arena: PatternArena,
    pub results: Vec<PatternId>,
    pub registry: ClusterRegistry,
    pub stats: MiningStats,
}

impl MiningOutcome {
    pub fn patterns(&self) -> impl Iterator<Item = &TracablePattern> {
        self.results.iter().filter_map(|&id| self.arena.get(id))
    }

    pub fn get(&self, id: PatternId) -> Option<&TracablePattern> {
        self.arena.get(id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
