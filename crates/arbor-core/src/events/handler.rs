//! MiningEventHandler trait, all methods with no-op defaults.

use super::types::*;

/// Trait for observing a mining run.
///
/// Handlers only override the events they care about. `Send + Sync` is
/// required because rounds may be driven from a rayon pool.
pub trait MiningEventHandler: Send + Sync {
    fn on_mining_started(&self, _event: &MiningStartedEvent) {}
    fn on_round_completed(&self, _event: &RoundCompletedEvent) {}
    fn on_mining_complete(&self, _event: &MiningCompleteEvent) {}
}
