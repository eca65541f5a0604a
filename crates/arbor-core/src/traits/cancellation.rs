//! Cooperative cancellation for mining runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::MiningError;

/// Polled by the detector at every round boundary. A round in flight
/// always completes.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;

    fn cancel(&self);

    /// `Err(Cancelled)` once cancellation was requested.
    fn checkpoint(&self) -> Result<(), MiningError> {
        if self.is_cancelled() {
            Err(MiningError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Shared flag; every clone observes the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-arms the token so a detector can be reused for another run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Cancellable for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}
