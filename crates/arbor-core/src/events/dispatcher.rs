//! EventDispatcher: synchronous event dispatch.

use std::sync::Arc;

use super::handler::MiningEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
///
/// When no handlers are registered, `emit` iterates over an empty Vec.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn MiningEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn register(&mut self, handler: Arc<dyn MiningEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A panicking handler does not prevent later handlers from receiving the event.
    fn emit<F: Fn(&dyn MiningEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                ::tracing::warn!("mining event handler panicked");
            }
        }
    }

    pub fn emit_mining_started(&self, event: &MiningStartedEvent) {
        self.emit(|h| h.on_mining_started(event));
    }

    pub fn emit_round_completed(&self, event: &RoundCompletedEvent) {
        self.emit(|h| h.on_round_completed(event));
    }

    pub fn emit_mining_complete(&self, event: &MiningCompleteEvent) {
        self.emit(|h| h.on_mining_complete(event));
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
