//! Shared application state for the tick API.

use std::sync::Arc;

use hearth_core::TickOrchestrator;
use tokio::sync::Mutex;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState<S> {
    /// The orchestrator that runs ticks against the store.
    pub orchestrator: Arc<TickOrchestrator<S>>,
    /// Held for the whole of a tick or reset so writes never interleave.
    pub write_lock: Mutex<()>,
}

impl<S> AppState<S> {
    /// Wrap an orchestrator.
    pub fn new(orchestrator: Arc<TickOrchestrator<S>>) -> Self {
        Self {
            orchestrator,
            write_lock: Mutex::new(()),
        }
    }
}
