//! The world store contract.
//!
//! The orchestrator reads the world document once at the start of a tick
//! and writes it once at the end. It never creates the document; that is
//! the bootstrap flow's job. [`MemoryWorldStore`] backs tests and
//! single-process runs; the Dragonfly implementation lives in `hearth-db`.

use std::future::Future;

use hearth_types::{World, create_starting_world};
use tokio::sync::RwLock;
use tracing::info;

/// Errors from a world store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// The stored document could not be (de)serialized.
    #[error("world serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent home of the world document.
pub trait WorldStore: Send + Sync {
    /// Read the current world, or `None` if it was never written.
    fn load(&self) -> impl Future<Output = Result<Option<World>, StoreError>> + Send;

    /// Replace the stored world.
    fn save(&self, world: &World) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Write the starting world if the store is empty.
///
/// Returns `true` when a world was written.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read or written.
pub async fn bootstrap_if_empty<S: WorldStore>(store: &S) -> Result<bool, StoreError> {
    if store.load().await?.is_some() {
        return Ok(false);
    }
    store.save(&create_starting_world()).await?;
    info!("Bootstrapped starting world");
    Ok(true)
}

/// In-process world store.
#[derive(Debug, Default)]
pub struct MemoryWorldStore {
    world: RwLock<Option<World>>,
}

impl MemoryWorldStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `world`.
    pub fn with_world(world: World) -> Self {
        Self {
            world: RwLock::new(Some(world)),
        }
    }

    /// Copy of the stored world.
    pub async fn snapshot(&self) -> Option<World> {
        self.world.read().await.clone()
    }
}

impl WorldStore for MemoryWorldStore {
    async fn load(&self) -> Result<Option<World>, StoreError> {
        Ok(self.world.read().await.clone())
    }

    async fn save(&self, world: &World) -> Result<(), StoreError> {
        *self.world.write().await = Some(world.clone());
        Ok(())
    }
}
