//! Startup-selected world store.

use hearth_core::{MemoryWorldStore, StoreError, WorldStore};
use hearth_types::World;
use tracing::info;

use crate::dragonfly::DragonflyWorldStore;
use crate::error::DbError;

/// The world store chosen at startup.
#[derive(Debug)]
pub enum WorldBackend {
    /// In-process store. The world is lost on restart.
    Memory(MemoryWorldStore),
    /// `Dragonfly` store.
    Dragonfly(DragonflyWorldStore),
}

impl WorldBackend {
    /// Connect to `Dragonfly` when `url` is set, else use memory.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the `Dragonfly` connection fails.
    pub async fn connect(url: Option<&str>) -> Result<Self, DbError> {
        match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => Ok(Self::Dragonfly(DragonflyWorldStore::connect(url).await?)),
            None => {
                info!("No Dragonfly URL configured, keeping the world in memory");
                Ok(Self::Memory(MemoryWorldStore::new()))
            }
        }
    }

    /// Short backend name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Dragonfly(_) => "dragonfly",
        }
    }
}

impl WorldStore for WorldBackend {
    async fn load(&self) -> Result<Option<World>, StoreError> {
        match self {
            Self::Memory(store) => store.load().await,
            Self::Dragonfly(store) => store.load().await,
        }
    }

    async fn save(&self, world: &World) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.save(world).await,
            Self::Dragonfly(store) => store.save(world).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_types::create_starting_world;

    use super::*;

    #[tokio::test]
    async fn missing_url_selects_memory() {
        let backend = WorldBackend::connect(None).await.unwrap();
        assert_eq!(backend.name(), "memory");
        let blank = WorldBackend::connect(Some("  ")).await.unwrap();
        assert_eq!(blank.name(), "memory");
    }

    #[tokio::test]
    async fn memory_backend_round_trips_world() {
        let backend = WorldBackend::Memory(MemoryWorldStore::new());
        assert!(backend.load().await.unwrap().is_none());

        let mut world = create_starting_world();
        world.turn = 12;
        backend.save(&world).await.unwrap();
        assert_eq!(backend.load().await.unwrap().unwrap().turn, 12);
    }

    #[test]
    fn serialization_errors_keep_their_kind() {
        let json_error = serde_json::from_str::<World>("{").unwrap_err();
        let store_error = StoreError::from(DbError::from(json_error));
        assert!(matches!(store_error, StoreError::Serialization(_)));

        let config_error = StoreError::from(DbError::Config(String::from("bad url")));
        assert!(matches!(config_error, StoreError::Backend(msg) if msg.contains("bad url")));
    }
}
