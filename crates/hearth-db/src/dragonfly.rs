//! `Dragonfly` (Redis-compatible) world store.
//!
//! The world document is stored as JSON under [`WORLD_KEY`]. Every save
//! replaces the whole document.

use fred::prelude::*;
use hearth_core::{StoreError, WorldStore};
use hearth_types::World;

use crate::error::DbError;

/// Default key of the world document.
pub const WORLD_KEY: &str = "world:state";

/// World store backed by a `Dragonfly` instance.
#[derive(Clone)]
pub struct DragonflyWorldStore {
    client: Client,
    key: String,
}

impl std::fmt::Debug for DragonflyWorldStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragonflyWorldStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl DragonflyWorldStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!(key = WORLD_KEY, "Connected to Dragonfly");
        Ok(Self {
            client,
            key: WORLD_KEY.to_owned(),
        })
    }

    /// Use `key` instead of [`WORLD_KEY`].
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The key holding the world document.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read and decode the world document.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if the stored JSON is not a world.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_world(&self) -> Result<Option<World>, DbError> {
        let value: Option<String> = self.client.get(self.key.as_str()).await?;
        value
            .map(|s| serde_json::from_str(&s).map_err(DbError::from))
            .transpose()
    }

    /// Serialize and store the world document.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn set_world(&self, world: &World) -> Result<(), DbError> {
        let json = serde_json::to_string(world)?;
        let _: () = self
            .client
            .set(self.key.as_str(), json.as_str(), None, None, false)
            .await?;
        Ok(())
    }

    /// Remove the world document.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete_world(&self) -> Result<(), DbError> {
        let _: u32 = self.client.del(self.key.as_str()).await?;
        Ok(())
    }
}

impl WorldStore for DragonflyWorldStore {
    async fn load(&self) -> Result<Option<World>, StoreError> {
        Ok(self.get_world().await?)
    }

    async fn save(&self, world: &World) -> Result<(), StoreError> {
        Ok(self.set_world(world).await?)
    }
}
