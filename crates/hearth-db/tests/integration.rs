//! Integration tests for the `hearth-db` world store.
//!
//! These tests require a live Dragonfly instance. Run with:
//!
//! ```bash
//! docker compose up -d
//! cargo test -p hearth-db -- --ignored
//! docker compose down
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc
)]

use hearth_core::{WorldStore, bootstrap_if_empty};
use hearth_db::{DbError, DragonflyWorldStore, WORLD_KEY, WorldBackend};
use hearth_types::create_starting_world;

/// `Dragonfly` connection URL for the local Docker instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

async fn scratch_store(key: &str) -> DragonflyWorldStore {
    let store = DragonflyWorldStore::connect(DRAGONFLY_URL)
        .await
        .expect("Failed to connect to Dragonfly")
        .with_key(key);
    assert_eq!(store.key(), key);
    store.delete_world().await.expect("Failed to clear scratch key");
    store
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance (docker compose up -d)"]
async fn world_round_trips_through_dragonfly() {
    let store = scratch_store("test:world:round_trip").await;
    assert!(store.load().await.unwrap().is_none());

    let mut world = create_starting_world();
    world.turn = 41;
    world.logs.push(String::from("A quiet night."));
    store.save(&world).await.unwrap();

    let loaded = store.load().await.unwrap().expect("world should exist");
    assert_eq!(loaded, world);

    store.delete_world().await.unwrap();
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance (docker compose up -d)"]
async fn bootstrap_writes_once() {
    let store = scratch_store("test:world:bootstrap").await;
    assert!(bootstrap_if_empty(&store).await.unwrap());
    assert!(!bootstrap_if_empty(&store).await.unwrap());
    store.delete_world().await.unwrap();
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance (docker compose up -d)"]
async fn backend_selects_dragonfly_for_url() {
    let backend = WorldBackend::connect(Some(DRAGONFLY_URL)).await.unwrap();
    assert_eq!(backend.name(), "dragonfly");
    let WorldBackend::Dragonfly(store) = backend else {
        panic!("expected the Dragonfly backend");
    };
    assert_eq!(store.key(), WORLD_KEY);
}

#[tokio::test]
async fn invalid_url_is_config_error() {
    let result = DragonflyWorldStore::connect("not a url").await;
    assert!(matches!(result, Err(DbError::Config(_))));
}
