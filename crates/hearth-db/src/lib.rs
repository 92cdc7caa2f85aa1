//! Persistence for the Hearthstead world document.
//!
//! The whole world lives in a single JSON document. In production it sits
//! in `Dragonfly` under one key; for local runs and tests it can stay in
//! process memory. [`WorldBackend`] picks between the two at startup so
//! the orchestrator only ever sees one concrete store type.
//!
//! # Modules
//!
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) world store
//! - [`backend`] -- Startup-selected store
//! - [`error`] -- Shared error types

pub mod backend;
pub mod dragonfly;
pub mod error;

pub use backend::WorldBackend;
pub use dragonfly::{DragonflyWorldStore, WORLD_KEY};
pub use error::DbError;
