//! Tick invocation API for the Hearthstead tick engine.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`POST /api/tick`** to run one tick against the stored world
//! - **`GET /api/world`** to read the stored world
//! - **`POST /api/reset`** to overwrite the store with the starting world
//!
//! Every response body carries a `success` flag so a renderer can branch
//! on it without looking at the status code.
//!
//! Ticks are serialized: a second `POST /api/tick` waits for the first to
//! commit, so two ticks never load the same turn.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
