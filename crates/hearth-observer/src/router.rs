//! Axum router construction for the tick API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use hearth_core::WorldStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// CORS is configured to allow any origin so a browser renderer can call
/// the API from another port.
pub fn build_router<S: WorldStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/tick", post(handlers::post_tick::<S>))
        .route("/api/world", get(handlers::get_world::<S>))
        .route("/api/reset", post(handlers::post_reset::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
