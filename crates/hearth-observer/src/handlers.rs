//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/tick` | Run one tick, return the new world and report |
//! | `GET` | `/api/world` | Current world |
//! | `POST` | `/api/reset` | Replace the world with the starting world |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use hearth_core::WorldStore;
use hearth_types::create_starting_world;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::ObserverError;
use crate::state::AppState;

/// Run one tick.
///
/// Responds `200 {"success": true, "world": ..., "report": ...}`, or
/// `404` when there is no world to advance.
pub async fn post_tick<S: WorldStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ObserverError> {
    let _guard = state.write_lock.lock().await;
    let mut rng = SmallRng::from_os_rng();
    let report = state
        .orchestrator
        .run_tick(&mut rng)
        .await
        .inspect_err(|e| warn!(error = %e, "Tick request failed"))?;

    Ok(Json(json!({
        "success": true,
        "world": report.world,
        "report": report,
    })))
}

/// Return the stored world.
pub async fn get_world<S: WorldStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ObserverError> {
    let world = state
        .orchestrator
        .store()
        .load()
        .await?
        .ok_or(ObserverError::NoWorld)?;
    Ok(Json(json!({ "success": true, "world": world })))
}

/// Overwrite the store with the starting world.
pub async fn post_reset<S: WorldStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ObserverError> {
    let _guard = state.write_lock.lock().await;
    let world = create_starting_world();
    state.orchestrator.store().save(&world).await?;
    info!("World reset to starting state");
    Ok(Json(json!({ "success": true, "world": world })))
}
