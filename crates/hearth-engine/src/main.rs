//! Tick engine binary for Hearthstead.
//!
//! Wires the world store, worker pool and prompt templates into a tick
//! orchestrator and serves it over HTTP. Ticks only run when a client
//! calls `POST /api/tick`; there is no background loop.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load tick tuning from `HEARTH_CONFIG` (default `hearth-config.yaml`)
//! 3. Build the worker pool from `LLM_*` environment variables
//! 4. Load prompt templates, with overrides from `TEMPLATES_DIR`
//! 5. Open the world store (`DRAGONFLY_URL`, else memory)
//! 6. Write the starting world if `BOOTSTRAP_WORLD` is set and the store is empty
//! 7. Serve the tick API on `HEARTH_HOST:HEARTH_PORT` until `Ctrl-C`

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use hearth_core::config::DEFAULT_CONFIG_PATH;
use hearth_core::{TickConfig, TickOrchestrator, bootstrap_if_empty};
use hearth_db::WorldBackend;
use hearth_llm::{PoolConfig, PromptEngine, WorkerPool};
use hearth_observer::{AppState, ServerConfig, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point for the tick engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    init_tracing();
    info!("hearth-engine starting");

    run().await?;

    info!("hearth-engine shutdown complete");
    Ok(())
}

async fn run() -> Result<(), EngineError> {
    // 2. Load tick configuration.
    let config_path = std::env::var("HEARTH_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = TickConfig::load_or_default(&config_path)?;
    info!(
        path = %config_path.display(),
        governance_probability = config.governance_probability,
        intent_batch_size = config.intent_batch_size,
        tick_budget_ms = config.tick_budget_ms,
        resource_policy = ?config.resource_policy,
        "Tick configuration loaded"
    );

    // 3. Build the worker pool.
    let pool_config = PoolConfig::from_env()?;
    let pool = WorkerPool::from_config(&pool_config);
    info!(
        backend = ?pool_config.backend_type,
        model = %pool_config.model,
        fixed = pool.fixed_len(),
        shared_configured = pool.configured_shared(),
        "Worker pool ready"
    );
    if pool.configured_shared() == 0 {
        warn!("No narrator credentials configured, narration will use fallbacks");
    }

    // 4. Load prompt templates.
    let prompts = PromptEngine::new(pool_config.templates_dir.as_deref())?;

    // 5. Open the world store.
    let dragonfly_url = std::env::var("DRAGONFLY_URL").ok();
    let store = WorldBackend::connect(dragonfly_url.as_deref()).await?;
    info!(backend = store.name(), "World store ready");

    // 6. Bootstrap.
    if env_flag("BOOTSTRAP_WORLD") && bootstrap_if_empty(&store).await? {
        info!("Starting world written");
    }

    // 7. Serve.
    let orchestrator = Arc::new(TickOrchestrator::new(store, pool, prompts, config));
    let state = Arc::new(AppState::new(orchestrator));
    start_server(&ServerConfig::from_env(), state).await?;
    Ok(())
}

/// Install the global subscriber. `LOG_FORMAT=json` selects JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
