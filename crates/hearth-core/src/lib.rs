//! Tick orchestration for the Hearthstead settlement simulation.
//!
//! One call to [`TickOrchestrator::run_tick`] loads the world, runs every
//! stage against it, and persists the result. Generation backends are
//! untrusted: each stage turns call and decode failures into a fixed
//! fallback so the tick always commits once a world exists.
//!
//! # Modules
//!
//! - [`config`] -- `TickConfig` loaded from `hearth-config.yaml`
//! - [`store`] -- [`WorldStore`] contract and the in-memory store
//! - [`call`] -- Deadline-bounded stage calls
//! - [`governance`] -- Blueprint proposals
//! - [`intents`] -- Concurrent per-agent intent collection
//! - [`arbitration`] -- NPC assignment and laborer construction
//! - [`effects`] -- Intent effects and expert construction
//! - [`narration`] -- Environment and story
//! - [`tick`] -- Stage sequencing and commit
//! - [`report`] -- Per-tick outcome summary

pub mod arbitration;
pub mod call;
pub mod config;
pub mod effects;
pub mod governance;
pub mod intents;
pub mod narration;
pub mod report;
pub mod store;
pub mod tick;

pub use config::{ResourcePolicy, TickConfig};
pub use report::{StageStatus, TickReport};
pub use store::{MemoryWorldStore, StoreError, WorldStore, bootstrap_if_empty};
pub use tick::{TickError, TickOrchestrator};
