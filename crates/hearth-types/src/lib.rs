//! Shared type definitions for the Hearthstead settlement simulation.
//!
//! This crate is the single source of truth for the world document that the
//! tick orchestrator loads, mutates, and commits once per tick. The same
//! document is what the renderer draws, so the serialized shape uses
//! camelCase field names and the types flow to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`building`] -- Building types, the static cost table, and the
//!   blueprint lifecycle (blueprint -> active, never back)
//! - [`intent`] -- Per-tick agent intents (transient, never persisted)
//! - [`world`] -- The world singleton, agents, NPCs, and resource counters
//! - [`starting_world`] -- The bootstrap document written by the reset flow

pub mod building;
pub mod intent;
pub mod starting_world;
pub mod world;

// Re-export all public types at crate root for convenience.
pub use building::{Building, BuildingCost, BuildingStatus, BuildingType, slot_position};
pub use intent::{Intent, IntentTag, SILENT_LINE};
pub use starting_world::create_starting_world;
pub use world::{Agent, GlobalResources, LOG_CAPACITY, Npc, ResourceKind, World};
