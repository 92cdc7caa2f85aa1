//! The world singleton and the entities it owns.
//!
//! The orchestrator loads one [`World`] at the start of a tick, threads it by
//! `&mut` through every stage, and hands it back to the store at the end.
//! Agents and NPCs are fixed in count; buildings only grow by append.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::building::Building;

/// Maximum number of narrative entries kept in [`World::logs`].
pub const LOG_CAPACITY: usize = 50;

/// The whole simulation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct World {
    /// Completed tick counter.
    pub turn: u64,
    /// Current weather, as narrated.
    pub weather: String,
    /// Short scene description for the current time segment.
    pub environment_description: String,
    /// Governance outcome line of the last tick, or a placeholder.
    pub social_news: String,
    /// Narrative history, oldest first, at most [`LOG_CAPACITY`] entries.
    pub logs: Vec<String>,
    /// Settlement-wide resource counters.
    pub global_resources: GlobalResources,
    /// Player-facing agents, in stable roster order.
    pub agents: Vec<Agent>,
    /// Non-player workers, in stable roster order.
    pub npcs: Vec<Npc>,
    /// Every building ever commissioned, in creation order.
    pub buildings: Vec<Building>,
}

impl World {
    /// The building currently under construction, if any.
    pub fn active_blueprint(&self) -> Option<&Building> {
        self.buildings.iter().find(|b| b.is_blueprint())
    }

    /// Mutable access to the building under construction, if any.
    pub fn active_blueprint_mut(&mut self) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.is_blueprint())
    }

    /// Number of buildings in blueprint status. At most one by invariant.
    pub fn blueprint_count(&self) -> usize {
        self.buildings.iter().filter(|b| b.is_blueprint()).count()
    }

    /// Names of all buildings, finished or not.
    pub fn building_names(&self) -> Vec<&str> {
        self.buildings.iter().map(|b| b.name.as_str()).collect()
    }

    /// Append a narrative entry, dropping the oldest entries beyond `capacity`.
    pub fn push_log(&mut self, entry: String, capacity: usize) {
        self.logs.push(entry);
        let overflow = self.logs.len().saturating_sub(capacity);
        if overflow > 0 {
            self.logs.drain(..overflow);
        }
    }
}

/// Named resource counters.
///
/// Counters are signed: the council may commission a building the
/// settlement cannot fully afford, depending on the configured floor policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GlobalResources {
    /// Timber.
    pub wood: i64,
    /// Quarried stone.
    pub stone: i64,
    /// Provisions.
    pub food: i64,
    /// Remedies and bandages.
    pub medicine: i64,
}

/// Selector for one counter in [`GlobalResources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// [`GlobalResources::wood`].
    Wood,
    /// [`GlobalResources::stone`].
    Stone,
    /// [`GlobalResources::food`].
    Food,
    /// [`GlobalResources::medicine`].
    Medicine,
}

impl GlobalResources {
    /// Current value of one counter.
    pub const fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Food => self.food,
            ResourceKind::Medicine => self.medicine,
        }
    }

    /// Mutable reference to one counter.
    pub const fn slot_mut(&mut self, kind: ResourceKind) -> &mut i64 {
        match kind {
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Food => &mut self.food,
            ResourceKind::Medicine => &mut self.medicine,
        }
    }

    /// Add `amount` to a counter, saturating at the `i64` bounds.
    pub const fn credit(&mut self, kind: ResourceKind, amount: i64) {
        let slot = self.slot_mut(kind);
        *slot = slot.saturating_add(amount);
    }
}

/// A player-facing settler driven by a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Stable identity.
    pub id: u32,
    /// Stable display name.
    pub name: String,
    /// Occupation; expert jobs speed up construction.
    pub job: String,
    /// Health points.
    pub hp: u32,
    /// Hunger level. Never decreases from one tick to the next.
    pub hunger: u32,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
    /// The line the agent spoke this tick.
    pub action_log: String,
}

impl Agent {
    /// Whether this agent's job is one of `jobs`, ignoring ASCII case.
    pub fn has_job_in(&self, jobs: &[String]) -> bool {
        jobs.iter().any(|j| j.eq_ignore_ascii_case(self.job.trim()))
    }
}

/// A non-player worker whose task is set by the arbiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Npc {
    /// Stable identity.
    pub id: u32,
    /// Stable display name.
    pub name: String,
    /// Standing role in the settlement.
    pub role: String,
    /// Free-text description of what the NPC is doing.
    pub current_task: String,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
}

impl Npc {
    /// Whether the current task contains `marker`, ignoring ASCII case.
    pub fn is_on_task(&self, marker: &str) -> bool {
        self.current_task
            .to_ascii_lowercase()
            .contains(&marker.to_ascii_lowercase())
    }
}
