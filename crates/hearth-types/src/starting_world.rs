//! The bootstrap world document.
//!
//! The tick orchestrator never creates a world. This document is written by
//! the external reset flow (`POST /api/reset`, or `BOOTSTRAP_WORLD=true` at
//! engine startup) when the store is empty or an operator asks for a fresh
//! settlement.

use crate::building::{Building, BuildingStatus, BuildingType, slot_position};
use crate::world::{Agent, GlobalResources, Npc, World};

/// Agents as `(name, job, x, y)`.
const AGENTS: [(&str, &str, u32, u32); 6] = [
    ("Ada", "builder", 4, 12),
    ("Bram", "farmer", 8, 14),
    ("Cora", "healer", 12, 12),
    ("Dunn", "engineer", 6, 16),
    ("Elin", "hunter", 14, 16),
    ("Fitz", "scout", 10, 18),
];

/// NPCs as `(name, role, task, x, y)`.
const NPCS: [(&str, &str, &str, u32, u32); 4] = [
    ("Gus", "laborer", "gather wood", 3, 19),
    ("Hana", "laborer", "gather food", 7, 20),
    ("Ivo", "mason", "gather wood", 13, 20),
    ("Juno", "cook", "gather food", 16, 19),
];

/// Build the starting settlement.
///
/// Turn zero, a single finished lodge, six agents, four NPCs on subsistence
/// work, and enough wood that the council can consider a first project.
pub fn create_starting_world() -> World {
    let agents = (1_u32..)
        .zip(AGENTS)
        .map(|(id, (name, job, x, y))| Agent {
            id,
            name: name.to_owned(),
            job: job.to_owned(),
            hp: 100,
            hunger: 0,
            x,
            y,
            action_log: String::new(),
        })
        .collect();

    let npcs = (101_u32..)
        .zip(NPCS)
        .map(|(id, (name, role, task, x, y))| Npc {
            id,
            name: name.to_owned(),
            role: role.to_owned(),
            current_task: task.to_owned(),
            x,
            y,
        })
        .collect();

    let mut lodge = Building::blueprint(
        BuildingType::House,
        "Founders' Lodge",
        "The first roof raised by the settlers.",
        slot_position(0),
    );
    lodge.progress = lodge.max_progress;
    lodge.status = BuildingStatus::Active;

    World {
        turn: 0,
        weather: String::from("Clear"),
        environment_description: String::from("Smoke rises from the lodge chimney."),
        social_news: String::from("The settlers have arrived."),
        logs: Vec::new(),
        global_resources: GlobalResources {
            wood: 120,
            stone: 40,
            food: 100,
            medicine: 10,
        },
        agents,
        npcs,
        buildings: vec![lodge],
    }
}
