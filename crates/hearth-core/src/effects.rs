//! Effect application: intents take effect on agents and the blueprint.
//!
//! Runs whether or not arbitration succeeded. Every agent speaks its line
//! and grows hungrier. Each expert whose intent is WORK adds the expert
//! bonus to the active blueprint, on top of any progress the laborers
//! already added during arbitration. Finally every finished blueprint is
//! activated, whether or not anyone worked this pass.

use hearth_types::{IntentTag, World};
use tracing::{debug, info};

use crate::config::TickConfig;
use crate::intents::IntentCollection;

/// Apply intents to `world`. Returns the names of buildings completed here.
pub fn apply_effects(
    world: &mut World,
    intents: &IntentCollection,
    config: &TickConfig,
) -> Vec<String> {
    let mut expert_workers: u32 = 0;
    for agent in &mut world.agents {
        let intent = intents.get(agent.id);
        agent.hunger = agent.hunger.saturating_add(config.hunger_per_tick);
        if intent.tag == IntentTag::Work && agent.has_job_in(&config.expert_jobs) {
            debug!(agent = %agent.name, "Expert working on blueprint");
            expert_workers = expert_workers.saturating_add(1);
        }
        agent.action_log = intent.line;
    }

    let mut completed = Vec::new();
    if let Some(blueprint) = world.active_blueprint_mut() {
        for _ in 0..expert_workers {
            if blueprint.advance(config.expert_build_bonus) {
                info!(building = %blueprint.name, "Construction completed by experts");
                completed.push(blueprint.name.clone());
            }
        }
    }

    // Status check runs every pass, even when nobody worked.
    for building in &mut world.buildings {
        if building.settle() {
            info!(building = %building.name, "Finished blueprint activated");
            completed.push(building.name.clone());
        }
    }
    completed
}
