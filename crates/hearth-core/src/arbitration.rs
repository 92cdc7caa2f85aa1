//! Arbitration: the foreman assigns NPC tasks and reports events.
//!
//! One arbiter call sees every NPC's task and every agent's intent. After
//! the call (or after its decode fallback):
//!
//! - an NPC named in `npc_tasks` adopts that task verbatim
//! - any other NPC not on a construction task is put on a random
//!   subsistence task, which credits its resource
//! - every NPC now on a construction task advances the blueprint
//!
//! A failed call mutates nothing and yields a single recovery event.

use std::collections::BTreeMap;

use hearth_llm::parse::excerpt;
use hearth_llm::{Decodable, Role, Stage, decode, try_decode};
use hearth_types::{Npc, ResourceKind, World};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::call::StageCaller;
use crate::config::TickConfig;
use crate::intents::IntentCollection;
use crate::report::StageStatus;

/// Event used when the arbiter could not be reached.
pub const RECOVERING_EVENT: &str = "The foreman's orders never arrived; the settlement is recovering.";

/// Subsistence tasks and the resource each one produces.
const SUBSISTENCE: [(&str, ResourceKind); 2] = [
    ("gather food", ResourceKind::Food),
    ("gather wood", ResourceKind::Wood),
];

/// The arbiter's reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArbiterVerdict {
    /// Task per NPC, keyed by id (or name).
    #[serde(default)]
    pub npc_tasks: BTreeMap<String, String>,
    /// Narrative events, in order.
    #[serde(default)]
    pub events: Vec<String>,
}

impl Decodable for ArbiterVerdict {
    fn absorb_raw(&mut self, raw: &str) {
        if !raw.is_empty() {
            self.events.push(excerpt(raw).to_owned());
        }
    }
}

impl ArbiterVerdict {
    /// The task assigned to `npc`, if any.
    fn task_for(&self, npc: &Npc) -> Option<&str> {
        let id = npc.id.to_string();
        self.npc_tasks
            .iter()
            .find(|(key, _)| {
                let key = key.trim();
                key == id || key.eq_ignore_ascii_case(&npc.name)
            })
            .map(|(_, task)| task.trim())
            .filter(|task| !task.is_empty())
    }
}

/// What arbitration did this tick.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrationReport {
    /// Whether the verdict came from the arbiter.
    pub status: StageStatus,
    /// Narrative events for the story.
    pub events: Vec<String>,
    /// NPCs on construction after assignment.
    pub constructing: usize,
    /// Name of the building this stage completed, if any.
    pub completed: Option<String>,
}

/// Run the arbitration stage against `world`.
pub async fn run_arbitration<R: Rng + Send>(
    world: &mut World,
    intents: &IntentCollection,
    caller: &StageCaller<'_>,
    config: &TickConfig,
    rng: &mut R,
) -> ArbitrationReport {
    let client = caller.pool.acquire(Role::Arbiter, rng);
    let context = arbitration_context(world, intents);

    let (verdict, status) = match caller.call_raw(&client, Stage::Arbitration, &context).await {
        Ok(raw) => match try_decode::<ArbiterVerdict>(&raw) {
            Ok(verdict) => (verdict, StageStatus::Ok),
            Err(_) => (decode(&raw, ArbiterVerdict::default()), StageStatus::Fallback),
        },
        Err(e) => {
            warn!(error = %e, client = client.label(), "Arbitration call failed, no assignments");
            return ArbitrationReport {
                status: StageStatus::Failed,
                events: vec![RECOVERING_EVENT.to_owned()],
                constructing: 0,
                completed: None,
            };
        }
    };

    apply_verdict(world, verdict, status, config, rng)
}

fn arbitration_context(world: &World, intents: &IntentCollection) -> serde_json::Value {
    let npcs: Vec<_> = world
        .npcs
        .iter()
        .map(|npc| {
            serde_json::json!({
                "id": npc.id,
                "name": npc.name,
                "role": npc.role,
                "task": npc.current_task,
            })
        })
        .collect();
    let intents: Vec<_> = world
        .agents
        .iter()
        .map(|agent| {
            let intent = intents.get(agent.id);
            serde_json::json!({
                "name": agent.name,
                "job": agent.job,
                "intent": intent.tag,
                "target": intent.target,
                "line": intent.line,
            })
        })
        .collect();

    serde_json::json!({
        "blueprint": world.active_blueprint().map_or("none", |b| b.name.as_str()),
        "npcs": npcs,
        "intents": intents,
    })
}

/// Apply task assignments, subsistence draws, and NPC construction.
pub fn apply_verdict<R: Rng + ?Sized>(
    world: &mut World,
    verdict: ArbiterVerdict,
    status: StageStatus,
    config: &TickConfig,
    rng: &mut R,
) -> ArbitrationReport {
    let marker = config.construction_marker.as_str();

    for npc in &mut world.npcs {
        if let Some(task) = verdict.task_for(npc) {
            task.clone_into(&mut npc.current_task);
        } else if !npc.is_on_task(marker) {
            if let Some(&(task, kind)) = SUBSISTENCE.choose(rng) {
                task.clone_into(&mut npc.current_task);
                world.global_resources.credit(kind, config.subsistence_yield);
            }
        }
    }

    let constructing = world.npcs.iter().filter(|npc| npc.is_on_task(marker)).count();
    let mut completed = None;
    if let Some(blueprint) = world.active_blueprint_mut() {
        for _ in 0..constructing {
            if blueprint.advance(config.npc_build_progress) {
                info!(building = %blueprint.name, "Construction completed by laborers");
                completed = Some(blueprint.name.clone());
            }
        }
    }

    info!(
        assigned = verdict.npc_tasks.len(),
        constructing,
        events = verdict.events.len(),
        "Arbitration applied"
    );

    ArbitrationReport {
        status,
        events: verdict.events,
        constructing,
        completed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use hearth_types::{Building, BuildingStatus, BuildingType, create_starting_world};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn verdict(pairs: &[(&str, &str)]) -> ArbiterVerdict {
        ArbiterVerdict {
            npc_tasks: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            events: vec![String::from("A hawk circled.")],
        }
    }

    fn with_blueprint(progress: u32) -> World {
        let mut world = create_starting_world();
        let mut blueprint = Building::blueprint(BuildingType::House, "Cottage", "", (6, 2));
        blueprint.progress = progress;
        world.buildings.push(blueprint);
        world
    }

    #[test]
    fn assigned_tasks_are_adopted_verbatim() {
        let mut world = with_blueprint(0);
        let mut rng = SmallRng::seed_from_u64(1);
        let report = apply_verdict(
            &mut world,
            verdict(&[("101", "Construct the cottage walls"), ("Hana", "haul water")]),
            StageStatus::Ok,
            &TickConfig::default(),
            &mut rng,
        );
        let gus = world.npcs.iter().find(|n| n.id == 101).unwrap();
        let hana = world.npcs.iter().find(|n| n.id == 102).unwrap();
        assert_eq!(gus.current_task, "Construct the cottage walls");
        assert_eq!(hana.current_task, "haul water");
        assert_eq!(report.constructing, 1);
        assert_eq!(world.active_blueprint().unwrap().progress, 5);
    }

    #[test]
    fn unassigned_npcs_credit_subsistence() {
        let mut world = create_starting_world();
        let before = world.global_resources;
        let mut rng = SmallRng::seed_from_u64(2);
        let _ = apply_verdict(
            &mut world,
            ArbiterVerdict::default(),
            StageStatus::Fallback,
            &TickConfig::default(),
            &mut rng,
        );
        let gained = (world.global_resources.food - before.food)
            + (world.global_resources.wood - before.wood);
        assert_eq!(gained, 20);
        assert!(world
            .npcs
            .iter()
            .all(|n| n.current_task == "gather food" || n.current_task == "gather wood"));
    }

    #[test]
    fn constructing_npcs_keep_their_task() {
        let mut world = with_blueprint(0);
        world.npcs.iter_mut().for_each(|n| "construct frame".clone_into(&mut n.current_task));
        let before = world.global_resources;
        let mut rng = SmallRng::seed_from_u64(3);
        let report = apply_verdict(
            &mut world,
            ArbiterVerdict::default(),
            StageStatus::Ok,
            &TickConfig::default(),
            &mut rng,
        );
        assert_eq!(world.global_resources, before);
        assert_eq!(report.constructing, 4);
        assert_eq!(world.active_blueprint().unwrap().progress, 20);
    }

    #[test]
    fn construction_caps_and_activates() {
        let mut world = with_blueprint(98);
        let mut rng = SmallRng::seed_from_u64(4);
        let report = apply_verdict(
            &mut world,
            verdict(&[("101", "construct"), ("102", "CONSTRUCT roof")]),
            StageStatus::Ok,
            &TickConfig::default(),
            &mut rng,
        );
        let cottage = world.buildings.last().unwrap();
        assert_eq!(cottage.progress, 100);
        assert_eq!(cottage.status, BuildingStatus::Active);
        assert_eq!(report.completed.as_deref(), Some("Cottage"));
    }

    #[test]
    fn absorbed_raw_becomes_event() {
        let verdict = decode("The foreman shrugged.", ArbiterVerdict::default());
        assert!(verdict.npc_tasks.is_empty());
        assert_eq!(verdict.events, vec!["The foreman shrugged."]);
    }

    #[test]
    fn blank_assignment_is_ignored() {
        let world = create_starting_world();
        let v = verdict(&[("101", "   ")]);
        assert!(v.task_for(world.npcs.first().unwrap()).is_none());
    }
}
