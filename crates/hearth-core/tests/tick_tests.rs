//! End-to-end tick tests against scripted generation clients.
#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::time::Duration;

use hearth_core::governance::GovernanceOutcome;
use hearth_core::narration::{FALLBACK_DESCRIPTION, FALLBACK_WEATHER};
use hearth_core::tick::SOCIAL_NEWS_PLACEHOLDER;
use hearth_core::{
    MemoryWorldStore, StageStatus, TickConfig, TickError, TickOrchestrator, WorldStore,
};
use hearth_llm::{GenerationClient, LlmError, PromptEngine, RenderedPrompt, ScriptedBackend, WorkerPool};
use hearth_types::{Building, BuildingStatus, BuildingType, World, create_starting_world};
use rand::SeedableRng;
use rand::rngs::SmallRng;

const ARBITRATION_NONE: &str = r#"{"npc_tasks": {}, "events": ["A quiet day."]}"#;
const ENVIRONMENT_OK: &str = r#"{"weather": "Snow", "description": "Snow blankets the roofs."}"#;
const STORY_OK: &str = r#"{"story": "The settlers worked through the snow."}"#;

fn agent_name(prompt: &RenderedPrompt) -> String {
    prompt
        .user
        .strip_prefix("You are ")
        .and_then(|rest| rest.split(',').next())
        .unwrap_or("")
        .to_owned()
}

/// Arbiter answering governance and arbitration prompts.
fn arbiter(governance: &'static str, arbitration: &'static str) -> GenerationClient {
    GenerationClient::scripted(
        "arbiter",
        ScriptedBackend::new(move |p| {
            if p.system.contains("council") {
                Ok(governance.to_owned())
            } else {
                Ok(arbitration.to_owned())
            }
        }),
    )
}

/// Intent client where every agent works and says its own name.
fn working_batch(label: &str) -> GenerationClient {
    GenerationClient::scripted(
        label,
        ScriptedBackend::new(|p| {
            let name = agent_name(p);
            Ok(format!(r#"{{"intent": "WORK", "line": "{name} gets to work."}}"#))
        }),
    )
}

/// Narrator answering both environment and story prompts.
fn narrator(environment: &'static str, story: &'static str) -> GenerationClient {
    GenerationClient::scripted(
        "narrator",
        ScriptedBackend::new(move |p| {
            if p.system.contains("describe the surroundings") {
                Ok(environment.to_owned())
            } else {
                Ok(story.to_owned())
            }
        }),
    )
}

fn full_pool(arbitration: &'static str) -> WorkerPool {
    WorkerPool::new(
        vec![
            arbiter("{}", arbitration),
            working_batch("batch-0"),
            working_batch("batch-1"),
        ],
        vec![narrator(ENVIRONMENT_OK, STORY_OK)],
    )
}

fn quiet_config() -> TickConfig {
    TickConfig {
        governance_probability: 0.0,
        ..TickConfig::default()
    }
}

fn orchestrator(
    world: Option<World>,
    pool: WorkerPool,
    config: TickConfig,
) -> TickOrchestrator<MemoryWorldStore> {
    let store = world.map_or_else(MemoryWorldStore::new, MemoryWorldStore::with_world);
    TickOrchestrator::new(store, pool, PromptEngine::builtin().unwrap(), config)
}

fn with_blueprint(progress: u32) -> World {
    let mut world = create_starting_world();
    let mut blueprint = Building::blueprint(BuildingType::House, "Cottage", "", (6, 2));
    blueprint.progress = progress;
    world.buildings.push(blueprint);
    world
}

#[tokio::test]
async fn missing_world_is_fatal_and_writes_nothing() {
    let orch = orchestrator(None, full_pool(ARBITRATION_NONE), quiet_config());
    let mut rng = SmallRng::seed_from_u64(1);

    let result = orch.run_tick(&mut rng).await;
    assert!(matches!(result, Err(TickError::MissingWorld)));
    assert!(orch.store().load().await.unwrap().is_none());
}

#[tokio::test]
async fn tick_advances_even_when_every_call_fails() {
    let config = TickConfig {
        governance_probability: 1.0,
        ..TickConfig::default()
    };
    let start = create_starting_world();
    let orch = orchestrator(Some(start.clone()), WorkerPool::new(Vec::new(), Vec::new()), config);
    let mut rng = SmallRng::seed_from_u64(2);

    let report = orch.run_tick(&mut rng).await.unwrap();
    let world = report.world;

    assert_eq!(world.turn, start.turn + 1);
    assert_eq!(world.weather, FALLBACK_WEATHER);
    assert_eq!(world.environment_description, FALLBACK_DESCRIPTION);
    assert_eq!(world.logs.len(), 1);
    assert!(world.logs.first().unwrap().contains("no credential configured"));
    // Governance and arbitration failed: no mutation from either.
    assert_eq!(world.global_resources, start.global_resources);
    assert_eq!(world.buildings, start.buildings);
    assert_eq!(world.npcs, start.npcs);
    assert_eq!(world.social_news, SOCIAL_NEWS_PLACEHOLDER);
    // Effects still applied with resting fallbacks.
    assert!(world.agents.iter().all(|a| a.action_log == "..." && a.hunger == 2));
    assert_eq!(report.intent_fallbacks, 6);
    assert_eq!(report.arbitration.status, StageStatus::Failed);
    assert_eq!(orch.store().snapshot().await.unwrap(), world);
}

#[tokio::test]
async fn logs_grow_by_one_up_to_capacity() {
    for prev in [0_usize, 10, 49, 50] {
        let mut start = create_starting_world();
        start.logs = (0..prev).map(|i| format!("old {i}")).collect();
        let orch = orchestrator(Some(start), full_pool(ARBITRATION_NONE), quiet_config());
        let mut rng = SmallRng::seed_from_u64(3);

        let world = orch.run_tick(&mut rng).await.unwrap().world;
        assert_eq!(world.logs.len(), (prev + 1).min(50));
        assert_eq!(world.logs.last().unwrap(), "The settlers worked through the snow.");
    }
}

#[tokio::test]
async fn one_undecodable_agent_rests_alone() {
    let picky = GenerationClient::scripted(
        "batch-0",
        ScriptedBackend::new(|p| {
            let name = agent_name(p);
            if name == "Bram" {
                Ok(String::from("I would rather not answer in JSON."))
            } else {
                Ok(format!(r#"{{"intent": "COMMAND", "line": "{name} speaks."}}"#))
            }
        }),
    );
    let pool = WorkerPool::new(
        vec![arbiter("{}", ARBITRATION_NONE), picky, working_batch("batch-1")],
        vec![narrator(ENVIRONMENT_OK, STORY_OK)],
    );
    let orch = orchestrator(Some(create_starting_world()), pool, quiet_config());
    let mut rng = SmallRng::seed_from_u64(4);

    let report = orch.run_tick(&mut rng).await.unwrap();
    assert_eq!(report.intent_fallbacks, 1);
    for agent in &report.world.agents {
        match agent.name.as_str() {
            "Bram" => assert_eq!(agent.action_log, "..."),
            "Ada" | "Cora" => assert_eq!(agent.action_log, format!("{} speaks.", agent.name)),
            _ => assert_eq!(agent.action_log, format!("{} gets to work.", agent.name)),
        }
    }
}

#[tokio::test]
async fn near_complete_blueprint_activates() {
    const ASSIGN_TWO: &str =
        r#"{"npc_tasks": {"101": "construct the walls", "102": "Construct the roof"}, "events": []}"#;
    let orch = orchestrator(Some(with_blueprint(95)), full_pool(ASSIGN_TWO), quiet_config());
    let mut rng = SmallRng::seed_from_u64(5);

    let world = orch.run_tick(&mut rng).await.unwrap().world;
    let cottage = world.buildings.iter().find(|b| b.name == "Cottage").unwrap();
    assert_eq!(cottage.progress, 100);
    assert_eq!(cottage.status, BuildingStatus::Active);
    assert_eq!(world.blueprint_count(), 0);
}

#[tokio::test]
async fn laborer_and_expert_progress_stack_in_one_tick() {
    const ASSIGN_ONE: &str = r#"{"npc_tasks": {"101": "construct"}, "events": []}"#;
    let orch = orchestrator(Some(with_blueprint(0)), full_pool(ASSIGN_ONE), quiet_config());
    let mut rng = SmallRng::seed_from_u64(6);

    let world = orch.run_tick(&mut rng).await.unwrap().world;
    // 5 from the laborer during arbitration, 10 each from Ada and Dunn.
    assert_eq!(world.active_blueprint().unwrap().progress, 25);
}

#[tokio::test]
async fn existing_blueprint_skips_governance() {
    let config = TickConfig {
        governance_probability: 1.0,
        ..TickConfig::default()
    };
    let start = with_blueprint(0);
    let orch = orchestrator(Some(start.clone()), full_pool(ARBITRATION_NONE), config);
    let mut rng = SmallRng::seed_from_u64(7);

    let report = orch.run_tick(&mut rng).await.unwrap();
    assert!(matches!(report.governance, hearth_core::governance::GovernanceOutcome::Skipped));
    assert_eq!(report.world.social_news, SOCIAL_NEWS_PLACEHOLDER);
    assert_eq!(report.world.blueprint_count(), 1);
    assert_eq!(report.world.global_resources.stone, start.global_resources.stone);
}

#[tokio::test]
async fn governance_lays_one_blueprint() {
    const PROPOSAL: &str =
        r#"{"type": "farm", "name": "East Field", "reason": "Food is running low."}"#;
    let pool = WorkerPool::new(
        vec![
            arbiter(PROPOSAL, ARBITRATION_NONE),
            working_batch("batch-0"),
            working_batch("batch-1"),
        ],
        vec![narrator(ENVIRONMENT_OK, STORY_OK)],
    );
    let config = TickConfig {
        governance_probability: 1.0,
        ..TickConfig::default()
    };
    let orch = orchestrator(Some(create_starting_world()), pool, config);
    let mut rng = SmallRng::seed_from_u64(8);

    let world = orch.run_tick(&mut rng).await.unwrap().world;
    assert_eq!(world.blueprint_count(), 1);
    let field = world.active_blueprint().unwrap();
    assert_eq!(field.name, "East Field");
    assert_eq!(field.building_type, BuildingType::Farm);
    assert!(world.social_news.contains("East Field"));
    assert!(world.social_news.contains("Food is running low."));
}

#[tokio::test]
async fn story_failure_keeps_environment() {
    let pool = WorkerPool::new(
        vec![
            arbiter("{}", ARBITRATION_NONE),
            working_batch("batch-0"),
            working_batch("batch-1"),
        ],
        vec![narrator(ENVIRONMENT_OK, "Once upon a time, with no JSON at all.")],
    );
    let orch = orchestrator(Some(create_starting_world()), pool, quiet_config());
    let mut rng = SmallRng::seed_from_u64(9);

    let report = orch.run_tick(&mut rng).await.unwrap();
    let world = &report.world;
    assert_eq!(world.weather, "Snow");
    assert_eq!(world.environment_description, "Snow blankets the roofs.");
    let story = world.logs.last().unwrap();
    assert!(story.starts_with("The chronicler's pen faltered"));
    assert_ne!(story, "Snow blankets the roofs.");
    assert_eq!(report.narration.environment, StageStatus::Ok);
    assert_eq!(report.narration.story, StageStatus::Failed);
}

#[tokio::test]
async fn no_configured_narrators_uses_fallbacks() {
    let pool = WorkerPool::new(
        vec![
            arbiter("{}", ARBITRATION_NONE),
            working_batch("batch-0"),
            working_batch("batch-1"),
        ],
        vec![GenerationClient::inert("empty-0"), GenerationClient::inert("empty-1")],
    );
    let orch = orchestrator(Some(create_starting_world()), pool, quiet_config());
    let mut rng = SmallRng::seed_from_u64(10);

    let world = orch.run_tick(&mut rng).await.unwrap().world;
    assert_eq!(world.weather, FALLBACK_WEATHER);
    assert_eq!(world.environment_description, FALLBACK_DESCRIPTION);
    assert!(world.logs.last().unwrap().starts_with("The chronicler's pen faltered"));
}

#[tokio::test]
async fn undecodable_arbitration_still_runs_subsistence() {
    let pool = WorkerPool::new(
        vec![
            arbiter("{}", "Everyone should just gather things."),
            working_batch("batch-0"),
            working_batch("batch-1"),
        ],
        vec![narrator(ENVIRONMENT_OK, STORY_OK)],
    );
    let start = create_starting_world();
    let orch = orchestrator(Some(start.clone()), pool, quiet_config());
    let mut rng = SmallRng::seed_from_u64(11);

    let report = orch.run_tick(&mut rng).await.unwrap();
    let resources = report.world.global_resources;
    let gained = (resources.food - start.global_resources.food)
        + (resources.wood - start.global_resources.wood);
    assert_eq!(gained, 20);
    assert_eq!(report.arbitration.status, StageStatus::Fallback);
    assert_eq!(report.arbitration.events, vec!["Everyone should just gather things."]);
}

#[tokio::test]
async fn invariants_hold_over_many_ticks() {
    const PROPOSAL: &str = r#"{"type": "clinic", "name": "Infirmary", "reason": "Sickness."}"#;
    const ASSIGN: &str = r#"{"npc_tasks": {"101": "construct", "103": "construct"}, "events": []}"#;
    let pool = WorkerPool::new(
        vec![arbiter(PROPOSAL, ASSIGN), working_batch("batch-0"), working_batch("batch-1")],
        vec![narrator(ENVIRONMENT_OK, STORY_OK)],
    );
    let config = TickConfig {
        governance_probability: 1.0,
        ..TickConfig::default()
    };
    let mut start = create_starting_world();
    start.global_resources.wood = 10_000;
    start.global_resources.stone = 10_000;
    let orch = orchestrator(Some(start), pool, config);
    let mut rng = SmallRng::seed_from_u64(12);

    let mut previous = orch.store().snapshot().await.unwrap();
    for _ in 0..60 {
        let world = orch.run_tick(&mut rng).await.unwrap().world;
        assert!(world.blueprint_count() <= 1);
        assert_eq!(world.turn, previous.turn + 1);
        assert!(world.logs.len() <= 50);
        for (before, after) in previous.buildings.iter().zip(&world.buildings) {
            assert!(after.progress >= before.progress);
            if !before.is_blueprint() {
                assert!(!after.is_blueprint());
            }
        }
        for (before, after) in previous.agents.iter().zip(&world.agents) {
            assert!(after.hunger >= before.hunger);
        }
        previous = world;
    }
    assert!(previous.buildings.len() > 2);
}

#[tokio::test(start_paused = true)]
async fn slow_intent_calls_fall_back_at_deadline() {
    let slow = |label: &str| {
        GenerationClient::scripted(
            label,
            ScriptedBackend::fixed(r#"{"intent": "WORK", "line": "Finally."}"#)
                .with_latency(Duration::from_secs(120)),
        )
    };
    let pool = WorkerPool::new(
        vec![arbiter("{}", ARBITRATION_NONE), slow("batch-0"), slow("batch-1")],
        vec![narrator(ENVIRONMENT_OK, STORY_OK)],
    );
    let config = TickConfig {
        tick_budget_ms: 1_000,
        ..quiet_config()
    };
    let orch = orchestrator(Some(create_starting_world()), pool, config);
    let mut rng = SmallRng::seed_from_u64(13);

    let report = orch.run_tick(&mut rng).await.unwrap();
    assert_eq!(report.intent_fallbacks, 6);
    assert!(report.world.agents.iter().all(|a| a.action_log == "..."));
    assert_eq!(report.world.turn, 1);
}

#[tokio::test]
async fn backend_errors_do_not_cross_agents() {
    let flaky = GenerationClient::scripted(
        "batch-1",
        ScriptedBackend::new(|p| {
            if agent_name(p) == "Elin" {
                Err(LlmError::RateLimited(String::from("slow down")))
            } else {
                Ok(String::from(r#"{"intent": "REST", "line": "Resting."}"#))
            }
        }),
    );
    let pool = WorkerPool::new(
        vec![arbiter("{}", ARBITRATION_NONE), working_batch("batch-0"), flaky],
        vec![narrator(ENVIRONMENT_OK, STORY_OK)],
    );
    let orch = orchestrator(Some(create_starting_world()), pool, quiet_config());
    let mut rng = SmallRng::seed_from_u64(14);

    let report = orch.run_tick(&mut rng).await.unwrap();
    assert_eq!(report.intent_fallbacks, 1);
    let line = |name: &str| {
        report
            .world
            .agents
            .iter()
            .find(|a| a.name == name)
            .unwrap()
            .action_log
            .clone()
    };
    assert_eq!(line("Elin"), "...");
    assert_eq!(line("Dunn"), "Resting.");
    assert_eq!(line("Ada"), "Ada gets to work.");
}

#[tokio::test]
async fn undecodable_governance_reply_changes_nothing() {
    let pool = WorkerPool::new(
        vec![
            arbiter("The council could not agree on anything today.", ARBITRATION_NONE),
            working_batch("batch-0"),
            working_batch("batch-1"),
        ],
        vec![narrator(ENVIRONMENT_OK, STORY_OK)],
    );
    let config = TickConfig {
        governance_probability: 1.0,
        ..TickConfig::default()
    };
    let start = create_starting_world();
    let orch = orchestrator(Some(start.clone()), pool, config);
    let mut rng = SmallRng::seed_from_u64(21);

    let report = orch.run_tick(&mut rng).await.unwrap();
    assert!(matches!(report.governance, GovernanceOutcome::Failed { .. }));
    let world = report.world;
    assert_eq!(world.buildings, start.buildings);
    assert_eq!(world.blueprint_count(), 0);
    // Subsistence may credit wood and food; nothing was debited.
    assert!(world.global_resources.wood >= start.global_resources.wood);
    assert_eq!(world.global_resources.stone, start.global_resources.stone);
    assert_eq!(world.social_news, SOCIAL_NEWS_PLACEHOLDER);
}

#[tokio::test]
async fn oversized_log_capacity_still_caps_at_fifty() {
    let mut start = create_starting_world();
    start.logs = (0..50).map(|i| format!("old {i}")).collect();
    let config = TickConfig {
        log_capacity: 100,
        ..quiet_config()
    };
    let orch = orchestrator(Some(start), full_pool(ARBITRATION_NONE), config);
    let mut rng = SmallRng::seed_from_u64(22);

    let world = orch.run_tick(&mut rng).await.unwrap().world;
    assert_eq!(world.logs.len(), 50);
    assert_eq!(world.logs.first().unwrap(), "old 1");
}
