//! The tick orchestrator.
//!
//! Each tick runs these stages strictly in order against one world document
//! owned by the orchestrator for the duration of the tick:
//!
//! 1. **Load** -- read the world. A missing world is the only fatal error.
//! 2. **Governance** -- maybe lay a new blueprint.
//! 3. **Intent Collection** -- one concurrent call per agent.
//! 4. **Arbitration** -- NPC task assignment and construction.
//! 5. **Effect Application** -- agents speak, grow hungry, experts build.
//! 6. **Narration** -- weather, scene, and the tick's story.
//! 7. **Commit** -- advance the turn, append the story, persist.
//!
//! Every stage after Load degrades to a fallback on failure, so a tick that
//! finds a world always reaches Commit.

use hearth_llm::{PromptEngine, WorkerPool};
use hearth_types::World;
use rand::Rng;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::arbitration::run_arbitration;
use crate::call::StageCaller;
use crate::config::TickConfig;
use crate::effects::apply_effects;
use crate::governance::run_governance;
use crate::intents::collect_intents;
use crate::narration::{Narration, StoryInputs, narrate};
use crate::report::TickReport;
use crate::store::{StoreError, WorldStore};

/// Social news when the council did not lay a blueprint this tick.
pub const SOCIAL_NEWS_PLACEHOLDER: &str = "The council had nothing new to announce.";

/// Errors that end a tick early.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The store holds no world document. Nothing was run or written.
    #[error("no world document in the store")]
    MissingWorld,

    /// Loading or saving the world failed.
    #[error("world store failed: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// Runs ticks against one store with one pool.
#[derive(Debug)]
pub struct TickOrchestrator<S> {
    store: S,
    pool: WorkerPool,
    prompts: PromptEngine,
    config: TickConfig,
}

impl<S: WorldStore> TickOrchestrator<S> {
    /// Assemble an orchestrator.
    pub const fn new(store: S, pool: WorkerPool, prompts: PromptEngine, config: TickConfig) -> Self {
        Self {
            store,
            pool,
            prompts,
            config,
        }
    }

    /// The world store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The tick configuration.
    pub const fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Execute one complete tick.
    ///
    /// # Errors
    ///
    /// [`TickError::MissingWorld`] when there is no world to advance, and
    /// [`TickError::Store`] when the store fails to load or save.
    pub async fn run_tick<R: Rng + Send>(&self, rng: &mut R) -> Result<TickReport, TickError> {
        // --- Load ---
        let mut world = self.store.load().await?.ok_or(TickError::MissingWorld)?;
        let started = Instant::now();
        let caller = StageCaller {
            pool: &self.pool,
            prompts: &self.prompts,
            deadline: started.checked_add(self.config.tick_budget()).unwrap_or(started),
        };
        info!(turn = world.turn, "Tick started");

        // --- Governance ---
        let governance = run_governance(&mut world, &caller, &self.config, rng).await;

        // --- Intent Collection ---
        let intents = collect_intents(&world, &caller, &self.config, rng).await;

        // --- Arbitration ---
        let arbitration = run_arbitration(&mut world, &intents, &caller, &self.config, rng).await;

        // --- Effect Application ---
        let expert_completions = apply_effects(&mut world, &intents, &self.config);

        // --- Narration ---
        let inputs = StoryInputs {
            governance: governance.announcement(),
            events: &arbitration.events,
        };
        let narration = narrate(&world, inputs, &caller, &self.config, rng).await;

        // --- Commit ---
        let social_news = governance
            .announcement()
            .unwrap_or(SOCIAL_NEWS_PLACEHOLDER)
            .to_owned();
        commit(&mut world, &narration, social_news, self.config.log_cap());
        if let Err(e) = self.store.save(&world).await {
            warn!(turn = world.turn, error = %e, "Failed to persist world");
            return Err(e.into());
        }

        info!(
            turn = world.turn,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            intent_fallbacks = intents.fallbacks,
            "Tick committed"
        );

        Ok(TickReport {
            turn: world.turn,
            governance,
            intent_fallbacks: intents.fallbacks,
            arbitration,
            expert_completions,
            narration: narration.report,
            world,
        })
    }
}

/// Write the tick's results into the world.
fn commit(world: &mut World, narration: &Narration, social_news: String, log_capacity: usize) {
    world.turn = world.turn.saturating_add(1);
    world.weather.clone_from(&narration.weather);
    world
        .environment_description
        .clone_from(&narration.description);
    world.social_news = social_news;
    world.push_log(narration.story.clone(), log_capacity);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_types::create_starting_world;

    use super::*;
    use crate::narration::{DaySegment, NarrationReport};
    use crate::report::StageStatus;

    fn narration(story: &str) -> Narration {
        Narration {
            weather: String::from("Rain"),
            description: String::from("Puddles everywhere."),
            story: story.to_owned(),
            report: NarrationReport {
                segment: DaySegment::Dawn,
                environment: StageStatus::Ok,
                story: StageStatus::Ok,
            },
        }
    }

    #[test]
    fn commit_advances_turn_and_appends_story() {
        let mut world = create_starting_world();
        commit(&mut world, &narration("It rained."), String::from("news"), 50);
        assert_eq!(world.turn, 1);
        assert_eq!(world.weather, "Rain");
        assert_eq!(world.environment_description, "Puddles everywhere.");
        assert_eq!(world.social_news, "news");
        assert_eq!(world.logs, vec!["It rained."]);
    }

    #[test]
    fn commit_caps_logs() {
        let mut world = create_starting_world();
        world.logs = (0..50).map(|i| format!("entry {i}")).collect();
        commit(&mut world, &narration("newest"), String::new(), 50);
        assert_eq!(world.logs.len(), 50);
        assert_eq!(world.logs.first().unwrap(), "entry 1");
        assert_eq!(world.logs.last().unwrap(), "newest");
    }
}
