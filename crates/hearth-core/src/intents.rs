//! Intent collection: every agent decides what to do this tick.
//!
//! Agents are split into fixed-size batches in roster order. Batch `n` is
//! served by its own fixed pool member, all batches run concurrently, and
//! the calls inside a batch run concurrently too. A failed or undecodable
//! reply only affects its own agent, which rests silently.

use std::collections::BTreeMap;

use futures::future::join_all;
use hearth_llm::{GenerationClient, Role, Stage};
use hearth_types::{Agent, Intent, IntentTag, SILENT_LINE, World};
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::call::{CallError, StageCaller};
use crate::config::TickConfig;

/// One agent's reply.
#[derive(Debug, Deserialize)]
struct IntentReply {
    intent: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    line: String,
}

impl IntentReply {
    /// Validate the reply into an [`Intent`]. Unknown tags are rejected.
    fn into_intent(self) -> Option<Intent> {
        let tag = IntentTag::parse(&self.intent)?;
        let line = match self.line.trim() {
            "" => SILENT_LINE.to_owned(),
            trimmed => trimmed.to_owned(),
        };
        let target = self
            .target
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        Some(Intent { tag, target, line })
    }
}

/// Every agent's intent for the tick.
#[derive(Debug, Clone, Default)]
pub struct IntentCollection {
    /// Intent per agent id. Every agent in the roster has an entry.
    pub intents: BTreeMap<u32, Intent>,
    /// How many agents fell back to resting.
    pub fallbacks: usize,
}

impl IntentCollection {
    /// The intent for `agent_id`, or the resting fallback.
    pub fn get(&self, agent_id: u32) -> Intent {
        self.intents
            .get(&agent_id)
            .cloned()
            .unwrap_or_else(Intent::resting)
    }
}

/// Collect one intent per agent.
pub async fn collect_intents<R: Rng + Send>(
    world: &World,
    caller: &StageCaller<'_>,
    config: &TickConfig,
    rng: &mut R,
) -> IntentCollection {
    let blueprint = world
        .active_blueprint()
        .map_or("none", |b| b.name.as_str());

    let batches: Vec<_> = world
        .agents
        .chunks(config.batch_size())
        .enumerate()
        .map(|(index, agents)| (caller.pool.acquire(Role::IntentBatch(index), &mut *rng), agents))
        .collect();
    let batch_count = batches.len();

    let batch_futures = batches.into_iter().map(|(client, agents)| async move {
        join_all(
            agents
                .iter()
                .map(|agent| collect_one(caller, &client, agent, blueprint)),
        )
        .await
    });

    let mut collection = IntentCollection::default();
    for (agent_id, outcome) in join_all(batch_futures).await.into_iter().flatten() {
        let intent = outcome.unwrap_or_else(|| {
            collection.fallbacks = collection.fallbacks.saturating_add(1);
            Intent::resting()
        });
        collection.intents.insert(agent_id, intent);
    }

    info!(
        agents = collection.intents.len(),
        batches = batch_count,
        fallbacks = collection.fallbacks,
        "Intents collected"
    );
    collection
}

/// One agent's call. `None` means the fallback applies.
async fn collect_one(
    caller: &StageCaller<'_>,
    client: &GenerationClient,
    agent: &Agent,
    blueprint: &str,
) -> (u32, Option<Intent>) {
    let context = serde_json::json!({
        "name": agent.name,
        "job": agent.job,
        "hp": agent.hp,
        "hunger": agent.hunger,
        "blueprint": blueprint,
    });

    let result = caller
        .call_decoded::<IntentReply>(client, Stage::Intent, &context)
        .await
        .and_then(|reply| {
            let raw_tag = reply.intent.clone();
            reply
                .into_intent()
                .ok_or_else(|| CallError::Rejected(format!("unknown intent tag: {raw_tag}")))
        });

    match result {
        Ok(intent) => (agent.id, Some(intent)),
        Err(e) => {
            warn!(
                agent = %agent.name,
                client = client.label(),
                error = %e,
                "Intent call failed, agent rests"
            );
            (agent.id, None)
        }
    }
}
