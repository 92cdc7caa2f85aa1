//! Governance: the council occasionally lays a new blueprint.
//!
//! The council convenes only when no blueprint exists, wood is above the
//! configured threshold, and a per-tick coin flip passes. One arbiter call
//! names a building type; an unknown type becomes the default type. The
//! cost is debited under the configured [`ResourcePolicy`] and the blueprint
//! is appended with zero progress.
//!
//! Any failure (call, decode, or a blueprint that appeared in the meantime)
//! leaves the world untouched.
//!
//! [`ResourcePolicy`]: crate::config::ResourcePolicy

use hearth_llm::{Role, Stage};
use hearth_types::{Building, BuildingType, ResourceKind, World, slot_position};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::call::StageCaller;
use crate::config::TickConfig;

/// The council's reply.
#[derive(Debug, Clone, Deserialize)]
struct ProposalReply {
    #[serde(rename = "type", alias = "building_type", alias = "buildingType")]
    building_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    reason: String,
}

/// What governance did this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GovernanceOutcome {
    /// Preconditions or the coin flip kept the council from meeting.
    Skipped,
    /// The council met but produced nothing usable.
    Failed {
        /// Operator-facing reason.
        reason: String,
    },
    /// A blueprint was laid.
    Proposed {
        /// The resolved building type.
        #[serde(rename = "type")]
        building_type: BuildingType,
        /// The blueprint's name.
        name: String,
        /// The log line announcing it.
        announcement: String,
    },
}

impl GovernanceOutcome {
    /// The announcement, if a blueprint was laid.
    pub fn announcement(&self) -> Option<&str> {
        match self {
            Self::Proposed { announcement, .. } => Some(announcement),
            Self::Skipped | Self::Failed { .. } => None,
        }
    }
}

/// Whether the council convenes this tick.
///
/// The coin flip is only drawn when the deterministic preconditions hold.
pub fn should_convene<R: Rng + ?Sized>(world: &World, config: &TickConfig, rng: &mut R) -> bool {
    world.blueprint_count() == 0
        && world.global_resources.wood > config.governance_wood_threshold
        && rng.random_bool(config.governance_chance())
}

/// Run the governance stage against `world`.
pub async fn run_governance<R: Rng + Send>(
    world: &mut World,
    caller: &StageCaller<'_>,
    config: &TickConfig,
    rng: &mut R,
) -> GovernanceOutcome {
    if !should_convene(world, config, rng) {
        return GovernanceOutcome::Skipped;
    }

    let client = caller.pool.acquire(Role::Arbiter, rng);
    let context = serde_json::json!({
        "wood": world.global_resources.wood,
        "stone": world.global_resources.stone,
        "food": world.global_resources.food,
        "medicine": world.global_resources.medicine,
        "building_names": world.building_names(),
        "building_types": BuildingType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
    });

    let reply: ProposalReply = match caller
        .call_decoded(&client, Stage::Governance, &context)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, client = client.label(), "Governance call failed, council adjourned");
            return GovernanceOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    apply_proposal(world, config, reply)
}

/// Debit the cost and append the blueprint.
fn apply_proposal(world: &mut World, config: &TickConfig, reply: ProposalReply) -> GovernanceOutcome {
    if world.blueprint_count() > 0 {
        return GovernanceOutcome::Failed {
            reason: String::from("a blueprint already exists"),
        };
    }

    let building_type = BuildingType::from_proposal(&reply.building_type);
    let name = match reply.name.trim() {
        "" => format!("New {building_type}"),
        trimmed => trimmed.to_owned(),
    };
    let cost = building_type.cost();

    let resources = &mut world.global_resources;
    for (kind, amount) in [(ResourceKind::Wood, cost.wood), (ResourceKind::Stone, cost.stone)] {
        if amount > 0 {
            let slot = resources.slot_mut(kind);
            *slot = config.resource_policy.debit(*slot, amount);
        }
    }

    let position = slot_position(world.buildings.len());
    world.buildings.push(Building::blueprint(
        building_type,
        name.clone(),
        reply.reason.trim(),
        position,
    ));

    let announcement = if reply.reason.trim().is_empty() {
        format!("The council approved {name} ({building_type}).")
    } else {
        format!(
            "The council approved {name} ({building_type}): {}",
            reply.reason.trim()
        )
    };
    info!(%building_type, name = %name, wood = world.global_resources.wood, "Blueprint laid");

    GovernanceOutcome::Proposed {
        building_type,
        name,
        announcement,
    }
}
