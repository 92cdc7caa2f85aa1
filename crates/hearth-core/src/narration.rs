//! Narration: environment, then story.
//!
//! Both calls go to random-assignment members and run one after the other,
//! since the story prompt is built from the environment reply. If the
//! environment call fails, the fallback weather and description stand and
//! the story call is skipped. Any failure puts a diagnostic line carrying
//! the error in place of the story.

use std::fmt;

use hearth_llm::parse::excerpt;
use hearth_llm::{Role, Stage};
use hearth_types::{SILENT_LINE, World};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::call::{CallError, StageCaller};
use crate::config::TickConfig;
use crate::report::StageStatus;

/// Weather used when the environment call fails.
pub const FALLBACK_WEATHER: &str = "Overcast";

/// Scene description used when the environment call fails.
pub const FALLBACK_DESCRIPTION: &str = "The settlement carries on under a quiet grey sky.";

/// Part of the in-world day, cycling every four turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DaySegment {
    /// `turn % 4 == 0`.
    Dawn,
    /// `turn % 4 == 1`.
    Day,
    /// `turn % 4 == 2`.
    Dusk,
    /// `turn % 4 == 3`.
    Night,
}

impl DaySegment {
    /// The segment for `turn`.
    pub const fn for_turn(turn: u64) -> Self {
        match turn % 4 {
            0 => Self::Dawn,
            1 => Self::Day,
            2 => Self::Dusk,
            _ => Self::Night,
        }
    }

    /// Lowercase name used in prompts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dawn => "dawn",
            Self::Day => "day",
            Self::Dusk => "dusk",
            Self::Night => "night",
        }
    }
}

impl fmt::Display for DaySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct EnvironmentReply {
    #[serde(default)]
    weather: String,
    #[serde(default, alias = "environment", alias = "environmentDescription")]
    description: String,
}

#[derive(Debug, Deserialize)]
struct StoryReply {
    #[serde(alias = "narrative")]
    story: String,
}

/// How narration went.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationReport {
    /// The day segment narrated.
    pub segment: DaySegment,
    /// Environment call status.
    pub environment: StageStatus,
    /// Story call status. `Failed` also when the call was skipped.
    pub story: StageStatus,
}

/// Narration output for commit.
#[derive(Debug, Clone)]
pub struct Narration {
    /// New weather.
    pub weather: String,
    /// New scene description.
    pub description: String,
    /// The log entry for this tick.
    pub story: String,
    /// Stage statuses.
    pub report: NarrationReport,
}

/// Inputs to the story prompt gathered by earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct StoryInputs<'a> {
    /// Governance announcement, if a blueprint was laid.
    pub governance: Option<&'a str>,
    /// Arbitration events.
    pub events: &'a [String],
}

/// The story used when narration fails.
pub fn diagnostic_story(error: &CallError) -> String {
    let detail = error.to_string();
    format!("The chronicler's pen faltered this turn ({}).", excerpt(&detail))
}

/// Run both narration calls.
pub async fn narrate<R: Rng + Send>(
    world: &World,
    inputs: StoryInputs<'_>,
    caller: &StageCaller<'_>,
    config: &TickConfig,
    rng: &mut R,
) -> Narration {
    let segment = DaySegment::for_turn(world.turn);

    let environment_client = caller.pool.acquire(Role::Narrator, rng);
    let environment_context = serde_json::json!({
        "turn": world.turn,
        "segment": segment.as_str(),
        "weather": world.weather,
    });
    let environment = caller
        .call_decoded::<EnvironmentReply>(&environment_client, Stage::Environment, &environment_context)
        .await;

    let (weather, description) = match environment {
        Ok(reply) => (
            non_empty_or(reply.weather, FALLBACK_WEATHER),
            non_empty_or(reply.description, FALLBACK_DESCRIPTION),
        ),
        Err(e) => {
            warn!(
                error = %e,
                client = environment_client.label(),
                "Environment call failed, skipping story"
            );
            return Narration {
                weather: FALLBACK_WEATHER.to_owned(),
                description: FALLBACK_DESCRIPTION.to_owned(),
                story: diagnostic_story(&e),
                report: NarrationReport {
                    segment,
                    environment: StageStatus::Failed,
                    story: StageStatus::Failed,
                },
            };
        }
    };

    let story_client = caller.pool.acquire(Role::Narrator, rng);
    let story_context = serde_json::json!({
        "segment": segment.as_str(),
        "description": description,
        "governance": inputs.governance,
        "events": inputs.events,
        "lines": spoken_lines(world, config.narrator_spoken_lines),
    });
    let story = caller
        .call_decoded::<StoryReply>(&story_client, Stage::Story, &story_context)
        .await
        .and_then(|reply| {
            let story = reply.story.trim().to_owned();
            if story.is_empty() {
                Err(CallError::Rejected(String::from("empty story")))
            } else {
                Ok(story)
            }
        });

    let (story, story_status) = match story {
        Ok(story) => (story, StageStatus::Ok),
        Err(e) => {
            warn!(error = %e, client = story_client.label(), "Story call failed");
            (diagnostic_story(&e), StageStatus::Failed)
        }
    };

    info!(%segment, weather = %weather, story = ?story_status, "Narration done");
    Narration {
        weather,
        description,
        story,
        report: NarrationReport {
            segment,
            environment: StageStatus::Ok,
            story: story_status,
        },
    }
}

/// Up to `limit` non-silent lines, as `Name: line`.
fn spoken_lines(world: &World, limit: usize) -> Vec<String> {
    world
        .agents
        .iter()
        .filter(|agent| {
            let line = agent.action_log.trim();
            !line.is_empty() && line != SILENT_LINE
        })
        .take(limit)
        .map(|agent| format!("{}: {}", agent.name, agent.action_log.trim()))
        .collect()
}

fn non_empty_or(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_llm::LlmError;
    use hearth_types::create_starting_world;

    use super::*;

    #[test]
    fn segments_cycle_every_four_turns() {
        assert_eq!(DaySegment::for_turn(0), DaySegment::Dawn);
        assert_eq!(DaySegment::for_turn(1), DaySegment::Day);
        assert_eq!(DaySegment::for_turn(2), DaySegment::Dusk);
        assert_eq!(DaySegment::for_turn(3), DaySegment::Night);
        assert_eq!(DaySegment::for_turn(4), DaySegment::Dawn);
    }

    #[test]
    fn spoken_lines_skip_silence_and_cap() {
        let mut world = create_starting_world();
        for (i, agent) in world.agents.iter_mut().enumerate() {
            agent.action_log = if i == 1 {
                SILENT_LINE.to_owned()
            } else {
                format!("line {i}")
            };
        }
        let lines = spoken_lines(&world, 3);
        assert_eq!(lines, vec!["Ada: line 0", "Cora: line 2", "Dunn: line 3"]);
    }

    #[test]
    fn diagnostic_story_carries_error() {
        let story = diagnostic_story(&CallError::Backend(LlmError::RateLimited(String::from(
            "slow down",
        ))));
        assert!(story.contains("rate limited: slow down"));
    }

    #[test]
    fn blank_environment_fields_fall_back() {
        assert_eq!(non_empty_or(String::from("  "), FALLBACK_WEATHER), FALLBACK_WEATHER);
        assert_eq!(non_empty_or(String::from(" Snow "), FALLBACK_WEATHER), "Snow");
    }
}
