//! Per-tick agent intents.
//!
//! An intent is collected fresh every tick and consumed by arbitration and
//! effect application. It is never written into the [`World`] document.
//!
//! [`World`]: crate::world::World

use serde::{Deserialize, Serialize};

/// Spoken line used when an agent's intent could not be collected.
pub const SILENT_LINE: &str = "...";

/// What an agent wants to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntentTag {
    /// Labor, including construction for expert jobs.
    Work,
    /// Direct others; feeds the arbiter's NPC assignments.
    Command,
    /// Idle or recover.
    Rest,
}

impl IntentTag {
    /// Case-insensitive parse of the wire tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "WORK" => Some(Self::Work),
            "COMMAND" => Some(Self::Command),
            "REST" => Some(Self::Rest),
            _ => None,
        }
    }
}

/// One agent's decided intent for the current tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// The intent category.
    #[serde(rename = "intent")]
    pub tag: IntentTag,
    /// Optional target (a person, building, or resource).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// The short line the agent speaks.
    pub line: String,
}

impl Intent {
    /// The fallback intent: rest silently.
    pub fn resting() -> Self {
        Self {
            tag: IntentTag::Rest,
            target: None,
            line: SILENT_LINE.to_owned(),
        }
    }
}
