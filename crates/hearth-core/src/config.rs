//! Tick tuning loaded from `hearth-config.yaml`.
//!
//! Every field has a default, so an empty or missing file yields the stock
//! simulation. The path can be overridden with `HEARTH_CONFIG`.

use std::path::Path;
use std::time::Duration;

use hearth_types::LOG_CAPACITY;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "hearth-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// How a resource debit treats the zero floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourcePolicy {
    /// Counters may go negative.
    #[default]
    AllowNegative,
    /// Counters stop at zero.
    ClampToZero,
}

impl ResourcePolicy {
    /// Apply a debit of `amount` to `current`.
    pub const fn debit(self, current: i64, amount: i64) -> i64 {
        let next = current.saturating_sub(amount);
        match self {
            Self::AllowNegative => next,
            Self::ClampToZero => {
                if next < 0 {
                    0
                } else {
                    next
                }
            }
        }
    }
}

/// Tunable parameters for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Governance runs only when wood is strictly above this.
    #[serde(default = "default_governance_wood_threshold")]
    pub governance_wood_threshold: i64,

    /// Chance per tick that the council convenes when eligible.
    #[serde(default = "default_governance_probability")]
    pub governance_probability: f64,

    /// Agents per intent batch; each batch has its own pool member.
    #[serde(default = "default_intent_batch_size")]
    pub intent_batch_size: usize,

    /// Hunger added to every agent each tick.
    #[serde(default = "default_hunger_per_tick")]
    pub hunger_per_tick: u32,

    /// Progress each constructing NPC adds to the blueprint.
    #[serde(default = "default_npc_build_progress")]
    pub npc_build_progress: u32,

    /// Progress each working expert adds to the blueprint.
    #[serde(default = "default_expert_build_bonus")]
    pub expert_build_bonus: u32,

    /// Resource credited for each NPC put on a subsistence task.
    #[serde(default = "default_subsistence_yield")]
    pub subsistence_yield: i64,

    /// Maximum retained log entries. Read through [`TickConfig::log_cap`].
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Spoken lines passed to the story call.
    #[serde(default = "default_narrator_spoken_lines")]
    pub narrator_spoken_lines: usize,

    /// Wall-clock budget for all generation calls in one tick.
    #[serde(default = "default_tick_budget_ms")]
    pub tick_budget_ms: u64,

    /// Zero-floor handling for governance debits.
    #[serde(default)]
    pub resource_policy: ResourcePolicy,

    /// Jobs whose WORK intent raises the blueprint.
    #[serde(default = "default_expert_jobs")]
    pub expert_jobs: Vec<String>,

    /// Substring marking an NPC task as construction.
    #[serde(default = "default_construction_marker")]
    pub construction_marker: String,
}

const fn default_governance_wood_threshold() -> i64 {
    50
}

const fn default_governance_probability() -> f64 {
    0.3
}

const fn default_intent_batch_size() -> usize {
    3
}

const fn default_hunger_per_tick() -> u32 {
    2
}

const fn default_npc_build_progress() -> u32 {
    5
}

const fn default_expert_build_bonus() -> u32 {
    10
}

const fn default_subsistence_yield() -> i64 {
    5
}

const fn default_log_capacity() -> usize {
    hearth_types::LOG_CAPACITY
}

const fn default_narrator_spoken_lines() -> usize {
    5
}

const fn default_tick_budget_ms() -> u64 {
    55_000
}

fn default_expert_jobs() -> Vec<String> {
    vec![String::from("builder"), String::from("engineer")]
}

fn default_construction_marker() -> String {
    String::from("construct")
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            governance_wood_threshold: default_governance_wood_threshold(),
            governance_probability: default_governance_probability(),
            intent_batch_size: default_intent_batch_size(),
            hunger_per_tick: default_hunger_per_tick(),
            npc_build_progress: default_npc_build_progress(),
            expert_build_bonus: default_expert_build_bonus(),
            subsistence_yield: default_subsistence_yield(),
            log_capacity: default_log_capacity(),
            narrator_spoken_lines: default_narrator_spoken_lines(),
            tick_budget_ms: default_tick_budget_ms(),
            resource_policy: ResourcePolicy::default(),
            expert_jobs: default_expert_jobs(),
            construction_marker: default_construction_marker(),
        }
    }
}

impl TickConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Load from `path`, or use the defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            info!(path = %path.display(), "Loading tick config");
            Self::from_file(path)
        } else {
            info!(path = %path.display(), "No tick config file, using defaults");
            Ok(Self::default())
        }
    }

    /// The tick's wall-clock budget.
    pub const fn tick_budget(&self) -> Duration {
        Duration::from_millis(self.tick_budget_ms)
    }

    /// Governance probability clamped to `[0, 1]`.
    pub fn governance_chance(&self) -> f64 {
        if self.governance_probability.is_nan() {
            return 0.0;
        }
        self.governance_probability.clamp(0.0, 1.0)
    }

    /// Batch size, never zero.
    pub fn batch_size(&self) -> usize {
        self.intent_batch_size.max(1)
    }

    /// Log capacity kept within `1..=LOG_CAPACITY`.
    pub fn log_cap(&self) -> usize {
        self.log_capacity.clamp(1, LOG_CAPACITY)
    }
}
