//! Per-tick outcome summary returned alongside the committed world.

use hearth_types::World;
use serde::Serialize;

use crate::arbitration::ArbitrationReport;
use crate::governance::GovernanceOutcome;
use crate::narration::NarrationReport;

/// How a stage's generation call went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StageStatus {
    /// The backend's reply was used as-is.
    Ok,
    /// The reply was undecodable and the fallback value was used.
    Fallback,
    /// The call failed; the stage contributed its canned value.
    Failed,
}

/// Everything one tick did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// The turn number after commit.
    pub turn: u64,
    /// Governance result.
    pub governance: GovernanceOutcome,
    /// Agents whose intent fell back to resting.
    pub intent_fallbacks: usize,
    /// Arbitration result.
    pub arbitration: ArbitrationReport,
    /// Buildings completed by expert work this tick.
    pub expert_completions: Vec<String>,
    /// Narration result.
    pub narration: NarrationReport,
    /// The committed world.
    #[serde(skip)]
    pub world: World,
}
