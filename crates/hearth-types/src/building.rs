//! Buildings, the static cost table, and the blueprint lifecycle.
//!
//! A building is born as a `Blueprint` with zero progress and becomes
//! `Active` exactly when its progress reaches `max_progress`. The transition
//! is one-way. `max_progress` is fixed at creation from [`BuildingType::cost`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Columns in the building slot layout.
const SLOT_COLUMNS: usize = 5;

/// Grid cells between adjacent building slots.
const SLOT_SPACING: u32 = 4;

/// Grid offset of the first slot from the settlement edge.
const SLOT_ORIGIN: u32 = 2;

/// The closed set of buildings the council may commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum BuildingType {
    /// Dwelling for settlers.
    House,
    /// Cultivated plots that feed the settlement.
    Farm,
    /// Tool and craft shop.
    Workshop,
    /// Where the sick are treated.
    Clinic,
    /// Bulk storage for wood, stone, and food.
    Warehouse,
}

/// Resource cost and construction effort for one building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingCost {
    /// Wood deducted when the blueprint is laid.
    pub wood: i64,
    /// Stone deducted when the blueprint is laid (zero for timber builds).
    pub stone: i64,
    /// Progress required to finish construction.
    pub max_progress: u32,
}

impl BuildingType {
    /// Every type the council may propose, in prompt order.
    pub const ALL: [Self; 5] = [
        Self::House,
        Self::Farm,
        Self::Workshop,
        Self::Clinic,
        Self::Warehouse,
    ];

    /// The type substituted when a proposal names something unknown.
    pub const DEFAULT: Self = Self::House;

    /// Static cost table.
    pub const fn cost(self) -> BuildingCost {
        match self {
            Self::House => BuildingCost { wood: 40, stone: 0, max_progress: 100 },
            Self::Farm => BuildingCost { wood: 30, stone: 0, max_progress: 80 },
            Self::Workshop => BuildingCost { wood: 60, stone: 20, max_progress: 150 },
            Self::Clinic => BuildingCost { wood: 50, stone: 15, max_progress: 120 },
            Self::Warehouse => BuildingCost { wood: 80, stone: 30, max_progress: 160 },
        }
    }

    /// Lowercase wire name, as it appears in prompts and the world document.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Farm => "farm",
            Self::Workshop => "workshop",
            Self::Clinic => "clinic",
            Self::Warehouse => "warehouse",
        }
    }

    /// Case-insensitive lookup by name. Surrounding whitespace is ignored.
    pub fn parse(name: &str) -> Option<Self> {
        let needle = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
    }

    /// Resolve a proposed type name, falling back to [`Self::DEFAULT`].
    pub fn from_proposal(name: &str) -> Self {
        Self::parse(name).unwrap_or(Self::DEFAULT)
    }
}

impl std::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction status. `Blueprint -> Active` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum BuildingStatus {
    /// Under construction.
    Blueprint,
    /// Finished and in use.
    Active,
}

/// A building record in the world document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Building {
    /// Which kind of building this is.
    #[serde(rename = "type")]
    pub building_type: BuildingType,
    /// Display name chosen by the council.
    pub name: String,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
    /// Construction status.
    pub status: BuildingStatus,
    /// Accumulated construction progress, `0..=max_progress`.
    pub progress: u32,
    /// Progress needed to finish, fixed at creation.
    pub max_progress: u32,
    /// Free-text description (the council's rationale).
    pub desc: String,
}

impl Building {
    /// Lay a new blueprint with zero progress.
    pub fn blueprint(
        building_type: BuildingType,
        name: impl Into<String>,
        desc: impl Into<String>,
        (x, y): (u32, u32),
    ) -> Self {
        Self {
            building_type,
            name: name.into(),
            x,
            y,
            status: BuildingStatus::Blueprint,
            progress: 0,
            max_progress: building_type.cost().max_progress,
            desc: desc.into(),
        }
    }

    /// Whether this building is still under construction.
    pub const fn is_blueprint(&self) -> bool {
        matches!(self.status, BuildingStatus::Blueprint)
    }

    /// Add construction progress, clamped to `max_progress`.
    ///
    /// Flips the status to [`BuildingStatus::Active`] when the cap is reached
    /// and returns `true` only on the call that completed the building.
    /// Active buildings are left untouched.
    pub fn advance(&mut self, amount: u32) -> bool {
        if !self.is_blueprint() {
            return false;
        }
        self.progress = self.progress.saturating_add(amount);
        self.settle()
    }

    /// Activate a blueprint whose progress already reached `max_progress`.
    ///
    /// Clamps progress to the cap and returns `true` only when the status
    /// changed. Covers documents loaded with a finished but unflipped
    /// blueprint.
    pub fn settle(&mut self) -> bool {
        if !self.is_blueprint() || self.progress < self.max_progress {
            return false;
        }
        self.progress = self.max_progress;
        self.status = BuildingStatus::Active;
        true
    }
}

/// Grid position of the `index`-th building slot.
///
/// Slots are laid out row-major, [`SLOT_COLUMNS`] per row, so appended
/// buildings never overlap earlier ones.
pub fn slot_position(index: usize) -> (u32, u32) {
    let column = u32::try_from(index % SLOT_COLUMNS).unwrap_or(0);
    let row = u32::try_from(index / SLOT_COLUMNS).unwrap_or(u32::MAX);
    (
        SLOT_ORIGIN.saturating_add(column.saturating_mul(SLOT_SPACING)),
        SLOT_ORIGIN.saturating_add(row.saturating_mul(SLOT_SPACING)),
    )
}
