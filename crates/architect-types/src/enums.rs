//! Enumeration types for the Architect simulation.
//!
//! Every closed vocabulary the oracle and the log stream speak in lives here.
//! The wire spellings match what the oracle is instructed to emit, so the
//! adapter can hand raw strings straight to the `from_label` constructors.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// World objects
// ---------------------------------------------------------------------------

/// The kind of artifact placed into the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WorldObjectType {
    /// Load-bearing wall segment.
    Wall,
    /// Roof panel.
    Roof,
    /// Doorway.
    Door,
    /// Cultivated crop plot.
    Crop,
    /// Planted tree.
    Tree,
    /// Water well.
    Well,
    /// Fence segment.
    Fence,
    /// Prefabricated habitation module. The primary structure of a settlement.
    ModularUnit,
    /// Photovoltaic panel.
    SolarPanel,
    /// Rainwater collector.
    WaterCollector,
}

impl WorldObjectType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Wall,
        Self::Roof,
        Self::Door,
        Self::Crop,
        Self::Tree,
        Self::Well,
        Self::Fence,
        Self::ModularUnit,
        Self::SolarPanel,
        Self::WaterCollector,
    ];

    /// The `snake_case` wire label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Roof => "roof",
            Self::Door => "door",
            Self::Crop => "crop",
            Self::Tree => "tree",
            Self::Well => "well",
            Self::Fence => "fence",
            Self::ModularUnit => "modular_unit",
            Self::SolarPanel => "solar_panel",
            Self::WaterCollector => "water_collector",
        }
    }

    /// Parse a label, ignoring case and surrounding whitespace.
    ///
    /// Spaces and hyphens are accepted in place of underscores
    /// (`"Solar Panel"` and `"solar-panel"` both resolve).
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }
}

impl core::fmt::Display for WorldObjectType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Knowledge
// ---------------------------------------------------------------------------

/// Category a knowledge entry is filed under.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum KnowledgeCategory {
    /// Roads, utilities, and site services.
    Infrastructure,
    /// Power generation and storage.
    Energy,
    /// Terrain, water, and ecology.
    Environment,
    /// Structural and spatial design.
    Architecture,
    /// Cross-cutting insight. Used whenever the oracle gives no usable category.
    #[default]
    Synthesis,
}

impl KnowledgeCategory {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Infrastructure,
        Self::Energy,
        Self::Environment,
        Self::Architecture,
        Self::Synthesis,
    ];

    /// The `PascalCase` wire label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Infrastructure => "Infrastructure",
            Self::Energy => "Energy",
            Self::Environment => "Environment",
            Self::Architecture => "Architecture",
            Self::Synthesis => "Synthesis",
        }
    }

    /// Parse a label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(label))
    }
}

impl core::fmt::Display for KnowledgeCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Lifecycle status of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum StepStatus {
    /// Not yet reached.
    Pending,
    /// The step currently being worked.
    Active,
    /// Finished by a placement.
    Completed,
}

// ---------------------------------------------------------------------------
// Log stream
// ---------------------------------------------------------------------------

/// Tag on a log stream entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum LogKind {
    /// An action taken in the world (relocation, standby).
    Action,
    /// A new knowledge entry was indexed.
    Learning,
    /// A tick failed.
    Error,
    /// A placement or plan completion.
    Success,
    /// Progress chatter and streamed reasoning.
    Thinking,
}

impl LogKind {
    /// The lowercase wire label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Learning => "learning",
            Self::Error => "error",
            Self::Success => "success",
            Self::Thinking => "thinking",
        }
    }

    /// Parse a lowercase label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "action" => Some(Self::Action),
            "learning" => Some(Self::Learning),
            "error" => Some(Self::Error),
            "success" => Some(Self::Success),
            "thinking" => Some(Self::Thinking),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator status
// ---------------------------------------------------------------------------

/// Link status shown to operators while ticks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum NetworkStatus {
    /// No oracle link.
    Offline,
    /// Idle and ready for the next tick.
    #[default]
    UplinkActive,
    /// A tick is in flight.
    Syncing,
}

/// The three actions the oracle may choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Place a new object.
    Place,
    /// Relocate the avatar.
    Move,
    /// Do nothing this tick.
    Wait,
}

impl ActionKind {
    /// Parse an action label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "PLACE" => Some(Self::Place),
            "MOVE" => Some(Self::Move),
            "WAIT" => Some(Self::Wait),
            _ => None,
        }
    }
}
