//! Appliance-Type Rule Table
//!
//! Each appliance type maps to a fixed, declarative rule. Unknown types get the
//! identity rule.

use serde::{Deserialize, Serialize};

/// Label substrings (case-insensitive) whose rows are hidden by a rule.
pub type Keywords = &'static [&'static str];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplianceType {
    /// Kitchen wood range
    Range,
    Insert,
    Furnace,
    Boiler,
    #[serde(rename = "factorybuilt")]
    FactoryBuilt,
    /// Pellet stove or pellet insert
    Pellet,
    Hearth,
    #[serde(rename = "outdoorboiler")]
    OutdoorBoiler,
    /// Masonry fireplace
    Fireplace,
    Stove,
    /// Empty or unrecognized selection; written as `""` like [`ApplianceType::identifier`].
    #[default]
    #[serde(rename = "", other)]
    Unknown,
}

/// What a type does to a section's clearance rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRule {
    pub hide_keywords: Keywords,
    pub rename_flue_to_chimney: bool,
    pub insert_facing_rows: bool,
}

impl TypeRule {
    pub const IDENTITY: TypeRule = TypeRule {
        hide_keywords: &[],
        rename_flue_to_chimney: false,
        insert_facing_rows: false,
    };

    const fn hide(hide_keywords: Keywords) -> Self {
        Self {
            hide_keywords,
            rename_flue_to_chimney: false,
            insert_facing_rows: false,
        }
    }

    const fn with_facing_rows(self) -> Self {
        Self { insert_facing_rows: true, ..self }
    }

    const fn with_chimney_labels(self) -> Self {
        Self { rename_flue_to_chimney: true, ..self }
    }

    pub fn hides(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.hide_keywords.iter().any(|k| label.contains(k))
    }
}

const FLUE_AND_CORNERS: Keywords = &[
    "flue pipe back",
    "flue pipe side",
    "flue pipe ceiling",
    "left corner",
    "right corner",
    "plenum",
];

const INSERT_HIDES: Keywords = &[
    "rear",
    "flue pipe back",
    "flue pipe side",
    "flue pipe ceiling",
    "left corner",
    "right corner",
    "plenum",
];

impl ApplianceType {
    pub const ALL: [ApplianceType; 10] = [
        ApplianceType::Range,
        ApplianceType::Insert,
        ApplianceType::Furnace,
        ApplianceType::Boiler,
        ApplianceType::FactoryBuilt,
        ApplianceType::Pellet,
        ApplianceType::Hearth,
        ApplianceType::OutdoorBoiler,
        ApplianceType::Fireplace,
        ApplianceType::Stove,
    ];

    /// Parse the form's type identifier. Case and surrounding whitespace are
    /// ignored; anything unrecognized is `Unknown`.
    pub fn from_identifier(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "range" => Self::Range,
            "insert" => Self::Insert,
            "furnace" => Self::Furnace,
            "boiler" => Self::Boiler,
            "factorybuilt" => Self::FactoryBuilt,
            "pellet" => Self::Pellet,
            "hearth" => Self::Hearth,
            "outdoorboiler" => Self::OutdoorBoiler,
            "fireplace" => Self::Fireplace,
            "stove" => Self::Stove,
            _ => Self::Unknown,
        }
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Range => "range",
            Self::Insert => "insert",
            Self::Furnace => "furnace",
            Self::Boiler => "boiler",
            Self::FactoryBuilt => "factorybuilt",
            Self::Pellet => "pellet",
            Self::Hearth => "hearth",
            Self::OutdoorBoiler => "outdoorboiler",
            Self::Fireplace => "fireplace",
            Self::Stove => "stove",
            Self::Unknown => "",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Range => "Kitchen wood range",
            Self::Insert => "Insert",
            Self::Furnace => "Furnace",
            Self::Boiler => "Boiler",
            Self::FactoryBuilt => "Factory-built fireplace",
            Self::Pellet => "Pellet stove / insert",
            Self::Hearth => "Hearth",
            Self::OutdoorBoiler => "Outdoor wood boiler",
            Self::Fireplace => "Masonry fireplace",
            Self::Stove => "Stove",
            Self::Unknown => "",
        }
    }

    pub fn rule(&self) -> TypeRule {
        match self {
            Self::Range => TypeRule::hide(&["plenum", "mantel"]),
            Self::Insert => TypeRule::hide(INSERT_HIDES).with_facing_rows(),
            Self::Furnace => TypeRule::hide(&["mantel"]),
            Self::Boiler => TypeRule::hide(&["plenum", "mantel"]),
            Self::FactoryBuilt => TypeRule::hide(FLUE_AND_CORNERS).with_facing_rows(),
            Self::Pellet | Self::Hearth | Self::Stove => TypeRule::hide(&["plenum"]),
            Self::OutdoorBoiler => {
                TypeRule::hide(&["left corner", "right corner", "plenum", "mantel"])
                    .with_chimney_labels()
            }
            Self::Fireplace => TypeRule::hide(FLUE_AND_CORNERS).with_facing_rows(),
            Self::Unknown => TypeRule::IDENTITY,
        }
    }
}
