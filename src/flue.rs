//! Flue-Pipe Requirement Calculator
//!
//! The chimney connector's construction sets the baseline required clearance of
//! every flue-adjacent row. A shielded flue row needs half the baseline.

use serde::{Deserialize, Serialize};

use crate::clearance::ClearanceRow;
use crate::numeric::{format_value, normalize};

/// Label fragments identifying flue-adjacent rows, in both their flue-pipe and
/// chimney (renamed) forms.
pub const FLUE_KEYWORDS: &[&str] = &[
    "flue pipe back",
    "flue pipe side",
    "flue pipe ceiling",
    "chimney back",
    "chimney side",
    "chimney ceiling",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluePipeCategory {
    /// Single-wall connector pipe.
    SingleWall,
    /// Listed double-wall connector pipe.
    DoubleWall,
}

impl FluePipeCategory {
    pub fn base_clearance(&self) -> f64 {
        match self {
            FluePipeCategory::SingleWall => 18.0,
            FluePipeCategory::DoubleWall => 6.0,
        }
    }

    pub fn from_identifier(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "single_wall" | "single" => Some(Self::SingleWall),
            "double_wall" | "double" => Some(Self::DoubleWall),
            _ => None,
        }
    }
}

pub fn is_flue_row(row: &ClearanceRow) -> bool {
    !row.is_header_row && FLUE_KEYWORDS.iter().any(|k| row.label_contains(k))
}

/// Overwrite the required value of every visible flue-adjacent row with the
/// category's baseline (halved for rows already shielded) and re-evaluate them.
///
/// No category means no override. Returns the number of rows updated.
pub fn apply_pipe_category(rows: &mut [ClearanceRow], category: Option<FluePipeCategory>) -> usize {
    let Some(category) = category else {
        return 0;
    };

    let base = category.base_clearance();
    let mut updated = 0;
    for row in rows.iter_mut().filter(|r| r.visible && is_flue_row(r)) {
        let required = if row.shielded { base / 2.0 } else { base };
        row.required_value = format_value(required);
        row.reevaluate();
        updated += 1;
    }
    updated
}

/// Apply a shielded-checkbox change to one row.
///
/// On a flue-adjacent row an off→on transition halves the required value and
/// on→off doubles it back. Other rows keep their required value; only the
/// fail/caution branch of their classification changes. A required value that
/// does not parse is left alone.
pub fn set_row_shielded(row: &mut ClearanceRow, shielded: bool) {
    if row.shielded != shielded {
        row.shielded = shielded;
        if is_flue_row(row) {
            if let Some(current) = normalize(&row.required_value) {
                let adjusted = if shielded { current / 2.0 } else { current * 2.0 };
                row.required_value = format_value(adjusted);
            }
        }
    }
    row.reevaluate();
}
