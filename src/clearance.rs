//! Clearance rows and the Row Evaluator
//!
//! A row is one required-vs-actual distance measurement. Its classification is
//! always derived from the current required/actual/shielded triple; callers
//! re-run [`evaluate_row`] after every change to any of the three.

use serde::{Deserialize, Serialize};

use crate::numeric::normalize;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static EVALUATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_evaluation_call_count() -> u32 {
    EVALUATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_evaluation_call_count() {
    EVALUATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

/// Pass/fail state of a single row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Header row, or one of the values is not a number.
    #[default]
    Unclassified,
    Pass,
    Fail,
    /// Short of the requirement but shielded.
    Caution,
}

impl Classification {
    /// Style tag the form applies to the row.
    pub fn row_class(&self) -> &'static str {
        match self {
            Classification::Unclassified => "",
            Classification::Pass => "row-positive",
            Classification::Fail => "row-negative",
            Classification::Caution => "row-caution",
        }
    }
}

/// Where a row came from. Rule-inserted rows are removed on every type transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrigin {
    #[default]
    Template,
    RuleInserted,
}

/// Stable row handle within a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearanceRow {
    pub id: RowId,
    pub label: String,
    #[serde(default)]
    pub required_value: String,
    #[serde(default)]
    pub actual_value: String,
    #[serde(default)]
    pub shielded: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub is_header_row: bool,
    #[serde(default)]
    pub origin: RowOrigin,
    /// Value the required input resets to on a type transition.
    #[serde(default)]
    pub default_required: String,
    #[serde(default)]
    pub classification: Classification,
}

fn default_true() -> bool { true }

impl ClearanceRow {
    pub fn measurement(id: RowId, label: &str, default_required: &str) -> Self {
        Self {
            id,
            label: label.to_string(),
            required_value: default_required.to_string(),
            actual_value: String::new(),
            shielded: false,
            visible: true,
            is_header_row: false,
            origin: RowOrigin::Template,
            default_required: default_required.to_string(),
            classification: Classification::Unclassified,
        }
    }

    pub fn header(id: RowId, label: &str) -> Self {
        Self {
            is_header_row: true,
            ..Self::measurement(id, label, "")
        }
    }

    pub fn inserted(id: RowId, label: &str) -> Self {
        Self {
            origin: RowOrigin::RuleInserted,
            ..Self::measurement(id, label, "")
        }
    }

    /// Recompute this row's classification from its current values.
    pub fn reevaluate(&mut self) {
        self.classification = evaluate_row(
            &self.required_value,
            &self.actual_value,
            self.shielded,
            self.is_header_row,
        );
    }

    /// Case-insensitive label match against a keyword.
    pub fn label_contains(&self, keyword: &str) -> bool {
        self.label.to_lowercase().contains(&keyword.to_lowercase())
    }

    pub fn label_is(&self, label: &str) -> bool {
        self.label.trim().eq_ignore_ascii_case(label)
    }

    /// Empty the inputs of a row the user can no longer see.
    pub fn clear_inputs(&mut self) {
        self.required_value.clear();
        self.actual_value.clear();
        self.shielded = false;
        self.classification = Classification::Unclassified;
    }
}

/// Classify one row.
///
/// Header rows are never evaluated. Otherwise both values must normalize to a
/// number; then the row passes iff `actual >= required`, and a shortfall is a
/// caution when shielded, a failure when not.
pub fn evaluate_row(required: &str, actual: &str, shielded: bool, is_header: bool) -> Classification {
    #[cfg(feature = "test-hooks")]
    EVALUATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

    if is_header {
        return Classification::Unclassified;
    }

    let (Some(req), Some(act)) = (normalize(required), normalize(actual)) else {
        return Classification::Unclassified;
    };

    if act >= req {
        Classification::Pass
    } else if shielded {
        Classification::Caution
    } else {
        Classification::Fail
    }
}
