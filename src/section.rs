//! Appliance sections and the Section State Applicator
//!
//! A section owns its clearance rows in display order. Selecting an appliance
//! type runs a full transition: reset, drop inserted rows, undo renames, then
//! apply the new type's rule. Every transition lands in the same row-set as
//! applying that type to a fresh section.

use serde::{Deserialize, Serialize};

use crate::clearance::{ClearanceRow, RowId, RowOrigin};
use crate::flue::{apply_pipe_category, set_row_shielded, FluePipeCategory};
use crate::rules::{ApplianceType, TypeRule};

/// Row-set used for every new section: `(label, default required, is header)`.
const DEFAULT_ROWS: &[(&str, &str, bool)] = &[
    ("Appliance", "", true),
    ("Front", "", false),
    ("Rear", "", false),
    ("Left side", "", false),
    ("Right side", "", false),
    ("Left corner", "", false),
    ("Right corner", "", false),
    ("Ceiling", "", false),
    ("Mantel", "", false),
    ("Plenum", "", false),
    ("Connector", "", true),
    ("Flue pipe back", "", false),
    ("Flue pipe side", "", false),
    ("Flue pipe ceiling", "", false),
    ("Floor pad", "", true),
    ("Floor pad front", "16", false),
    ("Floor pad rear", "8", false),
    ("Floor pad sides", "8", false),
];

/// Flue labels and their chimney renames.
const CHIMNEY_RENAMES: [(&str, &str); 3] = [
    ("Flue pipe back", "Chimney back"),
    ("Flue pipe side", "Chimney side"),
    ("Flue pipe ceiling", "Chimney ceiling"),
];

pub const FACING_ANCHOR: &str = "Right side";
pub const LEFT_FACING: &str = "Left facing";
pub const RIGHT_FACING: &str = "Right facing";

// Inserted rows reuse fixed ids so a transition is reproducible.
const LEFT_FACING_ID: RowId = RowId(901);
const RIGHT_FACING_ID: RowId = RowId(902);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u32);

/// A form field that may be a plain text input or a select with a visible
/// option text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Select { value: String, text: String },
    Text(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    pub fn value(&self) -> &str {
        match self {
            FieldValue::Select { value, .. } => value.trim(),
            FieldValue::Text(value) => value.trim(),
        }
    }

    /// Visible option text of a select; empty for text inputs.
    pub fn option_text(&self) -> &str {
        match self {
            FieldValue::Select { text, .. } => text.trim(),
            FieldValue::Text(_) => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeField {
    Type,
    Make,
    Model,
    InstalledBy,
    ChimneyMajor,
    ChimneyMinor,
    OwnShared,
    ChimneyCondition,
    Label,
}

/// Identifying fields of one appliance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceAttributes {
    #[serde(default)]
    pub appliance_type: FieldValue,
    #[serde(default)]
    pub make: FieldValue,
    #[serde(default)]
    pub model: FieldValue,
    #[serde(default)]
    pub installed_by: FieldValue,
    #[serde(default)]
    pub chimney_major: FieldValue,
    #[serde(default)]
    pub chimney_minor: FieldValue,
    #[serde(default)]
    pub own_shared: FieldValue,
    #[serde(default)]
    pub chimney_condition: FieldValue,
    #[serde(default)]
    pub label: FieldValue,
}

impl ApplianceAttributes {
    pub fn get(&self, field: AttributeField) -> &FieldValue {
        match field {
            AttributeField::Type => &self.appliance_type,
            AttributeField::Make => &self.make,
            AttributeField::Model => &self.model,
            AttributeField::InstalledBy => &self.installed_by,
            AttributeField::ChimneyMajor => &self.chimney_major,
            AttributeField::ChimneyMinor => &self.chimney_minor,
            AttributeField::OwnShared => &self.own_shared,
            AttributeField::ChimneyCondition => &self.chimney_condition,
            AttributeField::Label => &self.label,
        }
    }

    pub fn set(&mut self, field: AttributeField, value: FieldValue) {
        let slot = match field {
            AttributeField::Type => &mut self.appliance_type,
            AttributeField::Make => &mut self.make,
            AttributeField::Model => &mut self.model,
            AttributeField::InstalledBy => &mut self.installed_by,
            AttributeField::ChimneyMajor => &mut self.chimney_major,
            AttributeField::ChimneyMinor => &mut self.chimney_minor,
            AttributeField::OwnShared => &mut self.own_shared,
            AttributeField::ChimneyCondition => &mut self.chimney_condition,
            AttributeField::Label => &mut self.label,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "type", rename_all = "snake_case")]
pub enum SectionState {
    #[default]
    Default,
    TypeApplied(ApplianceType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceSection {
    pub id: SectionId,
    #[serde(default)]
    pub attributes: ApplianceAttributes,
    #[serde(default)]
    pub state: SectionState,
    #[serde(default)]
    pub shielding: bool,
    #[serde(default)]
    pub pipe_category: Option<FluePipeCategory>,
    pub rows: Vec<ClearanceRow>,
    #[serde(default)]
    pub notes: String,
}

impl ApplianceSection {
    /// New section cloned from the default row template.
    pub fn new(id: SectionId) -> Self {
        let rows = DEFAULT_ROWS
            .iter()
            .enumerate()
            .map(|(i, (label, required, header))| {
                let row_id = RowId(i as u32 + 1);
                if *header {
                    ClearanceRow::header(row_id, label)
                } else {
                    ClearanceRow::measurement(row_id, label, required)
                }
            })
            .collect();

        Self {
            id,
            attributes: ApplianceAttributes::default(),
            state: SectionState::Default,
            shielding: false,
            pipe_category: None,
            rows,
            notes: String::new(),
        }
    }

    pub fn appliance_type(&self) -> ApplianceType {
        match self.state {
            SectionState::Default => ApplianceType::Unknown,
            SectionState::TypeApplied(t) => t,
        }
    }

    pub fn row(&self, id: RowId) -> Option<&ClearanceRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn row_mut(&mut self, id: RowId) -> Option<&mut ClearanceRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    pub fn find_row(&self, label: &str) -> Option<&ClearanceRow> {
        self.rows.iter().find(|r| r.label_is(label))
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &ClearanceRow> {
        self.rows.iter().filter(|r| r.visible)
    }

    /// Transition to `appliance_type`, from whatever state the section is in.
    pub fn apply_type(&mut self, appliance_type: ApplianceType) {
        let rule = appliance_type.rule();
        tracing::debug!(
            section = self.id.0,
            from = ?self.state,
            to = appliance_type.identifier(),
            "applying appliance type rule"
        );

        self.reset_rows();
        self.remove_inserted_rows();
        self.rename_flue_to_chimney(false);
        self.apply_rule(&rule);

        apply_pipe_category(&mut self.rows, self.pipe_category);
        for row in &mut self.rows {
            row.reevaluate();
        }

        self.state = match appliance_type {
            ApplianceType::Unknown => SectionState::Default,
            t => SectionState::TypeApplied(t),
        };
    }

    /// Show every row, restore default values, clear checkboxes.
    fn reset_rows(&mut self) {
        for row in &mut self.rows {
            row.visible = true;
            row.required_value = row.default_required.clone();
            row.actual_value.clear();
            row.shielded = false;
            row.reevaluate();
        }
    }

    fn remove_inserted_rows(&mut self) {
        self.rows.retain(|r| r.origin != RowOrigin::RuleInserted);
    }

    fn apply_rule(&mut self, rule: &TypeRule) {
        for row in self.rows.iter_mut().filter(|r| !r.is_header_row) {
            if rule.hides(&row.label) {
                row.visible = false;
                row.clear_inputs();
            }
        }
        if rule.rename_flue_to_chimney {
            self.rename_flue_to_chimney(true);
        }
        if rule.insert_facing_rows {
            self.insert_facing_rows();
        }
    }

    /// Rename flue labels to chimney labels, or revert them. Matching is done
    /// on the current label text, so both directions are idempotent.
    pub fn rename_flue_to_chimney(&mut self, rename: bool) {
        for row in self.rows.iter_mut().filter(|r| !r.is_header_row) {
            for (flue, chimney) in CHIMNEY_RENAMES {
                let (from, to) = if rename { (flue, chimney) } else { (chimney, flue) };
                if row.label_contains(from) {
                    row.label = to.to_string();
                }
            }
        }
    }

    /// Insert "Left facing" and "Right facing" right after the "Right side"
    /// row, or at the end when that row is missing. Does nothing if facing
    /// rows are already present.
    pub fn insert_facing_rows(&mut self) {
        if self.rows.iter().any(|r| r.origin == RowOrigin::RuleInserted) {
            return;
        }

        let facing = [
            ClearanceRow::inserted(LEFT_FACING_ID, LEFT_FACING),
            ClearanceRow::inserted(RIGHT_FACING_ID, RIGHT_FACING),
        ];

        match self.rows.iter().position(|r| r.label_is(FACING_ANCHOR)) {
            Some(anchor) => {
                self.rows.splice(anchor + 1..anchor + 1, facing);
            }
            None => {
                tracing::warn!(
                    section = self.id.0,
                    "no \"{}\" row, appending facing rows",
                    FACING_ANCHOR
                );
                self.rows.extend(facing);
            }
        }
    }

    /// Turn the shielded column on or off. Turning it off unchecks every row,
    /// which restores halved flue requirements.
    pub fn set_shielding(&mut self, shielding: bool) {
        if !shielding {
            for row in &mut self.rows {
                set_row_shielded(row, false);
            }
        }
        self.shielding = shielding;
    }

    pub fn set_pipe_category(&mut self, category: Option<FluePipeCategory>) {
        self.pipe_category = category;
        apply_pipe_category(&mut self.rows, category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearance::Classification;

    fn labels(section: &ApplianceSection) -> Vec<&str> {
        section.visible_rows().map(|r| r.label.as_str()).collect()
    }

    #[test]
    fn test_new_section_uses_template() {
        let section = ApplianceSection::new(SectionId(1));
        assert_eq!(section.rows.len(), DEFAULT_ROWS.len());
        assert!(section.rows[0].is_header_row);
        assert_eq!(section.find_row("Floor pad front").unwrap().required_value, "16");
        assert_eq!(section.appliance_type(), ApplianceType::Unknown);
    }

    #[test]
    fn test_insert_hides_and_adds_facing_rows() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.apply_type(ApplianceType::Insert);

        let visible = labels(&section);
        assert!(!visible.contains(&"Plenum"));
        assert!(!visible.contains(&"Flue pipe back"));
        assert!(!visible.contains(&"Rear"));

        let right = section.rows.iter().position(|r| r.label == "Right side").unwrap();
        assert_eq!(section.rows[right + 1].label, LEFT_FACING);
        assert_eq!(section.rows[right + 2].label, RIGHT_FACING);
        assert_eq!(section.state, SectionState::TypeApplied(ApplianceType::Insert));
    }

    #[test]
    fn test_headers_are_never_hidden() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.apply_type(ApplianceType::Fireplace);
        assert!(section.rows.iter().filter(|r| r.is_header_row).all(|r| r.visible));
    }

    #[test]
    fn test_hidden_rows_are_cleared() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.shielding = true;
        {
            let plenum = section.rows.iter_mut().find(|r| r.label == "Plenum").unwrap();
            plenum.required_value = "18".into();
            plenum.actual_value = "2".into();
            plenum.shielded = true;
        }
        section.apply_type(ApplianceType::Stove);

        let plenum = section.find_row("Plenum").unwrap();
        assert!(!plenum.visible);
        assert!(plenum.required_value.is_empty());
        assert!(plenum.actual_value.is_empty());
        assert!(!plenum.shielded);
        assert_eq!(plenum.classification, Classification::Unclassified);
    }

    #[test]
    fn test_outdoor_boiler_rename_and_revert() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.apply_type(ApplianceType::OutdoorBoiler);
        assert!(section.find_row("Chimney back").is_some());
        assert!(section.find_row("Flue pipe back").is_none());

        section.apply_type(ApplianceType::Stove);
        assert_eq!(section.rows[11].label, "Flue pipe back");
        assert_eq!(section.rows[12].label, "Flue pipe side");
        assert_eq!(section.rows[13].label, "Flue pipe ceiling");
    }

    #[test]
    fn test_rename_twice_does_not_double_transform() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.rename_flue_to_chimney(true);
        section.rename_flue_to_chimney(true);
        assert!(section.find_row("Chimney back").is_some());
        section.rename_flue_to_chimney(false);
        section.rename_flue_to_chimney(false);
        assert_eq!(section, ApplianceSection::new(SectionId(1)));
    }

    #[test]
    fn test_facing_rows_without_anchor_are_appended() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.rows.retain(|r| r.label != FACING_ANCHOR);
        section.apply_type(ApplianceType::FactoryBuilt);
        let n = section.rows.len();
        assert_eq!(section.rows[n - 2].label, LEFT_FACING);
        assert_eq!(section.rows[n - 1].label, RIGHT_FACING);
    }

    #[test]
    fn test_switching_away_removes_facing_rows() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.apply_type(ApplianceType::Insert);
        section.apply_type(ApplianceType::Unknown);
        assert_eq!(section, ApplianceSection::new(SectionId(1)));
    }

    #[test]
    fn test_transition_matches_fresh_application() {
        let mut fresh = ApplianceSection::new(SectionId(1));
        fresh.apply_type(ApplianceType::Range);

        let mut travelled = ApplianceSection::new(SectionId(1));
        for t in [ApplianceType::Insert, ApplianceType::OutdoorBoiler, ApplianceType::Fireplace] {
            travelled.apply_type(t);
        }
        travelled.apply_type(ApplianceType::Range);
        assert_eq!(travelled, fresh);
    }

    #[test]
    fn test_type_change_keeps_pipe_category() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.set_pipe_category(Some(FluePipeCategory::SingleWall));
        section.apply_type(ApplianceType::OutdoorBoiler);
        assert_eq!(section.find_row("Chimney back").unwrap().required_value, "18");
    }

    #[test]
    fn test_shielding_off_restores_flue_requirement() {
        let mut section = ApplianceSection::new(SectionId(1));
        section.set_shielding(true);
        section.set_pipe_category(Some(FluePipeCategory::SingleWall));
        let row = section.rows.iter_mut().find(|r| r.label == "Flue pipe side").unwrap();
        set_row_shielded(row, true);
        assert_eq!(row.required_value, "9");

        section.set_shielding(false);
        let row = section.find_row("Flue pipe side").unwrap();
        assert_eq!(row.required_value, "18");
        assert!(!row.shielded);
    }

    #[test]
    fn test_field_value_accepts_text_or_select() {
        let text: FieldValue = serde_json::from_str("\"Jotul\"").unwrap();
        assert_eq!(text.value(), "Jotul");
        let select: FieldValue =
            serde_json::from_str(r#"{"value": "3", "text": "3 - Masonry"}"#).unwrap();
        assert_eq!(select.value(), "3");
        assert_eq!(select.option_text(), "3 - Masonry");
    }
}
