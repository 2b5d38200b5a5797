//! Multi-Entry Snapshot Builder
//!
//! Captures every section as a self-contained [`Entry`]. Row classes are
//! re-derived from the row values at capture time; a cached classification is
//! never trusted. Hidden rows are left out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clearance::{evaluate_row, Classification, ClearanceRow};
use crate::form::{ReportHeader, SurveyForm};
use crate::rules::ApplianceType;
use crate::section::{ApplianceSection, AttributeField, FieldValue};

/// One row as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRow {
    pub label: String,
    pub required: String,
    pub actual: String,
    /// `Yes`/`No` when the section has shielding, empty otherwise.
    pub shielded_display: String,
    pub row_class: Classification,
    #[serde(default)]
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendItem {
    pub code: String,
    pub words: String,
}

impl LegendItem {
    pub fn line(&self) -> String {
        if self.words.is_empty() {
            self.code.clone()
        } else {
            format!("{} — {}", self.code, self.words)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// One appliance, denormalized for one page of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub number: usize,
    pub attributes: Vec<Attribute>,
    pub shielding: bool,
    pub rows: Vec<EntryRow>,
    pub notes: String,
    pub legend: Vec<LegendItem>,
}

impl Entry {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub header: ReportHeader,
    pub entries: Vec<Entry>,
}

impl Report {
    pub fn from_form(form: &SurveyForm) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            header: form.header.clone(),
            entries: build_entries(form),
        }
    }

    /// Notes of every entry that has any, in entry order.
    pub fn all_notes(&self) -> Vec<(usize, &str)> {
        self.entries
            .iter()
            .filter(|e| e.has_notes())
            .map(|e| (e.number, e.notes.trim()))
            .collect()
    }
}

/// Walk the sections in document order, one entry per section.
pub fn build_entries(form: &SurveyForm) -> Vec<Entry> {
    form.sections
        .iter()
        .enumerate()
        .map(|(i, section)| build_entry(i + 1, section))
        .collect()
}

pub fn build_entry(number: usize, section: &ApplianceSection) -> Entry {
    let attrs = &section.attributes;
    let chimney_code = chimney_code(&attrs.chimney_major, &attrs.chimney_minor);

    let legend = if chimney_code.is_empty() {
        vec![]
    } else {
        vec![LegendItem {
            code: chimney_code.clone(),
            words: chimney_words(&attrs.chimney_major, &attrs.chimney_minor),
        }]
    };

    let shielding = if section.shielding { "Yes" } else { "No" };
    let text = |field| attrs.get(field).value().to_string();
    let attributes = [
        ("Type", type_display(&attrs.appliance_type)),
        ("Make", text(AttributeField::Make)),
        ("Model", text(AttributeField::Model)),
        ("Installed By", text(AttributeField::InstalledBy)),
        ("Chimney Code", chimney_code),
        ("Own/Shared", text(AttributeField::OwnShared)),
        ("Chimney Condition", display(attrs.get(AttributeField::ChimneyCondition))),
        ("Shielding", shielding.to_string()),
        ("Label", text(AttributeField::Label)),
    ]
    .into_iter()
    .map(|(key, value)| Attribute { key: key.to_string(), value })
    .collect();

    let rows = section
        .rows
        .iter()
        .filter(|r| r.visible)
        .map(|r| entry_row(r, section.shielding))
        .collect();

    Entry {
        number,
        attributes,
        shielding: section.shielding,
        rows,
        notes: section.notes.trim().to_string(),
        legend: dedupe_legend(legend),
    }
}

fn entry_row(row: &ClearanceRow, shielding: bool) -> EntryRow {
    if row.is_header_row {
        return EntryRow {
            label: row.label.trim().to_string(),
            required: String::new(),
            actual: String::new(),
            shielded_display: String::new(),
            row_class: Classification::Unclassified,
            is_header: true,
        };
    }

    let shielded = shielding && row.shielded;
    let shielded_display = match (shielding, shielded) {
        (false, _) => "",
        (true, true) => "Yes",
        (true, false) => "No",
    };

    EntryRow {
        label: row.label.trim().to_string(),
        required: row.required_value.trim().to_string(),
        actual: row.actual_value.trim().to_string(),
        shielded_display: shielded_display.to_string(),
        row_class: evaluate_row(&row.required_value, &row.actual_value, shielded, false),
        is_header: false,
    }
}

/// Prefer a select's visible text; fall back to the raw value.
fn display(field: &FieldValue) -> String {
    match field.option_text() {
        "" => field.value().to_string(),
        text => text.to_string(),
    }
}

fn type_display(field: &FieldValue) -> String {
    if !field.option_text().is_empty() {
        return field.option_text().to_string();
    }
    match ApplianceType::from_identifier(field.value()) {
        ApplianceType::Unknown => field.value().to_string(),
        known => known.display_name().to_string(),
    }
}

/// `major.minor`, or `major` alone. No major means no code.
pub fn chimney_code(major: &FieldValue, minor: &FieldValue) -> String {
    if major.is_empty() {
        String::new()
    } else if minor.is_empty() {
        major.value().to_string()
    } else {
        format!("{}.{}", major.value(), minor.value())
    }
}

/// Human wording from the selected option texts, e.g. `"3 - Masonry"` and
/// `"2 - Lined"` give `"Masonry / Lined"`.
pub fn chimney_words(major: &FieldValue, minor: &FieldValue) -> String {
    [major.option_text(), minor.option_text()]
        .into_iter()
        .map(strip_code_prefix)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

fn strip_code_prefix(text: &str) -> &str {
    let rest = text.trim_start();
    let without_digits = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() == rest.len() {
        return rest.trim();
    }
    without_digits
        .trim_start()
        .trim_start_matches(['-', '—'])
        .trim()
}

/// Keep the first occurrence of each code, taking wording from a later
/// duplicate when the first had none.
pub fn dedupe_legend(items: Vec<LegendItem>) -> Vec<LegendItem> {
    let mut out: Vec<LegendItem> = Vec::new();
    for item in items.into_iter().filter(|i| !i.code.is_empty()) {
        match out.iter_mut().find(|o| o.code == item.code) {
            Some(existing) if existing.words.is_empty() => existing.words = item.words,
            Some(_) => {}
            None => out.push(item),
        }
    }
    out
}
