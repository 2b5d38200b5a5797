//! Survey form model and edit dispatch
//!
//! The form is an ordered arena of sections. All user input flows through
//! [`SurveyForm::apply_edit`], which recomputes only the state the edit touches.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clearance::{ClearanceRow, RowId};
use crate::flue::{set_row_shielded, FluePipeCategory};
use crate::rules::ApplianceType;
use crate::section::{ApplianceSection, AttributeField, FieldValue, SectionId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Section not found: {0}")]
    SectionNotFound(u32),

    #[error("Row {row} not found in section {section}")]
    RowNotFound { section: u32, row: u32 },

    #[error("Cannot remove the only appliance section")]
    LastSection,

    #[error("Section {0} has shielding turned off")]
    ShieldingDisabled(u32),

    #[error("Row {row} in section {section} is hidden by the appliance type")]
    RowHidden { section: u32, row: u32 },

    #[error("Row {row} in section {section} is a header and takes no input")]
    HeaderRow { section: u32, row: u32 },
}

/// Metadata shared by every page of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    #[serde(default)]
    pub policy: String,
    #[serde(default = "today")]
    pub survey_date: NaiveDate,
    #[serde(default)]
    pub completed_by: String,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Default for ReportHeader {
    fn default() -> Self {
        Self {
            policy: String::new(),
            survey_date: today(),
            completed_by: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderField {
    Policy,
    CompletedBy,
}

/// One user edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edit", rename_all = "snake_case")]
pub enum Edit {
    SetRequired { section: SectionId, row: RowId, value: String },
    SetActual { section: SectionId, row: RowId, value: String },
    SetShielded { section: SectionId, row: RowId, shielded: bool },
    SetApplianceType { section: SectionId, value: FieldValue },
    SetShielding { section: SectionId, shielding: bool },
    SetPipeCategory { section: SectionId, category: Option<FluePipeCategory> },
    SetAttribute { section: SectionId, field: AttributeField, value: FieldValue },
    SetNotes { section: SectionId, notes: String },
    SetHeader { field: HeaderField, value: String },
    SetSurveyDate { date: NaiveDate },
    AddSection,
    RemoveSection { section: SectionId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyForm {
    #[serde(default)]
    pub header: ReportHeader,
    pub sections: Vec<ApplianceSection>,
    #[serde(default = "first_free_id")]
    next_section_id: u32,
}

fn first_free_id() -> u32 { 0 }

impl SurveyForm {
    pub fn new() -> Self {
        Self {
            header: ReportHeader::default(),
            sections: vec![ApplianceSection::new(SectionId(1))],
            next_section_id: 2,
        }
    }

    pub fn section(&self, id: SectionId) -> Result<&ApplianceSection, FormError> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .ok_or(FormError::SectionNotFound(id.0))
    }

    pub fn section_mut(&mut self, id: SectionId) -> Result<&mut ApplianceSection, FormError> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(FormError::SectionNotFound(id.0))
    }

    /// 1-based display number of a section.
    pub fn display_number(&self, id: SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id).map(|i| i + 1)
    }

    pub fn add_section(&mut self) -> SectionId {
        // Forms read from older drafts may lack the counter.
        let highest = self.sections.iter().map(|s| s.id.0).max().unwrap_or(0);
        let id = SectionId(self.next_section_id.max(highest + 1));
        self.next_section_id = id.0 + 1;
        self.sections.push(ApplianceSection::new(id));
        id
    }

    pub fn remove_section(&mut self, id: SectionId) -> Result<(), FormError> {
        let index = self
            .sections
            .iter()
            .position(|s| s.id == id)
            .ok_or(FormError::SectionNotFound(id.0))?;
        if self.sections.len() == 1 {
            return Err(FormError::LastSection);
        }
        self.sections.remove(index);
        Ok(())
    }

    /// Back to a single blank section dated today. Completed-by is kept.
    pub fn reset(&mut self) {
        let completed_by = std::mem::take(&mut self.header.completed_by);
        *self = Self::new();
        self.header.completed_by = completed_by;
    }

    /// Pure form of [`apply_edit_mut`](Self::apply_edit_mut): returns the new model.
    pub fn apply_edit(&self, edit: &Edit) -> Result<SurveyForm, FormError> {
        let mut next = self.clone();
        next.apply_edit_mut(edit)?;
        Ok(next)
    }

    pub fn apply_edit_mut(&mut self, edit: &Edit) -> Result<(), FormError> {
        match edit {
            Edit::SetRequired { section, row, value } => {
                let row = input_row(self.section_mut(*section)?, *row)?;
                row.required_value = value.clone();
                row.reevaluate();
            }
            Edit::SetActual { section, row, value } => {
                let row = input_row(self.section_mut(*section)?, *row)?;
                row.actual_value = value.clone();
                row.reevaluate();
            }
            Edit::SetShielded { section, row, shielded } => {
                let s = self.section_mut(*section)?;
                if !s.shielding {
                    return Err(FormError::ShieldingDisabled(section.0));
                }
                set_row_shielded(input_row(s, *row)?, *shielded);
            }
            Edit::SetApplianceType { section, value } => {
                let s = self.section_mut(*section)?;
                let appliance_type = ApplianceType::from_identifier(value.value());
                s.attributes.appliance_type = value.clone();
                s.apply_type(appliance_type);
            }
            Edit::SetShielding { section, shielding } => {
                self.section_mut(*section)?.set_shielding(*shielding);
            }
            Edit::SetPipeCategory { section, category } => {
                self.section_mut(*section)?.set_pipe_category(*category);
            }
            Edit::SetAttribute { section, field, value } => {
                let s = self.section_mut(*section)?;
                if *field == AttributeField::Type {
                    let appliance_type = ApplianceType::from_identifier(value.value());
                    s.attributes.set(*field, value.clone());
                    s.apply_type(appliance_type);
                } else {
                    s.attributes.set(*field, value.clone());
                }
            }
            Edit::SetNotes { section, notes } => {
                self.section_mut(*section)?.notes = notes.clone();
            }
            Edit::SetHeader { field, value } => match field {
                HeaderField::Policy => self.header.policy = value.clone(),
                HeaderField::CompletedBy => self.header.completed_by = value.clone(),
            },
            Edit::SetSurveyDate { date } => {
                self.header.survey_date = *date;
            }
            Edit::AddSection => {
                self.add_section();
            }
            Edit::RemoveSection { section } => {
                self.remove_section(*section)?;
            }
        }
        Ok(())
    }
}

impl Default for SurveyForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Row that accepts user input: visible and not a header.
fn input_row(section: &mut ApplianceSection, row: RowId) -> Result<&mut ClearanceRow, FormError> {
    let section_id = section.id.0;
    let target = section.row_mut(row).ok_or(FormError::RowNotFound {
        section: section_id,
        row: row.0,
    })?;
    if target.is_header_row {
        return Err(FormError::HeaderRow { section: section_id, row: row.0 });
    }
    if !target.visible {
        return Err(FormError::RowHidden { section: section_id, row: row.0 });
    }
    Ok(target)
}
