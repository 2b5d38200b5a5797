//! WoodSurvey Core - clearance evaluation and report engine
//!
//! # Guarantees
//! 1. A row's class always reflects its current required/actual/shielded values
//! 2. Appliance-type transitions converge: any path to a type gives the same rows
//! 3. Hidden rows carry no data and are never exported
//! 4. Row order is display order, in the form and in the report
//! 5. Notes text always reaches the exported document

pub mod numeric;
pub mod clearance;
pub mod flue;
pub mod rules;
pub mod section;
pub mod form;
pub mod snapshot;
pub mod document;
pub mod render;
pub mod hashing;
pub mod export;
pub mod draft;
pub mod manufacturers;
pub mod config;

pub use clearance::{evaluate_row, Classification, ClearanceRow, RowId, RowOrigin};
pub use flue::FluePipeCategory;
pub use rules::{ApplianceType, TypeRule};
pub use section::{ApplianceSection, AttributeField, FieldValue, SectionId};
pub use form::{Edit, FormError, ReportHeader, SurveyForm};
pub use snapshot::{Entry, EntryRow, Report};
pub use document::{Assembler, Document, DocumentError};
pub use render::{RenderFormat, RenderSink};
pub use export::{ExportError, ExportPipeline, ExportedArtifact, SaveTarget};
pub use config::SurveyConfig;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
