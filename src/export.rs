//! Export Pipeline - single entry point from form to saved artifact
//!
//! snapshot → assemble → render → hash → save. The pipeline only reads the
//! form; a failure at any stage leaves form state exactly as it was.

use std::fs;
use std::path::PathBuf;

use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{Assembler, DocumentError};
use crate::form::SurveyForm;
use crate::hashing::{compute_content_hash, sha256_hex};
use crate::render::{RenderError, RenderSink};
use crate::snapshot::Report;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Save failed for {file_name}: {source}")]
    Save {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A rendered report plus its manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedArtifact {
    pub id: String,
    pub file_name: String,
    pub format: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub page_count: usize,
    pub entry_count: usize,
    pub notes_fallback: bool,
    /// Hash of the report content, stable across re-exports of the same form.
    pub content_hash: String,
    /// Hash of the artifact bytes.
    pub hash: String,
    pub data_base64: String,
}

impl ExportedArtifact {
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.data_base64)
    }
}

/// Save/share collaborator: persists artifact bytes under a suggested name.
pub trait SaveTarget {
    fn save(&self, bytes: &[u8], file_name: &str) -> Result<PathBuf, std::io::Error>;
}

/// Writes artifacts into a directory. The file appears complete or not at all.
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveTarget for DirectorySaver {
    fn save(&self, bytes: &[u8], file_name: &str) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(file_name);
        let partial = self.dir.join(format!(".{}.partial", file_name));
        if let Err(e) = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, &target)) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        Ok(target)
    }
}

pub struct ExportPipeline {
    assembler: Assembler,
    sink: Box<dyn RenderSink>,
    file_suffix: String,
}

impl ExportPipeline {
    pub fn new(assembler: Assembler, sink: Box<dyn RenderSink>, file_suffix: impl Into<String>) -> Self {
        Self {
            assembler,
            sink,
            file_suffix: file_suffix.into(),
        }
    }

    /// Build the artifact for the current form without saving it.
    pub fn export(&self, form: &SurveyForm) -> Result<ExportedArtifact, ExportError> {
        let report = Report::from_form(form);
        self.export_report(&report)
    }

    pub fn export_report(&self, report: &Report) -> Result<ExportedArtifact, ExportError> {
        self.render_artifact(report).map(|(artifact, _)| artifact)
    }

    /// The artifact together with the raw rendered bytes.
    fn render_artifact(&self, report: &Report) -> Result<(ExportedArtifact, Vec<u8>), ExportError> {
        let document = self.assembler.assemble(report)?;
        let data = self.sink.render(&document)?;

        let format = self.sink.format();
        let file_name = suggested_file_name(
            &report.header.policy,
            report.header.survey_date,
            &self.file_suffix,
            format.extension(),
        );
        let content_hash =
            compute_content_hash(&(&report.header, &report.entries), ENGINE_VERSION)?;

        tracing::info!(
            report = %report.id,
            pages = document.page_count(),
            file = %file_name,
            "report rendered"
        );

        let artifact = ExportedArtifact {
            id: report.id.clone(),
            file_name,
            format: format.extension().to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: report.created_at,
            page_count: document.page_count(),
            entry_count: report.entries.len(),
            notes_fallback: document.notes_fallback,
            content_hash,
            hash: sha256_hex(&data),
            data_base64: base64::engine::general_purpose::STANDARD.encode(&data),
        };
        Ok((artifact, data))
    }

    /// Export and hand the bytes to `target`.
    pub fn export_and_save(
        &self,
        form: &SurveyForm,
        target: &dyn SaveTarget,
    ) -> Result<(ExportedArtifact, PathBuf), ExportError> {
        let (artifact, bytes) = self.render_artifact(&Report::from_form(form))?;
        let path = target.save(&bytes, &artifact.file_name).map_err(|source| {
            tracing::error!(file = %artifact.file_name, error = %source, "saving report failed");
            ExportError::Save {
                file_name: artifact.file_name.clone(),
                source,
            }
        })?;
        tracing::info!(path = %path.display(), "report saved");
        Ok((artifact, path))
    }
}

/// `"{policy} - {date} - {suffix}.{ext}"` with path-hostile characters removed.
pub fn suggested_file_name(policy: &str, date: NaiveDate, suffix: &str, extension: &str) -> String {
    let policy = match sanitize_file_name(policy) {
        p if p.is_empty() => "policy".to_string(),
        p => p,
    };
    format!(
        "{} - {} - {}.{}",
        policy,
        date.format("%Y-%m-%d"),
        sanitize_file_name(suffix),
        extension
    )
}

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .trim()
        .to_string()
}
