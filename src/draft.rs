//! Draft persistence
//!
//! Named snapshots of the whole form kept in one JSON file. The file records
//! the engine version that wrote it; drafts from another major version are
//! refused rather than half-loaded.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::form::SurveyForm;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Draft storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Draft file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Drafts written by engine {found} cannot be read by engine {current}")]
    Incompatible { found: String, current: String },

    #[error("Draft not found: {0}")]
    NotFound(String),

    #[error("Invalid engine version: {0}")]
    Version(#[from] semver::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub state: SurveyForm,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftFile {
    engine_version: Version,
    #[serde(default)]
    drafts: Vec<Draft>,
}

pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All drafts, oldest first. A missing file is an empty store.
    pub fn list(&self) -> Result<Vec<Draft>, DraftError> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let content = fs::read_to_string(&self.path)?;
        let file: DraftFile = serde_json::from_str(&content)?;

        let current = Version::parse(ENGINE_VERSION)?;
        if file.engine_version.major != current.major {
            return Err(DraftError::Incompatible {
                found: file.engine_version.to_string(),
                current: current.to_string(),
            });
        }
        Ok(file.drafts)
    }

    /// Save `form` as a new draft. Without a name one is made from the policy
    /// number and the current time.
    pub fn save(&self, form: &SurveyForm, name: Option<&str>) -> Result<Draft, DraftError> {
        let mut drafts = self.list()?;
        let draft = Draft {
            id: Uuid::new_v4().to_string(),
            name: match name.map(str::trim) {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => default_draft_name(&form.header.policy, Local::now()),
            },
            timestamp: Utc::now(),
            state: form.clone(),
        };
        drafts.push(draft.clone());
        self.write(drafts)?;
        tracing::info!(draft = %draft.id, name = %draft.name, "draft saved");
        Ok(draft)
    }

    pub fn latest(&self) -> Result<Option<Draft>, DraftError> {
        Ok(self.list()?.pop())
    }

    pub fn load(&self, id: &str) -> Result<Draft, DraftError> {
        self.list()?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| DraftError::NotFound(id.to_string()))
    }

    pub fn delete(&self, id: &str) -> Result<Draft, DraftError> {
        let mut drafts = self.list()?;
        let index = drafts
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| DraftError::NotFound(id.to_string()))?;
        let removed = drafts.remove(index);
        self.write(drafts)?;
        tracing::info!(draft = %removed.id, "draft deleted");
        Ok(removed)
    }

    fn write(&self, drafts: Vec<Draft>) -> Result<(), DraftError> {
        let file = DraftFile {
            engine_version: Version::parse(ENGINE_VERSION)?,
            drafts,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&file)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

pub fn default_draft_name(policy: &str, at: DateTime<Local>) -> String {
    let stamp = at.format("%Y-%m-%d %H:%M");
    match policy.trim() {
        "" => format!("Draft - {}", stamp),
        p => format!("{} - {}", p, stamp),
    }
}
