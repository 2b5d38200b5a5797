//! Configuration - `woodsurvey.toml`
//!
//! Every field has a default; a missing file yields the default configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{Assembler, LayoutConfig, ReportStyle};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(flatten)]
    pub style: ReportStyle,
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
}

fn default_file_suffix() -> String { "Wood app form".to_string() }

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            style: ReportStyle::default(),
            file_suffix: default_file_suffix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_drafts")]
    pub drafts: PathBuf,
    #[serde(default = "default_manufacturers")]
    pub manufacturers: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_drafts() -> PathBuf { PathBuf::from("woodapp_drafts.json") }
fn default_manufacturers() -> PathBuf { PathBuf::from("stovemanufacturers.json") }
fn default_output_dir() -> PathBuf { PathBuf::from(".") }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            drafts: default_drafts(),
            manufacturers: default_manufacturers(),
            output_dir: default_output_dir(),
        }
    }
}

impl SurveyConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn assembler(&self) -> Assembler {
        Assembler::new(self.layout.clone(), self.report.style.clone())
    }
}
