//! Host configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::schema::SchemaHelp;
use crate::hir::GlobalProperties;

/// When open documents are re-evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvaluationPolicy {
    /// Every text change is evaluated.
    #[default]
    OnEveryChange,
    /// Text changes only re-parse; evaluation waits for a save.
    OnSave,
}

/// Settings shared by every document of a host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub evaluation: EvaluationPolicy,
    /// Properties passed to every evaluation; they win over in-file
    /// declarations.
    pub global_properties: GlobalProperties,
    /// JSON file replacing the built-in schema help table.
    pub schema_help: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        Self::from_json(&read(path)?)
    }

    /// The configured schema help table, or the built-in one.
    pub fn load_schema_help(&self) -> Result<SchemaHelp, SettingsError> {
        match &self.schema_help {
            Some(path) => SchemaHelp::load(path),
            None => Ok(SchemaHelp::builtin()),
        }
    }
}

pub(super) fn read(path: &Path) -> Result<String, SettingsError> {
    fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_owned(),
        source,
    })
}
