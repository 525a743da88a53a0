use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod ask;

pub use ask::{AskHit, AskRequest, AskResponse};

pub const GRAPH_UPDATE_SCHEMA_VERSION: u32 = 1;

/// A single observation handed over by the filesystem watcher.
///
/// `Added`/`Changed` carry the file content read at observation time; `Deleted`
/// only the path. Paths are absolute.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FsEvent {
    Added { path: PathBuf, content: String },
    Changed { path: PathBuf, content: String },
    Deleted { path: PathBuf },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FsEventKind {
    Added,
    Changed,
    Deleted,
}

impl FsEvent {
    pub fn added(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::Added {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn changed(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::Changed {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::Deleted { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Added { path, .. } | Self::Changed { path, .. } | Self::Deleted { path } => path,
        }
    }

    #[must_use]
    pub fn kind(&self) -> FsEventKind {
        match self {
            Self::Added { .. } => FsEventKind::Added,
            Self::Changed { .. } => FsEventKind::Changed,
            Self::Deleted { .. } => FsEventKind::Deleted,
        }
    }

    /// File content for additions and changes.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Added { content, .. } | Self::Changed { content, .. } => Some(content),
            Self::Deleted { .. } => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
