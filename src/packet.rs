//! Domain inputs handed to the oven by the surrounding application.
//!
//! Everything here is owned by the caller and passed in by value or
//! reference; the oven never mutates a packet or a project.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::phase::{GenerationPhase, classify};

/// A discrete unit of requested work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkPacket {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Declared type (e.g. "feature", "bugfix"). Informational only;
    /// phase assignment comes from the title and description.
    #[serde(default, rename = "type")]
    pub packet_type: String,
    #[serde(default)]
    pub priority: String,
    /// Tasks / acceptance criteria.
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl WorkPacket {
    pub fn new(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            packet_type: "feature".to_string(),
            priority: "medium".to_string(),
            tasks: Vec::new(),
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<String>) -> Self {
        self.tasks = tasks;
        self
    }

    /// The generation phase this packet belongs to.
    pub fn phase(&self) -> GenerationPhase {
        classify(&self.title, &self.description)
    }
}

/// Project metadata. Only the name, description and feature list matter to
/// the oven (template selection, branch naming, scaffold request).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Project {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: crate::util::slugify(name, 40),
            name: name.to_string(),
            description: description.to_string(),
            features: Vec::new(),
        }
    }
}

/// Opaque handle for the target repository. Passed through to collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoHandle {
    pub owner: String,
    pub name: String,
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

impl RepoHandle {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            default_branch: default_branch(),
        }
    }

    /// `owner/name` slug.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Kind of change a [`FileChange`] represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    #[default]
    Create,
    Modify,
    Delete,
}

/// A path plus its full replacement content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub operation: FileOperation,
}

impl FileChange {
    pub fn create(path: &str, content: &str) -> Self {
        Self {
            path: path.to_string(),
            content: content.to_string(),
            operation: FileOperation::Create,
        }
    }

    pub fn modify(path: &str, content: &str) -> Self {
        Self {
            path: path.to_string(),
            content: content.to_string(),
            operation: FileOperation::Modify,
        }
    }

    pub fn delete(path: &str) -> Self {
        Self {
            path: path.to_string(),
            content: String::new(),
            operation: FileOperation::Delete,
        }
    }

    /// Lowercased extension of the path, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// Load a JSON array of packets from disk.
pub fn load_packets(path: &Path) -> Result<Vec<WorkPacket>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read packets file: {}", path.display()))?;
    let packets: Vec<WorkPacket> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse packets file: {}", path.display()))?;
    Ok(packets)
}
