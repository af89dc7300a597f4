//! Contracts for the external collaborators the oven drives.
//!
//! The oven never knows how code gets generated, scaffolded or pushed. It
//! talks to three trait objects:
//!
//! - [`GenerationEngine`]: turns one packet into files, streaming progress
//! - [`ScaffoldBuilder`]: detects or creates the base project structure
//! - [`CodeApplier`]: pushes files to the repository, directly or as a
//!   merge request
//!
//! Implementations live outside this crate. Tests use hand-written fakes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::packet::{FileChange, RepoHandle, WorkPacket};
use crate::phase::GenerationPhase;

// ---------------------------------------------------------------------------
// Generation engine
// ---------------------------------------------------------------------------

/// Limits passed to the engine to bound its iteration loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guardrails {
    pub max_total_iterations: u32,
    pub min_confidence_to_advance: f64,
    pub require_critique_pass: bool,
}

/// One packet's worth of work for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub packet: WorkPacket,
    pub repo: RepoHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_model: Option<String>,
    /// Phases the engine may run. The oven always sends exactly one.
    pub only_phases: Vec<GenerationPhase>,
    pub guardrails: Guardrails,
}

/// Incremental progress reported by the engine while it works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineProgress {
    pub phase: GenerationPhase,
    pub iteration: u32,
    pub total_iterations: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_generated: Option<usize>,
}

/// Per-phase outcome inside a [`GenerationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: GenerationPhase,
    pub confidence: f64,
    #[serde(default)]
    pub iterations: u32,
}

/// Final outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default)]
    pub all_files: Vec<FileChange>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub total_iterations: u32,
    #[serde(default)]
    pub phases: Vec<PhaseReport>,
}

impl GenerationResult {
    /// A failed result carrying a single error, used when the engine call
    /// itself returns `Err`.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            ..Default::default()
        }
    }

    /// Whether every phase reached `threshold`.
    pub fn all_phases_confident(&self, threshold: f64) -> bool {
        self.phases.iter().all(|p| p.confidence >= threshold)
    }

    /// Lowest confidence across phases, if any phase reported one.
    pub fn min_confidence(&self) -> Option<f64> {
        self.phases.iter().map(|p| p.confidence).reduce(f64::min)
    }
}

/// The multi-iteration generation engine, consumed as a black box.
///
/// `generate` sends progress on `progress` as it goes and resolves to the
/// final result. Dropping the sender (by returning) ends the progress
/// stream.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    async fn generate(
        &self,
        request: GenerationRequest,
        progress: mpsc::Sender<EngineProgress>,
    ) -> Result<GenerationResult>;
}

// ---------------------------------------------------------------------------
// Scaffold builder
// ---------------------------------------------------------------------------

/// Base project templates the oven knows how to ask for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaffoldTemplate {
    MobileApp,
    CliTool,
    ApiServer,
    #[default]
    WebApp,
}

impl ScaffoldTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MobileApp => "mobile-app",
            Self::CliTool => "cli-tool",
            Self::ApiServer => "api-server",
            Self::WebApp => "web-app",
        }
    }
}

impl fmt::Display for ScaffoldTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldRequest {
    pub template: ScaffoldTemplate,
    pub project_name: String,
    pub features: Vec<String>,
    pub include_tests: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScaffoldResult {
    pub success: bool,
    #[serde(default)]
    pub files: Vec<FileChange>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[async_trait]
pub trait ScaffoldBuilder: Send + Sync {
    /// Name of the template the repository already follows, if any.
    async fn detect_template(&self, repo: &RepoHandle) -> Result<Option<String>>;

    async fn build(&self, request: ScaffoldRequest) -> Result<ScaffoldResult>;
}

// ---------------------------------------------------------------------------
// Code applier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOptions {
    pub branch: String,
    pub create_branch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequestInfo {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_request_url: Option<String>,
}

impl ApplyResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait CodeApplier: Send + Sync {
    /// Commit `files` straight onto a branch.
    async fn push(
        &self,
        repo: &RepoHandle,
        files: &[FileChange],
        commit_message: &str,
        options: PushOptions,
    ) -> Result<ApplyResult>;

    /// Commit `files` on `branch` and open a merge/pull request for it.
    async fn open_merge_request(
        &self,
        repo: &RepoHandle,
        files: &[FileChange],
        commit_message: &str,
        branch: &str,
        info: MergeRequestInfo,
    ) -> Result<ApplyResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(confidence: f64) -> PhaseReport {
        PhaseReport {
            phase: GenerationPhase::Features,
            confidence,
            iterations: 1,
        }
    }

    #[test]
    fn test_failed_generation_result() {
        let result = GenerationResult::failed("engine crashed");
        assert!(!result.success);
        assert_eq!(result.errors, vec!["engine crashed".to_string()]);
        assert!(result.all_files.is_empty());
    }

    #[test]
    fn test_all_phases_confident() {
        let result = GenerationResult {
            success: true,
            phases: vec![report(0.9), report(0.75)],
            ..Default::default()
        };
        assert!(result.all_phases_confident(0.75));
        assert!(!result.all_phases_confident(0.8));
        assert_eq!(result.min_confidence(), Some(0.75));
    }

    #[test]
    fn test_no_phases_is_vacuously_confident() {
        let result = GenerationResult::default();
        assert!(result.all_phases_confident(0.95));
        assert_eq!(result.min_confidence(), None);
    }

    #[test]
    fn test_template_serializes_kebab_case() {
        let json = serde_json::to_string(&ScaffoldTemplate::ApiServer).unwrap();
        assert_eq!(json, "\"api-server\"");
        assert_eq!(ScaffoldTemplate::default().to_string(), "web-app");
    }

    #[test]
    fn test_generation_result_deserializes_sparse_json() {
        let json = r#"{"success": true, "phases": [{"phase": "shared", "confidence": 0.8}]}"#;
        let result: GenerationResult = serde_json::from_str(json).unwrap();
        assert!(result.success);
        assert_eq!(result.phases[0].phase, GenerationPhase::Shared);
        assert_eq!(result.phases[0].iterations, 0);
    }
}
