//! Persisted bake reports.
//!
//! A [`BakeReport`] is a compact, serialisable summary of a finished bake.
//! [`ReportStore`] keeps one JSON file per bake under `.oven/bakes/`,
//! named by bake id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::OvenError;
use crate::oven::{BakeResult, OvenState, QualityTier};
use crate::packet::{Project, RepoHandle};
use crate::phase::GenerationPhase;

/// Per-packet line of a [`BakeReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketSummary {
    pub packet_id: String,
    pub title: String,
    pub phase: GenerationPhase,
    pub generated: bool,
    pub files: usize,
    pub iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    /// `None` when the packet was not validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    pub error_count: usize,
    pub warning_count: usize,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeReport {
    pub bake_id: Uuid,
    pub project: String,
    pub repo: String,
    pub success: bool,
    pub quality_tier: QualityTier,
    pub final_state: OvenState,
    pub packets: Vec<PacketSummary>,
    pub files: usize,
    pub total_iterations: u32,
    pub duration_ms: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_request_url: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BakeReport {
    pub fn from_result(project: &Project, repo: &RepoHandle, result: &BakeResult) -> Self {
        let packets = result
            .packet_results
            .iter()
            .map(|r| PacketSummary {
                packet_id: r.packet_id.clone(),
                title: r.title.clone(),
                phase: r.phase,
                generated: r.generation.success,
                files: r.generation.all_files.len(),
                iterations: r.generation.total_iterations,
                min_confidence: r.generation.min_confidence(),
                valid: r.validation.as_ref().map(|v| v.valid),
                error_count: r.validation.as_ref().map_or(0, |v| v.error_count()),
                warning_count: r.validation.as_ref().map_or(0, |v| v.warning_count()),
                applied: r.applied,
            })
            .collect();

        let apply = result.apply_result.as_ref();

        Self {
            bake_id: result.bake_id,
            project: project.name.clone(),
            repo: repo.full_name(),
            success: result.success,
            quality_tier: result.quality_tier,
            final_state: result.final_state,
            packets,
            files: result.files.len(),
            total_iterations: result.total_iterations,
            duration_ms: result.duration.as_millis() as u64,
            errors: result.errors.clone(),
            branch: apply.and_then(|a| a.branch.clone()),
            merge_request_url: apply.and_then(|a| a.merge_request_url.clone()),
            started_at: result.started_at,
            finished_at: result.finished_at,
        }
    }

    /// First eight characters of the bake id.
    pub fn short_id(&self) -> String {
        self.bake_id.to_string()[..8].to_string()
    }

    /// One-line listing: `id  started  tier  project  (n packets)`.
    pub fn summary_line(&self) -> String {
        format!(
            "{}  {}  {:<12}  {} ({} packets)",
            self.short_id(),
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.quality_tier.to_string(),
            self.project,
            self.packets.len()
        )
    }
}

/// Directory of bake reports, one `<bake_id>.json` per bake.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write a report, creating the directory if needed.
    pub fn save(&self, report: &BakeReport) -> Result<PathBuf, OvenError> {
        let path = self.path_for(&report.bake_id.to_string());
        fs::create_dir_all(&self.dir).map_err(|source| OvenError::ReportWriteFailed {
            path: self.dir.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(report).map_err(|e| {
            OvenError::Other(anyhow::Error::new(e).context("Failed to serialize bake report"))
        })?;
        fs::write(&path, json).map_err(|source| OvenError::ReportWriteFailed {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// All reports, newest first.
    pub fn list(&self) -> Result<Vec<BakeReport>, OvenError> {
        let mut reports = self
            .report_files()?
            .iter()
            .map(|path| self.read(path))
            .collect::<Result<Vec<_>, _>>()?;
        reports.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(reports)
    }

    /// Load a report by full id or unique id prefix.
    ///
    /// Ids are hex digits and `-` only, so lookups never leave the store
    /// directory.
    pub fn load(&self, id: &str) -> Result<BakeReport, OvenError> {
        if !is_bake_id(id) {
            return Err(OvenError::InvalidReportId { id: id.to_string() });
        }
        let exact = self.path_for(id);
        if exact.exists() {
            return self.read(&exact);
        }

        let matches: Vec<PathBuf> = self
            .report_files()?
            .into_iter()
            .filter(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| !id.is_empty() && stem.starts_with(id))
            })
            .collect();

        match matches.as_slice() {
            [only] => self.read(only),
            [] => Err(OvenError::ReportNotFound { id: id.to_string() }),
            _ => Err(OvenError::Other(anyhow::anyhow!(
                "Bake id prefix '{}' is ambiguous ({} matches)",
                id,
                matches.len()
            ))),
        }
    }

    fn report_files(&self) -> Result<Vec<PathBuf>, OvenError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|source| OvenError::ReportReadFailed {
            path: self.dir.clone(),
            source,
        })?;
        Ok(entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .collect())
    }

    fn read(&self, path: &Path) -> Result<BakeReport, OvenError> {
        let content = fs::read_to_string(path).map_err(|source| OvenError::ReportReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| {
            OvenError::Other(
                anyhow::Error::new(e)
                    .context(format!("Failed to parse bake report: {}", path.display())),
            )
        })
    }
}

fn is_bake_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{ApplyResult, GenerationResult, PhaseReport};
    use crate::oven::PacketResult;
    use crate::packet::FileChange;
    use crate::validator::ValidationResult;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::tempdir;

    fn result_at(hour: u32) -> BakeResult {
        let started_at = Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap();
        BakeResult {
            bake_id: Uuid::new_v4(),
            success: true,
            quality_tier: QualityTier::GoldenBrown,
            final_state: OvenState::Complete,
            scaffold_result: None,
            packet_results: vec![PacketResult {
                packet_id: "cart".to_string(),
                title: "Shopping cart".to_string(),
                phase: GenerationPhase::Features,
                generation: GenerationResult {
                    success: true,
                    all_files: vec![FileChange::create("src/cart.ts", "export const a = 1;")],
                    total_iterations: 3,
                    phases: vec![PhaseReport {
                        phase: GenerationPhase::Features,
                        confidence: 0.88,
                        iterations: 3,
                    }],
                    ..Default::default()
                },
                validation: Some(ValidationResult::default()),
                applied: true,
            }],
            files: vec![FileChange::create("src/cart.ts", "export const a = 1;")],
            apply_result: Some(ApplyResult {
                success: true,
                branch: Some("oven/shop-20240501".to_string()),
                merge_request_url: Some("https://git.example.com/acme/shop/pull/7".to_string()),
                ..Default::default()
            }),
            total_iterations: 3,
            duration: Duration::from_millis(1500),
            errors: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    fn report_at(hour: u32) -> BakeReport {
        BakeReport::from_result(
            &Project::new("Shop", ""),
            &RepoHandle::new("acme", "shop"),
            &result_at(hour),
        )
    }

    #[test]
    fn test_report_from_result() {
        let report = report_at(9);
        assert_eq!(report.project, "Shop");
        assert_eq!(report.repo, "acme/shop");
        assert_eq!(report.quality_tier, QualityTier::GoldenBrown);
        assert_eq!(report.duration_ms, 1500);
        assert_eq!(report.branch.as_deref(), Some("oven/shop-20240501"));

        let packet = &report.packets[0];
        assert_eq!(packet.files, 1);
        assert_eq!(packet.valid, Some(true));
        assert_eq!(packet.min_confidence, Some(0.88));
        assert!(packet.applied);
    }

    #[test]
    fn test_summary_line() {
        let report = report_at(9);
        let line = report.summary_line();
        assert!(line.starts_with(&report.short_id()));
        assert!(line.contains("2024-05-01 09:00:00"));
        assert!(line.contains("golden-brown"));
        assert!(line.contains("Shop (1 packets)"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(&dir.path().join("bakes"));
        let report = report_at(9);

        let path = store.save(&report).unwrap();
        assert!(path.ends_with(format!("{}.json", report.bake_id)));
        assert_eq!(store.load(&report.bake_id.to_string()).unwrap(), report);
    }

    #[test]
    fn test_load_by_prefix() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let report = report_at(9);
        store.save(&report).unwrap();

        let loaded = store.load(&report.short_id()).unwrap();
        assert_eq!(loaded.bake_id, report.bake_id);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let err = store.load("deadbeef").unwrap_err();
        assert!(matches!(err, OvenError::ReportNotFound { .. }));
    }

    #[test]
    fn test_list_newest_first() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let early = report_at(8);
        let late = report_at(17);
        store.save(&early).unwrap();
        store.save(&late).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].bake_id, late.bake_id);
        assert_eq!(listed[1].bake_id, early.bake_id);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(&dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_report_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("beef.json"), "{not json").unwrap();
        let store = ReportStore::new(dir.path());
        assert!(store.load("beef").is_err());
        assert!(store.list().is_err());
    }

    #[test]
    fn test_load_rejects_ids_outside_store() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(&dir.path().join("bakes"));
        let report = report_at(9);
        fs::write(
            dir.path().join("secret.json"),
            serde_json::to_string(&report).unwrap(),
        )
        .unwrap();

        for id in ["../secret", "bakes/../../secret", "/etc/passwd", "", "abc.json"] {
            let err = store.load(id).unwrap_err();
            assert!(
                matches!(err, OvenError::InvalidReportId { .. }),
                "{} was not rejected",
                id
            );
        }
    }
}
