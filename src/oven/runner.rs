//! The bake orchestrator.
//!
//! One bake walks the state sequence
//! `preheating → scaffolding → mixing → (baking ⇄ testing)* → cooling →
//! complete | burnt`, calling the external collaborators along the way and
//! streaming a [`BakeUpdate`] at every step. Collaborator failures never
//! abort a bake. They are folded into the bake's error list and lower the
//! final quality tier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use regex::Regex;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{
    BakeResult, BakeUpdate, OvenState, PacketResult, compute_quality_tier, is_successful,
};
use crate::collaborators::{
    ApplyResult, CodeApplier, EngineProgress, GenerationEngine, GenerationRequest,
    GenerationResult, Guardrails, MergeRequestInfo, PushOptions, ScaffoldBuilder, ScaffoldRequest,
    ScaffoldResult, ScaffoldTemplate,
};
use crate::config::BakeConfig;
use crate::errors::OvenError;
use crate::packet::{FileChange, Project, RepoHandle, WorkPacket};
use crate::report::{BakeReport, ReportStore};
use crate::scheduler::{describe_histogram, execution_plan, phase_histogram, schedule};
use crate::util::slugify;
use crate::validator::Validator;

/// Capacity of the update channel created by [`Oven::start`].
pub const UPDATE_BUFFER: usize = 256;

/// Capacity of the per-packet engine progress channel.
const PROGRESS_BUFFER: usize = 64;

static MOBILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(mobile|ios|android|react native|expo|iphone|tablet)\b").unwrap()
});

static CLI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(cli|command[- ]line|terminal|shell tool|console app)\b").unwrap()
});

static API_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(api|apis|backend|back-end|server|rest|graphql|microservices?)\b").unwrap()
});

/// Everything one bake needs. The caller owns it; the oven never mutates it.
#[derive(Debug, Clone)]
pub struct BakeRequest {
    pub project: Project,
    pub packets: Vec<WorkPacket>,
    pub repo: RepoHandle,
    pub config: BakeConfig,
}

impl BakeRequest {
    pub fn new(project: Project, packets: Vec<WorkPacket>, repo: RepoHandle) -> Self {
        Self {
            project,
            packets,
            repo,
            config: BakeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BakeConfig) -> Self {
        self.config = config;
        self
    }
}

/// Anything that can run a full bake.
///
/// [`Oven`] is the real implementation; the retry loop only depends on this
/// trait so it can be driven by a scripted baker in tests.
#[async_trait]
pub trait Bake: Send + Sync {
    async fn bake(&self, request: BakeRequest, updates: mpsc::Sender<BakeUpdate>) -> BakeResult;
}

/// Drives one bake at a time across the external collaborators.
#[derive(Clone)]
pub struct Oven {
    engine: Arc<dyn GenerationEngine>,
    scaffold: Arc<dyn ScaffoldBuilder>,
    applier: Arc<dyn CodeApplier>,
    validator: Validator,
    reports: Option<ReportStore>,
}

/// Bake-wide accumulators. Owned by a single bake.
#[derive(Default)]
struct Batch {
    errors: Vec<String>,
    files: Vec<FileChange>,
    packet_results: Vec<PacketResult>,
    scaffold_result: Option<ScaffoldResult>,
    apply_result: Option<ApplyResult>,
    total_iterations: u32,
}

impl Oven {
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        scaffold: Arc<dyn ScaffoldBuilder>,
        applier: Arc<dyn CodeApplier>,
    ) -> Self {
        Self {
            engine,
            scaffold,
            applier,
            validator: Validator::new(),
            reports: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Persist a [`BakeReport`] for every finished bake.
    pub fn with_report_store(mut self, store: ReportStore) -> Self {
        self.reports = Some(store);
        self
    }

    /// Spawn a bake on the runtime and return a stream of its updates.
    ///
    /// Call [`BakeStream::finish`] for the final result. Dropping the
    /// stream early only discards updates; the bake still runs to
    /// completion.
    pub fn start(&self, request: BakeRequest) -> BakeStream {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let oven = self.clone();
        let handle = tokio::spawn(async move { oven.bake(request, tx).await });
        BakeStream { rx, handle }
    }

    /// Run one bake to completion, sending progress on `updates`.
    ///
    /// Updates are sent in causal order. A closed receiver is ignored.
    pub async fn bake(
        &self,
        request: BakeRequest,
        updates: mpsc::Sender<BakeUpdate>,
    ) -> BakeResult {
        let started_at = Utc::now();
        let timer = Instant::now();
        let bake_id = Uuid::new_v4();
        let BakeRequest {
            project,
            packets,
            repo,
            config,
        } = request;

        info!(%bake_id, project = %project.name, packets = packets.len(), "Starting bake");

        let mut batch = Batch::default();
        let mut state = OvenState::Idle;

        // Preheating
        transition(&mut state, OvenState::Preheating);
        let scheduled = schedule(&packets);
        let total = scheduled.len();
        let histogram = describe_histogram(&phase_histogram(&scheduled));
        send(
            &updates,
            BakeUpdate::new(
                state,
                format!("Preheating: {} packets scheduled ({})", total, histogram),
            )
            .with_total(total),
        )
        .await;

        // Scaffolding
        if config.auto_scaffold {
            transition(&mut state, OvenState::Scaffolding);
            self.scaffold_project(&project, &repo, total, &mut batch, &updates)
                .await;
        }

        // Mixing
        transition(&mut state, OvenState::Mixing);
        for entry in execution_plan(&scheduled) {
            send(
                &updates,
                BakeUpdate::new(state, entry.to_string())
                    .with_packet(entry.index + 1, total, &entry.title)
                    .with_phase(entry.phase),
            )
            .await;
        }
        send(
            &updates,
            BakeUpdate::new(state, format!("Mixed {} packets into phase order", total))
                .with_total(total),
        )
        .await;

        // Baking / testing
        for (idx, packet) in scheduled.iter().enumerate() {
            let index = idx + 1;
            transition(&mut state, OvenState::Baking);
            let result = self
                .bake_packet(packet, index, total, &repo, &config, &mut batch, &updates)
                .await;

            let validation = if config.require_validation && !result.all_files.is_empty() {
                transition(&mut state, OvenState::Testing);
                let validation = self.validator.validate(&result.all_files);
                let message = if validation.valid {
                    format!("Validation passed for '{}': {}", packet.title, validation.summary())
                } else {
                    format!("Validation failed for '{}': {}", packet.title, validation.summary())
                };
                debug!(packet = %packet.id, valid = validation.valid, "Validated packet");
                send(
                    &updates,
                    BakeUpdate::new(state, message)
                        .with_packet(index, total, &packet.title)
                        .with_phase(packet.phase())
                        .with_errors(
                            validation
                                .syntax_errors
                                .iter()
                                .map(|issue| issue.to_string())
                                .collect(),
                        ),
                )
                .await;
                Some(validation)
            } else {
                None
            };

            batch.packet_results.push(PacketResult {
                packet_id: packet.id.clone(),
                title: packet.title.clone(),
                phase: packet.phase(),
                generation: result,
                validation,
                applied: false,
            });
        }

        // Cooling
        if config.auto_apply && !batch.files.is_empty() {
            if config.dry_run {
                debug!(%bake_id, "Dry run, skipping apply");
            } else {
                transition(&mut state, OvenState::Cooling);
                self.apply(&project, &repo, &config, started_at, total, &mut batch, &updates)
                    .await;
            }
        }

        // Final tier
        let success = is_successful(&batch.errors, &batch.packet_results);
        let quality_tier = compute_quality_tier(
            success,
            &batch.packet_results,
            batch.apply_result.as_ref(),
            config.min_confidence,
        );
        let final_state = if success {
            OvenState::Complete
        } else {
            OvenState::Burnt
        };
        transition(&mut state, final_state);

        let result = BakeResult {
            bake_id,
            success,
            quality_tier,
            final_state,
            scaffold_result: batch.scaffold_result,
            packet_results: batch.packet_results,
            files: batch.files,
            apply_result: batch.apply_result,
            total_iterations: batch.total_iterations,
            duration: timer.elapsed(),
            errors: batch.errors,
            started_at,
            finished_at: Utc::now(),
        };

        let message = if success {
            format!("Bake complete: {} ({} files)", quality_tier, result.files.len())
        } else {
            format!(
                "Bake burnt: {} errors, {} of {} packets failed",
                result.errors.len(),
                result.packets_failed(),
                total
            )
        };
        if success {
            info!(%bake_id, tier = %quality_tier, "Bake complete");
        } else {
            warn!(
                %bake_id,
                errors = result.errors.len(),
                failed = result.packets_failed(),
                invalid = result.packets_failing_validation(),
                "Bake burnt"
            );
        }
        send(
            &updates,
            BakeUpdate::new(state, message)
                .with_total(total)
                .with_iterations(result.total_iterations, result.total_iterations)
                .with_files(result.files.len())
                .with_errors(result.errors.clone()),
        )
        .await;

        if let Some(store) = &self.reports {
            let report = BakeReport::from_result(&project, &repo, &result);
            match store.save(&report) {
                Ok(path) => debug!(%bake_id, path = %path.display(), "Saved bake report"),
                Err(e) => warn!(%bake_id, "Failed to save bake report: {}", e),
            }
        }

        result
    }

    async fn scaffold_project(
        &self,
        project: &Project,
        repo: &RepoHandle,
        total: usize,
        batch: &mut Batch,
        updates: &mpsc::Sender<BakeUpdate>,
    ) {
        let state = OvenState::Scaffolding;

        match self.scaffold.detect_template(repo).await {
            Ok(Some(existing)) => {
                send(
                    updates,
                    BakeUpdate::new(
                        state,
                        format!("Repository already follows template '{}'", existing),
                    )
                    .with_total(total),
                )
                .await;
                return;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(repo = %repo.full_name(), "Template detection failed: {:#}", e);
                let error = format!("scaffold: template detection failed: {:#}", e);
                batch.errors.push(error.clone());
                send(
                    updates,
                    BakeUpdate::new(state, "Template detection failed")
                        .with_total(total)
                        .with_errors(vec![error]),
                )
                .await;
                return;
            }
        }

        let template = select_template(project);
        send(
            updates,
            BakeUpdate::new(state, format!("Scaffolding from template '{}'", template))
                .with_total(total),
        )
        .await;

        let request = ScaffoldRequest {
            template,
            project_name: project.name.clone(),
            features: project.features.clone(),
            include_tests: true,
        };
        let result = match self.scaffold.build(request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(template = %template, "Scaffold builder failed: {:#}", e);
                ScaffoldResult {
                    success: false,
                    files: Vec::new(),
                    errors: vec![format!("{:#}", e)],
                }
            }
        };

        let errors: Vec<String> = if result.success || !result.errors.is_empty() {
            result.errors.iter().map(|e| format!("scaffold: {}", e)).collect()
        } else {
            vec!["scaffold: builder reported failure".to_string()]
        };
        batch.errors.extend(errors.iter().cloned());
        batch.files.extend(result.files.iter().cloned());

        send(
            updates,
            BakeUpdate::new(
                state,
                format!("Scaffolded {} files", result.files.len()),
            )
            .with_total(total)
            .with_files(result.files.len())
            .with_errors(errors),
        )
        .await;
        batch.scaffold_result = Some(result);
    }

    #[allow(clippy::too_many_arguments)]
    async fn bake_packet(
        &self,
        packet: &WorkPacket,
        index: usize,
        total: usize,
        repo: &RepoHandle,
        config: &BakeConfig,
        batch: &mut Batch,
        updates: &mpsc::Sender<BakeUpdate>,
    ) -> GenerationResult {
        let phase = packet.phase();
        send(
            updates,
            BakeUpdate::new(
                OvenState::Baking,
                format!("Baking packet {}/{}: {}", index, total, packet.title),
            )
            .with_packet(index, total, &packet.title)
            .with_phase(phase),
        )
        .await;

        let request = GenerationRequest {
            packet: packet.clone(),
            repo: repo.clone(),
            preferred_server: config.preferred_server.clone(),
            preferred_model: config.preferred_model.clone(),
            only_phases: vec![phase],
            guardrails: Guardrails {
                max_total_iterations: config.max_iterations,
                min_confidence_to_advance: config.min_confidence,
                require_critique_pass: config.require_validation,
            },
        };

        let (progress_tx, mut progress_rx) = mpsc::channel::<EngineProgress>(PROGRESS_BUFFER);
        let generate = self.engine.generate(request, progress_tx);
        let forward = async {
            while let Some(progress) = progress_rx.recv().await {
                send(updates, relabel(progress, index, total, &packet.title)).await;
            }
        };
        let (outcome, ()) = tokio::join!(generate, forward);

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(packet = %packet.id, "Generation engine failed: {:#}", e);
                GenerationResult::failed(format!("{:#}", e))
            }
        };

        let errors: Vec<String> = result
            .errors
            .iter()
            .map(|e| format!("{}: {}", packet.id, e))
            .collect();
        batch.errors.extend(errors.iter().cloned());
        batch.files.extend(result.all_files.iter().cloned());
        batch.total_iterations += result.total_iterations;

        let status = if result.success { "Baked" } else { "Failed to bake" };
        send(
            updates,
            BakeUpdate::new(
                OvenState::Baking,
                format!(
                    "{} '{}': {} files in {} iterations",
                    status,
                    packet.title,
                    result.all_files.len(),
                    result.total_iterations
                ),
            )
            .with_packet(index, total, &packet.title)
            .with_phase(phase)
            .with_iterations(result.total_iterations, config.max_iterations)
            .with_confidence(result.min_confidence())
            .with_files(result.all_files.len())
            .with_errors(errors),
        )
        .await;

        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply(
        &self,
        project: &Project,
        repo: &RepoHandle,
        config: &BakeConfig,
        started_at: DateTime<Utc>,
        total: usize,
        batch: &mut Batch,
        updates: &mpsc::Sender<BakeUpdate>,
    ) {
        let state = OvenState::Cooling;
        let branch = branch_name(&config.branch_prefix, &project.name, started_at);
        let titles: Vec<&str> = batch
            .packet_results
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        let message = commit_message(&project.name, &titles);

        send(
            updates,
            BakeUpdate::new(
                state,
                format!("Applying {} files to branch {}", batch.files.len(), branch),
            )
            .with_total(total)
            .with_files(batch.files.len()),
        )
        .await;

        let outcome = if config.create_merge_request {
            let info = MergeRequestInfo {
                title: format!("Bake: {}", project.name),
                description: merge_request_description(project, &batch.packet_results),
            };
            self.applier
                .open_merge_request(repo, &batch.files, &message, &branch, info)
                .await
        } else {
            let options = PushOptions {
                branch: branch.clone(),
                create_branch: true,
            };
            self.applier
                .push(repo, &batch.files, &message, options)
                .await
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(branch = %branch, "Code applier failed: {:#}", e);
                ApplyResult::failed(format!("{:#}", e))
            }
        };

        let update = if result.success {
            for packet in &mut batch.packet_results {
                packet.applied = true;
            }
            let target = result
                .merge_request_url
                .clone()
                .or_else(|| result.branch.clone())
                .unwrap_or_else(|| branch.clone());
            BakeUpdate::new(state, format!("Applied {} files: {}", batch.files.len(), target))
        } else {
            let errors: Vec<String> = if result.errors.is_empty() {
                vec!["apply: applier reported failure".to_string()]
            } else {
                result.errors.iter().map(|e| format!("apply: {}", e)).collect()
            };
            batch.errors.extend(errors.iter().cloned());
            BakeUpdate::new(state, "Apply failed").with_errors(errors)
        };
        send(updates, update.with_total(total)).await;

        batch.apply_result = Some(result);
    }
}

#[async_trait]
impl Bake for Oven {
    async fn bake(&self, request: BakeRequest, updates: mpsc::Sender<BakeUpdate>) -> BakeResult {
        Oven::bake(self, request, updates).await
    }
}

/// Stream of updates from a bake spawned with [`Oven::start`].
pub struct BakeStream {
    rx: mpsc::Receiver<BakeUpdate>,
    handle: JoinHandle<BakeResult>,
}

impl BakeStream {
    /// Wait for the bake to finish. Updates not yet consumed are discarded.
    pub async fn finish(self) -> Result<BakeResult, OvenError> {
        drop(self.rx);
        self.handle.await.map_err(OvenError::BakeTaskFailed)
    }
}

impl Stream for BakeStream {
    type Item = BakeUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Pick a base template from the project's name and description.
pub fn select_template(project: &Project) -> ScaffoldTemplate {
    let text = format!("{} {}", project.name, project.description).to_lowercase();
    if MOBILE_REGEX.is_match(&text) {
        ScaffoldTemplate::MobileApp
    } else if CLI_REGEX.is_match(&text) {
        ScaffoldTemplate::CliTool
    } else if API_REGEX.is_match(&text) {
        ScaffoldTemplate::ApiServer
    } else {
        ScaffoldTemplate::WebApp
    }
}

/// `prefix + slug + "-" + %Y%m%d%H%M%S`.
pub fn branch_name(prefix: &str, project_name: &str, started_at: DateTime<Utc>) -> String {
    let slug = slugify(project_name, 40);
    let slug = if slug.is_empty() { "project".to_string() } else { slug };
    format!("{}{}-{}", prefix, slug, started_at.format("%Y%m%d%H%M%S"))
}

/// Header line followed by one bullet per packet title.
pub fn commit_message(project_name: &str, titles: &[&str]) -> String {
    let mut message = format!("Bake {}: {} packets\n", project_name, titles.len());
    if !titles.is_empty() {
        message.push('\n');
    }
    for title in titles {
        message.push_str(&format!("- {}\n", title));
    }
    message
}

fn merge_request_description(project: &Project, results: &[PacketResult]) -> String {
    let mut description = String::new();
    if !project.description.is_empty() {
        description.push_str(&project.description);
        description.push_str("\n\n");
    }
    description.push_str("## Packets\n\n");
    for result in results {
        let status = if result.generation.success && result.passed_validation() {
            "✅"
        } else {
            "⚠️"
        };
        description.push_str(&format!(
            "- {} [{}] {}\n",
            status, result.phase, result.title
        ));
    }
    description
}

fn relabel(progress: EngineProgress, index: usize, total: usize, title: &str) -> BakeUpdate {
    let mut update = BakeUpdate::new(OvenState::Baking, progress.message)
        .with_packet(index, total, title)
        .with_phase(progress.phase)
        .with_iterations(progress.iteration, progress.total_iterations)
        .with_confidence(progress.confidence);
    update.files_generated = progress.files_generated;
    update
}

fn transition(state: &mut OvenState, next: OvenState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal oven transition {} -> {}",
        state,
        next
    );
    debug!(from = %state, to = %next, "Oven transition");
    *state = next;
}

async fn send(updates: &mpsc::Sender<BakeUpdate>, update: BakeUpdate) {
    updates.send(update).await.ok();
}
