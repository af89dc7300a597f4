//! Escalating retry loop ("Ralph loop").
//!
//! Repeats full bakes, raising the confidence bar by [`CONFIDENCE_STEP`] on
//! every attempt, until the bake reaches the target tier or the attempt
//! budget runs out.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::runner::{Bake, BakeRequest};
use super::state::{BakeResult, BakeUpdate, OvenState, QualityTier};
use crate::config::RampConfig;
use crate::errors::ConfigError;

/// Added to `min_confidence` for each attempt after the first.
pub const CONFIDENCE_STEP: f64 = 0.05;

/// Upper bound for the escalated `min_confidence`. A base already above it
/// is kept as is.
pub const CONFIDENCE_CAP: f64 = 0.95;

/// A bake update tagged with the 1-based attempt that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampUpdate {
    pub attempt: u32,
    pub update: BakeUpdate,
}

/// Final outcome of a ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampOutcome {
    /// The qualifying bake, or the last one if none qualified.
    pub result: BakeResult,
    pub attempts: u32,
    pub reached_target: bool,
    pub gave_up: bool,
    /// Highest tier seen across all attempts.
    pub best_tier: QualityTier,
    /// `min_confidence` used by each attempt, in order.
    pub confidences: Vec<f64>,
    pub message: String,
}

/// `min_confidence` for a 1-based attempt number.
pub fn attempt_confidence(base: f64, attempt: u32) -> f64 {
    let raised = base + CONFIDENCE_STEP * f64::from(attempt.saturating_sub(1));
    // Round away float drift so 0.75 + 0.05 reads as 0.8.
    let raised = (raised * 1e6).round() / 1e6;
    raised.min(CONFIDENCE_CAP.max(base))
}

/// Drives repeated bakes through any [`Bake`] implementation.
pub struct Ramp<B> {
    baker: B,
}

impl<B: Bake> Ramp<B> {
    pub fn new(baker: B) -> Self {
        Self { baker }
    }

    /// Run a ramp with the attempt budget and target tier from `[ramp]`.
    pub async fn ramp_with_config(
        &self,
        request: BakeRequest,
        config: &RampConfig,
        updates: mpsc::Sender<RampUpdate>,
    ) -> Result<RampOutcome, ConfigError> {
        let target = config.target_tier()?;
        Ok(self
            .ramp_until_quality(request, config.max_attempts, target, updates)
            .await)
    }

    /// Bake until `target` is reached or `max_attempts` bakes have run.
    ///
    /// `max_attempts = 0` is treated as 1. Each attempt is a fresh bake with
    /// only `min_confidence` changed. Updates from every attempt are
    /// forwarded in order; a closed receiver is ignored.
    pub async fn ramp_until_quality(
        &self,
        request: BakeRequest,
        max_attempts: u32,
        target: QualityTier,
        updates: mpsc::Sender<RampUpdate>,
    ) -> RampOutcome {
        let max_attempts = max_attempts.max(1);
        let base = request.config.min_confidence;
        let mut confidences = Vec::new();
        let mut best_tier = QualityTier::Raw;
        let mut attempt = 0;

        let result = loop {
            attempt += 1;
            let confidence = attempt_confidence(base, attempt);
            confidences.push(confidence);

            let mut attempt_request = request.clone();
            attempt_request.config.min_confidence = confidence;

            info!(attempt, max_attempts, confidence, target = %target, "Starting ramp attempt");
            let result = self.run_attempt(attempt, attempt_request, &updates).await;
            best_tier = best_tier.max(result.quality_tier);

            if result.quality_tier.meets(target) {
                info!(attempt, tier = %result.quality_tier, "Ramp reached target");
                let message = format!(
                    "Reached {} on attempt {}/{} (min confidence {:.2})",
                    result.quality_tier, attempt, max_attempts, confidence
                );
                return RampOutcome {
                    result,
                    attempts: attempt,
                    reached_target: true,
                    gave_up: false,
                    best_tier,
                    confidences,
                    message,
                };
            }

            warn!(
                attempt,
                tier = %result.quality_tier,
                target = %target,
                "Ramp attempt fell short"
            );
            if attempt >= max_attempts {
                break result;
            }
        };

        let message = format!(
            "Gave up after {} attempts: best tier {}, target {}",
            max_attempts, best_tier, target
        );
        let final_update = BakeUpdate::new(OvenState::Burnt, message.clone())
            .with_total(result.packet_results.len())
            .with_errors(result.errors.clone());
        updates
            .send(RampUpdate {
                attempt: max_attempts,
                update: final_update,
            })
            .await
            .ok();

        RampOutcome {
            result,
            attempts: max_attempts,
            reached_target: false,
            gave_up: true,
            best_tier,
            confidences,
            message,
        }
    }

    async fn run_attempt(
        &self,
        attempt: u32,
        request: BakeRequest,
        updates: &mpsc::Sender<RampUpdate>,
    ) -> BakeResult {
        let (tx, mut rx) = mpsc::channel::<BakeUpdate>(super::runner::UPDATE_BUFFER);
        let bake = self.baker.bake(request, tx);
        let forward = async {
            while let Some(update) = rx.recv().await {
                updates.send(RampUpdate { attempt, update }).await.ok();
            }
        };
        let (result, ()) = tokio::join!(bake, forward);
        result
    }
}
