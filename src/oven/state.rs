//! Bake state, quality tiers, progress updates and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::collaborators::{ApplyResult, GenerationResult, ScaffoldResult};
use crate::errors::ConfigError;
use crate::packet::FileChange;
use crate::phase::GenerationPhase;
use crate::validator::ValidationResult;

/// Where a bake currently is.
///
/// Moves forward only, except `Baking ⇄ Testing` which alternates once per
/// packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OvenState {
    #[default]
    Idle,
    Preheating,
    Scaffolding,
    Mixing,
    Baking,
    Testing,
    Cooling,
    Complete,
    Burnt,
}

impl OvenState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Burnt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preheating => "preheating",
            Self::Scaffolding => "scaffolding",
            Self::Mixing => "mixing",
            Self::Baking => "baking",
            Self::Testing => "testing",
            Self::Cooling => "cooling",
            Self::Complete => "complete",
            Self::Burnt => "burnt",
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: OvenState) -> bool {
        use OvenState::*;
        matches!(
            (self, next),
            (Idle, Preheating)
                | (Preheating, Scaffolding | Mixing)
                | (Scaffolding, Mixing)
                | (Mixing, Baking | Cooling | Complete | Burnt)
                | (Baking, Testing | Baking | Cooling | Complete | Burnt)
                | (Testing, Baking | Cooling | Complete | Burnt)
                | (Cooling, Complete | Burnt)
        )
    }
}

impl fmt::Display for OvenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality classification of a finished bake.
///
/// Totally ordered: `Raw < Tested < Crispy < GoldenBrown`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum QualityTier {
    #[default]
    Raw,
    Tested,
    Crispy,
    GoldenBrown,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Tested => "tested",
            Self::Crispy => "crispy",
            Self::GoldenBrown => "golden-brown",
        }
    }

    /// Whether this tier meets or exceeds `target`.
    pub fn meets(&self, target: QualityTier) -> bool {
        *self >= target
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QualityTier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "raw" => Ok(Self::Raw),
            "tested" => Ok(Self::Tested),
            "crispy" => Ok(Self::Crispy),
            "golden-brown" | "goldenbrown" => Ok(Self::GoldenBrown),
            _ => Err(ConfigError::UnknownTier(s.to_string())),
        }
    }
}

/// Ephemeral progress event. Only ever sent on the update channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeUpdate {
    pub state: OvenState,
    /// 1-based index of the packet being worked on (0 outside the packet loop).
    pub packet_index: usize,
    pub total_packets: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_packet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<GenerationPhase>,
    pub iteration: u32,
    pub total_iterations: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_generated: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl BakeUpdate {
    pub fn new(state: OvenState, message: impl Into<String>) -> Self {
        Self {
            state,
            packet_index: 0,
            total_packets: 0,
            current_packet: None,
            phase: None,
            iteration: 0,
            total_iterations: 0,
            message: message.into(),
            confidence: None,
            files_generated: None,
            errors: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_packet(mut self, index: usize, total: usize, title: &str) -> Self {
        self.packet_index = index;
        self.total_packets = total;
        self.current_packet = Some(title.to_string());
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total_packets = total;
        self
    }

    pub fn with_phase(mut self, phase: GenerationPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_iterations(mut self, iteration: u32, total: u32) -> Self {
        self.iteration = iteration;
        self.total_iterations = total;
        self
    }

    pub fn with_confidence(mut self, confidence: Option<f64>) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_files(mut self, files: usize) -> Self {
        self.files_generated = Some(files);
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

/// Outcome of one packet within a bake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketResult {
    pub packet_id: String,
    pub title: String,
    pub phase: GenerationPhase,
    pub generation: GenerationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    pub applied: bool,
}

impl PacketResult {
    /// No validation recorded, or validation passed.
    pub fn passed_validation(&self) -> bool {
        self.validation.as_ref().is_none_or(|v| v.valid)
    }
}

/// Terminal record of one bake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeResult {
    pub bake_id: Uuid,
    pub success: bool,
    pub quality_tier: QualityTier,
    pub final_state: OvenState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaffold_result: Option<ScaffoldResult>,
    pub packet_results: Vec<PacketResult>,
    pub files: Vec<FileChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_result: Option<ApplyResult>,
    pub total_iterations: u32,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BakeResult {
    pub fn packets_failed(&self) -> usize {
        self.packet_results
            .iter()
            .filter(|r| !r.generation.success)
            .count()
    }

    pub fn packets_failing_validation(&self) -> usize {
        self.packet_results
            .iter()
            .filter(|r| !r.passed_validation())
            .count()
    }
}

/// Whether the accumulated results add up to a successful bake.
pub fn is_successful(errors: &[String], packet_results: &[PacketResult]) -> bool {
    errors.is_empty() && packet_results.iter().all(|r| r.generation.success)
}

/// Compute the quality tier from a bake's accumulated results.
///
/// Each tier builds on the previous one: `tested` needs every packet to have
/// passed (or skipped) validation, `crispy` additionally needs every phase
/// confidence at or above `min_confidence`, and `golden-brown` needs a
/// `crispy` bake whose apply step succeeded. Unsuccessful bakes stay `raw`.
pub fn compute_quality_tier(
    success: bool,
    packet_results: &[PacketResult],
    apply_result: Option<&ApplyResult>,
    min_confidence: f64,
) -> QualityTier {
    if !success {
        return QualityTier::Raw;
    }

    let all_validated = packet_results.iter().all(|r| r.passed_validation());
    if !all_validated {
        return QualityTier::Raw;
    }

    let all_confident = packet_results
        .iter()
        .all(|r| r.generation.all_phases_confident(min_confidence));
    if !all_confident {
        return QualityTier::Tested;
    }

    if apply_result.is_some_and(|a| a.success) {
        QualityTier::GoldenBrown
    } else {
        QualityTier::Crispy
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::PhaseReport;
    use crate::validator::{IssueSeverity, ValidationIssue};

    fn packet_result(confidence: f64, valid: Option<bool>, success: bool) -> PacketResult {
        let validation = valid.map(|ok| {
            let mut v = ValidationResult::default();
            if !ok {
                v.push(ValidationIssue::new(IssueSeverity::Error, "a.ts", 1, "bad"));
            }
            v
        });
        PacketResult {
            packet_id: "p".to_string(),
            title: "P".to_string(),
            phase: GenerationPhase::Features,
            generation: GenerationResult {
                success,
                phases: vec![PhaseReport {
                    phase: GenerationPhase::Features,
                    confidence,
                    iterations: 2,
                }],
                ..Default::default()
            },
            validation,
            applied: false,
        }
    }

    fn applied(success: bool) -> ApplyResult {
        ApplyResult {
            success,
            ..Default::default()
        }
    }

    #[test]
    fn test_tier_ordering() {
        assert!(QualityTier::Raw < QualityTier::Tested);
        assert!(QualityTier::Tested < QualityTier::Crispy);
        assert!(QualityTier::Crispy < QualityTier::GoldenBrown);
        assert!(QualityTier::GoldenBrown.meets(QualityTier::Crispy));
        assert!(!QualityTier::Tested.meets(QualityTier::Crispy));
    }

    #[test]
    fn test_tier_from_str_and_display() {
        assert_eq!("golden-brown".parse::<QualityTier>().unwrap(), QualityTier::GoldenBrown);
        assert_eq!("golden_brown".parse::<QualityTier>().unwrap(), QualityTier::GoldenBrown);
        assert_eq!("CRISPY".parse::<QualityTier>().unwrap(), QualityTier::Crispy);
        assert!("burnt".parse::<QualityTier>().is_err());
        assert_eq!(QualityTier::GoldenBrown.to_string(), "golden-brown");
        assert_eq!(
            serde_json::to_string(&QualityTier::GoldenBrown).unwrap(),
            "\"golden-brown\""
        );
    }

    #[test]
    fn test_unsuccessful_bake_is_raw() {
        let results = vec![packet_result(0.99, Some(true), true)];
        let tier = compute_quality_tier(false, &results, Some(&applied(true)), 0.75);
        assert_eq!(tier, QualityTier::Raw);
    }

    #[test]
    fn test_failed_validation_caps_below_crispy() {
        let results = vec![
            packet_result(0.99, Some(true), true),
            packet_result(0.99, Some(false), true),
        ];
        let tier = compute_quality_tier(true, &results, Some(&applied(true)), 0.75);
        assert!(tier < QualityTier::Crispy);
        assert_eq!(tier, QualityTier::Raw);
    }

    #[test]
    fn test_low_confidence_is_tested() {
        let results = vec![packet_result(0.6, Some(true), true)];
        let tier = compute_quality_tier(true, &results, Some(&applied(true)), 0.75);
        assert_eq!(tier, QualityTier::Tested);
    }

    #[test]
    fn test_confident_without_apply_is_crispy() {
        let results = vec![packet_result(0.9, Some(true), true)];
        assert_eq!(
            compute_quality_tier(true, &results, None, 0.75),
            QualityTier::Crispy
        );
        assert_eq!(
            compute_quality_tier(true, &results, Some(&applied(false)), 0.75),
            QualityTier::Crispy
        );
    }

    #[test]
    fn test_confident_with_apply_is_golden_brown() {
        let results = vec![packet_result(0.9, None, true)];
        assert_eq!(
            compute_quality_tier(true, &results, Some(&applied(true)), 0.75),
            QualityTier::GoldenBrown
        );
    }

    #[test]
    fn test_apply_cannot_promote_tested_bake() {
        let results = vec![packet_result(0.5, Some(true), true)];
        assert_eq!(
            compute_quality_tier(true, &results, Some(&applied(true)), 0.75),
            QualityTier::Tested
        );
    }

    #[test]
    fn test_confidence_threshold_is_inclusive() {
        let results = vec![packet_result(0.75, Some(true), true)];
        assert_eq!(
            compute_quality_tier(true, &results, None, 0.75),
            QualityTier::Crispy
        );
    }

    #[test]
    fn test_is_successful() {
        let ok = vec![packet_result(0.9, None, true)];
        let failed = vec![packet_result(0.9, None, false)];
        assert!(is_successful(&[], &ok));
        assert!(!is_successful(&["scaffold: x".to_string()], &ok));
        assert!(!is_successful(&[], &failed));
        assert!(is_successful(&[], &[]));
    }

    #[test]
    fn test_state_transitions() {
        assert!(OvenState::Idle.can_transition_to(OvenState::Preheating));
        assert!(OvenState::Baking.can_transition_to(OvenState::Testing));
        assert!(OvenState::Testing.can_transition_to(OvenState::Baking));
        assert!(!OvenState::Cooling.can_transition_to(OvenState::Baking));
        assert!(!OvenState::Complete.can_transition_to(OvenState::Idle));
        assert!(OvenState::Burnt.is_terminal());
        assert!(!OvenState::Testing.is_terminal());
    }

    #[test]
    fn test_update_builder() {
        let update = BakeUpdate::new(OvenState::Baking, "working")
            .with_packet(2, 5, "Cart")
            .with_phase(GenerationPhase::Features)
            .with_iterations(3, 15)
            .with_confidence(Some(0.8))
            .with_files(4);
        assert_eq!(update.packet_index, 2);
        assert_eq!(update.current_packet.as_deref(), Some("Cart"));
        assert_eq!(update.total_iterations, 15);
        assert_eq!(update.files_generated, Some(4));
    }
}
