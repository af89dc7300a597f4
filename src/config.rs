//! Oven configuration.
//!
//! Settings come from `.oven/oven.toml` and are layered:
//! file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [bake]
//! auto_scaffold = true
//! auto_apply = true
//! create_merge_request = true
//! min_confidence = 0.75
//! max_iterations = 15
//! require_validation = true
//! dry_run = false
//! branch_prefix = "oven/"
//! preferred_model = "large"
//!
//! [ramp]
//! max_attempts = 3
//! target_tier = "crispy"
//! ```
//!
//! # Environment
//!
//! | Variable              | Overrides             |
//! |-----------------------|-----------------------|
//! | `OVEN_MIN_CONFIDENCE` | `bake.min_confidence` |
//! | `OVEN_MAX_ITERATIONS` | `bake.max_iterations` |
//! | `OVEN_DRY_RUN`        | `bake.dry_run`        |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::oven::QualityTier;

pub const ENV_MIN_CONFIDENCE: &str = "OVEN_MIN_CONFIDENCE";
pub const ENV_MAX_ITERATIONS: &str = "OVEN_MAX_ITERATIONS";
pub const ENV_DRY_RUN: &str = "OVEN_DRY_RUN";

/// Per-bake settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeConfig {
    /// Build the base project structure before baking packets.
    #[serde(default = "default_true")]
    pub auto_scaffold: bool,
    /// Push generated files once all packets are baked.
    #[serde(default = "default_true")]
    pub auto_apply: bool,
    /// Open a merge request instead of pushing directly.
    #[serde(default = "default_true")]
    pub create_merge_request: bool,
    /// Confidence every phase must reach for a `crispy` bake.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Iteration ceiling handed to the engine per packet.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Validate each packet's files after generation.
    #[serde(default = "default_true")]
    pub require_validation: bool,
    /// Never apply, even when `auto_apply` is set.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_model: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_min_confidence() -> f64 {
    0.75
}

fn default_max_iterations() -> u32 {
    15
}

fn default_branch_prefix() -> String {
    "oven/".to_string()
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            auto_scaffold: true,
            auto_apply: true,
            create_merge_request: true,
            min_confidence: default_min_confidence(),
            max_iterations: default_max_iterations(),
            require_validation: true,
            dry_run: false,
            branch_prefix: default_branch_prefix(),
            preferred_server: None,
            preferred_model: None,
        }
    }
}

impl BakeConfig {
    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MIN_CONFIDENCE) {
            self.min_confidence = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_MIN_CONFIDENCE.to_string(),
                message: format!("expected a number, got '{}'", raw),
            })?;
        }
        if let Some(raw) = lookup(ENV_MAX_ITERATIONS) {
            self.max_iterations = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_MAX_ITERATIONS.to_string(),
                message: format!("expected a positive integer, got '{}'", raw),
            })?;
        }
        if let Some(raw) = lookup(ENV_DRY_RUN) {
            self.dry_run = parse_flag(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_DRY_RUN.to_string(),
                message: format!("expected true or false, got '{}'", raw),
            })?;
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Settings for the escalating retry loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_target_tier")]
    pub target_tier: String,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_target_tier() -> String {
    QualityTier::Crispy.to_string()
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            target_tier: default_target_tier(),
        }
    }
}

impl RampConfig {
    pub fn target_tier(&self) -> Result<QualityTier, ConfigError> {
        self.target_tier.parse()
    }
}

/// Contents of `.oven/oven.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OvenToml {
    #[serde(default)]
    pub bake: BakeConfig,
    #[serde(default)]
    pub ramp: RampConfig,
}

impl OvenToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `oven.toml` from `oven_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(oven_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = oven_dir.join("oven.toml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize oven.toml")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(0.0..=1.0).contains(&self.bake.min_confidence) {
            warnings.push(format!(
                "Invalid min_confidence {}: should be between 0.0 and 1.0",
                self.bake.min_confidence
            ));
        }

        if self.bake.max_iterations == 0 {
            warnings.push("max_iterations is 0: the engine will not iterate".to_string());
        }

        if self.bake.branch_prefix.trim().is_empty() {
            warnings.push("branch_prefix is empty: bake branches will have no prefix".to_string());
        }

        if self.ramp.max_attempts == 0 {
            warnings.push("ramp.max_attempts is 0: one attempt will still be made".to_string());
        }

        if let Err(e) = self.ramp.target_tier() {
            warnings.push(e.to_string());
        }

        warnings
    }
}

/// Resolved configuration for one invocation.
///
/// Merges settings from:
/// 1. oven.toml file
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct OvenConfig {
    pub project_dir: PathBuf,
    pub oven_dir: PathBuf,
    pub toml: OvenToml,
    pub cli_dry_run: Option<bool>,
    pub cli_min_confidence: Option<f64>,
}

impl OvenConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let oven_dir = project_dir.join(".oven");
        let toml = OvenToml::load_or_default(&oven_dir)?;

        Ok(Self {
            project_dir,
            oven_dir,
            toml,
            cli_dry_run: None,
            cli_min_confidence: None,
        })
    }

    pub fn with_cli_args(
        project_dir: PathBuf,
        dry_run: Option<bool>,
        min_confidence: Option<f64>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.cli_dry_run = dry_run;
        config.cli_min_confidence = min_confidence;
        Ok(config)
    }

    /// Effective bake settings (file → env → CLI).
    pub fn bake_config(&self) -> Result<BakeConfig, ConfigError> {
        self.bake_config_with_env(|key| std::env::var(key).ok())
    }

    fn bake_config_with_env<F>(&self, lookup: F) -> Result<BakeConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut bake = self.toml.bake.clone();
        bake.apply_env_overrides_from(lookup)?;
        if let Some(dry_run) = self.cli_dry_run {
            bake.dry_run = dry_run;
        }
        if let Some(min_confidence) = self.cli_min_confidence {
            bake.min_confidence = min_confidence;
        }
        Ok(bake)
    }

    pub fn config_file(&self) -> PathBuf {
        self.oven_dir.join("oven.toml")
    }

    /// Directory holding persisted bake reports.
    pub fn reports_dir(&self) -> PathBuf {
        self.oven_dir.join("bakes")
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
