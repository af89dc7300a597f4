//! Configuration view and validation commands: `oven config`.

use anyhow::Result;

use oven::config::{BakeConfig, OvenConfig, OvenToml, RampConfig};

use super::super::ConfigCommands;

/// Bake settings given on the command line. They win over file and env.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub dry_run: Option<bool>,
    pub min_confidence: Option<f64>,
}

pub fn cmd_config(
    project_dir: &std::path::Path,
    overrides: CliOverrides,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let oven_dir = project_dir.join(".oven");
    let config_path = oven_dir.join("oven.toml");

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Oven Configuration");
            println!("==================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                OvenToml::load(&config_path)?
            } else {
                println!("No oven.toml found at {}", config_path.display());
                println!("Using default configuration.");
                OvenToml::default()
            };
            println!();

            print_bake("[bake]", &toml.bake);
            print_ramp(&toml.ramp);

            println!("Effective values (with env and CLI overrides):");
            let config = OvenConfig::with_cli_args(
                project_dir.to_path_buf(),
                overrides.dry_run,
                overrides.min_confidence,
            )?;
            let effective = config.bake_config()?;
            println!("  min_confidence = {}", effective.min_confidence);
            println!("  max_iterations = {}", effective.max_iterations);
            println!("  dry_run = {}", effective.dry_run);
            println!();

            if !config_path.exists() {
                println!("Run 'oven config init' to create an oven.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No oven.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = OvenToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("oven.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            OvenToml::default().save(&config_path)?;

            println!("Created oven.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [bake] min_confidence, max_iterations, branch_prefix, dry_run");
            println!("  - [ramp] max_attempts, target_tier");
            println!();
        }
    }

    Ok(())
}

fn print_bake(header: &str, bake: &BakeConfig) {
    println!("{}", header);
    println!("  auto_scaffold = {}", bake.auto_scaffold);
    println!("  auto_apply = {}", bake.auto_apply);
    println!("  create_merge_request = {}", bake.create_merge_request);
    println!("  min_confidence = {}", bake.min_confidence);
    println!("  max_iterations = {}", bake.max_iterations);
    println!("  require_validation = {}", bake.require_validation);
    println!("  dry_run = {}", bake.dry_run);
    println!("  branch_prefix = \"{}\"", bake.branch_prefix);
    if let Some(server) = &bake.preferred_server {
        println!("  preferred_server = \"{}\"", server);
    }
    if let Some(model) = &bake.preferred_model {
        println!("  preferred_model = \"{}\"", model);
    }
    println!();
}

fn print_ramp(ramp: &RampConfig) {
    println!("[ramp]");
    println!("  max_attempts = {}", ramp.max_attempts);
    println!("  target_tier = \"{}\"", ramp.target_tier);
    println!();
}
