use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "oven")]
#[command(version, about = "Bake work packets into validated code")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[arg(long, global = true, env = "OVEN_PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    /// Never apply generated code (overrides bake.dry_run)
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Override bake.min_confidence
    #[arg(long, global = true)]
    pub min_confidence: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the phase-ordered execution plan for a packets file
    Plan {
        /// JSON file containing an array of work packets
        packets: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify a single packet title into a generation phase
    Classify {
        title: String,

        #[arg(default_value = "")]
        description: String,
    },
    /// Run the static validator over source files
    Validate {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[arg(long, default_value = "200")]
        max_line_length: usize,

        /// Skip the cross-file import check
        #[arg(long)]
        no_import_check: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// List or show saved bake reports
    Report {
        #[command(subcommand)]
        command: Option<ReportCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    Show,
    Validate,
    Init,
}

#[derive(Subcommand, Clone)]
pub enum ReportCommands {
    List,
    Show {
        /// Bake id or unique id prefix
        id: String,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    oven::telemetry::init_tracing(cli.log_json, oven::telemetry::level_for(cli.verbose));

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Plan { packets, json } => cmd::cmd_plan(packets, *json)?,
        Commands::Classify { title, description } => cmd::cmd_classify(title, description),
        Commands::Validate {
            paths,
            json,
            max_line_length,
            no_import_check,
        } => cmd::cmd_validate(paths, *json, *max_line_length, !*no_import_check)?,
        Commands::Config { command } => {
            let overrides = cmd::CliOverrides {
                dry_run: cli.dry_run.then_some(true),
                min_confidence: cli.min_confidence,
            };
            cmd::cmd_config(&project_dir, overrides, command.clone())?
        }
        Commands::Report { command } => cmd::cmd_report(&project_dir, command.clone())?,
    }

    Ok(())
}
