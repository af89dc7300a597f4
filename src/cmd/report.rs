//! Bake report browsing: `oven report`.

use anyhow::{Context, Result};
use std::path::Path;

use oven::config::OvenConfig;
use oven::oven::QualityTier;
use oven::report::{BakeReport, ReportStore};

use super::super::ReportCommands;

pub fn cmd_report(project_dir: &Path, command: Option<ReportCommands>) -> Result<()> {
    let config = OvenConfig::new(project_dir.to_path_buf())?;
    let store = ReportStore::new(&config.reports_dir());

    match command {
        None | Some(ReportCommands::List) => {
            let reports = store.list()?;
            if reports.is_empty() {
                println!("No bake reports in {}", store.dir().display());
                return Ok(());
            }
            println!();
            println!("{}", console::style("Bake Reports").bold().cyan());
            println!("────────────");
            for report in &reports {
                println!("{}", report.summary_line());
            }
            println!();
        }
        Some(ReportCommands::Show { id, json }) => {
            let report = store.load(&id)?;
            if json {
                let out =
                    serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
                println!("{}", out);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn print_report(report: &BakeReport) {
    let tier = match report.quality_tier {
        QualityTier::GoldenBrown | QualityTier::Crispy => {
            console::style(report.quality_tier.to_string()).green().bold()
        }
        QualityTier::Tested => console::style(report.quality_tier.to_string()).yellow(),
        QualityTier::Raw => console::style(report.quality_tier.to_string()).red(),
    };

    println!();
    println!("{}", console::style(format!("Bake {}", report.bake_id)).bold().cyan());
    println!("Project: {} ({})", report.project, report.repo);
    println!("State:   {}", report.final_state);
    println!("Tier:    {}", tier);
    println!(
        "Started: {} ({:.1}s)",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.duration_ms as f64 / 1000.0
    );
    println!("Files:   {}  Iterations: {}", report.files, report.total_iterations);
    if let Some(url) = &report.merge_request_url {
        println!("Merge request: {}", url);
    } else if let Some(branch) = &report.branch {
        println!("Branch:  {}", branch);
    }
    println!();

    println!(
        "{:<4} {:<12} {:<8} {:<10} {:<10} TITLE",
        "#", "PHASE", "FILES", "CONF", "VALID"
    );
    for (i, packet) in report.packets.iter().enumerate() {
        let confidence = packet
            .min_confidence
            .map(|c| format!("{:.2}", c))
            .unwrap_or_else(|| "-".to_string());
        let valid = match packet.valid {
            Some(true) => "yes".to_string(),
            Some(false) => format!("no ({})", packet.error_count),
            None => "-".to_string(),
        };
        println!(
            "{:<4} {:<12} {:<8} {:<10} {:<10} {}",
            i + 1,
            packet.phase.to_string(),
            packet.files,
            confidence,
            valid,
            packet.title
        );
    }

    if !report.errors.is_empty() {
        println!();
        println!("{}", console::style("Errors:").red().bold());
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
    println!();
}
