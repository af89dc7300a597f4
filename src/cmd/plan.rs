//! Execution plan preview: `oven plan` and `oven classify`.

use anyhow::{Context, Result};
use std::path::Path;

use oven::packet::load_packets;
use oven::phase::classify;
use oven::scheduler::{describe_histogram, execution_plan, phase_histogram};

pub fn cmd_plan(packets_file: &Path, json: bool) -> Result<()> {
    let packets = load_packets(packets_file)?;
    let plan = execution_plan(&packets);

    if json {
        let out = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{}", out);
        return Ok(());
    }

    println!();
    println!("{}", console::style("Execution Plan").bold().cyan());
    println!("──────────────");
    if plan.is_empty() {
        println!("No packets in {}", packets_file.display());
        println!();
        return Ok(());
    }

    for entry in &plan {
        println!(
            "{:>3}. {:<12} {} {}",
            entry.index + 1,
            entry.phase.to_string(),
            entry.title,
            console::style(format!("({})", entry.packet_id)).dim()
        );
    }
    println!();
    println!(
        "{} packets: {}",
        plan.len(),
        describe_histogram(&phase_histogram(&packets))
    );
    println!();
    Ok(())
}

pub fn cmd_classify(title: &str, description: &str) {
    println!("{}", classify(title, description));
}
