//! Static validation of files on disk: `oven validate`.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use oven::packet::FileChange;
use oven::validator::{IssueSeverity, Validator, is_source_file};

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "target", ".oven"];

pub fn cmd_validate(
    paths: &[PathBuf],
    json: bool,
    max_line_length: usize,
    check_imports: bool,
) -> Result<()> {
    let files = collect_files(paths)?;
    debug!(files = files.len(), "Collected source files");

    let validator = Validator::new()
        .with_max_line_length(max_line_length)
        .with_import_check(check_imports);
    let result = validator.validate(&files);

    if json {
        let out =
            serde_json::to_string_pretty(&result).context("Failed to serialize validation result")?;
        println!("{}", out);
    } else {
        for issue in result.issues() {
            let severity = match issue.severity {
                IssueSeverity::Error => console::style(issue.severity.to_string()).red().bold(),
                IssueSeverity::Warning => console::style(issue.severity.to_string()).yellow(),
                IssueSeverity::Info => console::style(issue.severity.to_string()).dim(),
            };
            let rule = if issue.rule.is_empty() {
                String::new()
            } else {
                format!(" ({})", issue.rule)
            };
            println!("{} {}: {}{}", issue.location(), severity, issue.message, rule);
        }
        println!();
        println!("Checked {} files: {}", files.len(), result.summary());
    }

    if !result.valid {
        bail!("Validation failed with {} errors", result.error_count());
    }
    Ok(())
}

/// Expand `paths` into source files, reading each one.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<FileChange>> {
    let mut files = Vec::new();

    for root in paths {
        if !root.exists() {
            bail!("Path not found: {}", root.display());
        }
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let shown = display_path(entry.path());
            if !is_source_file(&shown) {
                continue;
            }
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => files.push(FileChange::create(&shown, &content)),
                Err(e) => warn!(path = %shown, "Skipping unreadable file: {}", e),
            }
        }
    }

    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
