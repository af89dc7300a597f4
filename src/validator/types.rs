//! Validation output types.
//!
//! - [`IssueSeverity`]: error / warning / info classification
//! - [`ValidationIssue`]: one diagnostic at a file/line/column
//! - [`ValidationResult`]: everything one validation call produced
//!
//! ## Example
//!
//! ```
//! use oven::validator::{IssueSeverity, ValidationIssue, ValidationResult};
//!
//! let mut result = ValidationResult::default();
//! result.push(
//!     ValidationIssue::new(IssueSeverity::Error, "src/app.ts", 3, "Unexpected closing '}'")
//!         .with_column(1)
//!         .with_rule("unbalanced-brace"),
//! );
//!
//! assert!(!result.valid);
//! assert_eq!(result.syntax_errors[0].location(), "src/app.ts:3:1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a single validation issue.
///
/// Ordered from most to least critical.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Structural problem. Makes the result invalid.
    Error,
    /// Style or correctness smell.
    #[default]
    Warning,
    /// Advisory note.
    Info,
}

impl IssueSeverity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        write!(f, "{}", s)
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// File path as given in the [`FileChange`](crate::packet::FileChange).
    pub file: String,
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based), when the check knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub message: String,
    /// Rule that produced this issue (e.g. `no-console`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rule: String,
}

impl ValidationIssue {
    pub fn new(
        severity: IssueSeverity,
        file: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            file: file.into(),
            line,
            column: None,
            message: message.into(),
            rule: String::new(),
        }
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = rule.into();
        self
    }

    /// `file:line:column`, or `file:line` when the column is unknown.
    pub fn location(&self) -> String {
        match self.column {
            Some(col) => format!("{}:{}:{}", self.file, self.line, col),
            None => format!("{}:{}", self.file, self.line),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.location(), self.severity, self.message)?;
        if !self.rule.is_empty() {
            write!(f, " ({})", self.rule)?;
        }
        Ok(())
    }
}

/// Outcome of one validation call.
///
/// `valid` is true exactly when there are no syntax errors. Lint warnings
/// (including import warnings) never affect validity. `type_errors` is
/// reserved and stays empty: no type checker runs here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub syntax_errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub type_errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub lint_warnings: Vec<ValidationIssue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            syntax_errors: Vec::new(),
            type_errors: Vec::new(),
            lint_warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// Route an issue: errors go to `syntax_errors`, everything else to
    /// `lint_warnings`.
    pub fn push(&mut self, issue: ValidationIssue) {
        if issue.severity.is_error() {
            self.syntax_errors.push(issue);
            self.valid = false;
        } else {
            self.lint_warnings.push(issue);
        }
    }

    pub fn error_count(&self) -> usize {
        self.syntax_errors.len() + self.type_errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.lint_warnings.len()
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0 && self.warning_count() == 0
    }

    /// Short human-readable summary, e.g. `2 errors, 5 warnings`.
    pub fn summary(&self) -> String {
        let errors = self.error_count();
        let warnings = self.warning_count();
        format!(
            "{} error{}, {} warning{}",
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" }
        )
    }

    /// All issues, errors first.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.syntax_errors
            .iter()
            .chain(self.type_errors.iter())
            .chain(self.lint_warnings.iter())
    }
}
