//! Static code validator for generated output.
//!
//! Fast structural checks on generated source text without a real parser or
//! type checker. Every packet's files pass through here before the packet
//! counts as tested.
//!
//! ## Checks
//!
//! - [`syntax`]: bracket/paren/quote balance (errors, affect validity)
//! - [`lint`]: per-line style heuristics (warnings and info)
//! - [`imports`]: cross-file named-import sanity check (info)
//!
//! Only files with a recognised source extension are checked. Deleted files
//! and anything else are skipped silently.
//!
//! ## Example
//!
//! ```
//! use oven::packet::FileChange;
//! use oven::validator::Validator;
//!
//! let files = vec![
//!     FileChange::create("src/ok.ts", "export function f() { return (1 + 2); }\n"),
//!     FileChange::create("src/bad.ts", "export function g() { return (1 + 2; }\n"),
//! ];
//! let result = Validator::new().validate(&files);
//!
//! assert!(!result.valid);
//! assert_eq!(result.syntax_errors.len(), 1);
//! assert_eq!(result.syntax_errors[0].file, "src/bad.ts");
//! ```

pub mod imports;
pub mod lint;
pub mod syntax;
pub mod types;

pub use types::{IssueSeverity, ValidationIssue, ValidationResult};

use crate::packet::{FileChange, FileOperation};

/// Extensions treated as source code.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Extensions whose files are statically typed (subject to `no-explicit-any`).
pub const TYPED_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// Default line-length limit for the `max-line-length` rule.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 200;

/// Stateless validator. The same input always produces the same result.
#[derive(Debug, Clone)]
pub struct Validator {
    max_line_length: usize,
    check_imports: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            check_imports: true,
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Enable or disable the cross-file import pass.
    pub fn with_import_check(mut self, enabled: bool) -> Self {
        self.check_imports = enabled;
        self
    }

    /// Validate a set of files.
    ///
    /// Per file (in input order): balance scan, then lint. The import pass
    /// runs last over the whole set and appends to `lint_warnings`.
    pub fn validate(&self, files: &[FileChange]) -> ValidationResult {
        let mut result = ValidationResult::default();
        let sources: Vec<&FileChange> = files.iter().filter(|f| is_checked(f)).collect();

        for file in &sources {
            for issue in syntax::check_balance(&file.path, &file.content) {
                result.push(issue);
            }
            let typed = is_typed(file);
            for issue in lint::lint_lines(&file.path, &file.content, typed, self.max_line_length) {
                result.push(issue);
            }
        }

        if self.check_imports {
            for issue in imports::check_imports(&sources) {
                result.push(issue);
            }
        }

        result
    }
}

/// Whether the validator looks at this file at all.
pub fn is_checked(file: &FileChange) -> bool {
    file.operation != FileOperation::Delete && is_source_file(&file.path)
}

/// Whether a path has a recognised source extension.
pub fn is_source_file(path: &str) -> bool {
    extension_in(path, SOURCE_EXTENSIONS)
}

fn is_typed(file: &FileChange) -> bool {
    extension_in(&file.path, TYPED_EXTENSIONS)
}

fn extension_in(path: &str, extensions: &[&str]) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
}
