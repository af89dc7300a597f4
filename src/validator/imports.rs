//! Cross-file import sanity check.
//!
//! Collects every top-level exported name across the file set, then flags
//! named imports from relative paths (`./`, `../`) whose name nobody
//! exports. Module graphs are not resolved: namespace imports, re-exports
//! through `export *` and default imports are not followed, so results are
//! advisory and reported at info severity.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::types::{IssueSeverity, ValidationIssue};
use crate::packet::FileChange;

static EXPORT_DECL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*export\s+(?:default\s+)?(?:declare\s+)?(?:async\s+)?(?:abstract\s+)?(?:function\*?|const|let|var|class|interface|type|enum)\s+([A-Za-z_$][\w$]*)",
    )
    .unwrap()
});

static EXPORT_LIST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*export\s+(?:type\s+)?\{([^}]*)\}").unwrap());

static NAMED_IMPORT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"import\s+(?:type\s+)?(?:[A-Za-z_$][\w$]*\s*,\s*)?\{([^}]*)\}\s*from\s*['"](\.{1,2}/[^'"]*)['"]"#,
    )
    .unwrap()
});

/// Every name exported at top level by any of `files`.
pub fn collect_exports<'a>(files: impl IntoIterator<Item = &'a FileChange>) -> HashSet<String> {
    let mut exports = HashSet::new();

    for file in files {
        for cap in EXPORT_DECL_REGEX.captures_iter(&file.content) {
            if let Some(name) = cap.get(1) {
                exports.insert(name.as_str().to_string());
            }
        }
        for cap in EXPORT_LIST_REGEX.captures_iter(&file.content) {
            if let Some(list) = cap.get(1) {
                // `export { a, b as c }` exports `a` and `c`.
                for item in split_specifiers(list.as_str()) {
                    let exported = match item.split_once(" as ") {
                        Some((_, alias)) => alias.trim(),
                        None => item,
                    };
                    if !exported.is_empty() {
                        exports.insert(exported.to_string());
                    }
                }
            }
        }
    }

    exports
}

/// Flag relative named imports that no file in the set exports.
pub fn check_imports<'a>(files: &[&'a FileChange]) -> Vec<ValidationIssue> {
    let exports = collect_exports(files.iter().copied());
    let mut issues = Vec::new();

    for file in files {
        for cap in NAMED_IMPORT_REGEX.captures_iter(&file.content) {
            let (Some(list), Some(source)) = (cap.get(1), cap.get(2)) else {
                continue;
            };
            let line = line_of(&file.content, list.start());

            for item in split_specifiers(list.as_str()) {
                // `import { a as b }` needs `a` to be exported.
                let imported = match item.split_once(" as ") {
                    Some((name, _)) => name.trim(),
                    None => item,
                };
                if imported.is_empty() || exports.contains(imported) {
                    continue;
                }
                issues.push(
                    ValidationIssue::new(
                        IssueSeverity::Info,
                        &file.path,
                        line,
                        format!(
                            "'{}' imported from '{}' is not exported by any generated file",
                            imported,
                            source.as_str()
                        ),
                    )
                    .with_rule("unresolved-import"),
                );
            }
        }
    }

    issues
}

/// Split an import/export specifier list, dropping `type` modifiers and
/// empty entries (trailing commas).
fn split_specifiers(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(|item| item.trim())
        .map(|item| item.strip_prefix("type ").map(str::trim).unwrap_or(item))
        .filter(|item| !item.is_empty())
}

/// 1-based line number of a byte offset.
fn line_of(content: &str, byte_offset: usize) -> usize {
    content[..byte_offset].matches('\n').count() + 1
}
