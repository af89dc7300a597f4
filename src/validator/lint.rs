//! Per-line lint heuristics.
//!
//! Each rule looks at one line in isolation:
//!
//! | Rule              | Severity | Trigger                                        |
//! |-------------------|----------|------------------------------------------------|
//! | `no-console`      | warning  | `console.log/debug/info/trace(` debug prints   |
//! | `todo-comment`    | info     | `TODO`, `FIXME`, `XXX`, `HACK` in a comment    |
//! | `max-line-length` | warning  | line longer than the configured limit          |
//! | `no-explicit-any` | warning  | `: any`, `as any`, `<any>` in typed files      |
//! | `eqeqeq`          | warning  | `==` / `!=` not against `null` / `undefined`   |

use regex::Regex;
use std::sync::LazyLock;

use super::types::{IssueSeverity, ValidationIssue};

static CONSOLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bconsole\.(log|debug|info|trace)\s*\(").unwrap());

static TODO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?://|/\*|^\s*\*).*?\b(TODO|FIXME|XXX|HACK)\b").unwrap()
});

static ANY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*any\b|\bas\s+any\b|<any>").unwrap());

static NULLISH_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(null|undefined)\b").unwrap());

static NULLISH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(null|undefined)\s*$").unwrap());

/// Run every line rule over `content`.
pub fn lint_lines(
    file: &str,
    content: &str,
    typed: bool,
    max_line_length: usize,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(m) = CONSOLE_REGEX.find(line) {
            issues.push(
                ValidationIssue::new(
                    IssueSeverity::Warning,
                    file,
                    line_no,
                    "Debug print left in code",
                )
                .with_column(column_of(line, m.start()))
                .with_rule("no-console"),
            );
        }

        if let Some(caps) = TODO_REGEX.captures(line)
            && let Some(tag) = caps.get(1)
        {
            issues.push(
                ValidationIssue::new(
                    IssueSeverity::Info,
                    file,
                    line_no,
                    format!("{} comment", tag.as_str()),
                )
                .with_column(column_of(line, tag.start()))
                .with_rule("todo-comment"),
            );
        }

        let length = line.chars().count();
        if length > max_line_length {
            issues.push(
                ValidationIssue::new(
                    IssueSeverity::Warning,
                    file,
                    line_no,
                    format!(
                        "Line is {} characters long (max {})",
                        length, max_line_length
                    ),
                )
                .with_rule("max-line-length"),
            );
        }

        if typed && let Some(m) = ANY_REGEX.find(line) {
            issues.push(
                ValidationIssue::new(
                    IssueSeverity::Warning,
                    file,
                    line_no,
                    "Explicit 'any' type",
                )
                .with_column(column_of(line, m.start()))
                .with_rule("no-explicit-any"),
            );
        }

        if let Some(offset) = find_loose_equality(line) {
            let op = &line[offset..offset + 2];
            let strict = if op == "==" { "===" } else { "!==" };
            issues.push(
                ValidationIssue::new(
                    IssueSeverity::Warning,
                    file,
                    line_no,
                    format!("Use '{}' instead of '{}'", strict, op),
                )
                .with_column(column_of(line, offset))
                .with_rule("eqeqeq"),
            );
        }
    }

    issues
}

/// Byte offset of the first `==` or `!=` on the line that is neither part
/// of a strict operator nor a comparison against `null`/`undefined`.
fn find_loose_equality(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;

    while i + 1 < bytes.len() {
        let pair = (bytes[i], bytes[i + 1]);
        let is_candidate = match pair {
            (b'=', b'=') => i == 0 || !matches!(bytes[i - 1], b'=' | b'!' | b'<' | b'>'),
            (b'!', b'=') => true,
            _ => false,
        };
        if !is_candidate {
            i += 1;
            continue;
        }
        if bytes.get(i + 2) == Some(&b'=') {
            // Strict operator: skip all three characters.
            i += 3;
            continue;
        }

        let before = &line[..i];
        let after = &line[i + 2..];
        if !NULLISH_PREFIX.is_match(after) && !NULLISH_SUFFIX.is_match(before) {
            return Some(i);
        }
        i += 2;
    }

    None
}

/// 1-based character column for a byte offset.
fn column_of(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count() + 1
}
