//! Bracket, parenthesis and quote balance scan.
//!
//! A single left-to-right pass over the file. Three independent stacks track
//! open `{`, `(` and `[` positions; two string modes track quoted strings
//! (`'`, `"`) and template strings (`` ` ``). Inside any string or comment
//! bracket characters are ignored.
//!
//! A closing token with nothing open is reported where it occurs and then
//! dropped, so one stray `}` does not turn every later line into an error.
//! A quoted string still open at the end of its line is reported as
//! unterminated. Template strings may span lines. Whatever is still open at
//! end of file produces exactly one error per bracket kind, naming the count.

use super::types::{IssueSeverity, ValidationIssue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BracketKind {
    Brace,
    Paren,
    Bracket,
}

impl BracketKind {
    fn from_open(c: char) -> Option<Self> {
        match c {
            '{' => Some(Self::Brace),
            '(' => Some(Self::Paren),
            '[' => Some(Self::Bracket),
            _ => None,
        }
    }

    fn from_close(c: char) -> Option<Self> {
        match c {
            '}' => Some(Self::Brace),
            ')' => Some(Self::Paren),
            ']' => Some(Self::Bracket),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Brace => 0,
            Self::Paren => 1,
            Self::Bracket => 2,
        }
    }

    fn open(self) -> char {
        match self {
            Self::Brace => '{',
            Self::Paren => '(',
            Self::Bracket => '[',
        }
    }

    fn close(self) -> char {
        match self {
            Self::Brace => '}',
            Self::Paren => ')',
            Self::Bracket => ']',
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Self::Brace => "braces",
            Self::Paren => "parentheses",
            Self::Bracket => "brackets",
        }
    }

    fn rule(self) -> &'static str {
        match self {
            Self::Brace => "unbalanced-brace",
            Self::Paren => "unbalanced-paren",
            Self::Bracket => "unbalanced-bracket",
        }
    }

    const ALL: [BracketKind; 3] = [Self::Brace, Self::Paren, Self::Bracket];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    Quoted { quote: char, line: usize, column: usize },
    Template { line: usize, column: usize },
    BlockComment,
}

/// Scan `content` and return every syntax error found, in source order
/// (end-of-file imbalances last).
pub fn check_balance(file: &str, content: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    // Open positions (line, column) per bracket kind.
    let mut open: [Vec<(usize, usize)>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    let mut mode = Mode::Code;
    let mut escaped = false;

    for (line_idx, line) in content.lines().enumerate() {
        let line_no = line_idx + 1;
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let column = i + 1;

            match mode {
                Mode::BlockComment => {
                    if c == '*' && chars.get(i + 1) == Some(&'/') {
                        mode = Mode::Code;
                        i += 1;
                    }
                }
                Mode::Quoted { quote, .. } => {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == quote {
                        mode = Mode::Code;
                    }
                }
                Mode::Template { .. } => {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '`' {
                        mode = Mode::Code;
                    }
                }
                Mode::Code => match c {
                    '/' if chars.get(i + 1) == Some(&'/') => break,
                    '/' if chars.get(i + 1) == Some(&'*') => {
                        mode = Mode::BlockComment;
                        i += 1;
                    }
                    '\'' | '"' => {
                        mode = Mode::Quoted {
                            quote: c,
                            line: line_no,
                            column,
                        };
                    }
                    '`' => {
                        mode = Mode::Template {
                            line: line_no,
                            column,
                        };
                    }
                    _ => {
                        if let Some(kind) = BracketKind::from_open(c) {
                            open[kind.index()].push((line_no, column));
                        } else if let Some(kind) = BracketKind::from_close(c)
                            && open[kind.index()].pop().is_none()
                        {
                            issues.push(
                                ValidationIssue::new(
                                    IssueSeverity::Error,
                                    file,
                                    line_no,
                                    format!("Unexpected closing '{}'", kind.close()),
                                )
                                .with_column(column)
                                .with_rule(kind.rule()),
                            );
                        }
                    }
                },
            }
            i += 1;
        }

        // A quoted string cannot span lines unless the newline is escaped.
        if let Mode::Quoted { line, column, .. } = mode {
            if escaped {
                escaped = false;
            } else {
                issues.push(
                    ValidationIssue::new(
                        IssueSeverity::Error,
                        file,
                        line,
                        "Unterminated string literal",
                    )
                    .with_column(column)
                    .with_rule("unterminated-string"),
                );
                mode = Mode::Code;
            }
        }
    }

    if let Mode::Template { line, column } = mode {
        issues.push(
            ValidationIssue::new(
                IssueSeverity::Error,
                file,
                line,
                "Unterminated template literal",
            )
            .with_column(column)
            .with_rule("unterminated-template"),
        );
    }

    for kind in BracketKind::ALL {
        let unclosed = &open[kind.index()];
        if let Some(&(line, column)) = unclosed.first() {
            let count = unclosed.len();
            issues.push(
                ValidationIssue::new(
                    IssueSeverity::Error,
                    file,
                    line,
                    format!(
                        "Unbalanced {}: {} unclosed '{}' (missing {} closing '{}')",
                        kind.plural(),
                        count,
                        kind.open(),
                        count,
                        kind.close()
                    ),
                )
                .with_column(column)
                .with_rule(kind.rule()),
            );
        }
    }

    issues
}
