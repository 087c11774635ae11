//! Blocking rule parsing.
//!
//! A blocking rule is a predicate over a pair of aliased records, such as
//! `l.surname = r.surname`. Cardinality analysis only understands rules that
//! compare one column for equality across the two aliases; everything else is
//! parsed into [`RuleKind::Unsupported`] so the analyzer can skip it without
//! re-reading the text.
//!
//! # Example
//!
//! ```rust
//! use term_linkage::rules::{extract_column, BlockingRule, RuleKind};
//!
//! assert_eq!(extract_column("l.city = r.city").as_deref(), Some("city"));
//! assert_eq!(extract_column("block_on('surname')").as_deref(), Some("surname"));
//! assert_eq!(extract_column("l.city = r.city AND l.dob = r.dob"), None);
//!
//! let rule = BlockingRule::parse("left.email=right.email");
//! assert!(matches!(rule.kind(), RuleKind::ColumnEquality { .. }));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LinkageError, Result};

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";

// These regexes are compile-time constants and known to be valid
#[allow(clippy::expect_used)]
static EQUALITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^({IDENT})\s*\.\s*({IDENT})\s*=\s*({IDENT})\s*\.\s*({IDENT})$"
    ))
    .expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static BLOCK_ON_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"^block_on\(\s*['"]({IDENT})['"]\s*\)$"#))
        .expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static COMPOUND_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(and|or)\b").expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"\b{IDENT}\s*\.\s*({IDENT})|block_on\(\s*['"]({IDENT})['"]"#))
        .expect("Hard-coded regex pattern should be valid")
});

/// Why a rule cannot be used for cardinality estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnsupportedReason {
    /// The rule text is blank.
    Empty,
    /// The rule combines several conditions with AND/OR.
    Compound,
    /// Both sides compare different columns.
    DifferentColumns { left: String, right: String },
    /// Both sides use the same record alias.
    SameAlias { alias: String },
    /// The rule does not have a recognised shape.
    Unrecognised,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "rule is empty"),
            Self::Compound => write!(f, "compound rules are not supported for estimation"),
            Self::DifferentColumns { left, right } => {
                write!(f, "rule compares different columns ('{left}' and '{right}')")
            }
            Self::SameAlias { alias } => {
                write!(f, "both sides of the rule use alias '{alias}'")
            }
            Self::Unrecognised => {
                write!(f, "expected '<left>.<column> = <right>.<column>'")
            }
        }
    }
}

/// Parsed shape of a blocking rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Equality of one column between two aliased record sets.
    ColumnEquality {
        left_alias: String,
        right_alias: String,
        column: String,
    },
    /// Anything the estimator cannot handle.
    Unsupported(UnsupportedReason),
}

/// A blocking rule together with the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingRule {
    text: String,
    kind: RuleKind,
}

impl BlockingRule {
    /// Parses rule text. Never fails; unrecognised text becomes
    /// [`RuleKind::Unsupported`].
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = parse_kind(&text);
        Self { text, kind }
    }

    /// The original rule text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed shape.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// The compared column, if this is a single-column equality rule.
    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::ColumnEquality { column, .. } => Some(column),
            RuleKind::Unsupported(_) => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self.kind, RuleKind::ColumnEquality { .. })
    }
}

impl fmt::Display for BlockingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returns the column compared by a single-column equality rule.
///
/// Returns `None` for anything else. That is not an error: callers treat the
/// rule as unanalyzable and skip it.
pub fn extract_column(predicate: &str) -> Option<String> {
    BlockingRule::parse(predicate).column().map(str::to_string)
}

fn parse_kind(text: &str) -> RuleKind {
    let trimmed = strip_outer_parens(text.trim());
    if trimmed.is_empty() {
        return RuleKind::Unsupported(UnsupportedReason::Empty);
    }

    if let Some(caps) = BLOCK_ON_REGEX.captures(trimmed) {
        return RuleKind::ColumnEquality {
            left_alias: "l".to_string(),
            right_alias: "r".to_string(),
            column: caps[1].to_string(),
        };
    }

    // A full equality match holds no connective, so `and`/`or` there are
    // column or alias names
    if let Some(caps) = EQUALITY_REGEX.captures(trimmed) {
        return equality_kind(&caps[1], &caps[2], &caps[3], &caps[4]);
    }

    if COMPOUND_REGEX.is_match(trimmed) {
        RuleKind::Unsupported(UnsupportedReason::Compound)
    } else {
        RuleKind::Unsupported(UnsupportedReason::Unrecognised)
    }
}

fn equality_kind(
    left_alias: &str,
    left_column: &str,
    right_alias: &str,
    right_column: &str,
) -> RuleKind {
    if left_column != right_column {
        return RuleKind::Unsupported(UnsupportedReason::DifferentColumns {
            left: left_column.to_string(),
            right: right_column.to_string(),
        });
    }
    if left_alias == right_alias {
        return RuleKind::Unsupported(UnsupportedReason::SameAlias {
            alias: left_alias.to_string(),
        });
    }

    RuleKind::ColumnEquality {
        left_alias: left_alias.to_string(),
        right_alias: right_alias.to_string(),
        column: left_column.to_string(),
    }
}

/// Removes balanced parentheses wrapping the whole expression.
fn strip_outer_parens(mut text: &str) -> &str {
    while text.starts_with('(') && text.ends_with(')') && wraps_whole(text) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

fn wraps_whole(text: &str) -> bool {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && idx != text.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Every column referenced as `<alias>.<column>` (or via `block_on`) in a
/// rule, deduplicated in first-seen order.
pub fn referenced_columns(rule: &str) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for caps in REFERENCE_REGEX.captures_iter(rule) {
        if let Some(column) = caps.get(1).or_else(|| caps.get(2)) {
            let column = column.as_str();
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}

/// Checks that every column a rule references exists in the table.
pub fn validate_rule_columns(rule: &str, table: &str, existing_columns: &[String]) -> Result<()> {
    match referenced_columns(rule)
        .into_iter()
        .find(|column| !existing_columns.contains(column))
    {
        Some(missing) => Err(LinkageError::column_not_found(table, missing)),
        None => Ok(()),
    }
}

/// Keeps only the rules whose referenced columns all exist, preserving order.
pub fn retain_valid_rules<S: AsRef<str>>(rules: &[S], existing_columns: &[String]) -> Vec<String> {
    rules
        .iter()
        .map(AsRef::as_ref)
        .filter(|rule| {
            referenced_columns(rule)
                .iter()
                .all(|column| existing_columns.contains(column))
        })
        .map(str::to_string)
        .collect()
}
