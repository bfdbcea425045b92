use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parse::canonical::canonicalize;

/// Shown to the operator when input does not parse.
pub const FORMAT_HINT: &str = "expected: <ward><bed> <task>, e.g. `5a01 check K+`";

/// Ward (1–2 digits + A–D), bed (1–2 digits + optional letter), then
/// optional whitespace-separated task text.
static PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(\d{1,2}[a-d])(\d{1,2}[a-z]?)(?:\s+(.*))?$").expect("valid prefix regex")
});

/// The same token as a standalone word anywhere in the line.
static ANYWHERE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)(\d{1,2}[a-d])(\d{1,2}[a-z]?)(?:\s|$)")
        .expect("valid anywhere regex")
});

/// First prototype grammar: any digits, any letters, mandatory task text.
static UNPADDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(\d+[a-z])(\d+[a-z])\s+(.+)$").expect("valid unpadded regex")
});

/// Which shorthand grammar to apply. The grammars disagree on ambiguous
/// input, so exactly one is active per board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// `5a01 check K+`: the token must lead the line. Canonical.
    #[default]
    Prefix,
    /// `check K+ 5a01 stat`: token anywhere; a bare token keeps the whole
    /// line as the task text.
    Anywhere,
    /// `5A01A check K+` → `5A-01A`, no padding, task text required.
    Unpadded,
}

impl Grammar {
    pub fn parse_grammar(s: &str) -> Option<Grammar> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefix" => Some(Grammar::Prefix),
            "anywhere" => Some(Grammar::Anywhere),
            "unpadded" => Some(Grammar::Unpadded),
            _ => None,
        }
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grammar::Prefix => write!(f, "prefix"),
            Grammar::Anywhere => write!(f, "anywhere"),
            Grammar::Unpadded => write!(f, "unpadded"),
        }
    }
}

/// A successfully parsed line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedInput {
    pub bed_label: String,
    /// Trimmed task text; may be empty, in which case the store rejects it
    pub task_text: String,
}

/// The input did not fit the active grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no bed token recognized ({})", FORMAT_HINT)]
pub struct NoMatch;

/// Parse a line with the canonical prefix grammar.
pub fn parse(raw: &str) -> Result<ParsedInput, NoMatch> {
    parse_with(raw, Grammar::Prefix)
}

/// Parse a line with the given grammar.
pub fn parse_with(raw: &str, grammar: Grammar) -> Result<ParsedInput, NoMatch> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NoMatch);
    }
    let parsed = match grammar {
        Grammar::Prefix => parse_prefix(trimmed),
        Grammar::Anywhere => parse_anywhere(trimmed),
        Grammar::Unpadded => parse_unpadded(trimmed),
    };
    match &parsed {
        Some(p) => debug!("{grammar} grammar: {trimmed:?} -> {}", p.bed_label),
        None => debug!("{grammar} grammar: no match for {trimmed:?}"),
    }
    parsed.ok_or(NoMatch)
}

fn parse_prefix(s: &str) -> Option<ParsedInput> {
    let caps = PREFIX.captures(s)?;
    let task_text = caps.get(3).map_or("", |m| m.as_str()).trim();
    Some(ParsedInput {
        bed_label: canonicalize(&caps[1], &caps[2]),
        task_text: task_text.to_string(),
    })
}

fn parse_anywhere(s: &str) -> Option<ParsedInput> {
    let caps = ANYWHERE.captures(s)?;
    let whole = caps.get(0)?;
    let before = s[..whole.start()].trim();
    let after = s[whole.end()..].trim();
    let remainder = [before, after]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let task_text = if remainder.is_empty() {
        s.to_string()
    } else {
        remainder
    };
    Some(ParsedInput {
        bed_label: canonicalize(&caps[1], &caps[2]),
        task_text,
    })
}

fn parse_unpadded(s: &str) -> Option<ParsedInput> {
    let caps = UNPADDED.captures(s)?;
    Some(ParsedInput {
        bed_label: format!(
            "{}-{}",
            caps[1].to_ascii_uppercase(),
            caps[2].to_ascii_uppercase()
        ),
        task_text: caps[3].trim().to_string(),
    })
}
