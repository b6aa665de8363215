//! Parsing of untrusted model output.
//!
//! Every parser tries structured JSON first and falls back to line-based
//! heuristics. The result records which path produced the data.

mod fridge;
mod scan;

pub use fridge::{fallback_recipe, parse_ingredient_list, parse_recipe_suggestions};
pub use scan::parse_scanned_recipe;

use regex::Regex;
use std::sync::LazyLock;

/// Most ingredients kept from a free-text fridge response.
pub const MAX_FALLBACK_INGREDIENTS: usize = 10;
/// Most ingredient lines kept from a free-text recipe scan.
pub const MAX_SCAN_INGREDIENTS: usize = 15;
/// Most instruction lines kept from a free-text recipe scan.
pub const MAX_SCAN_INSTRUCTIONS: usize = 10;

/// Which parsing path produced a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    /// The response was valid JSON of the expected shape.
    Structured(T),
    /// JSON parsing failed and the text heuristics found something.
    Heuristic(T),
    /// Neither path produced usable data.
    Empty,
}

impl<T> ParseOutcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            ParseOutcome::Structured(v) | ParseOutcome::Heuristic(v) => Some(v),
            ParseOutcome::Empty => None,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ParseOutcome::Structured(_))
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, ParseOutcome::Heuristic(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ParseOutcome::Empty)
    }

    /// Short label for logs.
    pub fn path(&self) -> &'static str {
        match self {
            ParseOutcome::Structured(_) => "structured",
            ParseOutcome::Heuristic(_) => "heuristic",
            ParseOutcome::Empty => "empty",
        }
    }
}

/// Markdown code fence around a JSON payload, e.g. ```json ... ```
static CODE_FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*\n?(.*?)\n?\s*```$").expect("Invalid code fence regex")
});

/// Leading list marker: bullets, or list numbering like "1." / "2)".
static LIST_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•·]+\s*|\d+[.)](?:\s+|$))").expect("Invalid list marker regex")
});

/// The text to hand to the JSON parser: trimmed, with a surrounding code fence removed.
fn json_candidate(text: &str) -> &str {
    let trimmed = text.trim();
    CODE_FENCE_REGEX
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

/// Remove a leading bullet or list number and surrounding whitespace.
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();
    match LIST_MARKER_REGEX.find(trimmed) {
        Some(m) => trimmed[m.end()..].trim(),
        None => trimmed,
    }
}
