use anyhow::{Context, Result};
use larder_core::parse::{parse_ingredient_list, parse_recipe_suggestions, parse_scanned_recipe};
use larder_core::ParseOutcome;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::ResponseKind;

#[derive(Serialize)]
struct ParsedResponse<T> {
    path: &'static str,
    value: Option<T>,
}

impl<T> From<ParseOutcome<T>> for ParsedResponse<T> {
    fn from(outcome: ParseOutcome<T>) -> Self {
        Self {
            path: outcome.path(),
            value: outcome.into_value(),
        }
    }
}

/// Parse a saved model response and print which path was taken plus the result.
pub fn parse_response(kind: ResponseKind, file: &Path, ingredients: &[String]) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read response file: {}", file.display()))?;

    let json = match kind {
        ResponseKind::Ingredients => {
            serde_json::to_string_pretty(&ParsedResponse::from(parse_ingredient_list(&text)))?
        }
        ResponseKind::Recipes => serde_json::to_string_pretty(&ParsedResponse::from(
            parse_recipe_suggestions(&text, ingredients),
        ))?,
        ResponseKind::Scan => {
            serde_json::to_string_pretty(&ParsedResponse::from(parse_scanned_recipe(&text)))?
        }
    };

    println!("{}", json);
    Ok(())
}
