use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::{
    json_candidate, strip_list_marker, ParseOutcome, MAX_SCAN_INGREDIENTS, MAX_SCAN_INSTRUCTIONS,
};
use crate::types::ScannedRecipe;

/// Cooking verbs as whole words ("Stir", "bakes"), so "heated" or "cookies" do not count.
static ACTION_VERB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:cook|add|mix|heat|bake|stir)s?\b").expect("Invalid action verb regex")
});

/// A step that opens with a cooking verb, e.g. "Add the eggs".
static LEADING_VERB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:cook|add|mix|heat|bake|stir)s?\b").expect("Invalid leading verb regex")
});

/// Measuring units as whole words, so "Cupcakes" is not an ingredient line.
static UNIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:cups?|tbsps?|tsps?)\b").expect("Invalid unit regex")
});

/// Instruction lines must be longer than this.
const MIN_INSTRUCTION_CHARS: usize = 20;

/// Title lines must fit within these bounds (in characters).
const MIN_TITLE_CHARS: usize = 5;
const MAX_TITLE_CHARS: usize = 50;

/// Parse the response to the recipe-scan prompt.
///
/// A JSON object is merged onto [`ScannedRecipe::default`], so missing fields
/// keep their defaults. Free text goes through line heuristics. A recipe with
/// neither ingredients nor instructions is [`ParseOutcome::Empty`].
pub fn parse_scanned_recipe(text: &str) -> ParseOutcome<ScannedRecipe> {
    match serde_json::from_str::<Value>(json_candidate(text)) {
        Ok(Value::Object(fields)) => {
            let recipe = merge_onto_default(&fields);
            if has_content(&recipe) {
                ParseOutcome::Structured(recipe)
            } else {
                ParseOutcome::Empty
            }
        }
        _ => {
            let recipe = extract_from_text(text);
            if has_content(&recipe) {
                ParseOutcome::Heuristic(recipe)
            } else {
                ParseOutcome::Empty
            }
        }
    }
}

fn has_content(recipe: &ScannedRecipe) -> bool {
    !recipe.ingredients.is_empty() || !recipe.instructions.is_empty()
}

fn merge_onto_default(fields: &Map<String, Value>) -> ScannedRecipe {
    let defaults = ScannedRecipe::default();

    ScannedRecipe {
        name: string_field(fields, "name").unwrap_or(defaults.name),
        ingredients: list_field(fields, "ingredients").unwrap_or(defaults.ingredients),
        instructions: list_field(fields, "instructions").unwrap_or(defaults.instructions),
        cooking_time: string_field(fields, "cookingTime").or(defaults.cooking_time),
        servings: string_field(fields, "servings").or(defaults.servings),
        difficulty: string_field(fields, "difficulty").or(defaults.difficulty),
        category: string_field(fields, "category").or(defaults.category),
    }
}

/// A non-blank string, or a number rendered as text (models often send `"servings": 4`).
fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An array of strings, or a single newline-separated string.
fn list_field(fields: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match fields.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) => Some(
            s.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

fn is_instruction_line(line: &str) -> bool {
    line.chars().count() > MIN_INSTRUCTION_CHARS && ACTION_VERB_REGEX.is_match(line)
}

fn is_ingredient_line(line: &str) -> bool {
    let starts_with_marker = line
        .chars()
        .next()
        .is_some_and(|c| matches!(c, '-' | '*' | '•' | '·') || c.is_ascii_digit());
    starts_with_marker || UNIT_REGEX.is_match(line)
}

enum LineKind {
    Ingredient,
    Instruction,
}

/// A line that looks like both is a step only when it opens with the verb
/// ("Add 2 cups flour"); otherwise the measurement wins ("1 cup milk, add slowly").
fn classify(line: &str) -> Option<LineKind> {
    let ingredient = is_ingredient_line(line);
    if is_instruction_line(line)
        && (!ingredient || LEADING_VERB_REGEX.is_match(strip_list_marker(line)))
    {
        Some(LineKind::Instruction)
    } else if ingredient {
        Some(LineKind::Ingredient)
    } else {
        None
    }
}

fn is_title_keyword_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    (lower.contains("recipe") || lower.contains("title")) && classify(line).is_none()
}

fn is_short_heading(line: &str) -> bool {
    !line.contains(':') && classify(line).is_none() && fits_title(line)
}

fn fits_title(title: &str) -> bool {
    (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&title.chars().count())
}

/// Drop Markdown heading marks and a leading "Title:" or "Recipe:" label.
fn clean_title(line: &str) -> String {
    let line = line.trim_start_matches('#').trim();
    let lower = line.to_lowercase();
    for label in ["title:", "recipe:", "recipe name:"] {
        if !lower.starts_with(label) {
            continue;
        }
        if let Some(rest) = line.get(label.len()..).map(str::trim) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    line.to_string()
}

fn extract_from_text(text: &str) -> ScannedRecipe {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let title_index = lines
        .iter()
        .position(|line| is_title_keyword_line(line) && fits_title(&clean_title(line)))
        .or_else(|| lines.iter().position(|line| is_short_heading(line)));

    let mut recipe = ScannedRecipe::default();
    if let Some(index) = title_index {
        let title = clean_title(lines[index]);
        if !title.is_empty() {
            recipe.name = title;
        }
    }

    for (index, line) in lines.iter().enumerate() {
        if Some(index) == title_index {
            continue;
        }

        match classify(line) {
            Some(LineKind::Instruction) => {
                if recipe.instructions.len() < MAX_SCAN_INSTRUCTIONS {
                    recipe.instructions.push(strip_list_marker(line).to_string());
                }
            }
            Some(LineKind::Ingredient) => {
                let item = strip_list_marker(line);
                if !item.is_empty() && recipe.ingredients.len() < MAX_SCAN_INGREDIENTS {
                    recipe.ingredients.push(item.to_string());
                }
            }
            None => {}
        }
    }

    recipe
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_SCAN_NAME;

    #[test]
    fn test_full_json_is_structured() {
        let text = r#"{
            "name": "Banana Bread",
            "ingredients": ["3 ripe bananas", "2 cups flour"],
            "instructions": ["Mash the bananas", "Bake for 60 minutes"],
            "cookingTime": "1 hour",
            "servings": "8",
            "difficulty": "Easy",
            "category": "Dessert"
        }"#;

        let ParseOutcome::Structured(recipe) = parse_scanned_recipe(text) else {
            panic!("expected structured recipe");
        };
        assert_eq!(recipe.name, "Banana Bread");
        assert_eq!(recipe.ingredients, vec!["3 ripe bananas", "2 cups flour"]);
        assert_eq!(
            recipe.instructions,
            vec!["Mash the bananas", "Bake for 60 minutes"]
        );
        assert_eq!(recipe.cooking_time.as_deref(), Some("1 hour"));
        assert_eq!(recipe.servings.as_deref(), Some("8"));
        assert_eq!(recipe.difficulty.as_deref(), Some("Easy"));
        assert_eq!(recipe.category.as_deref(), Some("Dessert"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let text = r#"{"ingredients": ["1 egg"], "servings": 4}"#;
        let recipe = parse_scanned_recipe(text).into_value().unwrap();
        assert_eq!(recipe.name, DEFAULT_SCAN_NAME);
        assert_eq!(recipe.ingredients, vec!["1 egg"]);
        assert!(recipe.instructions.is_empty());
        assert_eq!(recipe.servings.as_deref(), Some("4"));
        assert_eq!(recipe.cooking_time, None);
    }

    #[test]
    fn test_json_without_content_is_empty() {
        assert!(parse_scanned_recipe(r#"{"name": "Mystery"}"#).is_empty());
    }

    #[test]
    fn test_text_recipe_uses_heuristics() {
        let text = "\
Grandma's Pancakes
Ingredients:
2 cups flour
- 1 egg
• 1 tbsp sugar
Instructions:
1. Mix the flour and sugar in a large bowl.
2. Add the egg and whisk until smooth.
3. Cook on a hot griddle until golden.";

        let ParseOutcome::Heuristic(recipe) = parse_scanned_recipe(text) else {
            panic!("expected heuristic recipe");
        };
        assert_eq!(recipe.name, "Grandma's Pancakes");
        assert_eq!(recipe.ingredients, vec!["2 cups flour", "1 egg", "1 tbsp sugar"]);
        assert_eq!(
            recipe.instructions,
            vec![
                "Mix the flour and sugar in a large bowl.",
                "Add the egg and whisk until smooth.",
                "Cook on a hot griddle until golden."
            ]
        );
    }

    #[test]
    fn test_title_keyword_line_wins() {
        let text = "Some notes\nTitle: Lemon Tart\n1 cup sugar";
        let recipe = parse_scanned_recipe(text).into_value().unwrap();
        assert_eq!(recipe.name, "Lemon Tart");
    }

    #[test]
    fn test_ingredient_line_is_not_mistaken_for_title() {
        let recipe = parse_scanned_recipe("2 cups flour\n1 tsp salt")
            .into_value()
            .unwrap();
        assert_eq!(recipe.name, DEFAULT_SCAN_NAME);
        assert_eq!(recipe.ingredients, vec!["2 cups flour", "1 tsp salt"]);
    }

    #[test]
    fn test_heuristic_caps() {
        let mut text = String::from("Big Batch Stew\n");
        for i in 0..30 {
            text.push_str(&format!("- item number {}\n", i));
        }
        for i in 0..30 {
            text.push_str(&format!("Stir the pot slowly for round {}\n", i));
        }

        let recipe = parse_scanned_recipe(&text).into_value().unwrap();
        assert_eq!(recipe.ingredients.len(), MAX_SCAN_INGREDIENTS);
        assert_eq!(recipe.instructions.len(), MAX_SCAN_INSTRUCTIONS);
        assert_eq!(recipe.ingredients[0], "item number 0");
        assert_eq!(recipe.instructions[0], "Stir the pot slowly for round 0");
    }

    #[test]
    fn test_measured_lines_with_verb_fragments_stay_ingredients() {
        let ParseOutcome::Heuristic(recipe) =
            parse_scanned_recipe("2 cups heavy cream, heated\n1 cup chocolate cookies, crushed")
        else {
            panic!("expected heuristic recipe");
        };
        assert_eq!(
            recipe.ingredients,
            vec!["2 cups heavy cream, heated", "1 cup chocolate cookies, crushed"]
        );
        assert!(recipe.instructions.is_empty());
    }

    #[test]
    fn test_measurement_beats_verb_unless_line_opens_with_it() {
        let text = "1 cup milk, add slowly while whisking\nAdd 2 cups flour and mix until smooth";
        let recipe = parse_scanned_recipe(text).into_value().unwrap();
        assert_eq!(recipe.ingredients, vec!["1 cup milk, add slowly while whisking"]);
        assert_eq!(
            recipe.instructions,
            vec!["Add 2 cups flour and mix until smooth"]
        );
    }

    #[test]
    fn test_ingredient_mentioning_recipe_is_not_the_title() {
        let recipe = parse_scanned_recipe("2 cups flour (double for this recipe)\n1 egg")
            .into_value()
            .unwrap();
        assert_eq!(recipe.name, DEFAULT_SCAN_NAME);
        assert_eq!(
            recipe.ingredients,
            vec!["2 cups flour (double for this recipe)", "1 egg"]
        );
    }

    #[test]
    fn test_overlong_title_line_is_skipped() {
        let long = format!("Recipe: {}", "very ".repeat(20));
        let text = format!("{}\nCupcakes\n1 cup sugar", long);
        let recipe = parse_scanned_recipe(&text).into_value().unwrap();
        assert_eq!(recipe.name, "Cupcakes");
        assert_eq!(recipe.ingredients, vec!["1 cup sugar"]);
    }

    #[test]
    fn test_unrelated_text_is_empty() {
        assert!(parse_scanned_recipe("I could not read this image.").is_empty());
    }
}
