use serde::Deserialize;
use serde_json::Value;

use super::{json_candidate, strip_list_marker, ParseOutcome, MAX_FALLBACK_INGREDIENTS};
use crate::types::RecipeSuggestion;

/// How many detected ingredients go into the fallback recipe.
const FALLBACK_RECIPE_INGREDIENTS: usize = 4;

const FALLBACK_RECIPE_NAME: &str = "Quick Fridge Medley";

const FALLBACK_RECIPE_STEPS: [&str; 4] = [
    "Wash and prepare all ingredients",
    "Chop the ingredients into bite-sized pieces",
    "Cook everything together in a pan over medium heat until done",
    "Season to taste and serve",
];

/// Parse the ingredient list returned for a fridge photo.
///
/// Expects a JSON array of strings (a `{"ingredients": [...]}` wrapper is also
/// accepted). Any other valid JSON is [`ParseOutcome::Empty`]. Free text counts
/// every non-empty line as one ingredient, with bullets and list numbers
/// removed, up to [`MAX_FALLBACK_INGREDIENTS`].
pub fn parse_ingredient_list(text: &str) -> ParseOutcome<Vec<String>> {
    if let Ok(value) = serde_json::from_str::<Value>(json_candidate(text)) {
        let items = match value {
            Value::Object(mut fields) => fields.remove("ingredients"),
            other => Some(other),
        };
        let items: Vec<String> = match items {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        return if items.is_empty() {
            ParseOutcome::Empty
        } else {
            ParseOutcome::Structured(items)
        };
    }

    let items: Vec<String> = text
        .lines()
        .map(strip_list_marker)
        .map(|line| line.trim_matches(|c: char| c == '"' || c == '\'' || c == ','))
        .map(str::trim)
        .filter(|line| line.chars().any(char::is_alphanumeric))
        .take(MAX_FALLBACK_INGREDIENTS)
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        ParseOutcome::Empty
    } else {
        ParseOutcome::Heuristic(items)
    }
}

#[derive(Deserialize)]
struct WrappedRecipes {
    recipes: Vec<RecipeSuggestion>,
}

/// Parse generated recipes.
///
/// Expects a JSON array of recipe objects (a `{"recipes": [...]}` wrapper is
/// also accepted). Anything else, including an empty array, yields the single
/// [`fallback_recipe`] built from `ingredients`.
pub fn parse_recipe_suggestions(
    text: &str,
    ingredients: &[String],
) -> ParseOutcome<Vec<RecipeSuggestion>> {
    let candidate = json_candidate(text);

    let parsed = serde_json::from_str::<Vec<RecipeSuggestion>>(candidate)
        .or_else(|_| serde_json::from_str::<WrappedRecipes>(candidate).map(|w| w.recipes));

    match parsed {
        Ok(recipes) if !recipes.is_empty() => ParseOutcome::Structured(recipes),
        _ if ingredients.is_empty() => ParseOutcome::Empty,
        _ => ParseOutcome::Heuristic(vec![fallback_recipe(ingredients)]),
    }
}

/// Deterministic recipe used when the model's recipes cannot be parsed.
pub fn fallback_recipe(ingredients: &[String]) -> RecipeSuggestion {
    RecipeSuggestion {
        name: FALLBACK_RECIPE_NAME.to_string(),
        ingredients: ingredients
            .iter()
            .take(FALLBACK_RECIPE_INGREDIENTS)
            .cloned()
            .collect(),
        instructions: FALLBACK_RECIPE_STEPS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        cooking_time: "20 minutes".to_string(),
        difficulty: "Easy".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_json_ingredients_are_structured() {
        let outcome = parse_ingredient_list(r#"["eggs","milk","bread"]"#);
        assert_eq!(
            outcome,
            ParseOutcome::Structured(strings(&["eggs", "milk", "bread"]))
        );
    }

    #[test]
    fn test_fenced_json_ingredients_are_structured() {
        let outcome = parse_ingredient_list("```json\n[\"cheddar cheese\", \"spinach\"]\n```");
        assert_eq!(
            outcome,
            ParseOutcome::Structured(strings(&["cheddar cheese", "spinach"]))
        );
    }

    #[test]
    fn test_structured_list_is_not_capped() {
        let items: Vec<String> = (0..14).map(|i| format!("item {}", i)).collect();
        let json = serde_json::to_string(&items).unwrap();
        assert_eq!(
            parse_ingredient_list(&json),
            ParseOutcome::Structured(items)
        );
    }

    #[test]
    fn test_text_ingredients_fall_back_to_lines() {
        let text = "Here is what I see:\n\n- Eggs\n* Milk\n3. Bread\n\n• Butter";
        let outcome = parse_ingredient_list(text);
        assert_eq!(
            outcome,
            ParseOutcome::Heuristic(strings(&[
                "Here is what I see:",
                "Eggs",
                "Milk",
                "Bread",
                "Butter"
            ]))
        );
    }

    #[test]
    fn test_fallback_ingredients_capped_at_ten() {
        let text = (1..=25)
            .map(|i| format!("{}. food {}", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let items = parse_ingredient_list(&text).into_value().unwrap();
        assert_eq!(items.len(), MAX_FALLBACK_INGREDIENTS);
        assert_eq!(items[0], "food 1");
        assert_eq!(items[9], "food 10");
    }

    #[test]
    fn test_wrapped_ingredients_are_structured() {
        let outcome = parse_ingredient_list(r#"{"ingredients": ["eggs", "milk"]}"#);
        assert_eq!(outcome, ParseOutcome::Structured(strings(&["eggs", "milk"])));
    }

    #[test]
    fn test_json_of_another_shape_is_empty() {
        assert!(parse_ingredient_list(r#"{"items": ["eggs"]}"#).is_empty());
        assert!(parse_ingredient_list(r#"{"ingredients": "eggs, milk"}"#).is_empty());
        assert!(parse_ingredient_list(r#"[1, 2, 3]"#).is_empty());
    }

    #[test]
    fn test_empty_responses() {
        assert!(parse_ingredient_list("[]").is_empty());
        assert!(parse_ingredient_list("").is_empty());
        assert!(parse_ingredient_list("\n  \n- \n").is_empty());
    }

    #[test]
    fn test_recipes_parsed_exactly() {
        let text = r#"[
            {"name": "Omelette", "ingredients": ["eggs", "milk"], "instructions": ["Whisk", "Cook"], "cookingTime": "10 minutes", "difficulty": "Easy"},
            {"name": "French Toast", "ingredients": ["bread", "eggs", "milk"], "instructions": ["Dip", "Fry"], "cookingTime": "15 minutes", "difficulty": "Easy"}
        ]"#;
        let ingredients = strings(&["eggs", "milk", "bread"]);
        let ParseOutcome::Structured(recipes) = parse_recipe_suggestions(text, &ingredients) else {
            panic!("expected structured recipes");
        };
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[1].name, "French Toast");
        assert_eq!(recipes[1].ingredients, strings(&["bread", "eggs", "milk"]));
        assert_eq!(recipes[0].instructions, strings(&["Whisk", "Cook"]));
        assert_eq!(recipes[0].cooking_time, "10 minutes");
    }

    #[test]
    fn test_wrapped_recipes_accepted() {
        let text = r#"{"recipes": [{"name": "Salad", "ingredients": ["lettuce"], "instructions": ["Toss"], "cookingTime": "5 minutes", "difficulty": "Easy"}]}"#;
        let outcome = parse_recipe_suggestions(text, &strings(&["lettuce"]));
        assert!(outcome.is_structured());
    }

    #[test]
    fn test_unparseable_recipes_use_fallback() {
        let ingredients = strings(&["eggs", "milk", "bread", "butter", "jam", "ham"]);
        let outcome = parse_recipe_suggestions("Sorry, I can't help with that.", &ingredients);
        let ParseOutcome::Heuristic(recipes) = outcome else {
            panic!("expected fallback recipe");
        };
        assert_eq!(recipes.len(), 1);
        assert_eq!(
            recipes[0].ingredients,
            strings(&["eggs", "milk", "bread", "butter"])
        );
        assert_eq!(recipes[0].instructions.len(), 4);
        assert_eq!(recipes[0], fallback_recipe(&ingredients));
    }

    #[test]
    fn test_empty_recipe_array_uses_fallback() {
        let outcome = parse_recipe_suggestions("[]", &strings(&["eggs"]));
        assert!(outcome.is_heuristic());
    }
}
