//! Prompt for generating recipes from detected fridge ingredients.

pub const FRIDGE_RECIPES_PROMPT_NAME: &str = "fridge_recipes";
pub const FRIDGE_RECIPES_MAX_TOKENS: u32 = 2000;

pub fn render_fridge_recipes_prompt(ingredients: &[String]) -> String {
    format!(
        r#"I have these ingredients in my fridge: {ingredients}

Suggest 3 recipes I could make. Each recipe should use at least 2-3 of these ingredients; common pantry staples (salt, pepper, oil, flour) may be added.

Return ONLY a JSON array with exactly this structure:
[
  {{
    "name": "Recipe name",
    "ingredients": ["ingredient with amount", "..."],
    "instructions": ["Step 1", "Step 2", "..."],
    "cookingTime": "e.g. 25 minutes",
    "difficulty": "Easy | Medium | Hard"
  }}
]"#,
        ingredients = ingredients.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_ingredients() {
        let prompt = render_fridge_recipes_prompt(&["eggs".to_string(), "milk".to_string()]);
        assert!(prompt.contains("eggs, milk"));
        assert!(prompt.contains("\"cookingTime\""));
    }
}
