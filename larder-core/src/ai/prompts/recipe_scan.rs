//! Prompt for digitizing a photographed recipe card.

pub const RECIPE_SCAN_PROMPT_NAME: &str = "recipe_scan";
pub const RECIPE_SCAN_MAX_TOKENS: u32 = 1500;

pub fn render_recipe_scan_prompt() -> String {
    r#"You are a recipe extraction assistant. You are given a photo of a recipe card or printed recipe.

Extract the recipe and return it as JSON with this exact structure:
{
  "name": "Recipe name",
  "ingredients": ["Each ingredient exactly as written, one per entry"],
  "instructions": ["Each step in order, one per entry"],
  "cookingTime": "Cooking time if present (optional)",
  "servings": "Servings if present (optional)",
  "difficulty": "Easy, Medium or Hard if you can tell (optional)",
  "category": "e.g. Dessert, Main Course, Breakfast (optional)"
}

Rules:
- Extract the text EXACTLY as written - do not paraphrase
- Leave out optional fields that are not in the photo
- Return ONLY the JSON, no other text"#
        .to_string()
}
