//! Prompt for listing the food visible in a fridge photo.

pub const FRIDGE_INGREDIENTS_PROMPT_NAME: &str = "fridge_ingredients";
pub const FRIDGE_INGREDIENTS_MAX_TOKENS: u32 = 500;

pub fn render_fridge_ingredients_prompt() -> String {
    r#"You are looking at a photo of the inside of a refrigerator.

List every food item and ingredient you can clearly see.

Rules:
- Use short, common names (e.g. "eggs", "cheddar cheese", "spinach")
- List each item once
- Ignore containers you cannot identify
- Return ONLY a JSON array of strings, for example: ["eggs", "milk", "butter"]"#
        .to_string()
}
