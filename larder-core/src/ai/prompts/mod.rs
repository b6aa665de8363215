//! AI prompt templates.
//!
//! Each prompt has a stable name (used for logs and cache paths) and an
//! output-token budget.

pub mod fridge_ingredients;
pub mod fridge_recipes;
pub mod recipe_scan;

pub use fridge_ingredients::render_fridge_ingredients_prompt;
pub use fridge_recipes::render_fridge_recipes_prompt;
pub use recipe_scan::render_recipe_scan_prompt;
