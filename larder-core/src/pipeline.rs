//! Background analysis tasks.
//!
//! Each task resolves the uploaded image, calls the vision model, parses the
//! reply and patches the record into its terminal state. Errors never escape:
//! they end as a `failed` record and a warning in the log.

use std::sync::Arc;
use thiserror::Error;

use crate::ai::prompts::fridge_ingredients::{
    render_fridge_ingredients_prompt, FRIDGE_INGREDIENTS_MAX_TOKENS,
    FRIDGE_INGREDIENTS_PROMPT_NAME,
};
use crate::ai::prompts::fridge_recipes::{
    render_fridge_recipes_prompt, FRIDGE_RECIPES_MAX_TOKENS, FRIDGE_RECIPES_PROMPT_NAME,
};
use crate::ai::prompts::recipe_scan::{
    render_recipe_scan_prompt, RECIPE_SCAN_MAX_TOKENS, RECIPE_SCAN_PROMPT_NAME,
};
use crate::ai::{complete_text, AiClient, AiError};
use crate::parse::{parse_ingredient_list, parse_recipe_suggestions, parse_scanned_recipe};
use crate::store::{ObjectStore, RecordStore, StoreError};
use crate::types::{AnalysisState, ImageHandle, RecordId, RecordState, ScanState, Status};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Image {0} could not be resolved to a URL")]
    ImageUnavailable(ImageHandle),

    #[error("Inference failed: {0}")]
    Ai(#[from] AiError),

    #[error("No ingredients detected")]
    NoIngredients,

    #[error("No ingredients or instructions found on the recipe card")]
    NoRecipeContent,
}

/// Collaborators shared by every analysis task.
#[derive(Clone)]
pub struct AnalysisContext {
    pub ai: Arc<dyn AiClient>,
    pub objects: Arc<dyn ObjectStore>,
}

impl AnalysisContext {
    async fn image_url(&self, image: &ImageHandle) -> Result<String, AnalysisError> {
        self.objects
            .resolve(image)
            .await
            .ok_or_else(|| AnalysisError::ImageUnavailable(image.clone()))
    }
}

/// Detect fridge ingredients, then generate recipes from them.
pub async fn analyze_fridge(
    ctx: &AnalysisContext,
    image: &ImageHandle,
) -> Result<AnalysisState, AnalysisError> {
    let image_url = ctx.image_url(image).await?;

    let text = complete_text(
        ctx.ai.as_ref(),
        FRIDGE_INGREDIENTS_PROMPT_NAME,
        render_fridge_ingredients_prompt(),
        Some(&image_url),
        FRIDGE_INGREDIENTS_MAX_TOKENS,
        false,
    )
    .await?;

    let outcome = parse_ingredient_list(&text);
    tracing::debug!(path = outcome.path(), "Parsed fridge ingredients");
    let ingredients = outcome.into_value().ok_or(AnalysisError::NoIngredients)?;

    let text = complete_text(
        ctx.ai.as_ref(),
        FRIDGE_RECIPES_PROMPT_NAME,
        render_fridge_recipes_prompt(&ingredients),
        None,
        FRIDGE_RECIPES_MAX_TOKENS,
        false,
    )
    .await?;

    let outcome = parse_recipe_suggestions(&text, &ingredients);
    tracing::debug!(path = outcome.path(), "Parsed recipe suggestions");
    let recipes = outcome.into_value().unwrap_or_default();

    Ok(AnalysisState::Completed {
        ingredients,
        recipes,
    })
}

/// Digitize a photographed recipe card.
pub async fn scan_recipe(
    ctx: &AnalysisContext,
    image: &ImageHandle,
) -> Result<ScanState, AnalysisError> {
    let image_url = ctx.image_url(image).await?;

    let text = complete_text(
        ctx.ai.as_ref(),
        RECIPE_SCAN_PROMPT_NAME,
        render_recipe_scan_prompt(),
        Some(&image_url),
        RECIPE_SCAN_MAX_TOKENS,
        true,
    )
    .await?;

    let outcome = parse_scanned_recipe(&text);
    tracing::debug!(path = outcome.path(), "Parsed scanned recipe");
    let recipe = outcome.into_value().ok_or(AnalysisError::NoRecipeContent)?;

    Ok(ScanState::Completed(recipe))
}

/// Run the fridge analysis for one record and persist its terminal state.
pub async fn run_fridge_analysis(
    ctx: AnalysisContext,
    records: Arc<dyn RecordStore<AnalysisState>>,
    record_id: RecordId,
    image: ImageHandle,
) {
    let result = analyze_fridge(&ctx, &image).await;
    finish(records.as_ref(), record_id, result).await;
}

/// Run the recipe scan for one record and persist its terminal state.
pub async fn run_recipe_scan(
    ctx: AnalysisContext,
    records: Arc<dyn RecordStore<ScanState>>,
    record_id: RecordId,
    image: ImageHandle,
) {
    let result = scan_recipe(&ctx, &image).await;
    finish(records.as_ref(), record_id, result).await;
}

async fn finish<S: RecordState>(
    records: &dyn RecordStore<S>,
    record_id: RecordId,
    result: Result<S, AnalysisError>,
) {
    let state = match result {
        Ok(state) => {
            tracing::info!(record_id = %record_id, "Analysis completed");
            state
        }
        Err(e) => {
            tracing::warn!(record_id = %record_id, error = %e, "Analysis failed");
            S::failed()
        }
    };
    let completed = state.status() == Status::Completed;

    match records.patch(record_id, state).await {
        Ok(()) => {}
        Err(e @ (StoreError::NotFound(_) | StoreError::AlreadyTerminal(_))) => {
            tracing::warn!(record_id = %record_id, error = %e, "Discarding analysis result");
        }
        Err(e) if completed => {
            tracing::error!(record_id = %record_id, error = %e, "Failed to persist analysis result");
            if let Err(e) = records.patch(record_id, S::failed()).await {
                tracing::error!(record_id = %record_id, error = %e, "Failed to mark record failed");
            }
        }
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "Failed to mark record failed");
        }
    }
}
