use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use larder_core::{AnalysisView, Larder, RecipeSuggestion};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSuggestionResponse {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cooking_time: String,
    pub difficulty: String,
}

impl From<RecipeSuggestion> for RecipeSuggestionResponse {
    fn from(recipe: RecipeSuggestion) -> Self {
        Self {
            name: recipe.name,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            cooking_time: recipe.cooking_time,
            difficulty: recipe.difficulty,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FridgeAnalysisResponse {
    pub id: Uuid,
    /// URL of the uploaded photo, when it can still be resolved
    pub image_url: Option<String>,
    #[schema(example = "completed")]
    pub status: String,
    pub ingredients: Vec<String>,
    pub recipes: Vec<RecipeSuggestionResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisView> for FridgeAnalysisResponse {
    fn from(view: AnalysisView) -> Self {
        Self {
            id: view.id,
            image_url: view.image_url,
            status: view.status.to_string(),
            ingredients: view.ingredients,
            recipes: view.recipes.into_iter().map(Into::into).collect(),
            created_at: view.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/fridge-analyses/{id}",
    tag = "fridge-analyses",
    params(
        ("id" = Uuid, Path, description = "Analysis ID")
    ),
    responses(
        (status = 200, description = "Analysis details", body = FridgeAnalysisResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Analysis not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_fridge_analysis(
    user: AuthUser,
    State(larder): State<Arc<Larder>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match larder.get_analysis(user.caller(), id).await {
        Ok(Some(view)) => {
            (StatusCode::OK, Json(FridgeAnalysisResponse::from(view))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Analysis not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
