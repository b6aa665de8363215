use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use larder_core::{Larder, RecipeView};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeScanResponse {
    pub id: Uuid,
    pub image_url: Option<String>,
    #[schema(example = "completed")]
    pub status: String,
    /// "Processing..." while the scan runs, "Scan Failed" when it failed
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cooking_time: Option<String>,
    pub servings: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RecipeView> for RecipeScanResponse {
    fn from(view: RecipeView) -> Self {
        Self {
            id: view.id,
            image_url: view.image_url,
            status: view.status.to_string(),
            name: view.name,
            ingredients: view.ingredients,
            instructions: view.instructions,
            cooking_time: view.cooking_time,
            servings: view.servings,
            difficulty: view.difficulty,
            category: view.category,
            created_at: view.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipe-scans/{id}",
    tag = "recipe-scans",
    params(
        ("id" = Uuid, Path, description = "Recipe scan ID")
    ),
    responses(
        (status = 200, description = "Recipe scan details", body = RecipeScanResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe scan not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe_scan(
    user: AuthUser,
    State(larder): State<Arc<Larder>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match larder.get_recipe(user.caller(), id).await {
        Ok(Some(view)) => (StatusCode::OK, Json(RecipeScanResponse::from(view))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe scan not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
