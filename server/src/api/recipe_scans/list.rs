use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::Larder;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::get::RecipeScanResponse;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipeScansResponse {
    pub recipes: Vec<RecipeScanResponse>,
}

#[utoipa::path(
    get,
    path = "/api/recipe-scans",
    tag = "recipe-scans",
    responses(
        (status = 200, description = "The 20 most recent scans, newest first", body = ListRecipeScansResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipe_scans(
    user: AuthUser,
    State(larder): State<Arc<Larder>>,
) -> impl IntoResponse {
    match larder.list_recipes(user.caller()).await {
        Ok(views) => {
            let recipes = views.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(ListRecipeScansResponse { recipes })).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}
