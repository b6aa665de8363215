use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use larder_core::Larder;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/recipe-scans/{id}",
    tag = "recipe-scans",
    params(
        ("id" = Uuid, Path, description = "Recipe scan ID")
    ),
    responses(
        (status = 204, description = "Recipe scan deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Recipe scan missing or owned by another user", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe_scan(
    user: AuthUser,
    State(larder): State<Arc<Larder>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match larder.delete_recipe(user.caller(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
