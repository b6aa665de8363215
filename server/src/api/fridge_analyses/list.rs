use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::Larder;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::get::FridgeAnalysisResponse;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListFridgeAnalysesResponse {
    pub analyses: Vec<FridgeAnalysisResponse>,
}

#[utoipa::path(
    get,
    path = "/api/fridge-analyses",
    tag = "fridge-analyses",
    responses(
        (status = 200, description = "The 20 most recent analyses, newest first", body = ListFridgeAnalysesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_fridge_analyses(
    user: AuthUser,
    State(larder): State<Arc<Larder>>,
) -> impl IntoResponse {
    match larder.list_analyses(user.caller()).await {
        Ok(views) => {
            let analyses = views.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(ListFridgeAnalysesResponse { analyses })).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}
