use crate::api::upload::{read_photo, PhotoUploadRequest};
use crate::api::{ApiError, ErrorResponse, SubmissionResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use larder_core::Larder;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/recipe-scans",
    tag = "recipe-scans",
    request_body(content_type = "multipart/form-data", content = PhotoUploadRequest),
    responses(
        (status = 201, description = "Photo accepted, scan started", body = SubmissionResponse),
        (status = 400, description = "Not an image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe_scan(
    user: AuthUser,
    State(larder): State<Arc<Larder>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let upload = match read_photo(&mut multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    match larder.submit_recipe_scan(user.caller(), upload).await {
        Ok(submitted) => (
            StatusCode::CREATED,
            Json(SubmissionResponse::from(submitted)),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
