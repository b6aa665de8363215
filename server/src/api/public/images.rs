use crate::api::ErrorResponse;
use crate::stores::PgObjectStore;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// Image handles are unguessable, so the URL itself grants access. This is
/// the URL handed to the vision model.
#[utoipa::path(
    get,
    path = "/api/images/{handle}",
    tag = "images",
    params(
        ("handle" = String, Path, description = "Image handle")
    ),
    responses(
        (status = 200, description = "Raw image bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn get_image(
    State(images): State<Arc<PgObjectStore>>,
    Path(handle): Path<String>,
) -> impl IntoResponse {
    match images.fetch(&handle) {
        Ok(Some(image)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, image.content_type),
                (header::CACHE_CONTROL, "private, max-age=86400".to_string()),
            ],
            image.data,
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Image not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch image");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch image".to_string(),
                }),
            )
                .into_response()
        }
    }
}
