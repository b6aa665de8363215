use crate::api::ErrorResponse;
use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use larder_core::photo::{validate_image, MAX_FILE_SIZE};
use larder_core::{is_image_content_type, Upload};
use utoipa::ToSchema;

/// Multipart body accepted by the photo submission endpoints.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct PhotoUploadRequest {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

/// Read the first multipart field as an image upload.
///
/// A declared non-image content type is passed through untouched so the
/// service rejects it. Declared images, and fields without a content type,
/// are checked against their actual bytes.
pub async fn read_photo(multipart: &mut Multipart) -> Result<Upload, Response> {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return Err(bad_request("No file provided".to_string())),
        Err(e) => {
            tracing::warn!("Multipart read error: {}", e);
            let error_msg = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                format!("File too large. Maximum size is {} bytes", MAX_FILE_SIZE)
            } else {
                format!("Failed to read multipart data: {}", e.body_text())
            };
            return Err((e.status(), Json(ErrorResponse { error: error_msg })).into_response());
        }
    };

    let declared = field.content_type().map(str::to_string);

    let data = match field.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::warn!("Field read error: {}", e);
            let error_msg = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                format!("File too large. Maximum size is {} bytes", MAX_FILE_SIZE)
            } else {
                format!("Failed to read file data: {}", e.body_text())
            };
            return Err((e.status(), Json(ErrorResponse { error: error_msg })).into_response());
        }
    };

    match declared {
        Some(content_type) if !is_image_content_type(&content_type) => {
            Ok(Upload::new(content_type, data))
        }
        _ => {
            let content_type = validate_image(&data).map_err(bad_request)?;
            Ok(Upload::new(content_type, data))
        }
    }
}
