pub mod fridge_analyses;
pub mod public;
pub mod recipe_scans;
pub mod upload;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use larder_core::{LarderError, Submitted};
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Returned when a photo is accepted. Analysis continues in the background;
/// poll the record until `status` is no longer `processing`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: Uuid,
    #[schema(example = "processing")]
    pub status: String,
}

impl From<Submitted> for SubmissionResponse {
    fn from(submitted: Submitted) -> Self {
        Self {
            id: submitted.id,
            status: submitted.status.to_string(),
        }
    }
}

/// Maps service errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub LarderError);

impl From<LarderError> for ApiError {
    fn from(e: LarderError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            LarderError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LarderError::NotAuthorized => StatusCode::FORBIDDEN,
            LarderError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            LarderError::Upload(_) | LarderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
            match self.0 {
                LarderError::Upload(_) => "Failed to store upload".to_string(),
                _ => "Failed to access records".to_string(),
            }
        } else {
            self.0.to_string()
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Larder API", description = "Fridge analysis and recipe scanning"),
        components(schemas(ErrorResponse, SubmissionResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        fridge_analyses::ApiDoc::openapi(),
        recipe_scans::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
