pub mod create;
pub mod get;
pub mod list;

use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use larder_core::photo::MAX_FILE_SIZE;
use utoipa::OpenApi;

/// Returns the router for /api/fridge-analyses endpoints (mounted at /api/fridge-analyses)
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list::list_fridge_analyses).post(create::create_fridge_analysis),
        )
        .route("/{id}", get(get::get_fridge_analysis))
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_fridge_analysis,
        get::get_fridge_analysis,
        list::list_fridge_analyses,
    ),
    components(schemas(
        crate::api::upload::PhotoUploadRequest,
        get::FridgeAnalysisResponse,
        get::RecipeSuggestionResponse,
        list::ListFridgeAnalysesResponse,
    ))
)]
pub struct ApiDoc;
