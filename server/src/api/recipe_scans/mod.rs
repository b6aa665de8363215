pub mod create;
pub mod delete;
pub mod get;
pub mod list;

use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use larder_core::photo::MAX_FILE_SIZE;
use utoipa::OpenApi;

/// Returns the router for /api/recipe-scans endpoints (mounted at /api/recipe-scans)
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list::list_recipe_scans).post(create::create_recipe_scan),
        )
        .route(
            "/{id}",
            get(get::get_recipe_scan).delete(delete::delete_recipe_scan),
        )
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe_scan,
        get::get_recipe_scan,
        list::list_recipe_scans,
        delete::delete_recipe_scan,
    ),
    components(schemas(get::RecipeScanResponse, list::ListRecipeScansResponse))
)]
pub struct ApiDoc;
