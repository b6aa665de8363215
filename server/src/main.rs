mod api;
mod auth;
mod config;
mod db;
mod models;
mod schema;
mod stores;
mod telemetry;

use anyhow::Context;
use axum::extract::{FromRef, MatchedPath};
use axum::http::Request;
use axum::middleware;
use axum::Router;
use larder_core::ai::CachingAiClient;
use larder_core::{AnalysisState, Larder, RecordStore, ScanState, TokioScheduler};
use std::env;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServerConfig;
use crate::db::DbPool;
use crate::stores::{PgObjectStore, PgRecordStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub larder: Arc<Larder>,
    pub images: Arc<PgObjectStore>,
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<Larder> {
    fn from_ref(state: &AppState) -> Self {
        state.larder.clone()
    }
}

impl FromRef<AppState> for Arc<PgObjectStore> {
    fn from_ref(state: &AppState) -> Self {
        state.images.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .context("Failed to serialize OpenAPI spec")?;
        println!("{}", spec);
        return Ok(());
    }

    telemetry::init_telemetry();

    let config = ServerConfig::from_env()?;
    let pool = Arc::new(db::create_pool(&config.database_url)?);

    let ai = CachingAiClient::from_env().context("Failed to configure AI client")?;
    tracing::info!(model = ai.model(), "AI client configured");

    let images = Arc::new(PgObjectStore::new(pool.clone(), &config.public_base_url));
    let records = Arc::new(PgRecordStore::new(pool.clone()));
    let analyses: Arc<dyn RecordStore<AnalysisState>> = records.clone();
    let recipes: Arc<dyn RecordStore<ScanState>> = records;

    let larder = Arc::new(Larder::new(
        Arc::new(ai),
        images.clone(),
        analyses,
        recipes,
        Arc::new(TokioScheduler),
    ));

    let state = AppState {
        pool,
        larder,
        images,
    };

    // Public routes (no auth required)
    let public_router = api::public::router();

    // Protected routes (auth required)
    let protected_router = Router::new()
        .nest("/api/fridge-analyses", api::fridge_analyses::router())
        .nest("/api/recipe-scans", api::recipe_scans::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let app = Router::new()
        .merge(public_router)
        .merge(protected_router)
        .merge(swagger_ui)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    // Image fetches by the vision model are noisy
                    if matched_path == "/api/images/{handle}" {
                        tracing::trace_span!("http_request")
                    } else {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %matched_path,
                        )
                    }
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        // Skip logging for noisy endpoints (trace-level spans)
                        if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                            return;
                        }
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!(
        "Swagger UI available at {}/swagger-ui/",
        config.public_base_url
    );
    tracing::info!(
        "Images are served to the vision model from {}/api/images/",
        config.public_base_url
    );

    axum::serve(listener, app).await?;
    Ok(())
}
