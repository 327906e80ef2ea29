// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router
//! directly without starting the full binary.

use crate::models::trials::{ErrorResponse, PagedResult, SearchFilters, TrialsQuery};
use crate::models::version::VersionResponse;
use crate::services::registry::{RegistryClient, UpstreamError};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `TRIALS_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("TRIALS_VERSION");

/// Advisory freshness for intermediary caches; the service itself holds no
/// cache state.
const CACHE_CONTROL_VALUE: &str = "s-maxage=3600, stale-while-revalidate=86400";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RegistryClient>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/version",
    responses((status = 200, body = VersionResponse))
)]
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: "trials-gateway".to_string(),
        version: VERSION.to_string(),
    })
}

/// GET /api/trials - Search the registry and return a sorted, paged result.
///
/// Invalid pagination clamps to defaults and never fails the request. An
/// upstream non-success status maps to 502 with the upstream status embedded;
/// every other failure maps to 500 with the error message. No partial results.
#[utoipa::path(
    get,
    path = "/api/trials",
    params(TrialsQuery),
    responses(
        (status = 200, body = PagedResult),
        (status = 502, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn trials_handler(
    State(state): State<AppState>,
    Query(query): Query<TrialsQuery>,
) -> Response {
    let filters = SearchFilters::from_query(query);

    match state.registry.search(&filters).await {
        Ok(page) => ([(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)], Json(page)).into_response(),
        Err(e) => match e.downcast_ref::<UpstreamError>() {
            Some(upstream) => (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Upstream registry error".to_string(),
                    status: Some(upstream.status),
                }),
            )
                .into_response(),
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                    status: None,
                }),
            )
                .into_response(),
        },
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(paths(trials_handler, version_handler))]
pub struct TrialsApiDoc;

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/api/trials", get(trials_handler))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", TrialsApiDoc::openapi()))
}
