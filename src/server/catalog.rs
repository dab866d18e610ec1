use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};

use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

/// Read-only routes for the public directory.
pub fn catalog_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/resources", get(list_resources))
        .route("/resources/{title}", get(get_resource))
}

async fn list_resources(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resources = state.catalog.list_resources().map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(resources)))
}

async fn get_resource(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> impl IntoResponse {
    let resource = state
        .catalog
        .get_resource(&title)
        .or_not_found("Resource not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(resource)))
}
