use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use super::{authorize, run_blocking};
use crate::auth::{AdminAction, RequireAdmin};
use crate::server::AppState;
use crate::server::dto::{ResourceListing, ResourceRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::Resource;

const DOWNLOAD_FILENAME: &str = "infant-info.db";

pub async fn list_resources(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    authorize(&state, &admin.caller, AdminAction::ManageResources)?;

    let listings: Vec<ResourceListing> = state
        .catalog
        .list_resources()
        .map_err(ApiError::from)?
        .into_iter()
        .map(ResourceListing::from)
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(listings)))
}

pub async fn create_resource(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResourceRequest>,
) -> impl IntoResponse {
    authorize(&state, &admin.caller, AdminAction::ManageResources)?;

    let resource = Resource::from(req);
    state
        .catalog
        .upsert_resource(&resource)
        .map_err(ApiError::from)?;
    tracing::info!("{} saved resource {:?}", admin.email(), resource.title);

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(resource))))
}

/// Saves the resource stored as `title`. The body may carry a new title, in
/// which case the entry is moved.
pub async fn update_resource(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
    Json(req): Json<ResourceRequest>,
) -> impl IntoResponse {
    authorize(&state, &admin.caller, AdminAction::ManageResources)?;

    let resource = Resource::from(req);
    state
        .catalog
        .replace_resource(&title, &resource)
        .map_err(ApiError::from)?;
    tracing::info!(
        "{} saved resource {:?} (was {:?})",
        admin.email(),
        resource.title,
        title
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(resource)))
}

pub async fn delete_resource(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> impl IntoResponse {
    authorize(&state, &admin.caller, AdminAction::ManageResources)?;

    state
        .catalog
        .delete_resource(&title)
        .or_not_found("Resource not found")?;
    tracing::info!("{} deleted resource {:?}", admin.email(), title);

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Streams a consistent copy of the catalog database file.
pub async fn download(admin: RequireAdmin, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    authorize(&state, &admin.caller, AdminAction::ExportCatalog)?;

    let catalog = Arc::clone(&state.catalog);
    let bytes = run_blocking(move || {
        let mut buf = Vec::new();
        catalog.export_snapshot(&mut buf).map(|_| buf)
    })
    .await?
    .map_err(ApiError::from)?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{DOWNLOAD_FILENAME}\""),
        ),
    ];

    Ok::<_, ApiError>((headers, bytes))
}
