use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::{authorize, run_blocking};
use crate::auth::{AdminAction, AuthGate, RequireAdmin};
use crate::server::AppState;
use crate::server::dto::{CreateAccountRequest, UpdateAccountRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub async fn list_users(admin: RequireAdmin, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    authorize(&state, &admin.caller, AdminAction::ManageAccounts)?;

    let emails = state
        .credentials
        .list_admin_emails()
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(emails)))
}

pub async fn create_user(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let email = req.email.trim().to_string();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let credentials = Arc::clone(&state.credentials);
    let saved = email.clone();
    run_blocking(move || {
        AuthGate::new(credentials.as_ref()).save_account(
            &admin.caller,
            &saved,
            &req.password,
            &req.repeat,
        )
    })
    .await?
    .map_err(ApiError::from)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(email))))
}

pub async fn update_user(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> impl IntoResponse {
    state
        .credentials
        .account_exists(&email)
        .or_not_found("Account not found")?;

    let credentials = Arc::clone(&state.credentials);
    let saved = email.clone();
    run_blocking(move || {
        AuthGate::new(credentials.as_ref()).save_account(
            &admin.caller,
            &saved,
            &req.password,
            &req.repeat,
        )
    })
    .await?
    .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(email)))
}

/// Deleting the caller's own account, or the last account, is allowed. The
/// former ends the caller's session on its next request; the latter puts the
/// back office back into first-run.
pub async fn delete_user(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    authorize(&state, &admin.caller, AdminAction::ManageAccounts)?;

    state
        .credentials
        .delete_account(&email)
        .or_not_found("Account not found")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
