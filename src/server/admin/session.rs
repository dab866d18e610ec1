use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::{authorize, run_blocking};
use crate::auth::{
    AdminAction, AuthGate, RequireAdmin, SessionDirective, SessionToken, bootstrap_state,
};
use crate::server::AppState;
use crate::server::dto::{CreateAccountRequest, LoginRequest, SessionResponse, StatusResponse};
use crate::server::response::{ApiError, ApiResponse};

/// Reports whether the back office still needs its first account, and who
/// the caller is logged in as, if anyone.
pub async fn status(
    State(state): State<Arc<AppState>>,
    SessionToken(token): SessionToken,
) -> impl IntoResponse {
    let identity = token.as_deref().and_then(|t| state.sessions.identity(t));

    let credentials = Arc::clone(&state.credentials);
    let (state_now, email) = run_blocking(move || {
        let state_now = bootstrap_state(credentials.as_ref())?;
        let caller = AuthGate::new(credentials.as_ref()).resolve(identity.as_deref())?;
        Ok((state_now, caller.email().map(str::to_string)))
    })
    .await?
    .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(StatusResponse {
        state: state_now,
        email,
    })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    SessionToken(token): SessionToken,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let credentials = Arc::clone(&state.credentials);
    let directive = run_blocking(move || {
        AuthGate::new(credentials.as_ref()).login(&req.email, &req.password)
    })
    .await?
    .map_err(ApiError::from)?;

    let response = bind_session(&state, token.as_deref(), &directive)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(response)))
}

pub async fn logout(admin: RequireAdmin, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    authorize(&state, &admin.caller, AdminAction::Logout)?;

    let directive = AuthGate::new(state.credentials.as_ref()).logout();
    state.sessions.apply(Some(&admin.token), &directive);
    tracing::info!("Admin logout for {}", admin.email());

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn claim_first_account(
    State(state): State<Arc<AppState>>,
    SessionToken(token): SessionToken,
    Json(req): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let credentials = Arc::clone(&state.credentials);
    let directive = run_blocking(move || {
        AuthGate::new(credentials.as_ref()).claim_first_account(
            &req.email,
            &req.password,
            &req.repeat,
        )
    })
    .await?
    .map_err(ApiError::from)?;

    let response = bind_session(&state, token.as_deref(), &directive)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

fn bind_session(
    state: &AppState,
    previous: Option<&str>,
    directive: &SessionDirective,
) -> Result<SessionResponse, ApiError> {
    let SessionDirective::Bind(email) = directive else {
        return Err(ApiError::internal("Failed to start session"));
    };
    let token = state
        .sessions
        .apply(previous, directive)
        .ok_or_else(|| ApiError::internal("Failed to start session"))?;

    Ok(SessionResponse {
        token,
        email: email.clone(),
    })
}
