use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::gate::{AuthGate, Caller};
use crate::server::AppState;

/// The bearer session token, if the request carries one.
pub struct SessionToken(pub Option<String>);

/// Extractor that requires a session bound to an existing admin account.
pub struct RequireAdmin {
    pub caller: Caller,
    pub token: String,
}

impl RequireAdmin {
    #[must_use]
    pub fn email(&self) -> &str {
        self.caller.email().unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidSession,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid or expired session"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                axum::http::HeaderValue::from_static("Bearer realm=\"infant-info\""),
            );
        }

        response
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AuthError> {
    let Some(header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return Ok(None);
    };

    header
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim().to_string()))
        .ok_or(AuthError::InvalidScheme)
}

impl FromRequestParts<Arc<AppState>> for SessionToken {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(bearer_token(parts)?))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AuthError::MissingAuth)?;
        let identity = state.sessions.identity(&token);

        let caller = AuthGate::new(state.credentials.as_ref())
            .resolve(identity.as_deref())
            .map_err(|e| {
                tracing::error!("Failed to resolve session: {e}");
                AuthError::InternalError
            })?;

        if caller == Caller::Anonymous {
            state.sessions.clear(&token);
            return Err(AuthError::InvalidSession);
        }

        Ok(RequireAdmin { caller, token })
    }
}
