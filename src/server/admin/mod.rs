mod resources;
mod session;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::auth::{AdminAction, AuthGate, Caller};
use crate::server::AppState;
use crate::server::response::ApiError;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Session routes
        .route("/status", get(session::status))
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        .route("/first-account", post(session::claim_first_account))
        // Account routes
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{email}", put(users::update_user).delete(users::delete_user))
        // Resource routes
        .route("/resources", get(resources::list_resources))
        .route("/resources", post(resources::create_resource))
        .route(
            "/resources/{title}",
            put(resources::update_resource).delete(resources::delete_resource),
        )
        .route("/download", get(resources::download))
}

/// Runs store and password work off the async worker threads.
async fn run_blocking<T, F>(f: F) -> Result<crate::error::Result<T>, ApiError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("Blocking task failed: {e}");
        ApiError::internal("Internal server error")
    })
}

fn authorize(state: &AppState, caller: &Caller, action: AdminAction) -> Result<(), ApiError> {
    AuthGate::new(state.credentials.as_ref())
        .authorize(caller, action)
        .map_err(ApiError::from)
}
