//! # Infant Info
//!
//! A directory of community resources for parents of young children, with a
//! small administrative back office. Usable both as a standalone binary and
//! as a library.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infant_info::config::ServerConfig;
//! use infant_info::server::{AppState, create_router};
//! use infant_info::store::{AdminStore, CatalogStore};
//!
//! let config = ServerConfig::default();
//! let catalog = CatalogStore::open(config.catalog_path()).unwrap();
//! let credentials = AdminStore::open(config.credentials_path()).unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(catalog),
//!     Arc::new(credentials),
//!     config.session_ttl(),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
