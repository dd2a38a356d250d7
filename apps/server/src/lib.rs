//! # Tally Server
//!
//! REST API over the Tally POS database: accounts, stores, catalogs and
//! sales.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally Server Routes                             │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  users         │  │  stores        │  │  catalog                   ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • list/create  │  │ • categories list/create   ││
//! │  │ • login        │  │ • get/update   │  │ • products list/create     ││
//! │  │                │  │ • delete       │  │ • update/delete            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  sales         │  │  health        │                                │
//! │  │                │  │                │                                │
//! │  │ • create (201) │  │ • liveness     │                                │
//! │  │ • list         │  │ • database     │                                │
//! │  │ • metrics      │  │                │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `TALLY_BIND_ADDR` - Listen address (default: 0.0.0.0)
//! - `TALLY_HTTP_PORT` - HTTP port (default: 5000)
//! - `TALLY_DB_PATH` - SQLite database file (default: tally.db)
//! - `TALLY_JWT_SECRET` - Secret for JWT signing
//! - `TALLY_JWT_LIFETIME_SECS` - Token lifetime (default: 2592000, 30 days)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tally_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::JwtManager;
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
        }
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
