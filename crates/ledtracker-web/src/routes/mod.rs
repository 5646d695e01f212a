//! HTTP route handlers.
//!
//! Bodies of the plain-text endpoints are fixed strings that setup scripts
//! and the companion app match on; keep them stable.

pub mod matrix;
pub mod setup;
pub mod status;

use crate::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Body of `GET /`.
pub const GREETING: &str = "Hello from RPi LED Device!";

/// Create the main Axum router with all routes.
///
/// Routes are organized as:
/// - `/` - liveness greeting
/// - `/setup` - captive portal
/// - `/update-matrix` - manual refresh
/// - `/status` - device status
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/setup", setup::routes())
        .merge(matrix::routes())
        .merge(status::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handler for `GET /`.
async fn root_handler() -> &'static str {
    GREETING
}
