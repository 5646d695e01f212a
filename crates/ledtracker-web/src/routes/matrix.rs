//! Manual matrix refresh.
//!
//! ### `GET /update-matrix`
//! Fetches the latest sales figures and shows them. Answers `200 Matrix
//! updated!` or `500 Failed to update matrix`; the cause of a failure is
//! only logged.

use axum::{extract::State, http::StatusCode, routing::get, Router};
use tracing::{error, info};

use crate::AppState;

pub const MATRIX_UPDATED: &str = "Matrix updated!";
pub const MATRIX_UPDATE_FAILED: &str = "Failed to update matrix";

pub fn routes() -> Router<AppState> {
    Router::new().route("/update-matrix", get(update_matrix))
}

/// GET /update-matrix
async fn update_matrix(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.controller.update_matrix().await {
        Ok(snapshot) => {
            info!("Matrix updated: {}", snapshot.headline());
            (StatusCode::OK, MATRIX_UPDATED)
        }
        Err(e) => {
            error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, MATRIX_UPDATE_FAILED)
        }
    }
}
