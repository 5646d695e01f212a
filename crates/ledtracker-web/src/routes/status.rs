//! Device status.
//!
//! ### `GET /status`
//!
//! ```json
//! {
//!   "configured": true,
//!   "ssid": "HomeNet",
//!   "salesSource": "http",
//!   "lastSnapshot": { "fetched_at": "...", "sales_today": 123, "sales_yesterday": 98 },
//!   "statistics": { "matrixUpdates": 4, "failedUpdates": 0, "uptime": 1200 }
//! }
//! ```
//!
//! Secrets are never part of the response.

use axum::{extract::State, response::Json, routing::get, Router};
use ledtracker_controller::UpdateStatistics;
use ledtracker_core::SalesSnapshot;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub configured: bool,
    pub ssid: Option<String>,
    pub sales_source: String,
    pub last_snapshot: Option<SalesSnapshot>,
    pub statistics: UpdateStatistics,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/status", get(get_status))
}

/// GET /status
async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let store = state.credentials.clone();
    let stored = match tokio::task::spawn_blocking(move || store.load()).await {
        Ok(loaded) => loaded.ok().filter(|c| c.is_complete()),
        Err(e) => {
            warn!("Credential load task failed: {}", e);
            None
        }
    };

    Json(StatusResponse {
        configured: stored.is_some(),
        ssid: stored.map(|c| c.wifi.ssid),
        sales_source: state.controller.sales_source_name().to_string(),
        last_snapshot: state.controller.last_snapshot().await,
        statistics: state.controller.statistics(),
    })
}
