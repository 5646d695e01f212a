//! Captive portal routes.
//!
//! # Endpoints
//!
//! ### `GET /setup`
//! The portal page.
//!
//! ### `POST /setup`
//! Accepts the portal form (`application/x-www-form-urlencoded`):
//!
//! | Field | Meaning |
//! |---|---|
//! | `ssid` | Wi-Fi network name (required) |
//! | `password` | Wi-Fi passphrase, empty for open networks |
//! | `amazon_id` | sales API client id |
//! | `amazon_secret` | sales API client secret |
//! | `refresh` | sales API refresh token |
//!
//! Valid credentials are stored and the Wi-Fi configuration is applied in the
//! background, after the response has been sent, since applying it may drop
//! the client's connection to the portal access point. The response body is
//! the same whatever the outcome; problems are reported in the device log.

use axum::{
    extract::{rejection::FormRejection, State},
    routing::get,
    Form, Router,
};
use ledtracker_core::{Credentials, SalesApiCredentials, WifiCredentials};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::AppState;

/// Body of `GET /setup`.
pub const SETUP_PAGE: &str = "Captive Portal Setup Page (placeholder)";

/// Body of `POST /setup`.
pub const SAVING_CREDENTIALS: &str = "Saving new credentials (placeholder)";

/// Fields posted by the portal form.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupForm {
    pub ssid: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub amazon_id: String,

    #[serde(default)]
    pub amazon_secret: String,

    #[serde(default)]
    pub refresh: String,
}

impl From<SetupForm> for Credentials {
    fn from(form: SetupForm) -> Self {
        Credentials {
            wifi: WifiCredentials {
                ssid: form.ssid,
                passphrase: form.password,
            },
            sales: SalesApiCredentials {
                client_id: form.amazon_id.trim().to_string(),
                client_secret: form.amazon_secret.trim().to_string(),
                refresh_token: form.refresh.trim().to_string(),
            },
        }
    }
}

/// Create setup routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(setup_page).post(save_credentials))
}

/// GET /setup
async fn setup_page() -> &'static str {
    SETUP_PAGE
}

/// POST /setup
async fn save_credentials(
    State(state): State<AppState>,
    form: Result<Form<SetupForm>, FormRejection>,
) -> &'static str {
    let credentials: Credentials = match form {
        Ok(Form(form)) => form.into(),
        Err(rejection) => {
            warn!("Ignoring setup submission: {}", rejection);
            return SAVING_CREDENTIALS;
        }
    };

    if let Err(e) = credentials.validate() {
        warn!("Rejected setup submission: {}", e);
        return SAVING_CREDENTIALS;
    }

    let store = state.credentials.clone();
    let to_save = credentials.clone();
    match tokio::task::spawn_blocking(move || store.save(&to_save)).await {
        Ok(Ok(())) => info!("Saved credentials for network '{}'", credentials.wifi.ssid),
        Ok(Err(e)) => {
            error!("Failed to save credentials: {}", e);
            return SAVING_CREDENTIALS;
        }
        Err(e) => {
            error!("Credential save task failed: {}", e);
            return SAVING_CREDENTIALS;
        }
    }

    if let Some(network) = state.network.clone() {
        let wifi = credentials.wifi;
        tokio::spawn(async move {
            if let Err(e) = network.apply(&wifi).await {
                error!("Failed to apply Wi-Fi configuration: {}", e);
            }
        });
    }

    SAVING_CREDENTIALS
}
