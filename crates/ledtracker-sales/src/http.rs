//! JSON-over-HTTP sales client.
//!
//! The endpoint answers `GET` with
//!
//! ```json
//! { "sales_today": 123, "sales_yesterday": 98 }
//! ```
//!
//! Credentials are read from the credential store on every fetch so values
//! submitted through the setup portal take effect without a restart.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledtracker_core::{ConfigError, CredentialStore, SalesApiCredentials, SalesSnapshot};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{SalesError, SalesSource};

const CLIENT_ID_HEADER: &str = "X-Client-Id";
const CLIENT_SECRET_HEADER: &str = "X-Client-Secret";

/// Longest error body kept in [`SalesError::Status`].
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Deserialize)]
struct SalesResponse {
    sales_today: u64,
    sales_yesterday: u64,
}

/// Fetches sales figures from a JSON endpoint.
pub struct HttpSalesClient {
    client: reqwest::Client,
    url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpSalesClient {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, SalesError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SalesError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            credentials,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read API credentials on the blocking pool; the store may hit the disk.
    async fn api_credentials(&self) -> Result<SalesApiCredentials, SalesError> {
        let store = self.credentials.clone();
        let loaded = tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| SalesError::Credentials(e.to_string()))?;

        match loaded {
            Ok(credentials) => Ok(credentials.sales),
            Err(ConfigError::NotFound(_)) => Ok(SalesApiCredentials::default()),
            Err(e) => Err(SalesError::Credentials(e.to_string())),
        }
    }
}

#[async_trait]
impl SalesSource for HttpSalesClient {
    async fn fetch(&self) -> Result<SalesSnapshot, SalesError> {
        let credentials = self.api_credentials().await?;
        if credentials.is_empty() {
            warn!("No sales API credentials configured, requesting anonymously");
        }

        let mut request = self.client.get(&self.url);
        if !credentials.refresh_token.is_empty() {
            request = request.bearer_auth(&credentials.refresh_token);
        }
        if !credentials.client_id.is_empty() {
            request = request.header(CLIENT_ID_HEADER, &credentials.client_id);
        }
        if !credentials.client_secret.is_empty() {
            request = request.header(CLIENT_SECRET_HEADER, &credentials.client_secret);
        }

        debug!("Fetching sales data from {}", self.url);
        let response = request
            .send()
            .await
            .map_err(|e| SalesError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SalesError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(SalesError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let parsed: SalesResponse =
            serde_json::from_str(&body).map_err(|e| SalesError::Decode(e.to_string()))?;
        Ok(SalesSnapshot::now(parsed.sales_today, parsed.sales_yesterday))
    }

    fn name(&self) -> &str {
        "http"
    }
}
