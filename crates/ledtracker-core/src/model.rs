//! Data model types.
//!
//! These types represent what the device knows about the outside world:
//! - Credentials submitted through the setup portal
//! - Sales snapshots fetched from the sales API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;

/// Maximum SSID length in bytes (802.11).
pub const MAX_SSID_LEN: usize = 32;

/// WPA2-PSK passphrase length bounds, in characters.
pub const MIN_PASSPHRASE_LEN: usize = 8;
pub const MAX_PASSPHRASE_LEN: usize = 63;

/// Everything the setup portal collects.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub wifi: WifiCredentials,
    pub sales: SalesApiCredentials,
}

/// Wi-Fi client credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    /// Network name (1..=32 bytes).
    pub ssid: String,

    /// Passphrase, empty for open networks.
    pub passphrase: String,
}

/// Sales API credentials.
///
/// `client_id` is the API key and `client_secret` the API secret. The refresh
/// token is exchanged by the API for short-lived access.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesApiCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl WifiCredentials {
    /// Create Wi-Fi credentials.
    pub fn new(ssid: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
        }
    }

    /// True when the network needs no passphrase.
    pub fn is_open(&self) -> bool {
        self.passphrase.is_empty()
    }

    /// Check SSID and passphrase against 802.11 / WPA2 limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.trim().is_empty() {
            return Err(ConfigError::InvalidData("ssid must not be blank".into()));
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::InvalidData(format!(
                "ssid is {} bytes, maximum is {}",
                self.ssid.len(),
                MAX_SSID_LEN
            )));
        }
        check_single_line("ssid", &self.ssid)?;

        if !self.passphrase.is_empty() {
            // WPA passphrases are printable ASCII only
            if !self.passphrase.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
                return Err(ConfigError::InvalidData(
                    "password must contain only printable ASCII characters".into(),
                ));
            }
            let len = self.passphrase.len();
            if !(MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN).contains(&len) {
                return Err(ConfigError::InvalidData(format!(
                    "password must be {}..={} characters, got {}",
                    MIN_PASSPHRASE_LEN, MAX_PASSPHRASE_LEN, len
                )));
            }
        }
        Ok(())
    }
}

impl SalesApiCredentials {
    /// True when no API credential has been provided.
    pub fn is_empty(&self) -> bool {
        self.client_id.is_empty() && self.client_secret.is_empty() && self.refresh_token.is_empty()
    }

    /// Reject values that cannot be stored on a single line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_single_line("amazon_id", &self.client_id)?;
        check_single_line("amazon_secret", &self.client_secret)?;
        check_single_line("refresh", &self.refresh_token)
    }
}

impl Credentials {
    /// Validate all fields, reporting the first offending one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wifi.validate()?;
        self.sales.validate()
    }

    /// True once a Wi-Fi network has been configured.
    pub fn is_complete(&self) -> bool {
        !self.wifi.ssid.is_empty()
    }
}

fn check_single_line(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.contains(['\n', '\r', '\0']) {
        return Err(ConfigError::InvalidData(format!(
            "{} contains a line break or NUL",
            field
        )));
    }
    Ok(())
}

// Secrets stay out of logs.
impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("passphrase", &redact(&self.passphrase))
            .finish()
    }
}

impl fmt::Debug for SalesApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesApiCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("wifi", &self.wifi)
            .field("sales", &self.sales)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "***"
    }
}

/// Sales figures fetched at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSnapshot {
    /// When the figures were fetched (UTC).
    pub fetched_at: DateTime<Utc>,

    /// Orders so far today.
    pub sales_today: u64,

    /// Orders yesterday.
    pub sales_yesterday: u64,
}

impl SalesSnapshot {
    /// Create a snapshot stamped with the current time.
    pub fn now(sales_today: u64, sales_yesterday: u64) -> Self {
        Self {
            fetched_at: Utc::now(),
            sales_today,
            sales_yesterday,
        }
    }

    /// The text shown on the matrix, e.g. `T:123 Y:98`.
    pub fn headline(&self) -> String {
        format!("T:{} Y:{}", self.sales_today, self.sales_yesterday)
    }
}
