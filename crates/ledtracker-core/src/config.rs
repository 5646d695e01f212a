//! Configuration and credential storage.
//!
//! Two concerns live here:
//! - [`DeviceConfig`]: read-only settings taken from the process environment
//!   at startup.
//! - [`CredentialStore`]: credentials submitted through the setup portal,
//!   persisted so they survive a reboot.
//!
//! Credential storage is abstracted so HTTP handlers can be tested against
//! [`MemoryCredentialStore`] while the device uses [`EnvFileStore`].

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::model::{Credentials, SalesApiCredentials, WifiCredentials};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested configuration was not found.
    #[error("Configuration not found: {0}")]
    NotFound(String),

    /// Failed to read configuration.
    #[error("Read error: {0}")]
    ReadError(String),

    /// Failed to write configuration.
    #[error("Write error: {0}")]
    WriteError(String),

    /// Configuration data is invalid.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Storage is not available.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

// ============================================================================
// Credential Storage
// ============================================================================

/// Env-file keys, shared with the legacy `.env` layout of the device image.
pub const KEY_WIFI_SSID: &str = "WIFI_SSID";
pub const KEY_WIFI_PASS: &str = "WIFI_PASS";
pub const KEY_CLIENT_ID: &str = "AMAZON_CLIENT_ID";
pub const KEY_CLIENT_SECRET: &str = "AMAZON_CLIENT_SECRET";
pub const KEY_REFRESH_TOKEN: &str = "AMAZON_REFRESH_TOKEN";

const CREDENTIAL_KEYS: [&str; 5] = [
    KEY_WIFI_SSID,
    KEY_WIFI_PASS,
    KEY_CLIENT_ID,
    KEY_CLIENT_SECRET,
    KEY_REFRESH_TOKEN,
];

/// Abstract credential storage.
///
/// All methods are synchronous; the stored data is a handful of short
/// strings and callers are free to move the work onto a blocking thread.
pub trait CredentialStore: Send + Sync {
    /// Load the stored credentials.
    fn load(&self) -> Result<Credentials, ConfigError>;

    /// Replace the stored credentials.
    fn save(&self, credentials: &Credentials) -> Result<(), ConfigError>;

    /// True when credentials with a Wi-Fi network are stored.
    fn is_configured(&self) -> bool {
        self.load().map(|c| c.is_complete()).unwrap_or(false)
    }
}

/// Credentials persisted to a dotenv-format file.
///
/// Saving rewrites the whole file: lines unrelated to credentials are kept in
/// their original order, then the credential keys are appended. The new
/// content is written to a uniquely named sibling temp file and renamed into
/// place so a power cut never leaves a half-written file behind.
///
/// Saves through the same store (or its clones) are serialized.
#[derive(Debug, Clone)]
pub struct EnvFileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl EnvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".env".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
    }
}

impl CredentialStore for EnvFileStore {
    fn load(&self) -> Result<Credentials, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound(self.path.display().to_string()));
        }

        // from_path_iter parses without touching the process environment
        #[allow(deprecated)]
        let iter = dotenv::from_path_iter(&self.path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::ReadError(e.to_string()))?;
            values.insert(key, value);
        }

        let mut take = |key: &str| values.remove(key).unwrap_or_default();
        Ok(Credentials {
            wifi: WifiCredentials {
                ssid: take(KEY_WIFI_SSID),
                passphrase: take(KEY_WIFI_PASS),
            },
            sales: SalesApiCredentials {
                client_id: take(KEY_CLIENT_ID),
                client_secret: take(KEY_CLIENT_SECRET),
                refresh_token: take(KEY_REFRESH_TOKEN),
            },
        })
    }

    fn save(&self, credentials: &Credentials) -> Result<(), ConfigError> {
        credentials.validate()?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ConfigError::StorageUnavailable("credential lock poisoned".into()))?;

        let existing = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(ConfigError::ReadError(e.to_string())),
        };

        let mut out = String::with_capacity(existing.len() + 256);
        for line in existing.lines() {
            if line_key(line).is_some_and(|k| CREDENTIAL_KEYS.contains(&k)) {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }

        let pairs = [
            (KEY_WIFI_SSID, &credentials.wifi.ssid),
            (KEY_WIFI_PASS, &credentials.wifi.passphrase),
            (KEY_CLIENT_ID, &credentials.sales.client_id),
            (KEY_CLIENT_SECRET, &credentials.sales.client_secret),
            (KEY_REFRESH_TOKEN, &credentials.sales.refresh_token),
        ];
        for (key, value) in pairs {
            out.push_str(key);
            out.push('=');
            out.push_str(&quote_env_value(value));
            out.push('\n');
        }

        let tmp = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(out.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            ConfigError::WriteError(format!("{}: {}", self.path.display(), e))
        })?;

        debug!("Credentials written to {}", self.path.display());
        Ok(())
    }
}

/// Key of a `KEY=value` line, if the line is an assignment.
fn line_key(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, _) = line.split_once('=')?;
    Some(key.trim())
}

/// Double-quote a value so `dotenv` reads it back verbatim.
fn quote_env_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// In-memory credential storage.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with credentials.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: RwLock::new(Some(credentials)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Credentials, ConfigError> {
        let guard = self
            .credentials
            .read()
            .map_err(|_| ConfigError::StorageUnavailable("credential lock poisoned".into()))?;
        guard
            .clone()
            .ok_or_else(|| ConfigError::NotFound("credentials".into()))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), ConfigError> {
        credentials.validate()?;
        let mut guard = self
            .credentials
            .write()
            .map_err(|_| ConfigError::StorageUnavailable("credential lock poisoned".into()))?;
        *guard = Some(credentials.clone());
        Ok(())
    }
}

// ============================================================================
// Device Configuration
// ============================================================================

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_REFRESH_SECS: u64 = 300;
pub const DEFAULT_SALES_TIMEOUT_SECS: u64 = 10;

/// Startup configuration for the device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// HTTP listen port.
    pub port: u16,

    /// Time between periodic matrix updates.
    pub refresh_interval: Duration,

    /// Display backend selector: `auto`, `real` or `emu`.
    pub display_backend: String,

    /// Env file holding portal-submitted credentials.
    pub credentials_path: PathBuf,

    /// Raw frame sink for the physical panel.
    pub matrix_device: PathBuf,

    /// Sales endpoint; `None` selects the built-in mock source.
    pub sales_api_url: Option<String>,

    /// Sales request timeout.
    pub sales_timeout: Duration,

    pub wpa_supplicant_path: PathBuf,
    pub wifi_interface: String,
    pub wifi_country: String,

    /// Command run after the Wi-Fi config is rewritten.
    pub network_reload_command: Option<Vec<String>>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            display_backend: "auto".to_string(),
            credentials_path: PathBuf::from(".env"),
            matrix_device: PathBuf::from("/dev/led-matrix"),
            sales_api_url: None,
            sales_timeout: Duration::from_secs(DEFAULT_SALES_TIMEOUT_SECS),
            wpa_supplicant_path: PathBuf::from("/etc/wpa_supplicant/wpa_supplicant.conf"),
            wifi_interface: "wlan0".to_string(),
            wifi_country: "US".to_string(),
            network_reload_command: None,
        }
    }
}

impl DeviceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(v) => parse_number::<u16>("PORT", &v)?,
            None => defaults.port,
        };

        let refresh_interval = match get("REFRESH_INTERVAL") {
            Some(v) => {
                let secs = parse_number::<u64>("REFRESH_INTERVAL", &v)?;
                if secs == 0 {
                    return Err(ConfigError::InvalidData(
                        "REFRESH_INTERVAL must be at least 1 second".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.refresh_interval,
        };

        let sales_timeout = match get("SALES_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_number::<u64>("SALES_TIMEOUT_SECS", &v)?),
            None => defaults.sales_timeout,
        };

        Ok(Self {
            port,
            refresh_interval,
            display_backend: get("DISPLAY_BACKEND").unwrap_or(defaults.display_backend),
            credentials_path: get("CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_path),
            matrix_device: get("MATRIX_DEVICE")
                .map(PathBuf::from)
                .unwrap_or(defaults.matrix_device),
            sales_api_url: get("SALES_API_URL"),
            sales_timeout,
            wpa_supplicant_path: get("WPA_SUPPLICANT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.wpa_supplicant_path),
            wifi_interface: get("WIFI_INTERFACE").unwrap_or(defaults.wifi_interface),
            wifi_country: get("WIFI_COUNTRY").unwrap_or(defaults.wifi_country),
            network_reload_command: get("NETWORK_RELOAD_COMMAND")
                .map(|v| v.split_whitespace().map(String::from).collect()),
        })
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidData(format!("{}: '{}' is not a valid number", key, value)))
}
