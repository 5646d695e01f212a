//! # ledtracker-network
//!
//! Applies Wi-Fi credentials collected by the setup portal to the device.
//!
//! The device joins networks through `wpa_supplicant`. Applying credentials
//! means rewriting its configuration file and, if the operator configured
//! one, running a reload command such as `wpa_cli -i wlan0 reconfigure`.
//! Controlling the access-point daemon itself is left to that command.

pub mod wpa;

pub use wpa::render_wpa_supplicant;

use std::path::PathBuf;

use ledtracker_core::{ConfigError, DeviceConfig, WifiCredentials};
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

/// Placeholder in reload command arguments replaced by the interface name.
pub const IFACE_PLACEHOLDER: &str = "{iface}";

/// Errors raised while reconfiguring the network.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Credentials failed validation.
    #[error(transparent)]
    Invalid(#[from] ConfigError),

    /// Writing the supplicant configuration failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reload command could not be started.
    #[error("Failed to run reload command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The reload command exited unsuccessfully.
    #[error("Reload command '{command}' failed with {status}")]
    ReloadFailed { command: String, status: String },
}

/// Writes Wi-Fi client configuration and triggers a reload.
#[derive(Debug, Clone)]
pub struct NetworkConfigurator {
    config_path: PathBuf,
    interface: String,
    country: String,
    reload_command: Option<Vec<String>>,
}

impl NetworkConfigurator {
    pub fn new(config_path: impl Into<PathBuf>, interface: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            interface: interface.into(),
            country: "US".to_string(),
            reload_command: None,
        }
    }

    /// Build from device configuration.
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            config_path: config.wpa_supplicant_path.clone(),
            interface: config.wifi_interface.clone(),
            country: config.wifi_country.clone(),
            reload_command: config.network_reload_command.clone(),
        }
    }

    /// Set the regulatory country code.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Set the command run after the configuration is written.
    pub fn with_reload_command(mut self, argv: Vec<String>) -> Self {
        self.reload_command = Some(argv).filter(|a| !a.is_empty());
        self
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Write the configuration for `credentials` and reload the interface.
    pub async fn apply(&self, credentials: &WifiCredentials) -> Result<(), NetworkError> {
        credentials.validate()?;

        let contents = render_wpa_supplicant(credentials, &self.country);
        self.write_config(&contents).await?;
        info!(
            "Wrote Wi-Fi configuration for '{}' to {}",
            credentials.ssid,
            self.config_path.display()
        );

        match &self.reload_command {
            Some(argv) => self.reload(argv).await,
            None => {
                warn!("No reload command configured; new Wi-Fi settings apply after reboot");
                Ok(())
            }
        }
    }

    async fn write_config(&self, contents: &str) -> Result<(), NetworkError> {
        let tmp = self.config_path.with_extension("conf.tmp");
        let write_err = |source| NetworkError::Write {
            path: self.config_path.clone(),
            source,
        };

        tokio::fs::write(&tmp, contents).await.map_err(write_err)?;
        restrict_permissions(&tmp).await.map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.config_path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        Ok(())
    }

    async fn reload(&self, argv: &[String]) -> Result<(), NetworkError> {
        let args: Vec<String> = argv
            .iter()
            .map(|a| a.replace(IFACE_PLACEHOLDER, &self.interface))
            .collect();
        let command = args.join(" ");
        let (program, rest) = match args.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };

        info!("Reloading network: {}", command);
        let status = Command::new(program)
            .args(rest)
            .status()
            .await
            .map_err(|source| NetworkError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(NetworkError::ReloadFailed {
                command,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}
