//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default management API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://management.core.windows.net";

/// Management API settings derived from environment variables and
/// configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "MGMT",
    discovery(
        app_name = "mgmtctl",
        env_var = "MGMTCTL_CONFIG_PATH",
        config_file_name = "mgmtctl.toml",
        dotfile_name = ".mgmtctl.toml",
        project_file_name = "mgmtctl.toml"
    )
)]
pub struct ManagementConfig {
    /// Base URL of the management API.
    #[ortho_config(default = DEFAULT_ENDPOINT.to_owned())]
    pub endpoint: String,
    /// Subscription that owns the managed services. This value is required.
    pub subscription_id: String,
    /// Bearer token presented on every request. This value is required.
    pub access_token: String,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 60)]
    pub request_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ManagementConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to mgmtctl.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("mgmtctl")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Performs semantic validation on required fields. Error messages name
    /// the environment variable and configuration key that supply the value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty,
    /// or [`ConfigError::InvalidTimeout`] when the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.endpoint,
            &FieldMetadata::new("management endpoint", "MGMT_ENDPOINT", "endpoint"),
        )?;
        Self::require_field(
            &self.subscription_id,
            &FieldMetadata::new(
                "subscription ID",
                "MGMT_SUBSCRIPTION_ID",
                "subscription_id",
            ),
        )?;
        Self::require_field(
            &self.access_token,
            &FieldMetadata::new("API access token", "MGMT_ACCESS_TOKEN", "access_token"),
        )?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Raised when the request timeout is zero.
    #[error("request timeout must be greater than zero (MGMT_REQUEST_TIMEOUT_SECS)")]
    InvalidTimeout,
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
