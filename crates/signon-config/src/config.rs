// crates/signon-config/src/config.rs
// ============================================================================
// Module: Sign-On Provider Configuration
// Description: Configuration loading and validation for the provider.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, signon-client
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys and out-of-range values fail closed. The `[api]` section
//! selects the regional API endpoint and token source, `[retry]` bounds the
//! back-off applied to remote calls, and `[audit]` selects where structured
//! audit events are written.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use signon_client::ClientSettings;
use signon_client::RetryPolicy;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "signon-provider.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SIGNON_PROVIDER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default environment variable holding the API access token.
const DEFAULT_ACCESS_TOKEN_ENV: &str = "PINGONE_API_ACCESS_TOKEN";
/// Default connect timeout in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
/// Default request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Maximum connect timeout in milliseconds.
pub(crate) const MAX_CONNECT_TIMEOUT_MS: u64 = 60_000;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;
/// Default initial retry delay in milliseconds.
const DEFAULT_RETRY_INITIAL_MS: u64 = 1_000;
/// Default retry growth factor.
const DEFAULT_RETRY_MULTIPLIER: u32 = 2;
/// Default retry delay cap in milliseconds.
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;
/// Default retry budget in milliseconds.
const DEFAULT_RETRY_BUDGET_MS: u64 = 120_000;
/// Maximum retry growth factor.
pub(crate) const MAX_RETRY_MULTIPLIER: u32 = 10;
/// Maximum retry budget in milliseconds.
pub(crate) const MAX_RETRY_BUDGET_MS: u64 = 60 * 60 * 1_000;
/// Maximum length of an API hostname override.
const MAX_HOSTNAME_LENGTH: usize = 253;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Sign-on provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Remote API configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Retry configuration for remote calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl ProviderConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then [`CONFIG_ENV_VAR`], then
    /// `signon-provider.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.retry.validate()?;
        self.audit.validate()
    }
}

// ============================================================================
// SECTION: API
// ============================================================================

/// Geographic region hosting the tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    /// North America (`.com`).
    #[default]
    #[serde(rename = "NA")]
    NorthAmerica,
    /// Europe (`.eu`).
    #[serde(rename = "EU")]
    Europe,
    /// Canada (`.ca`).
    #[serde(rename = "CA")]
    Canada,
    /// Asia-Pacific (`.asia`).
    #[serde(rename = "AP")]
    AsiaPacific,
    /// Asia-Pacific (`.com.au`).
    #[serde(rename = "AU")]
    Australia,
    /// Singapore (`.sg`).
    #[serde(rename = "SG")]
    Singapore,
}

impl Region {
    /// Returns the top-level domain suffix for the region.
    #[must_use]
    pub const fn domain_suffix(self) -> &'static str {
        match self {
            Self::NorthAmerica => "com",
            Self::Europe => "eu",
            Self::Canada => "ca",
            Self::AsiaPacific => "asia",
            Self::Australia => "com.au",
            Self::Singapore => "sg",
        }
    }

    /// Returns the region code used in configuration.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NorthAmerica => "NA",
            Self::Europe => "EU",
            Self::Canada => "CA",
            Self::AsiaPacific => "AP",
            Self::Australia => "AU",
            Self::Singapore => "SG",
        }
    }
}

/// Remote API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Tenant region.
    #[serde(default)]
    pub region: Region,
    /// Hostname overriding the regional default (e.g. a custom domain).
    #[serde(default)]
    pub api_hostname: Option<String>,
    /// Environment variable holding the access token.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    /// TCP connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            api_hostname: None,
            access_token_env: default_access_token_env(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    /// Returns the API base URL, including the version segment.
    #[must_use]
    pub fn base_url(&self) -> String {
        match &self.api_hostname {
            Some(hostname) => format!("https://{}/v1", hostname.trim()),
            None => format!("https://api.pingone.{}/v1", self.region.domain_suffix()),
        }
    }

    /// Builds HTTP client settings from this configuration.
    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..ClientSettings::new(self.base_url())
        }
    }

    /// Validates API settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hostname) = &self.api_hostname {
            validate_hostname(hostname)?;
        }
        let var = self.access_token_env.trim();
        if var.is_empty() {
            return Err(ConfigError::Invalid("api.access_token_env must be non-empty".to_string()));
        }
        if var.contains('=') || var.contains('\0') {
            return Err(ConfigError::Invalid(
                "api.access_token_env must be a valid environment variable name".to_string(),
            ));
        }
        validate_range("api.connect_timeout_ms", self.connect_timeout_ms, 1, MAX_CONNECT_TIMEOUT_MS)?;
        validate_range("api.request_timeout_ms", self.request_timeout_ms, 1, MAX_REQUEST_TIMEOUT_MS)
    }
}

// ============================================================================
// SECTION: Retry
// ============================================================================

/// Back-off configuration for remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_retry_initial_ms")]
    pub initial_delay_ms: u64,
    /// Growth factor applied after each retry.
    #[serde(default = "default_retry_multiplier")]
    pub multiplier: u32,
    /// Upper bound for a single delay, in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Total time an operation may spend retrying, in milliseconds.
    #[serde(default = "default_retry_budget_ms")]
    pub budget_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_RETRY_INITIAL_MS,
            multiplier: DEFAULT_RETRY_MULTIPLIER,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            budget_ms: DEFAULT_RETRY_BUDGET_MS,
        }
    }
}

impl RetryConfig {
    /// Converts the configuration into a retry policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            multiplier: self.multiplier,
            max_delay: Duration::from_millis(self.max_delay_ms),
            budget: Duration::from_millis(self.budget_ms),
        }
    }

    /// Validates retry settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_range("retry.budget_ms", self.budget_ms, 1, MAX_RETRY_BUDGET_MS)?;
        validate_range("retry.initial_delay_ms", self.initial_delay_ms, 1, self.budget_ms)?;
        validate_range("retry.max_delay_ms", self.max_delay_ms, self.initial_delay_ms, self.budget_ms)?;
        if self.multiplier == 0 || self.multiplier > MAX_RETRY_MULTIPLIER {
            return Err(ConfigError::Invalid(format!(
                "retry.multiplier must be between 1 and {MAX_RETRY_MULTIPLIER}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Audit disabled.
    None,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default access token environment variable.
fn default_access_token_env() -> String {
    DEFAULT_ACCESS_TOKEN_ENV.to_string()
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default initial retry delay.
const fn default_retry_initial_ms() -> u64 {
    DEFAULT_RETRY_INITIAL_MS
}

/// Default retry growth factor.
const fn default_retry_multiplier() -> u32 {
    DEFAULT_RETRY_MULTIPLIER
}

/// Default retry delay cap.
const fn default_retry_max_delay_ms() -> u64 {
    DEFAULT_RETRY_MAX_DELAY_MS
}

/// Default retry budget.
const fn default_retry_budget_ms() -> u64 {
    DEFAULT_RETRY_BUDGET_MS
}

/// Resolves the config path from an explicit path or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a bare hostname override.
fn validate_hostname(value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_HOSTNAME_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "api.api_hostname must be 1..={MAX_HOSTNAME_LENGTH} characters"
        )));
    }
    let valid = trimmed.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
    });
    if !valid {
        return Err(ConfigError::Invalid(
            "api.api_hostname must be a hostname without scheme or path".to_string(),
        ));
    }
    Ok(())
}

/// Validates an inclusive numeric range.
fn validate_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::Invalid(format!("{field} must be between {min} and {max}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
