//! Configuration for zonewatch front ends.
//!
//! TOML settings, the concrete credential sources (keyring, environment,
//! flat credential files), and translation to `zonewatch_core::MonitorConfig`.
//! The core never touches disk; everything file- or OS-shaped lives here.

pub mod sources;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use zonewatch_api::CredentialResolver;
use zonewatch_api::transport::{TlsMode, TransportConfig};
use zonewatch_core::{AnalyticsConfig, MonitorConfig};

pub use sources::{EnvSource, FileSource, KeyringSource, default_sources, parse_key_values};

/// Prefix for environment overrides; nested keys split on `__`
/// (`ZONEWATCH_REFRESH__INTERVAL_SECS=60`).
pub const ENV_PREFIX: &str = "ZONEWATCH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub refresh: RefreshSettings,

    #[serde(default)]
    pub analytics: AnalyticsSettings,

    #[serde(default)]
    pub credentials: CredentialSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Extra CA certificate (PEM), for TLS-intercepting proxies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            ca_cert: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RefreshSettings {
    /// Seconds between automatic cycles; 0 disables the timer.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            debounce_ms: default_debounce(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalyticsSettings {
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_lookback")]
    pub lookback_days: u32,

    #[serde(default = "default_ddos_lookback")]
    pub ddos_lookback_days: u32,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            lookback_days: default_lookback(),
            ddos_lookback_days: default_ddos_lookback(),
        }
    }
}

/// Where to look for a token, after the in-memory override.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialSettings {
    /// Environment variable holding the token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Environment variable holding the account id.
    #[serde(default = "default_account_env")]
    pub account_env: String,

    /// Account id for account-level attack analytics, overriding the one
    /// stored alongside the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Keyring service name for the saved token.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Extra `key = value` credential files, checked before the
    /// well-known locations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            account_env: default_account_env(),
            account_id: None,
            keyring_service: default_keyring_service(),
            files: Vec::new(),
        }
    }
}

fn default_base_url() -> String {
    zonewatch_api::DEFAULT_BASE_URL.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_interval() -> u64 {
    300
}
fn default_debounce() -> u64 {
    300
}
fn default_top_n() -> usize {
    10
}
fn default_lookback() -> u32 {
    7
}
fn default_ddos_lookback() -> u32 {
    30
}
fn default_token_env() -> String {
    "CLOUDFLARE_API_TOKEN".into()
}
fn default_account_env() -> String {
    "CLOUDFLARE_ACCOUNT_ID".into()
}
fn default_keyring_service() -> String {
    "zonewatch".into()
}

// ── Config file path ────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "zonewatch", "zonewatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("zonewatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path + environment. A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_toml(cfg)?)?;
    Ok(())
}

/// Render config as it would be written to disk.
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a validated `MonitorConfig`.
pub fn to_monitor_config(cfg: &Config) -> Result<MonitorConfig, ConfigError> {
    let base: url::Url = cfg
        .api
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api.base_url".into(),
            reason: format!("invalid URL: {}", cfg.api.base_url),
        })?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api.base_url".into(),
            reason: format!("unsupported scheme '{}'", base.scheme()),
        });
    }
    if cfg.analytics.top_n == 0 {
        return Err(ConfigError::Validation {
            field: "analytics.top_n".into(),
            reason: "must be at least 1".into(),
        });
    }
    if cfg.analytics.lookback_days == 0 || cfg.analytics.ddos_lookback_days == 0 {
        return Err(ConfigError::Validation {
            field: "analytics.lookback_days".into(),
            reason: "lookback windows must be at least one day".into(),
        });
    }

    let tls = cfg
        .api
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    Ok(MonitorConfig {
        base_url: cfg.api.base_url.clone(),
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(cfg.api.timeout_secs.max(1)),
        },
        refresh_interval: Duration::from_secs(cfg.refresh.interval_secs),
        selection_debounce: Duration::from_millis(cfg.refresh.debounce_ms),
        analytics: AnalyticsConfig {
            top_n: cfg.analytics.top_n,
            lookback_days: cfg.analytics.lookback_days,
            ddos_lookback_days: cfg.analytics.ddos_lookback_days,
            ..AnalyticsConfig::default()
        },
        account_id: cfg
            .credentials
            .account_id
            .clone()
            .filter(|a| !a.trim().is_empty()),
    })
}

/// Credential resolver over the configured sources, already resolved once.
pub fn build_resolver(cfg: &Config) -> CredentialResolver {
    CredentialResolver::new(default_sources(&cfg.credentials))
}
