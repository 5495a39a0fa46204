//! Configuration file loading with precedence handling.

use crate::model::Language;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MEALSNAP_CONFIG";
/// Environment variable overriding `language`.
pub const LANGUAGE_ENV: &str = "MEALSNAP_LANGUAGE";
/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "MEALSNAP_API_URL";
/// Environment variable overriding `api_token`.
pub const API_TOKEN_ENV: &str = "MEALSNAP_API_TOKEN";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SUBMISSION_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A setting parsed but its value is not acceptable.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue {
        /// Setting name.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Where committed meals go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// The HTTP meals endpoint.
    #[default]
    Remote,
    /// A local JSONL file.
    Local,
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/mealsnap/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Analysis locale (`en` or `he`).
    #[serde(default)]
    pub language: Option<String>,

    /// Root URL of the nutrition API.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Bearer token for the nutrition API.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Analysis call timeout in seconds.
    #[serde(default)]
    pub analysis_timeout_secs: Option<u64>,

    /// Submission call timeout in seconds.
    #[serde(default)]
    pub submission_timeout_secs: Option<u64>,

    /// Meal store backend.
    #[serde(default)]
    pub store: Option<StoreKind>,

    /// JSONL file used by the local store.
    #[serde(default)]
    pub local_store_path: Option<PathBuf>,

    /// Camera command argv; `{output}` is replaced with the image path.
    #[serde(default)]
    pub capture_command: Option<Vec<String>>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Analysis locale.
    pub language: Language,
    /// Root URL of the nutrition API.
    pub api_base_url: String,
    /// Bearer token, never logged.
    pub api_token: Option<String>,
    /// Analysis call timeout in seconds.
    pub analysis_timeout_secs: u64,
    /// Submission call timeout in seconds.
    pub submission_timeout_secs: u64,
    /// Meal store backend.
    pub store: StoreKind,
    /// JSONL file used by the local store.
    pub local_store_path: PathBuf,
    /// Camera command argv; empty when no camera is configured.
    pub capture_command: Vec<String>,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl ResolvedConfig {
    /// Analysis timeout as a duration.
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    /// Submission timeout as a duration.
    pub fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.submission_timeout_secs)
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            analysis_timeout_secs: DEFAULT_ANALYSIS_TIMEOUT_SECS,
            submission_timeout_secs: DEFAULT_SUBMISSION_TIMEOUT_SECS,
            store: StoreKind::default(),
            local_store_path: default_store_path(),
            capture_command: Vec::new(),
            log_file_path: default_log_path(),
        }
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("language", &self.language)
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("analysis_timeout_secs", &self.analysis_timeout_secs)
            .field("submission_timeout_secs", &self.submission_timeout_secs)
            .field("store", &self.store)
            .field("local_store_path", &self.local_store_path)
            .field("capture_command", &self.capture_command)
            .field("log_file_path", &self.log_file_path)
            .finish()
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/mealsnap/mealsnap.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    match dirs::state_dir() {
        Some(state_dir) => state_dir.join("mealsnap").join("mealsnap.log"),
        None => PathBuf::from("mealsnap.log"),
    }
}

/// Resolve default local store path: `<data_dir>/mealsnap/meals.jsonl`.
pub fn default_store_path() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("mealsnap").join("meals.jsonl"),
        None => PathBuf::from("meals.jsonl"),
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/mealsnap/config.toml` on Unix, appropriate path on other platforms.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mealsnap").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `MEALSNAP_CONFIG` environment variable
/// 3. Default path `~/.config/mealsnap/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    match default_config_path() {
        Some(default_path) => load_config_file(default_path),
        None => Ok(None),
    }
}

/// Merge config file into defaults to create resolved config.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for an unknown language code or a
/// zero timeout.
pub fn merge_config(config_file: Option<ConfigFile>) -> Result<ResolvedConfig, ConfigError> {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return Ok(defaults);
    };

    let language = match config.language {
        Some(code) => parse_language(&code)?,
        None => defaults.language,
    };

    Ok(ResolvedConfig {
        language,
        api_base_url: config.api_base_url.unwrap_or(defaults.api_base_url),
        api_token: config.api_token.filter(|t| !t.trim().is_empty()),
        analysis_timeout_secs: positive_secs(
            "analysis_timeout_secs",
            config.analysis_timeout_secs,
            defaults.analysis_timeout_secs,
        )?,
        submission_timeout_secs: positive_secs(
            "submission_timeout_secs",
            config.submission_timeout_secs,
            defaults.submission_timeout_secs,
        )?,
        store: config.store.unwrap_or(defaults.store),
        local_store_path: config.local_store_path.unwrap_or(defaults.local_store_path),
        capture_command: config.capture_command.unwrap_or(defaults.capture_command),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    })
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `MEALSNAP_LANGUAGE`: Override language
/// - `MEALSNAP_API_URL`: Override API root
/// - `MEALSNAP_API_TOKEN`: Override token
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for an unknown language code.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(code) = std::env::var(LANGUAGE_ENV) {
        config.language = parse_language(&code)?;
    }

    if let Ok(url) = std::env::var(API_URL_ENV) {
        config.api_base_url = url;
    }

    if let Ok(token) = std::env::var(API_TOKEN_ENV) {
        config.api_token = Some(token).filter(|t| !t.trim().is_empty());
    }

    Ok(config)
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    language_override: Option<Language>,
    api_url_override: Option<String>,
    local_store: bool,
) -> ResolvedConfig {
    if let Some(language) = language_override {
        config.language = language;
    }

    if let Some(url) = api_url_override {
        config.api_base_url = url;
    }

    if local_store {
        config.store = StoreKind::Local;
    }

    config
}

fn parse_language(code: &str) -> Result<Language, ConfigError> {
    code.parse().map_err(|e: crate::model::UnknownLanguage| ConfigError::InvalidValue {
        key: "language",
        reason: e.to_string(),
    })
}

fn positive_secs(key: &'static str, value: Option<u64>, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::InvalidValue {
            key,
            reason: "must be at least 1 second".to_string(),
        }),
        Some(secs) => Ok(secs),
        None => Ok(default),
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
