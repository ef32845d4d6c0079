//! Configuration loading, validation, and management for Umbra.
//!
//! Loads configuration from `~/.umbra/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.umbra/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the intent service (unused by Ollama)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Intent service provider ("ollama", "openai", "openrouter", ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature (0.0 keeps tool choice deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Base URL override for the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub profile: ProfileConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub travel: TravelConfig,

    #[serde(default)]
    pub contacts: ContactsConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3".into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("api_url", &self.api_url)
            .field("resolver", &self.resolver)
            .field("session", &self.session)
            .field("profile", &self.profile)
            .field("memory", &self.memory)
            .field("travel", &self.travel)
            .field("contacts", &self.contacts)
            .field("tools", &self.tools)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound on one intent-service call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Turns kept in the rolling conversation history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    umbra_core::DEFAULT_HISTORY_LIMIT
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Directory holding persona.md, context_profile.md and context/
    /// (default: the config directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Override the profile entirely (skips file loading)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_text: Option<String>,

    /// Additional context files to load (absolute paths)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "sqlite", "in_memory" or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// SQLite file (default: ~/.umbra/memory.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Journal every handled turn into memory
    #[serde(default = "default_true")]
    pub journal_turns: bool,
}

fn default_memory_backend() -> String {
    "sqlite".into()
}
fn default_true() -> bool {
    true
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
            journal_turns: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelConfig {
    /// SQLite file for friends and points of interest (default: ~/.umbra/travel.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactsConfig {
    /// Exported address book (default: ~/.umbra/contacts.csv)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_api_key: Option<String>,

    /// City used when the weather tool gets "current location"
    #[serde(default = "default_city")]
    pub default_city: String,

    #[serde(default = "default_country")]
    pub default_country: String,

    /// OpenWeatherMap units ("imperial" or "metric")
    #[serde(default = "default_units")]
    pub units: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_api_key: Option<String>,

    /// Authors the quote tool picks from
    #[serde(default = "default_inspirational_sources")]
    pub inspirational_sources: Vec<String>,
}

fn default_city() -> String {
    "Boston".into()
}
fn default_country() -> String {
    "US".into()
}
fn default_units() -> String {
    "imperial".into()
}
fn default_inspirational_sources() -> Vec<String> {
    vec![
        "Marcus Aurelius".into(),
        "Seneca".into(),
        "Maya Angelou".into(),
        "Theodore Roosevelt".into(),
        "Eleanor Roosevelt".into(),
    ]
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            default_city: default_city(),
            default_country: default_country(),
            units: default_units(),
            search_api_key: None,
            maps_api_key: None,
            inspirational_sources: default_inspirational_sources(),
        }
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("weather_api_key", &redact(&self.weather_api_key))
            .field("default_city", &self.default_city)
            .field("default_country", &self.default_country)
            .field("units", &self.units)
            .field("search_api_key", &redact(&self.search_api_key))
            .field("maps_api_key", &redact(&self.maps_api_key))
            .field("inspirational_sources", &self.inspirational_sources)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.umbra/config.toml).
    ///
    /// Environment variables override the file:
    /// - `UMBRA_API_KEY`, `UMBRA_PROVIDER`, `UMBRA_MODEL`
    /// - `OPENWEATHER_API_KEY`, `TAVILY_API_KEY`, `MAPS_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("UMBRA_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(provider) = lookup("UMBRA_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("UMBRA_MODEL") {
            self.model = model;
        }
        if let Some(key) = lookup("OPENWEATHER_API_KEY") {
            self.tools.weather_api_key = Some(key);
        }
        if let Some(key) = lookup("TAVILY_API_KEY") {
            self.tools.search_api_key = Some(key);
        }
        if let Some(key) = lookup("MAPS_API_KEY") {
            self.tools.maps_api_key = Some(key);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".umbra")
    }

    /// Directory holding the profile files.
    pub fn profile_dir(&self) -> PathBuf {
        match &self.profile.dir {
            Some(dir) => expand_home(dir),
            None => Self::config_dir(),
        }
    }

    pub fn memory_path(&self) -> PathBuf {
        self.memory
            .path
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| Self::config_dir().join("memory.db"))
    }

    pub fn travel_db_path(&self) -> PathBuf {
        self.travel
            .db_path
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| Self::config_dir().join("travel.db"))
    }

    pub fn contacts_path(&self) -> PathBuf {
        self.contacts
            .csv_path
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| Self::config_dir().join("contacts.csv"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.resolver.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "resolver.timeout_secs must be > 0".into(),
            ));
        }

        if self.session.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "session.history_limit must be > 0".into(),
            ));
        }

        if !matches!(self.memory.backend.as_str(), "sqlite" | "in_memory" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "unknown memory backend '{}' (expected sqlite, in_memory or none)",
                self.memory.backend
            )));
        }

        if !matches!(self.tools.units.as_str(), "imperial" | "metric") {
            return Err(ConfigError::ValidationError(format!(
                "tools.units must be 'imperial' or 'metric', got '{}'",
                self.tools.units
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            temperature: 0.0,
            api_url: None,
            resolver: ResolverConfig::default(),
            session: SessionConfig::default(),
            profile: ProfileConfig::default(),
            memory: MemoryConfig::default(),
            travel: TravelConfig::default(),
            contacts: ContactsConfig::default(),
            tools: ToolsConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs_home().join(rest),
        None => PathBuf::from(path),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
