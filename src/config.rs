//! Configuration discovery and loading
//!
//! Provider availability comes only from credentials in the environment.
//! Operational tunables (TTLs, limits, timeouts, endpoints) come from the
//! first TOML file found in this hierarchy:
//! 1. Current directory: ./seoforge.toml or ./.seoforge/config.toml
//! 2. User config: ~/.seoforge/config.toml
//! 3. System config: /etc/seoforge/config.toml
//! 4. Built-in defaults

use crate::env::{self, credentials, endpoints, models};
use crate::llm::PollPolicy;
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

/// Provider credentials, read once at startup.
///
/// Empty values count as absent. `Debug` never prints the secrets.
#[derive(Clone, Default)]
pub struct Credentials {
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std_env::var(name).ok())
    }

    /// Builds credentials from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            google_api_key: read(credentials::GOOGLE_API_KEY),
            openai_api_key: read(credentials::OPENAI_API_KEY),
            anthropic_api_key: read(credentials::ANTHROPIC_API_KEY),
            replicate_api_token: read(credentials::REPLICATE_API_TOKEN),
        }
    }

    /// Names of the variables that are set, for logging and status output.
    pub fn present(&self) -> Vec<&'static str> {
        [
            (credentials::GOOGLE_API_KEY, &self.google_api_key),
            (credentials::OPENAI_API_KEY, &self.openai_api_key),
            (credentials::ANTHROPIC_API_KEY, &self.anthropic_api_key),
            (credentials::REPLICATE_API_TOKEN, &self.replicate_api_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_some())
        .map(|(name, _)| name)
        .collect()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("present", &self.present())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub rate_limits: RateLimitConfig,
    pub http: HttpConfig,
    pub polling: PollingConfig,
    pub endpoints: EndpointConfig,
    pub models: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub sweep_interval_secs: u64,
    pub content_ttl_secs: u64,
    pub seo_ttl_secs: u64,
    pub keywords_ttl_secs: u64,
    pub translation_ttl_secs: u64,
    pub image_ttl_secs: u64,
    pub wordpress_post_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: 60,
            content_ttl_secs: 7200,
            seo_ttl_secs: 3600,
            keywords_ttl_secs: 86400,
            translation_ttl_secs: 86400,
            image_ttl_secs: 604800,
            wordpress_post_ttl_secs: 1800,
        }
    }
}

impl CacheConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_secs: u64,
    pub content_generation: u32,
    pub image_generation: u32,
    pub general: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 3600,
            content_generation: 50,
            image_generation: 100,
            general: 200,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub text_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub wordpress_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            text_timeout_secs: 30,
            image_timeout_secs: 60,
            wordpress_timeout_secs: 10,
        }
    }
}

impl HttpConfig {
    pub fn text_timeout(&self) -> Duration {
        Duration::from_secs(self.text_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }

    pub fn wordpress_timeout(&self) -> Duration {
        Duration::from_secs(self.wordpress_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            interval_ms: policy.interval.as_millis() as u64,
            max_attempts: policy.max_attempts,
        }
    }
}

impl PollingConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub gemini: String,
    pub openai: String,
    pub anthropic: String,
    pub replicate: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            gemini: endpoints::GEMINI_BASE_URL.to_string(),
            openai: endpoints::OPENAI_BASE_URL.to_string(),
            anthropic: endpoints::ANTHROPIC_BASE_URL.to_string(),
            replicate: endpoints::REPLICATE_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub gemini: String,
    pub openai_chat: String,
    pub anthropic: String,
    pub dalle: String,
    pub flux: String,
    pub openjourney: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            gemini: models::GEMINI_MODEL.to_string(),
            openai_chat: models::OPENAI_CHAT_MODEL.to_string(),
            anthropic: models::ANTHROPIC_MODEL.to_string(),
            dalle: models::DALLE_MODEL.to_string(),
            flux: models::FLUX_MODEL.to_string(),
            openjourney: models::OPENJOURNEY_MODEL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ServiceConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "polling.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.rate_limits.enabled && self.rate_limits.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limits.window_secs must be positive".to_string(),
            ));
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.sweep_interval_secs must be positive".to_string(),
            ));
        }
        let timeouts = [
            self.http.text_timeout_secs,
            self.http.image_timeout_secs,
            self.http.wordpress_timeout_secs,
        ];
        if timeouts.contains(&0) {
            return Err(ConfigError::Invalid(
                "http timeouts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<ServiceConfig, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return ServiceConfig::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(ServiceConfig::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        Self::first_existing(Self::get_config_candidates())
    }

    fn first_existing(candidates: Vec<PathBuf>) -> Option<PathBuf> {
        for candidate in candidates {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    pub fn get_config_candidates() -> Vec<PathBuf> {
        Self::candidates_for(std_env::current_dir().ok(), Self::get_home_dir())
    }

    fn candidates_for(current_dir: Option<PathBuf>, home_dir: Option<PathBuf>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(current_dir) = current_dir {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = home_dir {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/seoforge").join(env::CONFIG_FILE_NAME));

        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(
                PathBuf::from(program_data)
                    .join("seoforge")
                    .join(env::CONFIG_FILE_NAME),
            );
        }

        candidates
    }

    /// Get home directory path
    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Create a default config file in the user's home directory
    pub fn create_default_user_config() -> Result<PathBuf, ConfigError> {
        let home_dir = Self::get_home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Self::create_default_config_in(&home_dir)
    }

    fn create_default_config_in(home_dir: &Path) -> Result<PathBuf, ConfigError> {
        let config_dir = env::seoforge_dir_path(home_dir);
        let config_path = env::user_config_file_path(home_dir);

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|source| ConfigError::Io {
                path: config_dir.clone(),
                source,
            })?;
            info!("Created configuration directory: {:?}", config_dir);
        }

        if !config_path.exists() {
            ServiceConfig::default().to_toml_file(&config_path)?;
            info!("Created default configuration file: {:?}", config_path);
        } else {
            warn!("Configuration file already exists: {:?}", config_path);
        }

        Ok(config_path)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        let candidates = Self::get_config_candidates();
        for (i, candidate) in candidates.iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        if let Some(found) = Self::find_config_file() {
            println!("Active configuration: {:?}", found);
        } else {
            println!("Active configuration: Built-in defaults");
        }

        let credentials = Credentials::from_env();
        println!();
        println!("Provider credentials:");
        for name in [
            credentials::GOOGLE_API_KEY,
            credentials::OPENAI_API_KEY,
            credentials::ANTHROPIC_API_KEY,
            credentials::REPLICATE_API_TOKEN,
        ] {
            let status = if credentials.present().contains(&name) {
                "✓ SET"
            } else {
                "✗ NOT SET"
            };
            println!("  {} - {}", name, status);
        }
    }
}
