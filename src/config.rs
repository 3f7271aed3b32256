use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_CONFIG_PATH, DEFAULT_PORT, DEFAULT_SENTINEL, DEFAULT_STORE_PATH};
use crate::error::{BrandError, Result};
use crate::pipeline::processing::normalize::{NormalizationPolicy, UnresolvedTextPolicy};
use crate::pipeline::processing::replace::ReplaceStrategy;

pub const ENV_STORE_BACKEND: &str = "BRANDNORM_STORE_BACKEND";
pub const ENV_STORE_PATH: &str = "BRANDNORM_STORE_PATH";
pub const ENV_REPLACE_STRATEGY: &str = "BRANDNORM_REPLACE_STRATEGY";
pub const ENV_UNRESOLVED_TEXT: &str = "BRANDNORM_UNRESOLVED_TEXT";
pub const ENV_SENTINEL: &str = "BRANDNORM_SENTINEL";
pub const ENV_PORT: &str = "BRANDNORM_PORT";
pub const ENV_LOG_DIR: &str = "BRANDNORM_LOG_DIR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub normalizer: NormalizerConfig,
    pub replace: ReplaceConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    #[default]
    JsonFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::JsonFile,
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub unresolved_text: UnresolvedTextPolicy,
    pub sentinel: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            unresolved_text: UnresolvedTextPolicy::Sentinel,
            sentinel: DEFAULT_SENTINEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReplaceConfig {
    pub strategy: ReplaceStrategy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the rolling JSON log file; console only when unset
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `brandnorm.toml` when it exists,
    /// then apply environment overrides. Every key has a default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BrandError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_STORE_BACKEND) {
            self.store.backend = parse_choice(ENV_STORE_BACKEND, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STORE_PATH) {
            self.store.path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup(ENV_REPLACE_STRATEGY) {
            self.replace.strategy = parse_choice(ENV_REPLACE_STRATEGY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_UNRESOLVED_TEXT) {
            self.normalizer.unresolved_text = parse_choice(ENV_UNRESOLVED_TEXT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SENTINEL) {
            self.normalizer.sentinel = raw;
        }
        if let Some(raw) = lookup(ENV_PORT) {
            self.server.port = raw
                .trim()
                .parse()
                .map_err(|_| BrandError::Config(format!("{} must be a port number, got '{}'", ENV_PORT, raw)))?;
        }
        if let Some(raw) = lookup(ENV_LOG_DIR) {
            self.logging.dir = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.normalizer.unresolved_text == UnresolvedTextPolicy::Sentinel
            && self.normalizer.sentinel.trim().is_empty()
        {
            return Err(BrandError::Config(
                "normalizer.sentinel must be non-empty text when unresolved_text = \"sentinel\""
                    .to_string(),
            ));
        }
        if self.store.backend == StoreBackend::JsonFile && self.store.path.as_os_str().is_empty() {
            return Err(BrandError::Config(
                "store.path is required for the json_file backend".to_string(),
            ));
        }
        Ok(())
    }

    pub fn normalization_policy(&self) -> NormalizationPolicy {
        NormalizationPolicy {
            unresolved_text: self.normalizer.unresolved_text,
            sentinel: self.normalizer.sentinel.trim().to_string(),
        }
    }
}

/// Parse a snake_case choice the same way the TOML file spells it.
fn parse_choice<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .map_err(|_| BrandError::Config(format!("{} has unsupported value '{}'", key, raw)))
}
