//! Dcision Configuration
//!
//! Handles parsing and management of dcision.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::assembler::AssemblerConfig;

pub const CONFIG_FILE: &str = "dcision.toml";

/// Accepted values of `generation.backend`
pub const BACKENDS: [&str; 4] = ["ollama", "claude", "mock", "none"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching dcision.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DcisionConfig {
    /// Problem classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Language model settings
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl DcisionConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: DcisionConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.classifier.threshold) {
            return Err(ConfigError::Invalid(format!(
                "classifier.threshold must be within [0, 1], got {}",
                self.classifier.threshold
            )));
        }
        if !BACKENDS.contains(&self.generation.backend.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "generation.backend must be one of {}, got '{}'",
                BACKENDS.join(", "),
                self.generation.backend
            )));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Assembler settings derived from this file
    pub fn assembler(&self) -> AssemblerConfig {
        AssemblerConfig {
            threshold: self.classifier.threshold,
            timeout: Duration::from_secs(self.generation.timeout_secs),
        }
    }
}

/// Classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierConfig {
    /// Minimum confidence for a category (and for the deterministic path)
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_threshold() -> f32 {
    crate::classify::DEFAULT_THRESHOLD
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Backend: "ollama", "claude", "mock" or "none" (generative path disabled)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Model name; backend default when absent
    #[serde(default)]
    pub model: Option<String>,

    /// Ollama host URL
    #[serde(default)]
    pub host: Option<String>,

    /// Upper bound on one completion, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Completion length limit (Claude)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_backend() -> String {
    "ollama".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    2048
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: None,
            host: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DcisionConfig::default();
        assert_eq!(config.classifier.threshold, 0.5);
        assert_eq!(config.generation.backend, "ollama");
        assert_eq!(config.generation.timeout_secs, 60);
        assert_eq!(config.assembler().timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[classifier]
threshold = 0.7

[generation]
backend = "claude"
timeout_secs = 15
"#;
        let config: DcisionConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.classifier.threshold, 0.7);
        assert_eq!(config.generation.backend, "claude");
        assert_eq!(config.generation.timeout_secs, 15);
        assert_eq!(config.generation.max_tokens, 2048);
        assert!(config.generation.model.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = DcisionConfig::default();
        config.generation.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.generation.timeout_secs = 1;
        config.classifier.threshold = 1.5;
        assert!(config.validate().is_err());
        config.classifier.threshold = 0.5;
        config.generation.backend = "openai".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_find() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut config = DcisionConfig::default();
        config.generation.backend = "mock".to_string();
        config.save(&root.path().join(CONFIG_FILE)).unwrap();

        let found = DcisionConfig::find_and_load(&nested).unwrap();
        assert_eq!(found, config);
    }

    #[test]
    fn test_missing_file() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            DcisionConfig::load(&root.path().join(CONFIG_FILE)),
            Err(ConfigError::NotFound(_))
        ));
    }
}
