//! TOML-backed configuration for the chatpipe service
//!
//! Secrets never live in the file: the config names environment variables
//! and keys are resolved at runtime.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub server: ServerSection,
    pub llm: LlmSection,
}

/// Service identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// Service identifier (must match [a-zA-Z0-9._-]+), used in logs
    pub id: String,
    /// Description of what this deployment is for
    pub description: String,
}

/// Web boundary settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Bind address for the HTTP API
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port for the HTTP API
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Provider name: "ollama" or "anthropic"
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Override the provider's default base URL
    pub base_url: Option<String>,
    /// Environment variable containing the API key (required for anthropic)
    pub api_key_env: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Completion length cap
    pub max_tokens: Option<u32>,
    /// Deadline for each generation call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid service ID format: {0}")]
    InvalidServiceId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_service_id(&self.pipeline.id)?;

        match self.llm.provider.as_str() {
            "ollama" => {}
            "anthropic" => {
                if self.llm.api_key_env.is_none() {
                    return Err(ConfigError::InvalidConfig(
                        "anthropic provider requires llm.api_key_env".to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::InvalidConfig(format!(
                    "Unsupported LLM provider: {other}"
                )));
            }
        }

        if let Some(base_url) = &self.llm.base_url {
            url::Url::parse(base_url).map_err(|e| {
                ConfigError::InvalidConfig(format!("Invalid llm.base_url '{base_url}': {e}"))
            })?;
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "llm.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve the API key from the configured environment variable
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        let env_name = self.llm.api_key_env.as_ref().ok_or_else(|| {
            ConfigError::InvalidConfig("llm.api_key_env is not configured".to_string())
        })?;
        std::env::var(env_name).map_err(|_| ConfigError::EnvVarNotFound(env_name.clone()))
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[pipeline]
id = "test-pipeline"
description = "A test pipeline"

[server]
bind = "127.0.0.1"
port = 5000

[llm]
provider = "ollama"
model = "mistral"
temperature = 0.3
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Validate service ID format
fn validate_service_id(id: &str) -> Result<(), ConfigError> {
    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidServiceId(format!(
            "Service ID '{id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let toml_content = r#"
[pipeline]
id = "demo"
description = "Routing demo deployment"

[server]
bind = "127.0.0.1"
port = 8080

[llm]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"
api_key_env = "ANTHROPIC_API_KEY"
temperature = 0.3
max_tokens = 1024
timeout_secs = 30
"#;

        let config: PipelineConfig = toml::from_str(toml_content).unwrap();
        config.validate().unwrap();
        assert_eq!(config.pipeline.id, "demo");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.temperature, Some(0.3));
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let toml_content = r#"
[pipeline]
id = "minimal"
description = "Minimal deployment"

[llm]
provider = "ollama"
model = "mistral"
"#;

        let config: PipelineConfig = toml::from_str(toml_content).unwrap();
        config.validate().unwrap();
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.llm.temperature, None);
        assert!(config.llm.base_url.is_none());
    }

    #[test]
    fn test_invalid_service_id_rejected() {
        assert!(validate_service_id("invalid@id").is_err());
        assert!(validate_service_id("").is_err());
        assert!(validate_service_id("valid-id_123.test").is_ok());
    }

    #[test]
    fn test_anthropic_requires_api_key_env() {
        let toml_content = r#"
[pipeline]
id = "demo"
description = "Demo"

[llm]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"
"#;

        let config: PipelineConfig = toml::from_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let toml_content = r#"
[pipeline]
id = "demo"
description = "Demo"

[llm]
provider = "carrier-pigeon"
model = "homing-v1"
"#;

        let config: PipelineConfig = toml::from_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_base_url_rejected() {
        let toml_content = r#"
[pipeline]
id = "demo"
description = "Demo"

[llm]
provider = "ollama"
model = "mistral"
base_url = "not a url"
"#;

        let config: PipelineConfig = toml::from_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let toml_content = r#"
[pipeline]
id = "demo"
description = "Demo"

[llm]
provider = "ollama"
model = "mistral"
timeout_secs = 0
"#;

        let config: PipelineConfig = toml::from_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[pipeline]
id = "from-file"
description = "Loaded from disk"

[llm]
provider = "ollama"
model = "mistral"
"#
        )
        .unwrap();

        let config = PipelineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.pipeline.id, "from-file");
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = PipelineConfig::load_from_file(Path::new("/nonexistent/chatpipe.toml"));
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }

    #[test]
    fn test_load_from_malformed_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "this is not toml [[[").unwrap();

        let result = PipelineConfig::load_from_file(file.path());
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_missing_api_key_env_var() {
        let mut config = PipelineConfig::test_config();
        config.llm.api_key_env = Some("CHATPIPE_TEST_KEY_THAT_DOES_NOT_EXIST".to_string());
        assert!(matches!(
            config.get_llm_api_key(),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }
}
