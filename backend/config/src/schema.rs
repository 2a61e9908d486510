//! StackForge runtime configuration schema.
//!
//! Every section is optional in the file and falls back to its default, so
//! an empty config file (or none at all) yields a runnable mock-backed
//! service.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackForgeConfig {
    pub provider: ProviderConfig,
    pub generation: GenerationSettings,
    pub throttle: ThrottleSettings,
    pub session: SessionSettings,
    pub gateway: GatewaySettings,
    pub logging: LoggingSettings,
}

/// Which completion backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderKind {
    AzureOpenai,
    Gemini,
    #[default]
    Mock,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Supports `${ENV_VAR}` references, resolved at load time.
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// Descriptions shorter than this are rejected before any backend call.
    pub min_input_len: usize,
    /// Ceiling on continuation rounds per section.
    pub max_continuations: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 8192,
            top_p: 0.9,
            frequency_penalty: 0.1,
            presence_penalty: 0.1,
            min_input_len: 10,
            max_continuations: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThrottleSettings {
    pub tokens_per_minute: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            tokens_per_minute: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Sessions idle past this many seconds are evicted by the sweeper.
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewaySettings {
    pub host: String,
    pub port: u16,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub dir: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config: StackForgeConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, StackForgeConfig::default());
        assert_eq!(config.provider.kind, ProviderKind::Mock);
        assert_eq!(config.throttle.tokens_per_minute, 1_000_000);
    }

    #[test]
    fn camel_case_keys_deserialize() {
        let yaml = r#"
provider:
  kind: azureOpenai
  apiVersion: "2024-02-01"
generation:
  maxTokens: 4096
  maxContinuations: 3
"#;
        let config: StackForgeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::AzureOpenai);
        assert_eq!(config.provider.api_version.as_deref(), Some("2024-02-01"));
        assert_eq!(config.generation.max_tokens, 4096);
        assert_eq!(config.generation.max_continuations, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.generation.min_input_len, 10);
        assert_eq!(config.gateway.port, 8000);
    }
}
