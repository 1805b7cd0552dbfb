//! Node configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for the CodexBase node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// API listen address.
    pub listen_addr: String,
    /// Log level.
    pub log_level: String,

    /// Access tokens: map of bearer token to user id.
    #[serde(default)]
    pub tokens: HashMap<String, String>,

    /// AI completion service, if any.
    #[serde(default)]
    pub ai: Option<AiConfig>,
}

/// Connection settings for the AI completion service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,
    /// Model name to request.
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            log_level: "info".to_string(),
            tokens: HashMap::new(),
            ai: None,
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&raw)?;
        Ok(config)
    }
}
