//! Configuration loading and accessors.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level deep agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tool_iterations: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl Config {
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::DeepAgentError::Io)?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| crate::error::DeepAgentError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(8000)
    }

    pub fn model_name(&self) -> String {
        self.model
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| "claude-sonnet-4-5-20250929".to_string())
    }

    pub fn model_base_url(&self) -> Option<String> {
        self.model.as_ref().and_then(|m| m.base_url.clone())
    }

    pub fn max_tokens(&self) -> u32 {
        self.model
            .as_ref()
            .and_then(|m| m.max_tokens)
            .unwrap_or(8192)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.model.as_ref().and_then(|m| m.temperature).or(Some(0.0))
    }

    pub fn max_tool_iterations(&self) -> u32 {
        self.model
            .as_ref()
            .and_then(|m| m.max_tool_iterations)
            .unwrap_or(25)
    }

    /// Anthropic API key: config value first, then the named (or default) env var.
    pub fn anthropic_api_key(&self) -> Option<String> {
        let (direct, env) = match self.model.as_ref() {
            Some(m) => (m.api_key.clone(), m.api_key_env.clone()),
            None => (None, None),
        };
        resolve_secret(&direct, env.as_deref().unwrap_or("ANTHROPIC_API_KEY"))
    }

    pub fn tavily_api_key(&self) -> Option<String> {
        let (direct, env) = match self.search.as_ref() {
            Some(s) => (s.api_key.clone(), s.api_key_env.clone()),
            None => (None, None),
        };
        resolve_secret(&direct, env.as_deref().unwrap_or("TAVILY_API_KEY"))
    }

    pub fn search_max_results(&self) -> usize {
        self.search.as_ref().and_then(|s| s.max_results).unwrap_or(5)
    }
}

fn resolve_secret(direct: &Option<String>, env_var: &str) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Ok(val) = std::env::var(env_var) {
        if !val.is_empty() {
            return Some(val);
        }
    }
    None
}
