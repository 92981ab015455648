use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "PIPEFLOW_BASE_URL";
pub const ENV_PARSE_PATH: &str = "PIPEFLOW_PARSE_PATH";
pub const ENV_LLM_PATH: &str = "PIPEFLOW_LLM_PATH";
pub const ENV_TIMEOUT_SECS: &str = "PIPEFLOW_TIMEOUT_SECS";

/// Where the collaborators live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_parse_path")]
    pub parse_path: String,

    #[serde(default = "default_llm_path")]
    pub llm_path: String,

    /// Per-request timeout. `None` leaves requests unbounded.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_parse_path() -> String {
    "/pipelines/parse".to_string()
}

fn default_llm_path() -> String {
    "/api/llm".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            parse_path: default_parse_path(),
            llm_path: default_llm_path(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `PIPEFLOW_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(path) = lookup(ENV_PARSE_PATH) {
            config.parse_path = path;
        }
        if let Some(path) = lookup(ENV_LLM_PATH) {
            config.llm_path = path;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS.to_string(),
                value: raw.clone(),
            })?;
            config.timeout_secs = Some(secs);
        }
        Ok(config)
    }

    pub fn parse_url(&self) -> String {
        self.join(&self.parse_path)
    }

    pub fn llm_url(&self) -> String {
        self.join(&self.llm_path)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
