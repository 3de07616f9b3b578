//! Process configuration, resolved once at startup.
//!
//! Pipelines never read the environment themselves. `AppConfig::from_env()`
//! runs in `run()` and the resolved values are handed to the backend
//! factory and the HTTP server.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "Medico";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "medgemma:4b";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medico=info,medico_lib=info"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

impl ConfigError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => "invalid_value",
            Self::Missing(_) => "missing",
        }
    }
}

/// Which generative backend serves diagnosis and chat.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Ollama {
        base_url: String,
        model: String,
    },
    Gemini {
        base_url: String,
        model: String,
        #[serde(skip_serializing)]
        api_key: String,
    },
}

// Key stays out of `{:?}` output.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama { base_url, model } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            Self::Gemini { base_url, model, .. } => f
                .debug_struct("Gemini")
                .field("base_url", base_url)
                .field("model", model)
                .field("api_key", &"[redacted]")
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub backend: BackendConfig,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Resolve configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    ///
    /// Tests pass a map-backed closure instead of mutating the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("MEDICO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "MEDICO_BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let timeout_secs = match get("MEDICO_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MEDICO_REQUEST_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let backend_kind = get("MEDICO_BACKEND").unwrap_or_else(|| "ollama".to_string());
        let backend = match backend_kind.to_ascii_lowercase().as_str() {
            "ollama" => BackendConfig::Ollama {
                base_url: get("MEDICO_OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.into()),
                model: get("MEDICO_OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.into()),
            },
            "gemini" => BackendConfig::Gemini {
                base_url: get("MEDICO_GEMINI_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.into()),
                model: get("MEDICO_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
                api_key: get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?,
            },
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "MEDICO_BACKEND",
                    value: backend_kind,
                })
            }
        };

        Ok(Self {
            bind_addr,
            backend,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
