//! Configuration file management.
//!
//! Supports reading secrets from `~/.config/nexus/secret.json`, with an
//! environment-variable fallback for the Gemini API key.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::client::ClientError;

/// Environment variable consulted when secret.json has no Gemini entry.
pub const GEMINI_API_KEY_ENV: &str = "NEXUS_GEMINI_API_KEY";

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Loads the secret configuration file from ~/.config/nexus/secret.json
pub fn load_secret_config() -> Result<SecretConfig, ClientError> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(ClientError::Config(format!(
            "configuration file not found at: {}",
            config_path.display()
        )));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        ClientError::Config(format!(
            "failed to read configuration file at {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        ClientError::Config(format!(
            "failed to parse configuration file at {}: {}",
            config_path.display(),
            e
        ))
    })
}

/// Resolves the Gemini configuration: secret.json first, environment second.
pub fn resolve_gemini_config() -> Result<GeminiConfig, ClientError> {
    if let Ok(config) = load_secret_config() {
        if let Some(gemini) = config.gemini {
            return Ok(gemini);
        }
    }

    match std::env::var(GEMINI_API_KEY_ENV) {
        Ok(api_key) if !api_key.trim().is_empty() => Ok(GeminiConfig {
            api_key,
            model_name: None,
        }),
        _ => Err(ClientError::Config(format!(
            "no Gemini configuration in secret.json and {} is unset",
            GEMINI_API_KEY_ENV
        ))),
    }
}

/// Returns the path to the configuration file: ~/.config/nexus/secret.json
fn get_config_path() -> Result<PathBuf, ClientError> {
    let home = dirs::home_dir()
        .ok_or_else(|| ClientError::Config("could not determine home directory".to_string()))?;
    Ok(home.join(".config").join("nexus").join("secret.json"))
}
