//! Provider configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use medexam_core::generation::QuestionGenerator;

use crate::gemini::GeminiProvider;
use crate::mock::MockGenerator;

/// Configuration for the AI generation backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Mock {
        #[serde(default = "default_mock_response")]
        response: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response", response)
                .finish(),
        }
    }
}

fn default_mock_response() -> String {
    "[]".to_string()
}

/// Top-level provider configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub provider: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
                model: None,
            },
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
        } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: model.clone(),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `medexam.toml` in the current directory
/// 2. `~/.config/medexam/config.toml`
///
/// Environment variable override: `MEDEXAM_GEMINI_KEY`.
pub fn load_config() -> Result<ProvidersConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ProvidersConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("medexam.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ProvidersConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ProvidersConfig::default(),
    };

    // Apply env var override
    if let Ok(key) = std::env::var("MEDEXAM_GEMINI_KEY") {
        if let ProviderConfig::Gemini { api_key, .. } = &mut config.provider {
            *api_key = key;
        }
    }

    config.provider = resolve_provider_config(&config.provider);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("medexam"))
}

/// Create a generator instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn QuestionGenerator>> {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
        } => {
            if api_key.is_empty() {
                anyhow::bail!("gemini provider requires an api_key (set MEDEXAM_GEMINI_KEY)");
            }
            Ok(Arc::new(GeminiProvider::new(
                api_key,
                base_url.clone(),
                model.clone(),
            )))
        }
        ProviderConfig::Mock { response } => Ok(Arc::new(MockGenerator::with_response(response))),
    }
}
