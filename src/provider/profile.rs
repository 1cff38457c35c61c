//! Provider configuration profile.

use super::{CompletionOptions, ModelProvider};
use crate::error::{ProviderError, ProviderErrorKind};
use serde::{Deserialize, Serialize};

/// Supported provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

pub fn provider_type_slug(provider_type: ProviderType) -> &'static str {
    match provider_type {
        ProviderType::OpenAI => "openai",
        ProviderType::Gemini => "gemini",
        ProviderType::Ollama => "ollama",
    }
}

/// Text generation provider settings as they appear in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,

    pub model: String,

    /// Inline API key. Prefer `api_key_env` outside of local experiments.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Override for the provider base URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub default_options: CompletionOptions,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            reqwest::Url::parse(endpoint)
                .map_err(|e| format!("Invalid endpoint URL '{}': {}", endpoint, e))?;
        }
        if let Some(temperature) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("Temperature must be within 0.0..=2.0, got {}", temperature));
            }
        }
        Ok(())
    }

    /// Resolve the API key from the inline value or the named environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        self.api_key_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|k| !k.is_empty())
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, ProviderError> {
        let require_key = || {
            self.resolve_api_key().ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorKind::NotConfigured,
                    format!(
                        "{} provider requires an API key (api_key or api_key_env)",
                        provider_type_slug(self.provider_type)
                    ),
                )
            })
        };

        Ok(match self.provider_type {
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model: self.model.clone(),
                api_key: require_key()?,
                base_url: self.endpoint.clone(),
            },
            ProviderType::Gemini => ModelProvider::Gemini {
                model: self.model.clone(),
                api_key: require_key()?,
                base_url: self.endpoint.clone(),
            },
            ProviderType::Ollama => ModelProvider::Ollama {
                model: self.model.clone(),
                base_url: self.endpoint.clone(),
            },
        })
    }
}
