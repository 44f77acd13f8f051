//! Configuration for OpenAI-compatible completion engines.

use secrecy::SecretString;

use personachat_types::config::CompletionConfig;

/// Configuration used to construct an [`super::OpenAiCompatibleProvider`].
///
/// Holds the API key as a [`SecretString`]; it is only exposed when the
/// HTTP client is built.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openai").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when a request leaves `model` empty.
    pub model: String,
}

impl OpenAiCompatConfig {
    pub fn from_completion_config(config: &CompletionConfig, api_key: SecretString) -> Self {
        Self {
            provider_name: config.provider_name.clone(),
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
        }
    }
}

/// OpenAI defaults. Base URL: `https://api.openai.com/v1`
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: "https://api.openai.com/v1".into(),
        api_key,
        model: model.into(),
    }
}
