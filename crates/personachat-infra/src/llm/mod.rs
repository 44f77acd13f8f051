//! Completion engine implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined in
//! `personachat-core`, plus [`create_provider`] which builds one from the
//! `[completion]` config section.
//!
//! [`LlmProvider`]: personachat_core::llm::provider::LlmProvider

pub mod openai_compat;

use secrecy::SecretString;

use personachat_types::config::CompletionConfig;

use self::openai_compat::config::OpenAiCompatConfig;
use self::openai_compat::OpenAiCompatibleProvider;

/// Build the completion engine client.
///
/// Without an API key the client is still built so that read-only commands
/// work; chat requests then fail with an authentication error from the engine.
pub fn create_provider(
    config: &CompletionConfig,
    api_key: Option<SecretString>,
) -> OpenAiCompatibleProvider {
    let api_key = api_key.unwrap_or_else(|| {
        tracing::warn!(
            provider = %config.provider_name,
            "no API key configured, chat requests will be rejected by the engine"
        );
        SecretString::from(String::new())
    });
    OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_completion_config(config, api_key))
}
