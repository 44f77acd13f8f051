//! LlmProvider trait definition.
//!
//! The completion engine is an opaque request/response service. Uses RPITIT
//! for `complete`, like the storage ports.

use personachat_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for completion engine backends.
///
/// Implementations live in personachat-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
