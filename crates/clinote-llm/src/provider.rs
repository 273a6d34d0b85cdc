//! LLM provider trait

use crate::error::LlmError;

/// Text completion against a language model.
///
/// Implement [`LlmProvider`]; `LocalLlmProvider` is derived from it.
#[trait_variant::make(LlmProvider: Send)]
pub trait LocalLlmProvider {
    /// Send one prompt, return the raw reply text
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Check if provider is available
    async fn is_available(&self) -> bool;

    /// Get provider name
    fn name(&self) -> &'static str;

    /// Get model name
    fn model(&self) -> &str;
}
