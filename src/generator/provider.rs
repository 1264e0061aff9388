//! `edgequake-llm` backend: same fallback loop, any supported provider.
//!
//! A provider instance is bound to one model, so a fresh one is created per
//! attempt through [`ProviderFactory::create_llm_provider`]. A factory error
//! (unknown provider, missing key) counts as a failed attempt like any other.

use crate::config::ReviewConfig;
use crate::error::GenerateError;
use crate::generator::{Generation, Generator};
use edgequake_llm::{ChatMessage, CompletionOptions, ProviderFactory};
use tracing::debug;

/// Generator that delegates to a named `edgequake-llm` provider.
#[derive(Debug, Clone)]
pub struct ProviderGenerator {
    provider_name: String,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderGenerator {
    pub fn new(provider_name: impl Into<String>, config: &ReviewConfig) -> Self {
        Self {
            provider_name: provider_name.into(),
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_output_tokens as usize,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl Generator for ProviderGenerator {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, GenerateError> {
        let provider = ProviderFactory::create_llm_provider(&self.provider_name, model)
            .map_err(|e| GenerateError::Provider(e.to_string()))?;

        let messages = vec![ChatMessage::user(prompt)];
        let response = provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        debug!(
            "{}/{}: {} input tokens, {} output tokens",
            self.provider_name, model, response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(GenerateError::EmptyResponse(format!(
                "{} returned no text",
                self.provider_name
            )));
        }

        Ok(Generation {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}
