//! Text-generation backends.
//!
//! The fallback loop in [`crate::pipeline::invoke`] only needs one operation:
//! "send this prompt to this model". [`Generator`] is that seam. Two backends
//! ship with the crate:
//!
//! - [`GeminiGenerator`] — direct REST client for the Generative Language
//!   API, the only backend that carries top-k and per-category safety
//!   thresholds on the wire.
//! - [`ProviderGenerator`] — routes through an `edgequake-llm` provider
//!   (OpenAI, Anthropic, Ollama, …) chosen by name.

pub mod gemini;
pub mod provider;

pub use gemini::{GeminiGenerator, ModelInfo};
pub use provider::ProviderGenerator;

use crate::error::GenerateError;
use serde::{Deserialize, Serialize};

/// Text returned by a successful call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            input_tokens: 0,
            output_tokens: 0,
        }
    }
}

/// A backend that can send one prompt to one named model.
#[allow(async_fn_in_trait)]
pub trait Generator {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Send `prompt` to `model`. Any error makes the caller move on to the next model.
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, GenerateError>;
}
