//! Configuration types for a document review.
//!
//! All review behaviour is controlled through [`ReviewConfig`], built via its
//! [`ReviewConfigBuilder`]. Sampling parameters and safety thresholds are
//! fixed constants in normal use; they live here so tests and the CLI can
//! override them without touching the invocation code.

use crate::error::ReviewError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Models tried in order when no list is configured.
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-1.0-pro",
    "gemini-pro",
];

/// Per-category character cap applied when the request is assembled.
pub const DEFAULT_MAX_CHARS_PER_DOCUMENT: usize = 40_000;

/// Configuration for one review invocation.
///
/// # Example
/// ```rust
/// use edgequake_pdfreview::ReviewConfig;
///
/// let config = ReviewConfig::builder()
///     .api_key("test-key")
///     .models(["gemini-1.5-flash", "gemini-pro"])
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.models.len(), 2);
/// ```
#[derive(Clone)]
pub struct ReviewConfig {
    /// API key for the Gemini backend. Required unless `provider_name` is set.
    pub api_key: Option<String>,

    /// Base URL of the Generative Language API.
    /// Default: `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base_url: String,

    /// Ordered model candidates. First success wins.
    pub models: Vec<String>,

    /// Route calls through an `edgequake-llm` provider instead of the
    /// built-in Gemini client (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Sampling parameters sent with every call.
    pub generation: GenerationSettings,

    /// Safety threshold applied to every harm category.
    pub safety_threshold: SafetyThreshold,

    /// Per-category character cap. Default: 40 000.
    pub max_chars_per_document: usize,

    /// Custom instruction prompt. If None, the mode's built-in prompt is used.
    pub instruction_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-call timeout in seconds. Default: None (client default).
    pub api_timeout_secs: Option<u64>,

    /// Observer for phase messages.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            provider_name: None,
            generation: GenerationSettings::default(),
            safety_threshold: SafetyThreshold::default(),
            max_chars_per_document: DEFAULT_MAX_CHARS_PER_DOCUMENT,
            instruction_prompt: None,
            download_timeout_secs: 120,
            api_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("models", &self.models)
            .field("provider_name", &self.provider_name)
            .field("generation", &self.generation)
            .field("safety_threshold", &self.safety_threshold)
            .field("max_chars_per_document", &self.max_chars_per_document)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ReviewProgressCallback>"),
            )
            .finish()
    }
}

impl ReviewConfig {
    /// Create a new builder for `ReviewConfig`.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReviewConfig`].
#[derive(Debug)]
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl ReviewConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.models = models
            .into_iter()
            .map(Into::into)
            .map(|m: String| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.generation.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.generation.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.generation.top_k = k.max(1);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.generation.max_output_tokens = n;
        self
    }

    pub fn safety_threshold(mut self, threshold: SafetyThreshold) -> Self {
        self.config.safety_threshold = threshold;
        self
    }

    pub fn max_chars_per_document(mut self, n: usize) -> Self {
        self.config.max_chars_per_document = n;
        self
    }

    pub fn instruction_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.instruction_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, ReviewError> {
        let c = &self.config;
        if c.models.is_empty() {
            return Err(ReviewError::InvalidConfig(
                "At least one model identifier is required".into(),
            ));
        }
        if c.max_chars_per_document == 0 {
            return Err(ReviewError::InvalidConfig(
                "max_chars_per_document must be ≥ 1".into(),
            ));
        }
        if c.generation.max_output_tokens == 0 {
            return Err(ReviewError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Generation parameters ────────────────────────────────────────────────

/// Sampling parameters sent with every generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Default: 0.4.
    pub temperature: f32,
    /// Nucleus sampling mass. Default: 0.95.
    pub top_p: f32,
    /// Default: 40.
    pub top_k: u32,
    /// Default: 8192.
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// Harm categories the API filters on. Every one gets the same threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];
}

/// Blocking threshold for content-safety filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SafetyThreshold {
    #[serde(rename = "BLOCK_NONE")]
    BlockNone,
    #[serde(rename = "BLOCK_ONLY_HIGH")]
    BlockOnlyHigh,
    #[default]
    #[serde(rename = "BLOCK_MEDIUM_AND_ABOVE")]
    BlockMediumAndAbove,
    #[serde(rename = "BLOCK_LOW_AND_ABOVE")]
    BlockLowAndAbove,
}
