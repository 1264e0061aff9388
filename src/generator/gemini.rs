//! REST client for the Generative Language API (`generateContent`, `models.list`).
//!
//! Each call carries the fixed `generationConfig` (temperature, topP, topK,
//! maxOutputTokens) and one `safetySettings` entry per harm category. A 200
//! response whose candidates hold no text, because the prompt or the answer
//! was blocked, is reported as [`GenerateError::EmptyResponse`] so the
//! fallback loop treats it like any other failure.

use crate::config::{GenerationSettings, HarmCategory, ReviewConfig, SafetyThreshold};
use crate::error::{GenerateError, ReviewError};
use crate::generator::{Generation, Generator};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini backend.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    generation: GenerationSettings,
    safety_threshold: SafetyThreshold,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("base_url", &self.base_url)
            .field("generation", &self.generation)
            .field("safety_threshold", &self.safety_threshold)
            .finish_non_exhaustive()
    }
}

impl GeminiGenerator {
    /// Build a client from the review configuration.
    ///
    /// Fails with [`ReviewError::MissingApiKey`] before any network access
    /// when no key is configured.
    pub fn from_config(config: &ReviewConfig) -> Result<Self, ReviewError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ReviewError::MissingApiKey)?
            .to_string();

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ReviewError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            generation: config.generation,
            safety_threshold: config.safety_threshold,
        })
    }

    /// List models that support `generateContent`, following pagination.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ReviewError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{}/models", self.base_url))
                .header(API_KEY_HEADER, &self.api_key)
                .query(&[("pageSize", "100")]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ReviewError::ListModelsFailed(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ReviewError::ListModelsFailed(e.to_string()))?;
            if !status.is_success() {
                return Err(ReviewError::ListModelsFailed(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    api_error_message(&body)
                )));
            }

            let page: ModelListPage = serde_json::from_str(&body)
                .map_err(|e| ReviewError::ListModelsFailed(e.to_string()))?;
            models.extend(page.models.into_iter().filter(ModelInfo::supports_generate_content));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Listed {} generateContent models", models.len());
        Ok(models)
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        build_request_body(prompt, &self.generation, self.safety_threshold)
    }
}

impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, GenerateError> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(GenerateError::Status {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        parse_generate_response(&body)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: HarmCategory,
    threshold: SafetyThreshold,
}

pub(crate) fn build_request_body<'a>(
    prompt: &'a str,
    settings: &GenerationSettings,
    threshold: SafetyThreshold,
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            max_output_tokens: settings.max_output_tokens,
        },
        safety_settings: HarmCategory::ALL
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold,
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

/// Decode a `generateContent` body into text, or explain why there is none.
pub(crate) fn parse_generate_response(body: &str) -> Result<Generation, GenerateError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GenerateError::Malformed(e.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GenerateError::EmptyResponse(format!(
            "prompt blocked: {reason}"
        )));
    }

    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| GenerateError::EmptyResponse("no candidates returned".into()))?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .as_deref()
            .unwrap_or("UNSPECIFIED");
        return Err(GenerateError::EmptyResponse(format!(
            "no text in candidate (finish reason: {reason})"
        )));
    }

    let usage = response.usage_metadata.unwrap_or_default();
    Ok(Generation {
        text,
        input_tokens: usage.prompt_token_count,
        output_tokens: usage.candidates_token_count,
    })
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Best-effort message from an error body; falls back to the raw body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { error }) if !error.status.is_empty() => {
            format!("{} ({})", error.message, error.status)
        }
        Ok(ApiErrorBody { error }) => error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

// ── Model listing ────────────────────────────────────────────────────────────

/// One entry from `models.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-1.5-flash`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Identifier usable as a model candidate (resource prefix stripped).
    pub fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelListPage {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_sampling_and_safety() {
        let settings = GenerationSettings::default();
        let body = build_request_body("hello", &settings, SafetyThreshold::BlockOnlyHigh);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        let safety = json["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 4);
        assert!(safety
            .iter()
            .all(|s| s["threshold"] == "BLOCK_ONLY_HIGH"));
        assert_eq!(safety[1]["category"], "HARM_CATEGORY_HATE_SPEECH");
    }

    #[test]
    fn parses_text_and_usage() {
        let body = r###"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "## Summary\n"}, {"text": "Fine."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 7, "totalTokenCount": 127}
        }"###;
        let g = parse_generate_response(body).unwrap();
        assert_eq!(g.text, "## Summary\nFine.");
        assert_eq!(g.input_tokens, 120);
        assert_eq!(g.output_tokens, 7);
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = parse_generate_response(body).unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn candidate_without_text_is_an_error() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let err = parse_generate_response(body).unwrap_err();
        assert!(err.to_string().contains("finish reason: SAFETY"));
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert!(matches!(
            parse_generate_response("<html>"),
            Err(GenerateError::Malformed(_))
        ));
    }

    #[test]
    fn api_error_message_extracts_status() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            api_error_message(body),
            "Resource has been exhausted (RESOURCE_EXHAUSTED)"
        );
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn model_info_filters_and_strips_prefix() {
        let page: ModelListPage = serde_json::from_str(
            r#"{"models": [
                {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]},
                {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]}
            ], "nextPageToken": ""}"#,
        )
        .unwrap();
        let usable: Vec<_> = page
            .models
            .iter()
            .filter(|m| m.supports_generate_content())
            .map(ModelInfo::id)
            .collect();
        assert_eq!(usable, vec!["gemini-1.5-flash"]);
    }

    #[test]
    fn missing_key_fails_before_network() {
        let config = ReviewConfig::default();
        assert!(matches!(
            GeminiGenerator::from_config(&config),
            Err(ReviewError::MissingApiKey)
        ));
        let config = ReviewConfig::builder().api_key("   ").build().unwrap();
        assert!(matches!(
            GeminiGenerator::from_config(&config),
            Err(ReviewError::MissingApiKey)
        ));
    }
}
