//! Result types returned by a review.

use crate::bundle::{DocumentCategory, UserMode};
use crate::error::AttemptError;
use serde::{Deserialize, Serialize};

/// Everything a successful review produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutput {
    /// Cleaned model response.
    pub text: String,
    /// Model identifier that produced `text`.
    pub model: String,
    pub mode: UserMode,
    /// One entry per document that went into the request, in request order.
    pub documents: Vec<DocumentSummary>,
    /// Models that failed before `model`, in the order they were tried.
    pub failed_attempts: Vec<AttemptError>,
    pub stats: ReviewStats,
}

/// What was sent for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub category: DocumentCategory,
    pub label: String,
    /// Characters extracted, before the cap.
    pub chars: usize,
    /// Whether the cap cut this document short.
    pub truncated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    /// Characters in the assembled request.
    pub request_chars: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Models tried, including the one that succeeded.
    pub attempts: usize,
    pub extraction_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
