//! # edgequake-pdfreview
//!
//! Pre-screen research-ethics submissions with a hosted LLM.
//!
//! A student or an external researcher supplies PDF documents (and optional
//! pasted notes). The crate extracts the text, prepends a fixed instruction
//! prompt for the submitter's mode, caps each document at 40 000 characters,
//! and sends the result to a list of model identifiers in order until one
//! answers.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ReviewRequest (mode + files + notes)
//!  │
//!  ├─ 1. Validate   required document present, API key configured
//!  ├─ 2. Input      read local file or download URL; check %PDF magic
//!  ├─ 3. Extract    pdf-extract on a blocking thread; failure → literal text
//!  ├─ 4. Bundle     category → text, keyed only by the mode's categories
//!  ├─ 5. Request    prompt + "### Label" sections, each capped
//!  └─ 6. Fallback   gemini-1.5-flash → gemini-1.5-pro → … first success wins
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfreview::{review, ReviewConfig, ReviewRequest, UserMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReviewConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!     let request = ReviewRequest::new(UserMode::Student)
//!         .with_pdf("application", "ethics_application.pdf")?
//!         .with_notes("Supervisor: interviews are with adult staff only.")?;
//!     let output = review(&request, &config).await?;
//!     println!("{}", output.text);
//!     eprintln!("answered by {} after {} attempt(s)", output.model, output.stats.attempts);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfreview` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod bundle;
pub mod config;
pub mod error;
pub mod generator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod review;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use bundle::{DocumentBundle, DocumentCategory, InputKind, UserMode};
pub use config::{
    GenerationSettings, HarmCategory, ReviewConfig, ReviewConfigBuilder, SafetyThreshold,
    DEFAULT_MAX_CHARS_PER_DOCUMENT, DEFAULT_MODELS,
};
pub use error::{AttemptError, GenerateError, ReviewError};
pub use generator::{GeminiGenerator, Generation, Generator, ModelInfo, ProviderGenerator};
pub use output::{DocumentSummary, ReviewOutput, ReviewStats};
pub use pipeline::invoke::{invoke_with_fallback, FallbackSuccess};
pub use progress::{NoopProgressCallback, ProgressCallback, ReviewProgressCallback};
pub use request::{DocumentInput, DocumentSource, ReviewRequest};
pub use review::{
    collect_bundle, list_models, prepare_request, review, review_sync, review_to_file, review_with,
};
