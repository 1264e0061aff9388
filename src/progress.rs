//! Progress-callback trait for review phase events.
//!
//! Inject an [`Arc<dyn ReviewProgressCallback>`] via
//! [`crate::config::ReviewConfigBuilder::progress_callback`] to be told when
//! the review connects, reads each document, sends the request to each model,
//! and how each attempt turned out. Events are purely observational: nothing
//! a callback does changes the outcome.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfreview::{ReviewConfig, ReviewProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter(AtomicUsize);
//!
//! impl ReviewProgressCallback for FailureCounter {
//!     fn on_attempt_failed(&self, model: &str, error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{model} failed: {error}");
//!     }
//! }
//!
//! let config = ReviewConfig::builder()
//!     .progress_callback(Arc::new(FailureCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::bundle::DocumentCategory;
use std::sync::Arc;

/// Called by the review pipeline as it moves through each phase.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ReviewProgressCallback: Send + Sync {
    /// Called once before the backend is prepared.
    fn on_connecting(&self) {}

    /// Called before a document's text is extracted.
    fn on_reading(&self, category: DocumentCategory) {
        let _ = category;
    }

    /// Called after a document's text is available.
    ///
    /// `chars` counts characters before the per-category cap is applied.
    fn on_document_ready(&self, category: DocumentCategory, chars: usize) {
        let _ = (category, chars);
    }

    /// Called just before a request is sent to `model`.
    ///
    /// # Arguments
    /// * `attempt` — 1-indexed attempt number
    /// * `total`   — number of model candidates
    fn on_sending(&self, model: &str, attempt: usize, total: usize) {
        let _ = (model, attempt, total);
    }

    /// Called when a model call fails; the loop moves on to the next model.
    fn on_attempt_failed(&self, model: &str, error: &str) {
        let _ = (model, error);
    }

    /// Called when a model returns text. No further models are tried.
    fn on_success(&self, model: &str, response_len: usize) {
        let _ = (model, response_len);
    }

    /// Called when every model has failed.
    fn on_exhausted(&self, attempted: usize) {
        let _ = attempted;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReviewProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReviewConfig`].
pub type ProgressCallback = Arc<dyn ReviewProgressCallback>;
