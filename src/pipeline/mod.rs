//! Pipeline stages for a document review.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalize ──▶ (bundle + prompt) ──▶ invoke
//! (path/URL)  (pdf-extract)  (cleanup)                       (model fallback)
//! ```
//!
//! 1. [`input`]     — load the user-supplied path or URL into memory and
//!    check the `%PDF` magic bytes
//! 2. [`extract`]   — pull text out of the PDF on a blocking thread; failures
//!    become literal `[Error reading PDF: …]` text
//! 3. [`normalize`] — deterministic cleanup of extracted text and of the
//!    model's response
//! 4. [`invoke`]    — try each model candidate in order until one answers;
//!    the only stage with generation I/O

pub mod extract;
pub mod input;
pub mod invoke;
pub mod normalize;
