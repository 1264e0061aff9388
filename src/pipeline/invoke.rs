//! Model fallback: try each candidate in order until one returns text.
//!
//! Every failure is handled the same way (quota, network, safety block,
//! malformed body): record it, log it, move on. There is no backoff and no
//! retry of the same model; the next candidate *is* the retry. Attempts are
//! strictly sequential, and nothing after the first success is called.

use crate::error::{AttemptError, ReviewError};
use crate::generator::{Generation, Generator};
use crate::progress::ReviewProgressCallback;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// The first successful call and what it took to get there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSuccess {
    /// Model that produced the text.
    pub model: String,
    pub generation: Generation,
    /// Models that failed before `model`, in order.
    pub failed_attempts: Vec<AttemptError>,
    pub duration_ms: u64,
}

/// Send `prompt` to each model in `candidates` until one succeeds.
///
/// # Errors
/// - [`ReviewError::InvalidConfig`] if `candidates` is empty (nothing is sent)
/// - [`ReviewError::AllModelsFailed`] if every candidate failed
pub async fn invoke_with_fallback<G: Generator>(
    generator: &G,
    prompt: &str,
    candidates: &[String],
    progress: Option<&dyn ReviewProgressCallback>,
) -> Result<FallbackSuccess, ReviewError> {
    if candidates.is_empty() {
        return Err(ReviewError::InvalidConfig(
            "model candidate list is empty".into(),
        ));
    }

    let start = Instant::now();
    let total = candidates.len();
    let mut failed_attempts: Vec<AttemptError> = Vec::new();

    for (i, model) in candidates.iter().enumerate() {
        if let Some(cb) = progress {
            cb.on_sending(model, i + 1, total);
        }
        info!(
            "Sending request to {}/{} (attempt {}/{})",
            generator.name(),
            model,
            i + 1,
            total
        );

        match generator.generate(model, prompt).await {
            Ok(generation) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                debug!(
                    "{}: {} input tokens, {} output tokens, {}ms",
                    model, generation.input_tokens, generation.output_tokens, duration_ms
                );
                if let Some(cb) = progress {
                    cb.on_success(model, generation.text.len());
                }
                return Ok(FallbackSuccess {
                    model: model.clone(),
                    generation,
                    failed_attempts,
                    duration_ms,
                });
            }
            Err(error) => {
                warn!("Model {} failed — {}", model, error);
                if let Some(cb) = progress {
                    cb.on_attempt_failed(model, &error.to_string());
                }
                failed_attempts.push(AttemptError {
                    model: model.clone(),
                    error,
                });
            }
        }
    }

    if let Some(cb) = progress {
        cb.on_exhausted(total);
    }
    let last_error = failed_attempts
        .last()
        .map(|a| a.error.to_string())
        .unwrap_or_else(|| "Unknown error".to_string());

    Err(ReviewError::AllModelsFailed {
        attempts: failed_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;
    use std::sync::Mutex;

    /// Fails for every model listed in `failing`, succeeds otherwise.
    struct ScriptedGenerator {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, model: &str, _prompt: &str) -> Result<Generation, GenerateError> {
            self.calls.lock().unwrap().push(model.to_string());
            if self.failing.iter().any(|f| *f == model) {
                Err(GenerateError::Status {
                    status: 429,
                    message: format!("{model} quota exhausted"),
                })
            } else {
                Ok(Generation::new(format!("answer from {model}")))
            }
        }
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn first_success_stops_the_loop() {
        let g = ScriptedGenerator::new(vec!["a", "b"]);
        let out = invoke_with_fallback(&g, "p", &models(&["a", "b", "c", "d"]), None)
            .await
            .unwrap();
        assert_eq!(out.model, "c");
        assert_eq!(out.generation.text, "answer from c");
        assert_eq!(out.failed_attempts.len(), 2);
        assert_eq!(*g.calls.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn all_failures_are_reported() {
        let g = ScriptedGenerator::new(vec!["a", "b"]);
        let err = invoke_with_fallback(&g, "p", &models(&["a", "b"]), None)
            .await
            .unwrap_err();
        match err {
            ReviewError::AllModelsFailed {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts.len(), 2);
                assert!(last_error.contains("b quota exhausted"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidate_list_sends_nothing() {
        let g = ScriptedGenerator::new(vec![]);
        let err = invoke_with_fallback(&g, "p", &[], None).await.unwrap_err();
        assert!(matches!(err, ReviewError::InvalidConfig(_)));
        assert!(g.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn single_candidate_success_has_no_failures() {
        let g = ScriptedGenerator::new(vec![]);
        let out =
            tokio_test::block_on(invoke_with_fallback(&g, "p", &models(&["only"]), None)).unwrap();
        assert_eq!(out.model, "only");
        assert!(out.failed_attempts.is_empty());
    }
}
