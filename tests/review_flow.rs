//! Integration tests for the review flow with a scripted generator.
//!
//! No network and no real PDF is needed: inputs are either pasted text or
//! deliberately broken PDF bytes, whose extraction failure shows up as
//! literal `[Error reading PDF: …]` text in the request.

use edgequake_pdfreview::{
    collect_bundle, review_with, DocumentCategory, GenerateError, Generation, Generator,
    ReviewConfig, ReviewError, ReviewProgressCallback, ReviewRequest, UserMode,
};
use std::sync::{Arc, Mutex};

/// Route library logs to the test harness (`RUST_LOG` overrides; shown with `--nocapture`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("edgequake_pdfreview=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Bytes with a valid `%PDF` header that no extractor can parse.
const BROKEN_PDF: &[u8] = b"%PDF-1.4\nnot really a pdf body\n";

/// Records every call; fails for the first `fail_first` models it sees.
struct RecordingGenerator {
    fail_first: usize,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingGenerator {
    fn new(fail_first: usize) -> Self {
        Self {
            fail_first,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn models_called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    fn last_prompt(&self) -> String {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, p)| p.clone())
            .unwrap_or_default()
    }
}

impl Generator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, GenerateError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((model.to_string(), prompt.to_string()));
            calls.len()
        };
        if n <= self.fail_first {
            return Err(GenerateError::Status {
                status: 429,
                message: "Resource has been exhausted".into(),
            });
        }
        Ok(Generation {
            text: format!("```markdown\n## Review by {model}\nLooks complete.\n```"),
            input_tokens: 100,
            output_tokens: 12,
        })
    }
}

fn config(models: &[&str]) -> ReviewConfig {
    ReviewConfig::builder()
        .models(models.iter().copied())
        .build()
        .expect("valid config")
}

fn student_request() -> ReviewRequest {
    ReviewRequest::new(UserMode::Student)
        .with_pdf_bytes("application", "application.pdf", BROKEN_PDF.to_vec())
        .unwrap()
        .with_notes("Participants are adult colleagues.")
        .unwrap()
}

// ── Fallback behaviour ───────────────────────────────────────────────────────

#[tokio::test]
async fn stops_at_first_successful_model() {
    init_tracing();
    let generator = RecordingGenerator::new(2);
    let out = review_with(&generator, &student_request(), &config(&["a", "b", "c", "d"]))
        .await
        .expect("third model should answer");

    assert_eq!(out.model, "c");
    assert_eq!(generator.models_called(), vec!["a", "b", "c"]);
    assert_eq!(out.stats.attempts, 3);
    assert_eq!(out.failed_attempts.len(), 2);
    assert_eq!(out.failed_attempts[0].model, "a");
    // Outer fence stripped by response cleanup.
    assert_eq!(out.text, "## Review by c\nLooks complete.\n");
}

#[tokio::test]
async fn total_failure_produces_no_output() {
    init_tracing();
    let generator = RecordingGenerator::new(usize::MAX);
    let err = review_with(&generator, &student_request(), &config(&["a", "b"]))
        .await
        .unwrap_err();

    assert_eq!(generator.models_called(), vec!["a", "b"]);
    match err {
        ReviewError::AllModelsFailed { attempts, .. } => assert_eq!(attempts.len(), 2),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_submission_never_calls_a_model() {
    let generator = RecordingGenerator::new(0);
    let err = review_with(
        &generator,
        &ReviewRequest::new(UserMode::Researcher),
        &config(&["a"]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReviewError::NoDocuments { .. }));
    assert!(generator.models_called().is_empty());
}

#[tokio::test]
async fn missing_primary_document_never_calls_a_model() {
    let generator = RecordingGenerator::new(0);
    let request = ReviewRequest::new(UserMode::Researcher)
        .with_pdf_bytes("consent-form", "consent.pdf", BROKEN_PDF.to_vec())
        .unwrap();
    let err = review_with(&generator, &request, &config(&["a"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReviewError::MissingRequiredDocument { slug: "protocol", .. }
    ));
    assert!(generator.models_called().is_empty());
}

// ── Request assembly ─────────────────────────────────────────────────────────

#[tokio::test]
async fn long_text_is_truncated_to_exactly_the_cap() {
    let generator = RecordingGenerator::new(0);
    let long_notes = format!("{}{}", "a".repeat(40_000), "b".repeat(5_000));
    let request = ReviewRequest::new(UserMode::Student)
        .with_pdf_bytes("application", "application.pdf", BROKEN_PDF.to_vec())
        .unwrap()
        .with_notes(long_notes)
        .unwrap();

    let out = review_with(&generator, &request, &config(&["a"]))
        .await
        .unwrap();

    let prompt = generator.last_prompt();
    let section = prompt
        .split("### Supervisor comments\n\n")
        .nth(1)
        .expect("notes section present");
    let body = section.trim_end_matches('\n');
    assert_eq!(body.chars().count(), 40_000);
    assert!(!body.contains('b'));

    let notes = out
        .documents
        .iter()
        .find(|d| d.category == DocumentCategory::SupervisorNotes)
        .unwrap();
    assert_eq!(notes.chars, 45_000);
    assert!(notes.truncated);
}

#[tokio::test]
async fn extraction_failure_is_sent_as_literal_text() {
    let generator = RecordingGenerator::new(0);
    review_with(&generator, &student_request(), &config(&["a"]))
        .await
        .unwrap();

    let prompt = generator.last_prompt();
    assert!(prompt.contains("### Ethics application\n\n[Error reading PDF"));
    assert!(prompt.contains("### Supervisor comments\n\nParticipants are adult colleagues."));
}

#[tokio::test]
async fn each_mode_keeps_only_its_own_keys() {
    let cfg = ReviewConfig::default();

    let student = collect_bundle(&student_request(), &cfg).await.unwrap();
    assert!(student
        .iter()
        .all(|(c, _)| UserMode::Student.categories().contains(&c)));

    let researcher_request = ReviewRequest::new(UserMode::Researcher)
        .with_pdf_bytes("protocol", "protocol.pdf", BROKEN_PDF.to_vec())
        .unwrap()
        .with_pdf_bytes("approval", "approval.pdf", BROKEN_PDF.to_vec())
        .unwrap()
        .with_notes("Recruiting via staff newsletter.")
        .unwrap();
    let researcher = collect_bundle(&researcher_request, &cfg).await.unwrap();
    let keys: Vec<_> = researcher.iter().map(|(c, _)| c).collect();
    assert_eq!(
        keys,
        vec![
            DocumentCategory::ResearchProtocol,
            DocumentCategory::InstitutionalApproval,
            DocumentCategory::ResearcherNotes,
        ]
    );

    // A student slug cannot even be added to a researcher request.
    assert!(ReviewRequest::new(UserMode::Researcher)
        .with_pdf("application", "a.pdf")
        .is_err());
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct PhaseLog(Mutex<Vec<String>>);

impl ReviewProgressCallback for PhaseLog {
    fn on_reading(&self, category: DocumentCategory) {
        self.0.lock().unwrap().push(format!("read {}", category.slug()));
    }
    fn on_sending(&self, model: &str, attempt: usize, total: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("send {model} {attempt}/{total}"));
    }
    fn on_attempt_failed(&self, model: &str, _error: &str) {
        self.0.lock().unwrap().push(format!("fail {model}"));
    }
    fn on_success(&self, model: &str, _response_len: usize) {
        self.0.lock().unwrap().push(format!("ok {model}"));
    }
}

#[tokio::test]
async fn progress_events_follow_program_order() {
    init_tracing();
    let log = Arc::new(PhaseLog::default());
    let cfg = ReviewConfig::builder()
        .models(["a", "b"])
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let generator = RecordingGenerator::new(1);
    review_with(&generator, &student_request(), &cfg).await.unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            "read application",
            "read supervisor-notes",
            "send a 1/2",
            "fail a",
            "send b 2/2",
            "ok b",
        ]
    );
}
