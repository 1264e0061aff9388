//! Instruction prompts and request assembly.
//!
//! Every prompt lives here so the wording can change without touching the
//! invocation code, and so tests can inspect what is actually sent.
//! Callers can override the prompt via
//! [`crate::config::ReviewConfig::instruction_prompt`].

use crate::bundle::{DocumentBundle, UserMode};

/// Instruction prompt for students submitting a course-project ethics application.
pub const STUDENT_PROMPT: &str = r#"You are an experienced member of a university research ethics committee helping a student prepare their ethics application before formal submission.

Review the documents below and respond in Markdown with these sections:

1. SUMMARY
   - One paragraph describing the project, its participants, and its data.

2. RISK ASSESSMENT
   - Risks to participants (physical, psychological, social, legal).
   - Risks to the researcher.
   - Whether the proposed mitigations are adequate.

3. CONSENT AND INFORMATION
   - Is the participant information sheet complete and understandable?
   - Is consent voluntary, informed, and withdrawable?

4. DATA MANAGEMENT
   - Storage, anonymisation, retention, and deletion.

5. REQUIRED CHANGES
   - A numbered list of concrete changes the student must make.

6. RECOMMENDATION
   - One of: "Ready to submit", "Minor revisions", "Major revisions".

Be specific and refer to the text you were given. Do not invent content that is not in the documents."#;

/// Instruction prompt for external researchers submitting a study protocol.
pub const RESEARCHER_PROMPT: &str = r#"You are a research ethics reviewer pre-screening a study protocol submitted by an external researcher who wishes to recruit participants at this institution.

Review the documents below and respond in Markdown with these sections:

1. STUDY OVERVIEW
   - Aims, design, population, and recruitment route.

2. ETHICAL ISSUES
   - Risks and burdens to participants, vulnerable groups, deception, incentives.

3. CONSENT
   - Adequacy of the consent form and process.

4. APPROVALS
   - Whether the home-institution approval covers what is proposed here.

5. DATA PROTECTION
   - Lawful basis, transfer, storage, and retention of personal data.

6. OUTSTANDING ITEMS
   - A numbered list of documents or clarifications still required.

7. RECOMMENDATION
   - One of: "Proceed to full review", "Request clarification", "Decline".

Be specific and refer to the text you were given. Do not invent content that is not in the documents."#;

/// Built-in instruction prompt for a mode.
pub fn instruction_prompt(mode: UserMode) -> &'static str {
    match mode {
        UserMode::Student => STUDENT_PROMPT,
        UserMode::Researcher => RESEARCHER_PROMPT,
    }
}

/// Take at most `max_chars` characters (Unicode scalar values) from `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Assemble the single request string sent to the model.
///
/// Layout: the instruction prompt, then one `### <Label>` section per
/// document in the mode's declared order, each body capped at `max_chars`.
pub fn build_request(prompt: &str, bundle: &DocumentBundle, max_chars: usize) -> String {
    // Truncation never lengthens text, so the sent bodies bound the size.
    let capacity = prompt.len() + bundle.iter().map(|(_, t)| t.len() + 64).sum::<usize>();
    let mut request = String::with_capacity(capacity);
    request.push_str(prompt.trim_end());
    request.push_str("\n\n");

    for (category, text) in bundle.iter() {
        request.push_str("### ");
        request.push_str(category.label());
        request.push_str("\n\n");
        request.push_str(truncate_chars(text, max_chars));
        request.push_str("\n\n");
    }

    request.truncate(request.trim_end().len());
    request.push('\n');
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::DocumentCategory;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn request_contains_prompt_and_labels_in_order() {
        let mut bundle = DocumentBundle::new(UserMode::Student);
        bundle
            .insert(DocumentCategory::SupervisorNotes, "Looks fine.")
            .unwrap();
        bundle
            .insert(DocumentCategory::EthicsApplication, "We will interview ten people.")
            .unwrap();

        let req = build_request("PROMPT", &bundle, 40_000);
        assert!(req.starts_with("PROMPT\n\n### Ethics application\n\nWe will interview"));
        let app = req.find("### Ethics application").unwrap();
        let notes = req.find("### Supervisor comments").unwrap();
        assert!(app < notes);
        assert!(req.ends_with("Looks fine.\n"));
    }

    #[test]
    fn each_document_is_capped_independently() {
        let mut bundle = DocumentBundle::new(UserMode::Researcher);
        bundle
            .insert(DocumentCategory::ResearchProtocol, "p".repeat(50))
            .unwrap();
        bundle
            .insert(DocumentCategory::ConsentForm, "c".repeat(5))
            .unwrap();

        let req = build_request("P", &bundle, 10);
        assert!(req.contains(&format!("\n\n{}\n\n", "p".repeat(10))));
        assert!(!req.contains(&"p".repeat(11)));
        assert!(req.contains("ccccc"));
    }

    #[test]
    fn huge_cap_with_short_documents() {
        let mut bundle = DocumentBundle::new(UserMode::Researcher);
        bundle
            .insert(DocumentCategory::ResearchProtocol, "short protocol")
            .unwrap();
        bundle
            .insert(DocumentCategory::ConsentForm, "short consent")
            .unwrap();

        let req = build_request("P", &bundle, usize::MAX / 2);
        assert!(req.contains("### Research protocol\n\nshort protocol\n\n"));
        assert!(req.ends_with("short consent\n"));
    }

    #[test]
    fn prompts_differ_per_mode() {
        assert_ne!(
            instruction_prompt(UserMode::Student),
            instruction_prompt(UserMode::Researcher)
        );
        assert!(STUDENT_PROMPT.contains("RECOMMENDATION"));
        assert!(RESEARCHER_PROMPT.contains("RECOMMENDATION"));
    }
}
