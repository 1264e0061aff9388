//! User modes, document categories, and the per-invocation document bundle.
//!
//! Each [`UserMode`] owns a fixed, ordered set of [`DocumentCategory`] values.
//! A [`DocumentBundle`] is always tied to one mode and refuses categories that
//! belong to the other, so a student submission can never carry a
//! researcher-only key (and vice versa).

use crate::error::ReviewError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Who is submitting. Fixes the category set and the instruction prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    /// A student submitting an ethics application for a course project.
    #[default]
    Student,
    /// An external researcher submitting a study protocol.
    Researcher,
}

impl UserMode {
    /// Categories accepted in this mode, in the order they appear in the request.
    pub fn categories(self) -> &'static [DocumentCategory] {
        match self {
            UserMode::Student => &[
                DocumentCategory::EthicsApplication,
                DocumentCategory::InformationSheet,
                DocumentCategory::SupervisorNotes,
            ],
            UserMode::Researcher => &[
                DocumentCategory::ResearchProtocol,
                DocumentCategory::ConsentForm,
                DocumentCategory::InstitutionalApproval,
                DocumentCategory::ResearcherNotes,
            ],
        }
    }

    /// The category that must be present before anything is sent.
    pub fn required_category(self) -> DocumentCategory {
        match self {
            UserMode::Student => DocumentCategory::EthicsApplication,
            UserMode::Researcher => DocumentCategory::ResearchProtocol,
        }
    }

    /// The pasted-text category for this mode.
    pub fn notes_category(self) -> DocumentCategory {
        match self {
            UserMode::Student => DocumentCategory::SupervisorNotes,
            UserMode::Researcher => DocumentCategory::ResearcherNotes,
        }
    }

    /// Resolve a category slug, rejecting slugs from the other mode.
    pub fn category(self, slug: &str) -> Result<DocumentCategory, ReviewError> {
        let wanted = slug.trim().to_ascii_lowercase();
        self.categories()
            .iter()
            .copied()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| ReviewError::CategoryNotInMode {
                mode: self,
                slug: slug.to_string(),
                expected: self
                    .categories()
                    .iter()
                    .map(|c| c.slug())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserMode::Student => "student",
            UserMode::Researcher => "researcher",
        }
    }
}

impl fmt::Display for UserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserMode {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(UserMode::Student),
            "researcher" | "external" | "external-researcher" => Ok(UserMode::Researcher),
            other => Err(ReviewError::InvalidConfig(format!(
                "unknown mode '{other}' (expected 'student' or 'researcher')"
            ))),
        }
    }
}

/// How a category is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// An uploaded PDF whose text is extracted.
    Pdf,
    /// Free text pasted by the user.
    Pasted,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Pdf => "PDF",
            InputKind::Pasted => "pasted text",
        }
    }
}

/// Document category label. Variant order is the order used in requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentCategory {
    EthicsApplication,
    InformationSheet,
    SupervisorNotes,
    ResearchProtocol,
    ConsentForm,
    InstitutionalApproval,
    ResearcherNotes,
}

impl DocumentCategory {
    /// Short identifier used on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            DocumentCategory::EthicsApplication => "application",
            DocumentCategory::InformationSheet => "info-sheet",
            DocumentCategory::SupervisorNotes => "supervisor-notes",
            DocumentCategory::ResearchProtocol => "protocol",
            DocumentCategory::ConsentForm => "consent-form",
            DocumentCategory::InstitutionalApproval => "approval",
            DocumentCategory::ResearcherNotes => "notes",
        }
    }

    /// Human-readable label used as the section header in the request.
    pub fn label(self) -> &'static str {
        match self {
            DocumentCategory::EthicsApplication => "Ethics application",
            DocumentCategory::InformationSheet => "Participant information sheet",
            DocumentCategory::SupervisorNotes => "Supervisor comments",
            DocumentCategory::ResearchProtocol => "Research protocol",
            DocumentCategory::ConsentForm => "Consent form",
            DocumentCategory::InstitutionalApproval => "Institutional approval letter",
            DocumentCategory::ResearcherNotes => "Additional notes",
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            DocumentCategory::SupervisorNotes | DocumentCategory::ResearcherNotes => {
                InputKind::Pasted
            }
            _ => InputKind::Pdf,
        }
    }

    pub fn mode(self) -> UserMode {
        match self {
            DocumentCategory::EthicsApplication
            | DocumentCategory::InformationSheet
            | DocumentCategory::SupervisorNotes => UserMode::Student,
            _ => UserMode::Researcher,
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category → extracted text for one invocation.
///
/// Text is stored untruncated; the 40 000-character cap is applied when the
/// request is assembled (see [`crate::prompts::build_request`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBundle {
    mode: UserMode,
    documents: BTreeMap<DocumentCategory, String>,
}

impl DocumentBundle {
    pub fn new(mode: UserMode) -> Self {
        Self {
            mode,
            documents: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> UserMode {
        self.mode
    }

    /// Insert text for a category. Fails if the category belongs to the other mode.
    ///
    /// Blank text is ignored: an empty paste box contributes nothing.
    pub fn insert(
        &mut self,
        category: DocumentCategory,
        text: impl Into<String>,
    ) -> Result<(), ReviewError> {
        if category.mode() != self.mode {
            return Err(ReviewError::CategoryNotInMode {
                mode: self.mode,
                slug: category.slug().to_string(),
                expected: self
                    .mode
                    .categories()
                    .iter()
                    .map(|c| c.slug())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        let text = text.into();
        if text.trim().is_empty() {
            return Ok(());
        }
        self.documents.insert(category, text);
        Ok(())
    }

    pub fn get(&self, category: DocumentCategory) -> Option<&str> {
        self.documents.get(&category).map(String::as_str)
    }

    pub fn contains(&self, category: DocumentCategory) -> bool {
        self.documents.contains_key(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Entries in request order.
    pub fn iter(&self) -> impl Iterator<Item = (DocumentCategory, &str)> {
        self.documents.iter().map(|(c, t)| (*c, t.as_str()))
    }

    /// Check the bundle is ready to send: non-empty and the required category present.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.is_empty() {
            return Err(ReviewError::NoDocuments { mode: self.mode });
        }
        let required = self.mode.required_category();
        if !self.contains(required) {
            return Err(ReviewError::MissingRequiredDocument {
                mode: self.mode,
                slug: required.slug(),
                label: required.label(),
            });
        }
        Ok(())
    }
}
