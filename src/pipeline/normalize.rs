//! Deterministic text cleanup for extracted PDF text and model responses.
//!
//! Extracted text is full of layout debris: CRLF line endings, trailing
//! spaces from justified columns, long runs of blank lines between pages,
//! form feeds, and zero-width characters. None of it carries meaning, and
//! all of it eats into the per-document character cap.
//!
//! Model responses get a lighter pass: strip an outer ```` ```markdown ````
//! fence if the model added one, and normalise line endings.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean extracted PDF text before it enters the bundle.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF) and form feeds → LF
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Trim leading/trailing blank lines
pub fn normalize_text(input: &str) -> String {
    let s = normalise_line_endings(input).replace('\u{0C}', "\n");
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim_matches('\n').to_string()
}

/// Clean the text returned by the model.
pub fn clean_response(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    ensure_final_newline(&s)
}

// ── Fences ───────────────────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        // A fence line inside means the outer markers belong to separate blocks.
        Some(caps) if !caps[1].lines().any(|l| l.trim_start().starts_with("```")) => {
            caps[1].to_string()
        }
        _ => input.to_string(),
    }
}

// ── Line endings ─────────────────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Whitespace ───────────────────────────────────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Invisible characters ─────────────────────────────────────────────────────

static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{200B}\u{200C}\u{200D}\u{2060}\u{FEFF}\u{00AD}]").unwrap());

fn remove_invisible_chars(input: &str) -> String {
    RE_INVISIBLE.replace_all(input, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cleans_layout_debris() {
        let raw = "\n\nTitle  \r\nLine\u{200B}one\u{0C}\n\n\n\n\nNext   \n\n";
        assert_eq!(normalize_text(raw), "Title\nLineone\n\n\nNext");
    }

    #[test]
    fn normalize_keeps_paragraph_breaks() {
        assert_eq!(normalize_text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn response_fences_are_stripped() {
        let raw = "```markdown\n## Summary\nFine.\n```\n";
        assert_eq!(clean_response(raw), "## Summary\nFine.\n");
    }

    #[test]
    fn inner_code_blocks_survive() {
        let raw = "Intro\n```\ncode\n```\nOutro";
        assert_eq!(clean_response(raw), "Intro\n```\ncode\n```\nOutro\n");
    }

    #[test]
    fn separate_leading_and_trailing_blocks_survive() {
        let raw = "```\nlet a = 1;\n```\nThe consent form is fine.\n```\nlet b = 2;\n```";
        assert_eq!(clean_response(raw), format!("{raw}\n"));
    }

    #[test]
    fn bare_outer_fence_is_stripped() {
        assert_eq!(clean_response("```\nFine.\n```"), "Fine.\n");
    }

    #[test]
    fn empty_response_becomes_single_newline() {
        assert_eq!(clean_response("   \r\n"), "\n");
    }
}
