//! Outbound markup safety net (spec.md §4.2.4). Session prompts and model
//! responses are arbitrary user text and may contain an odd number of
//! bold/italic/code delimiters, which the chat's markup dialect rejects
//! outright. Every outbound send/edit is routed through [`prepare_outbound`]
//! first.

use ipc::markup::balance_markup;

const MAX_FIELD_CHARS: usize = 800;

/// Balances any unterminated markup delimiters, logging when it had to.
/// Truncation (to keep messages under the chat's length cap) happens
/// upstream of this, in the caller that assembles the message body, so the
/// delimiter counts being balanced here reflect the final displayed text.
pub fn prepare_outbound(text: &str) -> String {
    let (balanced, changed) = balance_markup(text);
    if changed {
        tracing::debug!("closed unbalanced markup delimiters in outbound message");
    }
    balanced
}

/// Truncates `text` to `MAX_FIELD_CHARS`, appending an ellipsis marker.
/// Applied to free-form fields (prompts, responses, stdout/stderr excerpts)
/// before they are embedded in a message body and passed to
/// [`prepare_outbound`].
pub fn truncate_field(text: &str) -> String {
    if text.chars().count() <= MAX_FIELD_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(MAX_FIELD_CHARS).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_outbound_closes_unbalanced_bold() {
        let out = prepare_outbound("Here is **an unfinished bold");
        assert_eq!(out, "Here is **an unfinished bold**");
    }

    #[test]
    fn truncate_field_leaves_short_text_untouched() {
        assert_eq!(truncate_field("short"), "short");
    }

    #[test]
    fn truncate_field_caps_long_text() {
        let long = "x".repeat(MAX_FIELD_CHARS + 50);
        let truncated = truncate_field(&long);
        assert_eq!(truncated.chars().count(), MAX_FIELD_CHARS + 1);
        assert!(truncated.ends_with('…'));
    }
}
