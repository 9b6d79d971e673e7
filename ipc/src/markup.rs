//! Outbound markup balancing.
//!
//! The chat dialect rejects messages with an odd count of any delimiter
//! class. Untrusted text (session prompts, assistant responses, CLI output)
//! can carry an unterminated `**bold` or a stray backtick, so every
//! outbound send passes through [`balance_markup`] as a safety net. This is
//! deliberately not markup-aware escaping — the dialect's rules are
//! context-sensitive and trying to transform characters globally creates
//! more corner cases than it fixes (see DESIGN.md).

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterCounts {
    pub fence: u32,
    pub inline_code: u32,
    pub bold: u32,
    pub italic: u32,
}

/// Tokenizes `text` into delimiter runs, matching the longest class first at
/// each position (``` before ` before ** before *) so that e.g. a bold run
/// is never mistaken for two italic runs.
pub fn count_delimiters(text: &str) -> DelimiterCounts {
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut counts = DelimiterCounts::default();
    while i < bytes.len() {
        if bytes[i..].starts_with(b"```") {
            counts.fence += 1;
            i += 3;
        } else if bytes[i..].starts_with(b"**") {
            counts.bold += 1;
            i += 2;
        } else if bytes[i] == b'`' {
            counts.inline_code += 1;
            i += 1;
        } else if bytes[i] == b'*' {
            counts.italic += 1;
            i += 1;
        } else {
            i += 1;
        }
    }
    counts
}

/// Appends closing delimiters for every odd-count class, in the mandated
/// order: code-fence, then inline-code, then bold, then italic. Returns the
/// (possibly unchanged) text and whether anything was closed, so the caller
/// can log that it did so.
pub fn balance_markup(text: &str) -> (String, bool) {
    let counts = count_delimiters(text);
    let mut out = text.to_string();
    let mut closed = false;

    if counts.fence % 2 == 1 {
        out.push_str("```");
        closed = true;
    }
    if counts.inline_code % 2 == 1 {
        out.push('`');
        closed = true;
    }
    if counts.bold % 2 == 1 {
        out.push_str("**");
        closed = true;
    }
    if counts.italic % 2 == 1 {
        out.push('*');
        closed = true;
    }

    (out, closed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_text_is_unchanged() {
        let (out, closed) = balance_markup("plain **bold** and `code` and ```fenced```");
        assert_eq!(out, "plain **bold** and `code` and ```fenced```");
        assert!(!closed);
    }

    #[test]
    fn unfinished_bold_gets_closed() {
        let (out, closed) = balance_markup("Here is **an unfinished bold");
        assert_eq!(out, "Here is **an unfinished bold**");
        assert!(closed);
    }

    #[test]
    fn unfinished_inline_code_gets_closed() {
        let (out, closed) = balance_markup("run `ls -la");
        assert_eq!(out, "run `ls -la`");
        assert!(closed);
    }

    #[test]
    fn unfinished_fence_closes_before_other_classes() {
        // Odd fence AND odd italic: fence closes first in the appended order.
        let (out, _) = balance_markup("```diff\n+x\n*note");
        assert_eq!(out, "```diff\n+x\n*note```*");
    }

    #[test]
    fn every_delimiter_class_even_after_balancing() {
        let samples = [
            "no markup here",
            "**bold",
            "`code",
            "```fence",
            "*italic",
            "mixed **bold *italic `code ```fence",
        ];
        for s in samples {
            let (out, _) = balance_markup(s);
            let counts = count_delimiters(&out);
            assert_eq!(counts.fence % 2, 0, "fence odd for {s:?} -> {out:?}");
            assert_eq!(counts.inline_code % 2, 0, "inline_code odd for {s:?} -> {out:?}");
            assert_eq!(counts.bold % 2, 0, "bold odd for {s:?} -> {out:?}");
            assert_eq!(counts.italic % 2, 0, "italic odd for {s:?} -> {out:?}");
        }
    }
}
