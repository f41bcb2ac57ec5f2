//! Whitespace normalisation and truncation to the extraction budget.
//!
//! Extracted PDF text is full of hard line breaks, tab runs and page-break
//! padding that cost tokens and carry no meaning for field extraction. One
//! regex pass collapses every whitespace run to a single space; a prefix cut
//! then bounds the request size.
//!
//! The cut is by characters, not bytes, so multi-byte text is never split
//! mid-code-point. It ignores word and sentence boundaries: losing the tail of
//! a long RFP is accepted, and the result records whether it happened.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Document text after normalisation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    original_chars: usize,
    truncated: bool,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Character count of the normalised text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Character count after whitespace collapse but before the budget cut.
    pub fn original_chars(&self) -> usize {
        self.original_chars
    }

    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Collapse whitespace runs to one space, trim, and keep at most `budget`
/// characters.
///
/// A cut that lands right after a space leaves it trailing; the result is
/// trimmed again so the output never ends in whitespace and
/// `normalize(normalize(s, b), b) == normalize(s, b)` holds for every `s`.
pub fn normalize(text: &str, budget: usize) -> NormalizedText {
    let collapsed = RE_WHITESPACE.replace_all(text, " ");
    let collapsed = collapsed.trim();
    let original_chars = collapsed.chars().count();

    if original_chars <= budget {
        return NormalizedText {
            text: collapsed.to_string(),
            original_chars,
            truncated: false,
        };
    }

    let cut = collapsed
        .char_indices()
        .nth(budget)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(collapsed.len());

    NormalizedText {
        text: collapsed[..cut].trim_end().to_string(),
        original_chars,
        truncated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_whitespace_run(s: &str) -> bool {
        let chars: Vec<char> = s.chars().collect();
        chars
            .windows(2)
            .any(|w| w[0].is_whitespace() && w[1].is_whitespace())
    }

    #[test]
    fn collapses_every_kind_of_whitespace() {
        let n = normalize("  Bid\tNumber:\n\n RFP-1 \r\n Due\u{00A0}\u{2003}Date ", 100);
        assert_eq!(n.as_str(), "Bid Number: RFP-1 Due Date");
        assert!(!n.was_truncated());
    }

    #[test]
    fn truncates_to_budget_by_prefix() {
        let n = normalize("abcdefghij", 4);
        assert_eq!(n.as_str(), "abcd");
        assert!(n.was_truncated());
        assert_eq!(n.original_chars(), 10);
    }

    #[test]
    fn truncation_may_split_words() {
        let n = normalize("Technical Specifications", 6);
        assert_eq!(n.as_str(), "Techni");
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let n = normalize("ééééé", 3);
        assert_eq!(n.as_str(), "ééé");
        assert_eq!(n.char_count(), 3);
    }

    #[test]
    fn cut_after_separator_drops_trailing_space() {
        let n = normalize("ab cd", 3);
        assert_eq!(n.as_str(), "ab");
    }

    #[test]
    fn whitespace_only_is_empty() {
        let n = normalize(" \n\t ", 10);
        assert_eq!(n.as_str(), "");
        assert_eq!(n.char_count(), 0);
    }

    #[test]
    fn invariants_hold_across_samples() {
        let repeated = "word ".repeat(50);
        let samples = [
            "",
            "x",
            "a  b",
            "\n\nline one\n\nline two\t\ttabbed   ",
            "Bid Number: RFP-2024-001. Due Date: March 1, 2024.",
            repeated.as_str(),
            "ü \u{3000} ü \u{3000} ü",
        ];
        for s in samples {
            for budget in [1, 2, 5, 17, 4000] {
                let once = normalize(s, budget);
                assert!(once.char_count() <= budget, "{s:?} / {budget}");
                assert!(!has_whitespace_run(once.as_str()), "{s:?} / {budget}");
                let twice = normalize(once.as_str(), budget);
                assert_eq!(once.as_str(), twice.as_str(), "{s:?} / {budget}");
            }
        }
    }

    #[test]
    fn deterministic() {
        let s = "Pre Bid Meeting\n  Details:   TBD";
        assert_eq!(normalize(s, 12), normalize(s, 12));
    }
}
