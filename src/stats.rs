//! Derived statistics reported alongside combined extraction results.

use serde::Serialize;

/// Size figures computed from extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    /// Length of the text in UTF-16 code units.
    pub text_length: usize,
    /// Number of pieces produced by splitting on runs of whitespace.
    pub word_count: usize,
}

impl TextStats {
    /// Compute statistics for `text`.
    pub fn of(text: &str) -> Self {
        Self {
            text_length: char_length(text),
            word_count: word_count(text),
        }
    }
}

/// Length of `text` in UTF-16 code units, the unit JSON clients measure strings in.
///
/// Characters outside the Basic Multilingual Plane count twice.
pub fn char_length(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Whitespace as matched by the `\s` class of ECMAScript regular expressions.
///
/// Differs from [`char::is_whitespace`]: includes U+FEFF, excludes U+0085.
fn is_separator(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n'
            | '\u{0B}'
            | '\u{0C}'
            | '\r'
            | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Count the pieces left after splitting on runs of whitespace.
///
/// Leading or trailing whitespace yields an empty piece at that edge, and empty text is a single
/// empty piece, so the result is always at least one.
pub fn word_count(text: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for ch in text.chars() {
        if is_separator(ch) {
            if !in_run {
                runs += 1;
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }
    runs + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world_has_two_words() {
        let stats = TextStats::of("hello world");
        assert_eq!(stats.text_length, 11);
        assert_eq!(stats.word_count, 2);
    }

    #[test]
    fn empty_text_counts_one_piece() {
        assert_eq!(word_count(""), 1);
        assert_eq!(char_length(""), 0);
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(word_count("a \t\n b   c"), 3);
    }

    #[test]
    fn edge_whitespace_adds_empty_pieces() {
        assert_eq!(word_count("\nhello world\n"), 4);
        assert_eq!(word_count("   "), 2);
    }

    #[test]
    fn length_counts_utf16_units_not_bytes() {
        assert_eq!(char_length("naïve"), 5);
        assert_eq!(char_length("😀 ok"), 5);
    }

    #[test]
    fn byte_order_mark_separates_words() {
        assert_eq!(word_count("a\u{FEFF}b"), 2);
    }

    #[test]
    fn next_line_control_does_not_separate_words() {
        assert_eq!(word_count("a\u{85}b"), 1);
    }

    #[test]
    fn unicode_spaces_separate_words() {
        assert_eq!(word_count("a\u{A0}b\u{3000}c\u{2009}d"), 4);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(TextStats::of("one two")).expect("json");
        assert_eq!(value["textLength"], 7);
        assert_eq!(value["wordCount"], 2);
    }
}
