//! Text normalization shared by the extractors.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(&str, &str); 7] = [
    ("\u{FB00}", "ff"),  // ﬀ
    ("\u{FB01}", "fi"),  // ﬁ
    ("\u{FB02}", "fl"),  // ﬂ
    ("\u{FB03}", "ffi"), // ﬃ
    ("\u{FB04}", "ffl"), // ﬄ
    ("\u{FB05}", "st"),  // ﬅ (long s + t)
    ("\u{FB06}", "st"),  // ﬆ
];

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static whitespace pattern"))
}

/// Collapse every whitespace run to one space and trim the ends.
///
/// Text is NFC-normalized and typographic ligatures are unfolded first so
/// that the same word always compares equal downstream.
pub fn clean_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();
    for (ligature, replacement) in LIGATURES {
        if result.contains(ligature) {
            result = result.replace(ligature, replacement);
        }
    }
    whitespace_regex().replace_all(&result, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_text("  a \n\n b\t\tc  "), "a b c");
        assert_eq!(clean_text("\n\t "), "");
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(clean_text("ﬁnding ﬂowers"), "finding flowers");
    }

    #[test]
    fn test_unicode_normalization() {
        // "e" + combining acute accent composes to a single code point
        assert_eq!(clean_text("cafe\u{301}"), "caf\u{e9}");
    }
}
