const OPEN_TAG: &str = "<palindromi>";
const CLOSE_TAG: &str = "</palindromi>";

/// Content between the first `<PALINDROMI>` and `</PALINDROMI>` markers (any
/// case), or the whole response when the markers are missing. Trimmed.
pub fn extract_palindrome(text: &str) -> &str {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    if let Some(start) = lower.find(OPEN_TAG) {
        let content_start = start + OPEN_TAG.len();
        if let Some(len) = lower[content_start..].find(CLOSE_TAG) {
            return text[content_start..content_start + len].trim();
        }
    }
    text.trim()
}

/// Lower-cased, ASCII punctuation removed, surrounding whitespace trimmed
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

pub fn is_correct(answer: &str, reference: &str) -> bool {
    normalize_text(answer) == normalize_text(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tagged_content() {
        let response = "Tässä:\n<PALINDROMI>\n  Innostunut sonni\n</PALINDROMI>\nKiitos!";
        assert_eq!(extract_palindrome(response), "Innostunut sonni");
    }

    #[test]
    fn tags_are_case_insensitive() {
        assert_eq!(extract_palindrome("<palindromi>saippuakauppias</Palindromi>"), "saippuakauppias");
    }

    #[test]
    fn untagged_response_is_used_whole() {
        assert_eq!(extract_palindrome("  saippuakauppias \n"), "saippuakauppias");
        assert_eq!(extract_palindrome("<PALINDROMI>unterminated"), "<PALINDROMI>unterminated");
    }

    #[test]
    fn first_tag_pair_wins() {
        assert_eq!(
            extract_palindrome("<PALINDROMI>yksi</PALINDROMI><PALINDROMI>kaksi</PALINDROMI>"),
            "yksi"
        );
    }

    #[test]
    fn normalization_ignores_punctuation_and_case() {
        assert_eq!(normalize_text(" Innostunut, sonni! "), "innostunut sonni");
        assert!(is_correct("Saippuakauppias.", "saippuakauppias"));
        assert!(!is_correct("saippua", "saippuakauppias"));
    }

    #[test]
    fn non_ascii_letters_survive() {
        assert_eq!(normalize_text("Äiti, ä!"), "äiti ä");
    }
}
