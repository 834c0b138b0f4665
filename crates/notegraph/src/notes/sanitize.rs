//! Title to filename conversion

use unicode_normalization::UnicodeNormalization;

/// Maximum title length in characters
pub const MAX_TITLE_CHARS: usize = 120;

/// Maximum stem length in UTF-8 bytes, leaving room for `.md` under the
/// usual 255-byte file name limit
pub const MAX_TITLE_BYTES: usize = 240;

const FALLBACK_TITLE: &str = "Untitled";

/// Turn a model-produced title into a safe file stem.
///
/// The result is NFC-normalized with runs of whitespace collapsed to a single
/// space. Characters that are reserved on common filesystems become `_`, and
/// leading and trailing dots are dropped. The stem is capped at
/// [`MAX_TITLE_CHARS`] characters and [`MAX_TITLE_BYTES`] bytes. Sanitizing a
/// sanitized stem returns it unchanged, so the stem doubles as the registry key.
pub fn sanitize_title(title: &str) -> String {
    let normalized: String = title.nfc().collect();

    let mut out = String::with_capacity(normalized.len());
    for word in normalized.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        }));
    }

    // Leading dots would make a hidden file that seeding never sees.
    let trimmed = out.trim_start_matches(|c: char| c == '.' || c.is_whitespace());
    let mut capped = String::with_capacity(trimmed.len().min(MAX_TITLE_BYTES));
    for c in trimmed.chars().take(MAX_TITLE_CHARS) {
        if capped.len() + c.len_utf8() > MAX_TITLE_BYTES {
            break;
        }
        capped.push(c);
    }
    let out = capped.trim_end_matches(|c: char| c == '.' || c.is_whitespace());

    if out.is_empty() || out.chars().all(|c| c == '_') {
        return FALLBACK_TITLE.to_string();
    }
    out.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reserved_characters() {
        assert_eq!(sanitize_title("TCP/IP: An Overview?"), "TCP_IP_ An Overview_");
        assert_eq!(sanitize_title("a\\b*c|d<e>f\"g"), "a_b_c_d_e_f_g");
    }

    #[test]
    fn test_whitespace_and_dots() {
        assert_eq!(sanitize_title("  Graph   Theory \n"), "Graph Theory");
        assert_eq!(sanitize_title("Etc..."), "Etc");
        assert_eq!(sanitize_title(".hidden"), "hidden");
        assert_eq!(sanitize_title(". .a"), "a");
        assert_eq!(sanitize_title(" .. . Notes"), "Notes");
    }

    #[test]
    fn test_empty_falls_back() {
        assert_eq!(sanitize_title(""), "Untitled");
        assert_eq!(sanitize_title(" ... "), "Untitled");
        assert_eq!(sanitize_title("???"), "Untitled");
    }

    #[test]
    fn test_nfc_makes_equal_titles_collide() {
        let composed = "Caf\u{e9}";
        let decomposed = "Cafe\u{301}";
        assert_eq!(sanitize_title(composed), sanitize_title(decomposed));
    }

    #[test]
    fn test_length_cap_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = sanitize_title(&long);
        assert_eq!(out.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_length_cap_counts_bytes() {
        let out = sanitize_title(&"漢".repeat(120));
        assert!(out.len() <= MAX_TITLE_BYTES);
        assert_eq!(out.len(), 240);
        assert!(format!("{}.md", out).len() <= 255);
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(title in r"[ .a-zA-Z漢é:/?*\\\t\n]{0,200}") {
            let once = sanitize_title(&title);
            prop_assert_eq!(sanitize_title(&once), once.clone());
            prop_assert!(!once.starts_with('.'));
            prop_assert!(once.len() <= MAX_TITLE_BYTES);
        }
    }
}
