use icu_normalizer::ComposingNormalizerBorrowed;

/// NFC-compose `text` and collapse every whitespace run to a single space.
pub fn normalize_text(text: &str) -> String {
    let composed = ComposingNormalizerBorrowed::new_nfc().normalize(text);
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composes_decomposed_accents() {
        let decomposed = "cafe\u{301}";
        let normalized = normalize_text(decomposed);
        assert_eq!(normalized, "caf\u{e9}");
        assert_eq!(normalized.chars().count(), 4);
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            normalize_text("  to be,\n\tor  not to be  "),
            "to be, or not to be"
        );
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n "), "");
    }
}
