/// Uppercase the first letter of `word`, leaving the rest untouched.
pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalizes_first_letter() {
        assert_eq!(capitalize_first("hello"), "Hello");
        assert_eq!(capitalize_first("hello,"), "Hello,");
    }

    #[test]
    fn test_numbers_and_empty_unchanged() {
        assert_eq!(capitalize_first("42"), "42");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_non_ascii_first_letter() {
        assert_eq!(capitalize_first("élan"), "Élan");
    }
}
