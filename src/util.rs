//! Shared utility functions for the Oven crate.

/// Convert a title to a git/URL-safe slug, limited to `max_len` characters.
///
/// Only ASCII letters and digits survive; every other run of characters
/// collapses into a single `-`.
pub fn slugify(title: &str, max_len: usize) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.len() > max_len {
        // ASCII-only, so any byte index is a char boundary.
        slug[..max_len].trim_end_matches('-').to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_normal_title() {
        assert_eq!(slugify("Fix the API bug", 50), "fix-the-api-bug");
    }

    #[test]
    fn test_slugify_special_characters() {
        assert_eq!(slugify("Fix @#$ bug!", 50), "fix-bug");
    }

    #[test]
    fn test_slugify_truncation() {
        let result = slugify("This is a very long title that should be truncated", 20);
        assert!(result.len() <= 20);
        assert!(!result.ends_with('-'));
        assert_eq!(result, "this-is-a-very-long");
    }

    #[test]
    fn test_slugify_empty_input() {
        assert_eq!(slugify("", 50), "");
        assert_eq!(slugify("@#$%^&*()", 50), "");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        let result = slugify("Café Résumé", 50);
        assert!(result.is_ascii());
        assert!(!result.starts_with('-'));
        assert!(!result.ends_with('-'));
    }

    #[test]
    fn test_slugify_truncation_no_trailing_dash() {
        assert_eq!(slugify("abcde fghij", 6), "abcde");
    }
}
