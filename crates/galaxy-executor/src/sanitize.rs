//! Free-text argument sanitizer.

/// Characters a shell would treat as syntax.
pub const SHELL_METACHARACTERS: &[char] = &[
    ';', '&', '|', '`', '$', '(', ')', '{', '}', '\\', '[', ']', '<', '>', '\'', '"',
];

/// Strips shell metacharacters, collapses whitespace runs to one space,
/// trims, and truncates to `max_chars` characters.
pub fn sanitize_argument(input: &str, max_chars: usize) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !SHELL_METACHARACTERS.contains(c))
        .collect();

    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}

/// Whether `input` passes through the sanitizer unchanged.
pub fn is_clean(input: &str, max_chars: usize) -> bool {
    sanitize_argument(input, max_chars) == input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_metacharacters() {
        assert_eq!(sanitize_argument("hello; rm -rf /", 1000), "hello rm -rf /");
        assert_eq!(sanitize_argument("$(cat /etc/passwd)", 1000), "cat /etc/passwd");
        assert_eq!(sanitize_argument("a && b || c", 1000), "a b c");
        assert_eq!(sanitize_argument("`id`", 1000), "id");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(sanitize_argument("  a \t\n b  ", 1000), "a b");
    }

    #[test]
    fn test_truncates_by_chars() {
        let long = "é".repeat(20);
        assert_eq!(sanitize_argument(&long, 5).chars().count(), 5);
    }

    #[test]
    fn test_is_clean() {
        assert!(is_clean("hello world", 1000));
        assert!(!is_clean("hello  world", 1000));
        assert!(!is_clean("hello; ls", 1000));
        assert!(!is_clean("abcdef", 3));
    }
}
