//! Small helpers for safe diagnostics output.

/// Replace the value of a `key=` URL query parameter with `***`.
///
/// Transport errors and debug lines can echo the full request URL, which for
/// the Direct protocol carries the credential as a query parameter.
pub fn redact_key_param(s: &str) -> String {
    match s.find("key=") {
        Some(start) => {
            let value_start = start + "key=".len();
            let value_end = s[value_start..]
                .find(|c: char| c == '&' || c == ')' || c.is_whitespace())
                .map_or(s.len(), |offset| value_start + offset);
            format!("{}key=***{}", &s[..start], &s[value_end..])
        }
        None => s.to_string(),
    }
}

/// Truncate a string to `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte-index slicing (`&s[..n]`), this is safe for multi-byte UTF-8
/// strings and will never panic on non-ASCII input.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_key_at_end_of_url() {
        assert_eq!(
            redact_key_param("https://example.com/generate?key=sk-secret"),
            "https://example.com/generate?key=***"
        );
    }

    #[test]
    fn redacts_key_before_other_params() {
        assert_eq!(
            redact_key_param("https://example.com/g?key=sk-secret&alt=json"),
            "https://example.com/g?key=***&alt=json"
        );
    }

    #[test]
    fn leaves_keyless_strings_alone() {
        assert_eq!(
            redact_key_param("connection refused (os error 111)"),
            "connection refused (os error 111)"
        );
    }

    #[test]
    fn redacts_inside_error_text() {
        let msg = "error sending request for url (https://x.test/v1?key=abc123)";
        assert_eq!(
            redact_key_param(msg),
            "error sending request for url (https://x.test/v1?key=***)"
        );
    }

    #[test]
    fn ascii_no_truncation() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
    }

    #[test]
    fn ascii_truncated() {
        assert_eq!(truncate_with_ellipsis("hello world", 5), "hello...");
    }

    #[test]
    fn multibyte_safe_truncation() {
        let s = "\u{4F60}\u{597D}\u{4E16}\u{754C}"; // 4 CJK chars, 3 bytes each
        assert_eq!(truncate_with_ellipsis(s, 2), "\u{4F60}\u{597D}...");
    }
}
