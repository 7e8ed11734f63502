//! String utilities
//!
//! Prompt previews for log lines.

/// Maximum characters of a prompt included in log fields
pub const PROMPT_PREVIEW_CHARS: usize = 50;

/// Safely truncate a string at a character boundary
///
/// # Example
/// ```
/// use image_studio::utils::truncate_str;
///
/// let text = "Hello, 世界!";
/// assert_eq!(truncate_str(text, 8), "Hello, 世");
/// assert_eq!(truncate_str(text, 100), "Hello, 世界!");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Short form of a prompt for logging, with `...` when cut
pub fn prompt_preview(prompt: &str) -> String {
    let trimmed = prompt.trim();
    let head = truncate_str(trimmed, PROMPT_PREVIEW_CHARS);
    if head.len() < trimmed.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_unicode() {
        let text = "Hello, 世界!";
        assert_eq!(truncate_str(text, 7), "Hello, ");
        assert_eq!(truncate_str(text, 8), "Hello, 世");
        assert_eq!(truncate_str(text, 9), "Hello, 世界");
    }

    #[test]
    fn test_prompt_preview() {
        assert_eq!(prompt_preview("  a red fox  "), "a red fox");

        let long = "x".repeat(80);
        let preview = prompt_preview(&long);
        assert_eq!(preview.len(), PROMPT_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));

        let exact = "y".repeat(PROMPT_PREVIEW_CHARS);
        assert_eq!(prompt_preview(&exact), exact);
    }
}
