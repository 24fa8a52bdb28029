// Output formatting — terminal display and the JSON intelligence report.

pub mod report;
pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, so titles with multi-byte characters
/// never panic.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("APT41", 10), "APT41");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_chars("Kyiv — Київ", 6), "Kyiv —...");
    }
}
