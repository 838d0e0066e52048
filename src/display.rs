//! Console-friendly rendering of names in progress logs.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Column budget for names in progress lines.
pub const NAME_COLUMNS: usize = 50;

/// Cuts `text` to at most `max_width` terminal columns, marking the cut with `…`.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_to_width("Portal 2", 50), "Portal 2");
    }

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("abcdefgh", 5), "abcd…");
    }

    #[test]
    fn test_wide_chars_count_double() {
        // Each CJK glyph is two columns wide.
        let cut = truncate_to_width("黑神话悟空", 6);
        assert_eq!(cut, "黑神…");
        assert!(cut.width() <= 6);
    }

    #[test]
    fn test_zero_width_budget() {
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
