pub mod field;
pub mod modal;
pub mod pane;
pub mod toast;

use unicode_width::UnicodeWidthChar;

/// Truncates `text` to at most `max` terminal columns, ending in `…` when cut.
pub fn fit_width(text: &str, max: usize) -> String {
    if unicode_width::UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("short", 10), "short");
        assert_eq!(fit_width("abcdefgh", 5), "abcd…");
        assert_eq!(fit_width("日本語テキスト", 7), "日本語…");
    }
}
