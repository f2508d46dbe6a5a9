//! Payload size rules shared by the dispatch gateway and the console editor.
//!
//! The size limit applies to the *normalized* payload: every line trimmed,
//! line breaks dropped, whitespace runs collapsed to one space. The gateway
//! only measures the normalized form; what it forwards is up to the caller.

/// Largest normalized payload the channel sideband accepts, in bytes.
pub const MAX_DISPATCH_BYTES: usize = 1024;

pub fn normalize(payload: &str) -> String {
    let joined: String = payload
        .split(|c| c == '\r' || c == '\n')
        .map(str::trim)
        .collect();

    let mut out = String::with_capacity(joined.len());
    let mut in_whitespace = false;
    for c in joined.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// UTF-8 length of the normalized payload.
pub fn normalized_byte_len(payload: &str) -> usize {
    if payload.is_empty() {
        return 0;
    }
    normalize(payload).len()
}

/// Size label shown next to the editor: `(512 B)` or `(1.02 KB)`.
pub fn format_byte_length(byte_len: usize) -> String {
    if byte_len >= 1000 {
        format!("({:.2} KB)", byte_len as f64 / 1000.0)
    } else {
        format!("({} B)", byte_len)
    }
}

/// Checks that a non-empty payload parses as JSON. Returns the parser's
/// message on failure.
pub fn lint_json(payload: &str) -> Result<(), String> {
    if payload.is_empty() {
        return Ok(());
    }
    serde_json::from_str::<serde_json::Value>(payload)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_lines_and_collapses() {
        let raw = "  {\n    \"a\":   1,\r\n    \"b\"\t: 2\r  }  ";
        assert_eq!(normalize(raw), "{\"a\": 1,\"b\" : 2}");
    }

    #[test]
    fn test_empty_payload_is_zero_bytes() {
        assert_eq!(normalized_byte_len(""), 0);
        assert_eq!(normalized_byte_len("   \n  "), 0);
    }

    #[test]
    fn test_limit_counts_normalized_bytes() {
        let exact = "a".repeat(MAX_DISPATCH_BYTES);
        assert!(normalized_byte_len(&exact) <= MAX_DISPATCH_BYTES);

        // Padding that normalization strips does not count.
        let padded = format!("   {}   \n\n\n   ", exact);
        assert!(padded.len() > MAX_DISPATCH_BYTES);
        assert!(normalized_byte_len(&padded) <= MAX_DISPATCH_BYTES);

        let over = "a".repeat(MAX_DISPATCH_BYTES + 1);
        assert!(normalized_byte_len(&over) > MAX_DISPATCH_BYTES);
    }

    #[test]
    fn test_multibyte_chars_count_as_bytes() {
        // 'é' is two bytes in UTF-8.
        let payload = "é".repeat(513);
        assert_eq!(normalized_byte_len(&payload), 1026);
        assert!(normalized_byte_len(&payload) > MAX_DISPATCH_BYTES);
    }

    #[test]
    fn test_format_byte_length() {
        assert_eq!(format_byte_length(0), "(0 B)");
        assert_eq!(format_byte_length(999), "(999 B)");
        assert_eq!(format_byte_length(1024), "(1.02 KB)");
    }

    #[test]
    fn test_lint_json() {
        assert!(lint_json("").is_ok());
        assert!(lint_json("{\"question\": \"?\"}").is_ok());
        assert!(lint_json("{oops").is_err());
    }
}
