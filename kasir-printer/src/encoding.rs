//! GB18030 encoding utilities for thermal printers
//!
//! The target printers are configured for the GB18030 code page. This
//! module provides utilities for:
//! - Calculating printed column widths
//! - Truncating/padding strings to column widths
//! - Converting UTF-8 to GB18030 while preserving ESC/POS commands

use tracing::instrument;

/// Get the GB18030 byte width of a string.
///
/// CJK characters are 2 columns on the paper, ASCII is 1.
pub fn text_width(s: &str) -> usize {
    let (cow, _, _) = encoding_rs::GB18030.encode(s);
    cow.len()
}

/// Truncate a string to fit within a printed column width.
pub fn truncate_width(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut result = String::new();
    for c in s.chars() {
        let char_len = text_width(c.encode_utf8(&mut [0u8; 4]));
        if width + char_len > max_width {
            break;
        }
        result.push(c);
        width += char_len;
    }
    result
}

/// Truncate a string to at most `max_chars` codepoints.
///
/// Never splits a character, unlike byte slicing.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Pad a string to a specific printed column width.
///
/// If the string is wider than `width`, it is truncated instead.
pub fn pad_width(s: &str, width: usize, align_right: bool) -> String {
    let current = text_width(s);
    if current >= width {
        return truncate_width(s, width);
    }
    let spaces = width - current;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Convert mixed UTF-8 content (with ESC/POS commands) to GB18030.
///
/// ASCII bytes (0x00-0x7F) pass through exactly as is, which protects
/// ESC/POS command sequences from being corrupted. Only bytes >= 0x80
/// are treated as UTF-8 sequences and re-encoded.
#[instrument(skip(bytes))]
pub fn convert_to_gb18030(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() * 2);
    let mut buffer = Vec::new();

    for &b in bytes {
        if b < 128 {
            // Command byte or ASCII text
            flush_buffer(&mut buffer, &mut result);
            result.push(b);
        } else {
            // Part of a UTF-8 multi-byte character
            buffer.push(b);
        }
    }

    flush_buffer(&mut buffer, &mut result);
    result
}

/// Flush the non-ASCII buffer, converting UTF-8 to GB18030.
fn flush_buffer(buffer: &mut Vec<u8>, result: &mut Vec<u8>) {
    if buffer.is_empty() {
        return;
    }
    let s = String::from_utf8_lossy(buffer);
    let (encoded, _, _) = encoding_rs::GB18030.encode(&s);
    result.extend_from_slice(&encoded);
    buffer.clear();
}
