//! Frame/sample number length
//!
//! The frame header carries the frame number (fixed blocking) or the first
//! sample number (variable blocking) in a UTF-8-like encoding. We never need
//! the value, only how many bytes it occupies:
//!
//! ```text
//! 0xxxxxxx                      1 byte
//! 110xxxxx 10xxxxxx             2 bytes
//! 1110xxxx 10xxxxxx x2          3 bytes
//! ...
//! 11111110 10xxxxxx x6          7 bytes
//! ```

/// Size of the coded number at the start of `p`, and whether it is well formed.
///
/// The size is still reported for malformed input so the header scanner can
/// account for it; `valid` is false when the leading byte is a bare
/// continuation byte, the buffer is too short, or any continuation byte does
/// not match `10xxxxxx`.
pub fn varint_length(p: &[u8]) -> (usize, bool) {
    let Some(&first) = p.first() else {
        return (0, false);
    };

    let n = match first.leading_ones() {
        0 => 1,
        // 10xxxxxx: continuation byte, invalid at start
        1 => return (1, false),
        ones @ 2..=7 => ones as usize,
        // 0xFF has no length form
        _ => return (1, false),
    };

    if n > p.len() {
        return (n, false);
    }

    let valid = p[1..n].iter().all(|&b| b & 0xC0 == 0x80);
    (n, valid)
}
