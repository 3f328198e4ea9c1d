//! UTF-8 codepoint decoding.

/// Largest codepoint the engine represents. Also the widest value that fits
/// an instruction's 24-bit immediate.
pub const MAX_CODEPOINT: u32 = 0x00FF_FFFF;

/// Decode one UTF-8 sequence from the front of `bytes`.
///
/// Returns the codepoint and the number of bytes it occupied, or `None` if
/// `bytes` is empty, the leading byte is not a valid lead, the sequence is
/// truncated, or a continuation byte does not match `10xxxxxx`.
///
/// A NUL byte decodes as codepoint 0 with length 1; callers treat it as the
/// end-of-string sentinel. Overlong forms and surrogates are not rejected.
pub fn decode(bytes: &[u8]) -> Option<(u32, usize)> {
    let &lead = bytes.first()?;
    let len = match lead.leading_ones() {
        0 => return Some((lead as u32, 1)),
        n @ 2..=4 => n as usize,
        _ => return None,
    };
    let tail = bytes.get(1..len)?;
    let mut cp = (lead & (0x7F >> len)) as u32;
    for &b in tail {
        if b & 0xC0 != 0x80 {
            return None;
        }
        cp = (cp << 6) | (b & 0x3F) as u32;
    }
    Some((cp, len))
}
