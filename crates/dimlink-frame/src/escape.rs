//! Byte substitution applied to the source id and payload.
//!
//! The firmware never puts a literal `0x00` on the wire for these fields; it
//! sends `0x0F` instead. Decoding maps every `0x0F` back to `0` and leaves
//! all other values alone. A true `0x0F` cannot be transmitted.

use bytes::{BufMut, Bytes, BytesMut};

/// On-wire stand-in for a zero byte.
pub const ESCAPED_ZERO: u8 = 0x0F;

/// Decode one transmitted byte.
#[inline]
pub fn unescape_byte(byte: u8) -> u8 {
    if byte == ESCAPED_ZERO {
        0
    } else {
        byte
    }
}

/// Encode one byte for transmission.
#[inline]
pub fn escape_byte(byte: u8) -> u8 {
    if byte == 0 {
        ESCAPED_ZERO
    } else {
        byte
    }
}

/// Decode a transmitted byte run into its interpreted values.
pub fn unescape(raw: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(raw.len());
    for &byte in raw {
        out.put_u8(unescape_byte(byte));
    }
    out.freeze()
}

/// Append `data` to `dst` with escape substitution applied.
pub fn escape_into(data: &[u8], dst: &mut BytesMut) {
    dst.reserve(data.len());
    for &byte in data {
        dst.put_u8(escape_byte(byte));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_zero_decodes_to_zero() {
        assert_eq!(unescape_byte(0x0F), 0);
    }

    #[test]
    fn other_bytes_pass_through() {
        for byte in (0u8..=255).filter(|b| *b != ESCAPED_ZERO) {
            assert_eq!(unescape_byte(byte), byte);
        }
    }

    #[test]
    fn zero_is_sent_as_escape() {
        assert_eq!(escape_byte(0), 0x0F);
        assert_eq!(escape_byte(0x02), 0x02);
        assert_eq!(escape_byte(0xFF), 0xFF);
    }

    #[test]
    fn unescape_run() {
        let out = unescape(&[0x0F, 0x00, 0x01, 0x0F, 0xFF]);
        assert_eq!(out.as_ref(), &[0x00, 0x00, 0x01, 0x00, 0xFF]);
    }

    #[test]
    fn escape_into_never_emits_zero() {
        let mut dst = BytesMut::new();
        escape_into(&[0, 1, 0, 2], &mut dst);
        assert_eq!(dst.as_ref(), &[0x0F, 0x01, 0x0F, 0x02]);
        assert_eq!(unescape(&dst).as_ref(), &[0, 1, 0, 2]);
    }

    #[test]
    fn literal_escape_value_is_lossy() {
        let mut dst = BytesMut::new();
        escape_into(&[0x0F], &mut dst);
        assert_eq!(unescape(&dst).as_ref(), &[0x00]);
    }
}
