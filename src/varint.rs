//! Sign-magnitude little-endian 64-bit integer codec.
//!
//! This is the 2003 bsdiff wire format: the low seven bytes hold the
//! magnitude little-endian, and the high bit of the eighth byte is the sign.
//! It is not the platform's native two's-complement layout and must not be
//! replaced by it.

use byteorder::{ByteOrder, LE};

/// Size in bytes of one encoded integer.
pub const SIZE: usize = 8;

/// Encodes `x` into `buf` using the sign-magnitude little-endian layout.
///
/// `x` must fit the 63-bit magnitude budget (`-(2^63-1) ..= 2^63-1`); values
/// outside that range are out of contract, matching the original format.
pub fn encode_int(x: i64, buf: &mut [u8]) {
    debug_assert!(buf.len() >= SIZE);
    let magnitude = if x < 0 {
        x.unsigned_abs()
    } else {
        x as u64
    };
    LE::write_u64(buf, magnitude);
    if x < 0 {
        buf[7] |= 0x80;
    }
}

/// Decodes a sign-magnitude little-endian integer from `buf`.
///
/// The negative-zero bit pattern (sign bit set, magnitude zero) decodes as
/// ordinary zero.
pub fn decode_int(buf: &[u8]) -> i64 {
    debug_assert!(buf.len() >= SIZE);
    let raw = LE::read_u64(buf);
    let magnitude = (raw & ((1u64 << 63) - 1)) as i64;
    if raw & (1u64 << 63) != 0 {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_positive_and_negative() {
        for x in [0i64, 1, -1, 255, -255, 1 << 40, -(1 << 40), (1i64 << 63) - 1, -((1i64 << 63) - 1)] {
            let mut buf = [0u8; SIZE];
            encode_int(x, &mut buf);
            assert_eq!(decode_int(&buf), x, "round trip failed for {x}");
        }
    }

    #[test]
    fn negative_zero_bit_pattern_decodes_as_zero() {
        let mut buf = [0u8; SIZE];
        buf[7] = 0x80;
        assert_eq!(decode_int(&buf), 0);
    }

    #[test]
    fn zero_encodes_without_sign_bit() {
        let mut buf = [0xffu8; SIZE];
        encode_int(0, &mut buf);
        assert_eq!(buf, [0u8; SIZE]);
    }
}
