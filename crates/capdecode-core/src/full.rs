//! Decoder for full-precision 256-bit binary capability dumps.
//!
//! The uncompressed representation stores every capability field at its
//! architectural width, so decoding is exact bit-field slicing with no
//! reconstruction step.

use std::ops::Range;

use crate::bits::TaggedPayload;
use crate::cap::CapabilityValue;
use crate::decode::DecodeResult;

/// Payload width of the full-precision dump, tag excluded.
pub const FULL_PAYLOAD_BITS: usize = 256;
/// Total digit count of a full-precision dump string, tag included.
pub const FULL_DUMP_DIGITS: usize = FULL_PAYLOAD_BITS + 1;

// Architectural payload layout, most-significant bit first.
const PERMS: Range<usize> = 8..39;
const OBJECT_TYPE: Range<usize> = 39..63;
const SEALED_BIT: usize = 63;
const OFFSET: Range<usize> = 64..128;
const BASE: Range<usize> = 128..192;
const LENGTH: Range<usize> = 192..256;

/// Decodes a 257-digit full-precision dump string.
///
/// Any `u` digit makes the whole value `DecodeResult::Undefined`; it is never
/// coerced to zero. Otherwise the fixed bit ranges are sliced losslessly.
#[must_use]
pub fn decode_full(digits: &str) -> DecodeResult {
    let payload = match TaggedPayload::parse(digits, FULL_PAYLOAD_BITS) {
        Ok(payload) => payload,
        Err(kind) => return kind.into(),
    };

    if payload.has_undefined() {
        return DecodeResult::Undefined;
    }

    DecodeResult::Value(CapabilityValue {
        tag: payload.tag(),
        sealed: payload.bit(SEALED_BIT),
        permissions: payload.field_u32(PERMS),
        object_type: payload.field_u32(OBJECT_TYPE),
        base: payload.field(BASE),
        length: payload.field(LENGTH),
        offset: payload.field(OFFSET),
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_full, FULL_DUMP_DIGITS, FULL_PAYLOAD_BITS};
    use crate::decode::{DecodeResult, MalformedKind};

    /// Builds a dump string from architectural field values.
    fn encode_dump(
        tag: bool,
        perms: u32,
        object_type: u32,
        sealed: bool,
        offset: u64,
        base: u64,
        length: u64,
    ) -> String {
        let mut digits = String::with_capacity(FULL_DUMP_DIGITS);
        digits.push(if tag { '1' } else { '0' });
        push_bits(&mut digits, 0, 8);
        push_bits(&mut digits, u64::from(perms), 31);
        push_bits(&mut digits, u64::from(object_type), 24);
        digits.push(if sealed { '1' } else { '0' });
        push_bits(&mut digits, offset, 64);
        push_bits(&mut digits, base, 64);
        push_bits(&mut digits, length, 64);
        digits
    }

    fn push_bits(digits: &mut String, value: u64, width: usize) {
        for position in (0..width).rev() {
            digits.push(if (value >> position) & 1 == 1 { '1' } else { '0' });
        }
    }

    #[test]
    fn slices_every_field_at_its_architectural_position() {
        let digits = encode_dump(
            true,
            0x7FFF_FFFF,
            0x00AB_CDEF,
            true,
            0x0123_4567_89AB_CDEF,
            0x9000_0000_4000_0000,
            0x0000_0000_1000_0000,
        );
        let cap = decode_full(&digits).value().copied().expect("clean dump");
        assert!(cap.tag);
        assert!(cap.sealed);
        assert_eq!(cap.permissions, 0x7FFF_FFFF);
        assert_eq!(cap.object_type, 0x00AB_CDEF);
        assert_eq!(cap.offset, 0x0123_4567_89AB_CDEF);
        assert_eq!(cap.base, 0x9000_0000_4000_0000);
        assert_eq!(cap.length, 0x0000_0000_1000_0000);
    }

    #[test]
    fn untagged_dump_still_decodes_its_fields() {
        let digits = encode_dump(false, 0, 0, false, 0, 0xFF00, 0x100);
        let cap = decode_full(&digits).value().copied().expect("clean dump");
        assert!(!cap.tag);
        assert_eq!(cap.base, 0xFF00);
    }

    #[test]
    fn any_undefined_digit_poisons_the_whole_value() {
        for position in [0, 1, 64, 200, FULL_DUMP_DIGITS - 1] {
            let mut digits = encode_dump(true, 1, 0, false, 0, 0, 0);
            digits.replace_range(position..=position, "u");
            assert_eq!(
                decode_full(&digits),
                DecodeResult::Undefined,
                "digit {position}"
            );
        }
    }

    #[test]
    fn wrong_width_is_malformed_not_undefined() {
        let digits = "0".repeat(FULL_DUMP_DIGITS - 1);
        assert_eq!(
            decode_full(&digits),
            DecodeResult::Malformed(MalformedKind::WrongWidth {
                expected: FULL_DUMP_DIGITS,
                actual: FULL_DUMP_DIGITS - 1,
            })
        );
    }
}
