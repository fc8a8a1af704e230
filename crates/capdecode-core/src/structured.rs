//! Decoder for structured named-field capability lines.
//!
//! The simplest wire form spells every capability field out as labelled hex
//! (`t:1 s:0 perms:0x... type:0x... offset:0x... base:0x... length:0x...`).
//! Decoding is a direct radix-16 parse with no precision loss; field order is
//! not significant, but each field must appear exactly once.

use crate::cap::CapabilityValue;
use crate::decode::{DecodeResult, MalformedKind};

/// The fixed set of named fields, one per capability component.
const FIELD_NAMES: [&str; 7] = ["t", "s", "perms", "type", "offset", "base", "length"];

const TAG: usize = 0;
const SEALED: usize = 1;
const PERMS: usize = 2;
const OBJECT_TYPE: usize = 3;
const OFFSET: usize = 4;
const BASE: usize = 5;
const LENGTH: usize = 6;

/// Canonical permission field width carried by structured lines.
const PERMS_BITS: u32 = 31;
/// Object-type field width carried by structured lines.
const OBJECT_TYPE_BITS: u32 = 24;

fn field_index(name: &str) -> Option<usize> {
    FIELD_NAMES.iter().position(|candidate| *candidate == name)
}

fn parse_hex(value: &str) -> Option<u64> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16).ok()
}

const fn parse_bit(index: usize, values: &[Option<u64>; 7]) -> Result<bool, MalformedKind> {
    match values[index] {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => Err(MalformedKind::InvalidBit {
            field: FIELD_NAMES[index],
        }),
    }
}

fn parse_narrow(index: usize, bits: u32, values: &[Option<u64>; 7]) -> Result<u32, MalformedKind> {
    let raw = values[index].unwrap_or_default();
    match u32::try_from(raw) {
        Ok(value) if u64::from(value) < (1_u64 << bits) => Ok(value),
        _ => Err(MalformedKind::InvalidHex {
            field: FIELD_NAMES[index],
        }),
    }
}

/// Decodes the named-field portion of a structured capability line.
///
/// Returns `DecodeResult::Malformed` when a field is missing, duplicated,
/// unlabelled, unknown, or not valid hex for its width. This format carries
/// no undefined digits, so `DecodeResult::Undefined` never arises here.
#[must_use]
pub fn decode_structured(text: &str) -> DecodeResult {
    let mut values: [Option<u64>; 7] = [None; 7];

    for token in text.split_whitespace() {
        let Some((name, value)) = token.split_once(':') else {
            return MalformedKind::NotAField(token.to_string()).into();
        };
        let Some(index) = field_index(name) else {
            return MalformedKind::UnknownField(name.to_string()).into();
        };
        if values[index].is_some() {
            return MalformedKind::DuplicateField(FIELD_NAMES[index]).into();
        }
        let Some(parsed) = parse_hex(value) else {
            return MalformedKind::InvalidHex {
                field: FIELD_NAMES[index],
            }
            .into();
        };
        values[index] = Some(parsed);
    }

    for (index, slot) in values.iter().enumerate() {
        if slot.is_none() {
            return MalformedKind::MissingField(FIELD_NAMES[index]).into();
        }
    }

    let tag = match parse_bit(TAG, &values) {
        Ok(bit) => bit,
        Err(kind) => return kind.into(),
    };
    let sealed = match parse_bit(SEALED, &values) {
        Ok(bit) => bit,
        Err(kind) => return kind.into(),
    };
    let permissions = match parse_narrow(PERMS, PERMS_BITS, &values) {
        Ok(value) => value,
        Err(kind) => return kind.into(),
    };
    let object_type = match parse_narrow(OBJECT_TYPE, OBJECT_TYPE_BITS, &values) {
        Ok(value) => value,
        Err(kind) => return kind.into(),
    };

    DecodeResult::Value(CapabilityValue {
        tag,
        sealed,
        permissions,
        object_type,
        base: values[BASE].unwrap_or_default(),
        length: values[LENGTH].unwrap_or_default(),
        offset: values[OFFSET].unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::decode_structured;
    use crate::decode::{DecodeResult, MalformedKind};

    const WELL_FORMED: &str = "t:1 s:0 perms:0x7fffffff type:0x000000 \
         offset:0x0000000000000010 base:0x0000000000001000 length:0x0000000000002000";

    #[test]
    fn well_formed_line_decodes_every_field() {
        let cap = decode_structured(WELL_FORMED)
            .value()
            .copied()
            .expect("well-formed line");
        assert!(cap.tag);
        assert!(!cap.sealed);
        assert_eq!(cap.permissions, 0x7FFF_FFFF);
        assert_eq!(cap.object_type, 0);
        assert_eq!(cap.offset, 0x10);
        assert_eq!(cap.base, 0x1000);
        assert_eq!(cap.length, 0x2000);
    }

    #[test]
    fn field_order_is_not_significant() {
        let shuffled = "length:0x2000 base:0x1000 offset:0x10 \
             type:0x0 perms:0x7fffffff s:0 t:1";
        assert_eq!(decode_structured(shuffled), decode_structured(WELL_FORMED));
    }

    #[test]
    fn sealed_line_carries_its_object_type() {
        let sealed = "t:1 s:1 perms:0x107 type:0xabcdef offset:0x0 base:0x0 length:0x1000";
        let cap = decode_structured(sealed)
            .value()
            .copied()
            .expect("sealed line");
        assert!(cap.sealed);
        assert_eq!(cap.object_type, 0x00AB_CDEF);
    }

    #[rstest]
    #[case(
        "t:1 s:0 perms:0x0 type:0x0 offset:0x0 base:0x0",
        MalformedKind::MissingField("length")
    )]
    #[case(
        "t:1 t:0 s:0 perms:0x0 type:0x0 offset:0x0 base:0x0 length:0x0",
        MalformedKind::DuplicateField("t")
    )]
    #[case(
        "t:1 s:0 perm:0x0 type:0x0 offset:0x0 base:0x0 length:0x0",
        MalformedKind::UnknownField("perm".into())
    )]
    #[case(
        "t:1 s:0 perms type:0x0 offset:0x0 base:0x0 length:0x0",
        MalformedKind::NotAField("perms".into())
    )]
    #[case(
        "t:1 s:0 perms:0xzz type:0x0 offset:0x0 base:0x0 length:0x0",
        MalformedKind::InvalidHex { field: "perms" }
    )]
    #[case(
        "t:2 s:0 perms:0x0 type:0x0 offset:0x0 base:0x0 length:0x0",
        MalformedKind::InvalidBit { field: "t" }
    )]
    #[case(
        "t:1 s:ff perms:0x0 type:0x0 offset:0x0 base:0x0 length:0x0",
        MalformedKind::InvalidBit { field: "s" }
    )]
    #[case(
        "t:1 s:0 perms:0x80000000 type:0x0 offset:0x0 base:0x0 length:0x0",
        MalformedKind::InvalidHex { field: "perms" }
    )]
    #[case(
        "t:1 s:0 perms:0x0 type:0x1000000 offset:0x0 base:0x0 length:0x0",
        MalformedKind::InvalidHex { field: "type" }
    )]
    fn malformed_lines_classify_precisely(#[case] text: &str, #[case] expected: MalformedKind) {
        assert_eq!(decode_structured(text), DecodeResult::Malformed(expected));
    }

    #[test]
    fn hex_prefix_is_optional() {
        let bare = "t:1 s:0 perms:7fffffff type:0 offset:10 base:1000 length:2000";
        assert_eq!(decode_structured(bare), decode_structured(WELL_FORMED));
    }
}
