//! Decoder for compressed 128-bit binary capability dumps.
//!
//! The compressed representation trades bounds precision for a fixed 128-bit
//! register width: the bottom and top bounds are stored as 20-bit windows
//! positioned by a shared exponent, and the absolute values must be
//! reconstructed relative to the pointer. Every downstream pass/fail verdict
//! depends on this reconstruction matching the hardware bit for bit.

use std::ops::Range;

use crate::bits::TaggedPayload;
use crate::cap::{widen_permissions, CapabilityValue};
use crate::decode::DecodeResult;

/// Payload width of the compressed dump, tag excluded.
pub const COMPRESSED_PAYLOAD_BITS: usize = 128;
/// Total digit count of a compressed dump string, tag included.
pub const COMPRESSED_DUMP_DIGITS: usize = COMPRESSED_PAYLOAD_BITS + 1;

// Architectural payload layout, most-significant bit first.
const PERMS: Range<usize> = 0..15;
const EXPONENT: Range<usize> = 17..23;
const SEALED_BIT: usize = 23;
const BOTTOM: Range<usize> = 24..44;
const TOP: Range<usize> = 44..64;
const POINTER: Range<usize> = 64..128;

/// The hardware stores the exponent XOR-biased by this constant.
const EXPONENT_XOR: u64 = 48;
/// Effective exponents saturate here; larger unbiased values clamp to 45.
const EXPONENT_SATURATE: u64 = 45;
/// Width of the compressed bound fields.
const BOUND_BITS: u64 = 20;
const BOUND_MASK: u64 = (1 << BOUND_BITS) - 1;
/// Half of the object type is packed into the low bits of each bound field.
const OTYPE_HALF_BITS: u32 = 12;
const OTYPE_HALF_MASK: u32 = (1 << OTYPE_HALF_BITS) - 1;
/// Bound bits that survive sealing.
const SEALED_BOUND_MASK: u64 = 0xF_F000;
/// Distance below the bottom bound at which the representable region wraps.
const REPRESENTABLE_GUARD: u64 = 4096;

const LOW_64: u128 = (1 << 64) - 1;
const LOW_65: u128 = (1 << 65) - 1;

/// Decodes a 129-digit compressed dump string.
///
/// Any `u` digit makes the whole value `DecodeResult::Undefined`. Otherwise
/// the bounds are reconstructed per the hardware algorithm: exponent unbias
/// and saturation, sealed object-type extraction, representable-region
/// correction of the pointer's upper bits, and length clamping.
#[must_use]
pub fn decode_compressed(digits: &str) -> DecodeResult {
    let payload = match TaggedPayload::parse(digits, COMPRESSED_PAYLOAD_BITS) {
        Ok(payload) => payload,
        Err(kind) => return kind.into(),
    };

    if payload.has_undefined() {
        return DecodeResult::Undefined;
    }

    let sealed = payload.bit(SEALED_BIT);
    let mut bottom = payload.field(BOTTOM);
    let mut top = payload.field(TOP);
    let pointer = payload.field(POINTER);
    let exponent = effective_exponent(payload.field(EXPONENT));

    let object_type = if sealed {
        let bottom_half = payload.field_u32(BOTTOM) & OTYPE_HALF_MASK;
        let top_half = payload.field_u32(TOP) & OTYPE_HALF_MASK;
        bottom &= SEALED_BOUND_MASK;
        top &= SEALED_BOUND_MASK;
        (bottom_half << OTYPE_HALF_BITS) | top_half
    } else {
        0
    };

    let bounds = reconstruct_bounds(bottom, top, exponent, pointer);

    DecodeResult::Value(CapabilityValue {
        tag: payload.tag(),
        sealed,
        permissions: widen_permissions(payload.field_u32(PERMS)),
        object_type,
        base: bounds.base,
        length: bounds.length,
        offset: bounds.offset,
    })
}

/// Applies the hardware exponent unbias and saturation.
///
/// Skipping the saturation silently corrupts the bounds of very large
/// capabilities without any decode failure, so it is applied here exactly
/// and covered by dedicated tests.
const fn effective_exponent(raw: u64) -> u64 {
    let unbiased = raw ^ EXPONENT_XOR;
    if unbiased > EXPONENT_SATURATE {
        EXPONENT_SATURATE
    } else {
        unbiased
    }
}

/// Absolute bounds recovered from the compressed fields.
struct ReconstructedBounds {
    base: u64,
    length: u64,
    offset: u64,
}

/// Region-crossing correction for one bound field.
///
/// Zero when the pointer window and the field sit on the same side of the
/// representable-region boundary, otherwise one step toward the field's side.
const fn correction(middle: u64, region: u64, field: u64) -> i64 {
    if (middle < region) == (field < region) {
        0
    } else if middle < region {
        -1
    } else {
        1
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn low64(value: u128) -> u64 {
    (value & LOW_64) as u64
}

/// Rebuilds absolute base/top from the 20-bit bound windows.
///
/// `base` is truncated to 64 bits and `top` to 65: `top - base` can formally
/// exceed `u64::MAX` by one representable unit, which the length clamp
/// absorbs rather than wrapping.
fn reconstruct_bounds(bottom: u64, top: u64, exponent: u64, pointer: u64) -> ReconstructedBounds {
    let region = bottom.wrapping_sub(REPRESENTABLE_GUARD) & BOUND_MASK;
    let middle = (pointer >> exponent) & BOUND_MASK;
    let upper = low64(u128::from(pointer) >> (BOUND_BITS + exponent));
    let shift = BOUND_BITS + exponent;

    let upper_bottom = upper.wrapping_add_signed(correction(middle, region, bottom));
    let upper_top = upper.wrapping_add_signed(correction(middle, region, top));

    let base128 =
        ((u128::from(bottom) << exponent) | (u128::from(upper_bottom) << shift)) & LOW_64;
    let top128 = ((u128::from(top) << exponent) | (u128::from(upper_top) << shift)) & LOW_65;

    let base = low64(base128);
    let length = u64::try_from(top128.wrapping_sub(base128) & LOW_65).unwrap_or(u64::MAX);

    ReconstructedBounds {
        base,
        length,
        offset: pointer.wrapping_sub(base),
    }
}
