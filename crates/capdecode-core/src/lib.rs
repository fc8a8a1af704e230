//! Capability register state decoding for simulator log dumps.
//!
//! Simulator back-ends describe the same capability register in three wire
//! forms: labelled hex fields, a full-precision 256-bit binary dump, and a
//! compressed 128-bit binary dump whose bounds must be reconstructed. Each
//! decoder here is a pure function from text to [`DecodeResult`] so that the
//! log-scanning layer can route lines without caring which back-end produced
//! them.

/// Canonical capability data model and permission widening.
pub mod cap;
pub use cap::{
    widen_permissions, CapabilityValue, PERMS_COMPRESSED_WIDTH, PERMS_FULL_WIDTH,
    PERM_ACCESS_SYSTEM_REGISTERS,
};

/// Binary digit-string validation and bit-field slicing.
pub mod bits;
pub use bits::TaggedPayload;

/// Decode result and malformed-input taxonomy.
pub mod decode;
pub use decode::{DecodeResult, MalformedKind};

/// Structured named-field line decoder.
pub mod structured;
pub use structured::decode_structured;

/// Full-precision 256-bit dump decoder.
pub mod full;
pub use full::{decode_full, FULL_DUMP_DIGITS, FULL_PAYLOAD_BITS};

/// Compressed 128-bit dump decoder with bounds reconstruction.
pub mod compressed;
pub use compressed::{decode_compressed, COMPRESSED_DUMP_DIGITS, COMPRESSED_PAYLOAD_BITS};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
