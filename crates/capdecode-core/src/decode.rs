//! Decode result and malformed-input taxonomy shared by the three decoders.

use thiserror::Error;

use crate::cap::CapabilityValue;

/// Why a line that matched a known grammar still failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedKind {
    /// Digit string is not the expected width for its format.
    #[error("dump is {actual} digits, expected {expected}")]
    WrongWidth {
        /// Digit count the format requires, tag included.
        expected: usize,
        /// Digit count actually present.
        actual: usize,
    },
    /// A digit outside `{0, 1, u}` appeared in a binary dump.
    #[error("digit at position {position} is not 0, 1, or u")]
    InvalidDigit {
        /// Zero-based offset of the offending character.
        position: usize,
    },
    /// A required named field was absent from a structured line.
    #[error("missing field {0}")]
    MissingField(&'static str),
    /// A named field appeared more than once on a structured line.
    #[error("duplicate field {0}")]
    DuplicateField(&'static str),
    /// A structured line carried a field name outside the fixed set.
    #[error("unknown field {0}")]
    UnknownField(String),
    /// A token on a structured line was not of the form `name:value`.
    #[error("token {0:?} is not a name:value field")]
    NotAField(String),
    /// A field value failed radix-16 parsing or exceeded its width.
    #[error("field {field} is not valid hex for its width")]
    InvalidHex {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A single-bit field held something other than 0 or 1.
    #[error("field {field} must be 0 or 1")]
    InvalidBit {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Result of decoding one capability dump.
///
/// Explicitly-undefined hardware output is a distinct non-value: it must
/// never collapse into a zeroed capability or be mistaken for a parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// Successfully decoded capability state.
    Value(CapabilityValue),
    /// The dump contained at least one hardware-undefined digit.
    Undefined,
    /// The text matched a known grammar but failed decoding.
    Malformed(MalformedKind),
}

impl DecodeResult {
    /// Returns the decoded capability if present.
    #[must_use]
    pub const fn value(&self) -> Option<&CapabilityValue> {
        match self {
            Self::Value(cap) => Some(cap),
            Self::Undefined | Self::Malformed(_) => None,
        }
    }

    /// Returns `true` when the dump was explicitly hardware-undefined.
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns the malformed-input classification if decoding failed.
    #[must_use]
    pub const fn malformed(&self) -> Option<&MalformedKind> {
        match self {
            Self::Malformed(kind) => Some(kind),
            Self::Value(_) | Self::Undefined => None,
        }
    }
}

impl From<MalformedKind> for DecodeResult {
    fn from(kind: MalformedKind) -> Self {
        Self::Malformed(kind)
    }
}

/// `Ok(Some)` for a value, `Ok(None)` for undefined, `Err` for malformed.
impl From<DecodeResult> for Result<Option<CapabilityValue>, MalformedKind> {
    fn from(result: DecodeResult) -> Self {
        match result {
            DecodeResult::Value(cap) => Ok(Some(cap)),
            DecodeResult::Undefined => Ok(None),
            DecodeResult::Malformed(kind) => Err(kind),
        }
    }
}
