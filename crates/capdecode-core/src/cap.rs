//! Canonical decoded capability representation and permission widening.

/// Width of the canonical (full-precision) permission bitset.
pub const PERMS_FULL_WIDTH: u32 = 31;
/// Width of the permission field carried by the compressed format.
pub const PERMS_COMPRESSED_WIDTH: u32 = 15;
/// The access-system-registers permission bit within the hardware group.
pub const PERM_ACCESS_SYSTEM_REGISTERS: u32 = 1 << 10;

/// Hardware permission group of the compressed field (bits 10..=0).
const COMPRESSED_HW_MASK: u32 = 0x07FF;
/// User permission nibble of the compressed field (bits 14..=11).
const COMPRESSED_USER_SHIFT: u32 = 11;
const COMPRESSED_USER_MASK: u32 = 0xF;
/// Reserved hardware positions of the canonical bitset (bits 14..=11).
const CANONICAL_RESERVED_MASK: u32 = 0xF << 11;
/// User permission group of the canonical bitset starts at bit 15.
const CANONICAL_USER_SHIFT: u32 = 15;

/// Widens a compressed 15-bit permission field to the canonical 31-bit form.
///
/// The 11 hardware bits are kept in place, the access-system-registers bit is
/// replicated into the reserved hardware positions 11..=14, and the 4 user
/// bits are relocated to canonical positions 15..=18. Widened and
/// full-precision permission words are therefore directly comparable.
#[must_use]
pub const fn widen_permissions(raw: u32) -> u32 {
    let hardware = raw & COMPRESSED_HW_MASK;
    let user = (raw >> COMPRESSED_USER_SHIFT) & COMPRESSED_USER_MASK;
    let replicated = if hardware & PERM_ACCESS_SYSTEM_REGISTERS == 0 {
        0
    } else {
        CANONICAL_RESERVED_MASK
    };
    hardware | replicated | (user << CANONICAL_USER_SHIFT)
}

/// One capability register's decoded state.
///
/// An untagged capability's fields are still defined but carry no authority.
/// `length` is the 65-bit `top - base` clamped (never wrapped) to `u64::MAX`;
/// `base + offset` is the address the capability currently designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CapabilityValue {
    /// Validity bit.
    pub tag: bool,
    /// Whether the capability is sealed to an object type.
    pub sealed: bool,
    /// Canonical-width permission bitset.
    pub permissions: u32,
    /// Object type; meaningful only when sealed, zero otherwise.
    pub object_type: u32,
    /// Lower bound of the authorised region.
    pub base: u64,
    /// Size of the authorised region, clamped to `u64::MAX`.
    pub length: u64,
    /// Cursor position relative to `base`.
    pub offset: u64,
}

impl CapabilityValue {
    /// Returns the absolute address the capability designates.
    #[must_use]
    pub const fn address(&self) -> u64 {
        self.base.wrapping_add(self.offset)
    }
}
