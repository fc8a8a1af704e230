//! Line grammars and classification for simulator log artifacts.
//!
//! Each producing back-end tags register writes with a fixed `DEBUG` marker
//! vocabulary. The patterns are process-wide immutable compiled constants;
//! classification is a pure function from one line to its kind, with no
//! state carried between lines.

use std::sync::LazyLock;

use regex::Regex;

static CORE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DEBUG CORE (\d+)$").expect("hand-checked pattern"));

static GENERAL_REGISTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DEBUG REG (\d+) 0x([0-9a-fA-F]{16})$").expect("hand-checked pattern")
});

static PROGRAM_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DEBUG PC 0x([0-9a-fA-F]{16})$").expect("hand-checked pattern"));

static BINARY_CAPABILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DEBUG CAP RAW (\d+|PCC) 0b([01u]+)$").expect("hand-checked pattern")
});

static STRUCTURED_CAPABILITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DEBUG CAP (\d+|PCC) (\S.*)$").expect("hand-checked pattern"));

/// Which capability register a line names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapRegister {
    /// Numbered capability register.
    Index(u32),
    /// The capability program counter (`PCC`).
    ProgramCounter,
}

/// A classified log line, borrowing its payload from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Marker shifting subsequent lines into another thread namespace.
    CoreMarker(u32),
    /// General-purpose register write.
    GeneralPurpose {
        /// Register index as written, unbounded.
        index: u32,
        /// 64-bit register value.
        value: u64,
    },
    /// Program-counter write.
    ProgramCounter(u64),
    /// Structured named-field capability line; `fields` is the labelled blob.
    StructuredCapability {
        /// Register the line names.
        register: CapRegister,
        /// Unparsed `name:value` field text.
        fields: &'a str,
    },
    /// Binary capability dump; `digits` is the `{0,1,u}` string.
    BinaryCapability {
        /// Register the line names.
        register: CapRegister,
        /// Unparsed digit string, tag first.
        digits: &'a str,
    },
}

fn parse_cap_register(text: &str) -> Option<CapRegister> {
    if text == "PCC" {
        Some(CapRegister::ProgramCounter)
    } else {
        text.parse().ok().map(CapRegister::Index)
    }
}

/// Classifies one log line against the fixed grammars.
///
/// Returns `None` for lines matching no grammar (the caller skips them) and
/// for index fields too large to represent, which no back-end emits.
#[must_use]
pub fn classify(line: &str) -> Option<LineKind<'_>> {
    if let Some(caps) = CORE_MARKER.captures(line) {
        return caps[1].parse().ok().map(LineKind::CoreMarker);
    }

    if let Some(caps) = GENERAL_REGISTER.captures(line) {
        let index = caps[1].parse().ok()?;
        let value = u64::from_str_radix(&caps[2], 16).ok()?;
        return Some(LineKind::GeneralPurpose { index, value });
    }

    if let Some(caps) = PROGRAM_COUNTER.captures(line) {
        let value = u64::from_str_radix(&caps[1], 16).ok()?;
        return Some(LineKind::ProgramCounter(value));
    }

    if let Some(caps) = BINARY_CAPABILITY.captures(line) {
        let register = parse_cap_register(caps.get(1).map_or("", |m| m.as_str()))?;
        let digits = caps.get(2).map_or("", |m| m.as_str());
        return Some(LineKind::BinaryCapability { register, digits });
    }

    if let Some(caps) = STRUCTURED_CAPABILITY.captures(line) {
        let register = parse_cap_register(caps.get(1).map_or("", |m| m.as_str()))?;
        let fields = caps.get(2).map_or("", |m| m.as_str());
        return Some(LineKind::StructuredCapability { register, fields });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{classify, CapRegister, LineKind};

    #[test]
    fn core_marker_extracts_the_thread_id() {
        assert_eq!(classify("DEBUG CORE 3"), Some(LineKind::CoreMarker(3)));
        assert_eq!(classify("DEBUG CORE 0"), Some(LineKind::CoreMarker(0)));
    }

    #[test]
    fn general_register_extracts_index_and_value() {
        assert_eq!(
            classify("DEBUG REG 5 0x00000000deadbeef"),
            Some(LineKind::GeneralPurpose {
                index: 5,
                value: 0x0000_0000_DEAD_BEEF,
            })
        );
    }

    #[test]
    fn program_counter_extracts_the_value() {
        assert_eq!(
            classify("DEBUG PC 0x9000000040000000"),
            Some(LineKind::ProgramCounter(0x9000_0000_4000_0000))
        );
    }

    #[test]
    fn structured_capability_carries_the_field_blob() {
        let line = "DEBUG CAP 12 t:1 s:0 perms:0x7ffff";
        assert_eq!(
            classify(line),
            Some(LineKind::StructuredCapability {
                register: CapRegister::Index(12),
                fields: "t:1 s:0 perms:0x7ffff",
            })
        );
    }

    #[test]
    fn capability_program_counter_is_recognised_in_both_forms() {
        assert!(matches!(
            classify("DEBUG CAP PCC t:1 s:0"),
            Some(LineKind::StructuredCapability {
                register: CapRegister::ProgramCounter,
                ..
            })
        ));
        assert!(matches!(
            classify("DEBUG CAP RAW PCC 0b101"),
            Some(LineKind::BinaryCapability {
                register: CapRegister::ProgramCounter,
                ..
            })
        ));
    }

    #[test]
    fn binary_capability_is_not_mistaken_for_structured() {
        let line = "DEBUG CAP RAW 7 0b10u";
        assert_eq!(
            classify(line),
            Some(LineKind::BinaryCapability {
                register: CapRegister::Index(7),
                digits: "10u",
            })
        );
    }

    #[test]
    fn near_misses_match_no_grammar() {
        for line in [
            "",
            "debug core 1",
            "DEBUG CORE",
            "DEBUG REG 5 0xdeadbeef",
            "DEBUG REG 5 00000000deadbeef",
            "DEBUG PC 0x00000000deadbee",
            "DEBUG CAP RAW 7 0b10x",
            "DEBUG CAP RAW 0b101",
            "DEBUG TLB 0 0x0000000000000000",
            "cycle count: 1234",
        ] {
            assert_eq!(classify(line), None, "line {line:?}");
        }
    }

    #[test]
    fn oversized_indices_are_unclassifiable() {
        assert_eq!(classify("DEBUG CORE 99999999999999999999"), None);
        assert_eq!(
            classify("DEBUG REG 99999999999999999999 0x0000000000000000"),
            None
        );
    }
}
