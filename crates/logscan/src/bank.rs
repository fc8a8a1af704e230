//! Per-thread register bank assembled from an interleaved log line stream.
//!
//! The bank scans one already-closed artifact line by line, routes each
//! classified line to the matching decoder, and stores results keyed by
//! `(thread, register)`. Later writes override earlier ones within a key.
//! External test code only ever reads through [`RegisterBank::get`], which
//! fails loudly for keys that were never observed.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::BufRead;

use capdecode_core::{
    decode_compressed, decode_full, decode_structured, CapabilityValue, DecodeResult,
    MalformedKind, COMPRESSED_DUMP_DIGITS, FULL_DUMP_DIGITS,
};
use log::{debug, warn};
use thiserror::Error;

use crate::grammar::{classify, CapRegister, LineKind};

/// Number of architecturally addressable general-purpose registers.
pub const GENERAL_REGISTER_COUNT: u32 = 32;
/// Number of architecturally addressable capability registers.
pub const CAPABILITY_REGISTER_COUNT: u32 = 32;

/// Which register within a thread a log line wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterIdentity {
    /// Numbered general-purpose register; index 0 always reads zero.
    GeneralPurpose(u8),
    /// The program counter.
    ProgramCounter,
    /// Numbered capability register.
    Capability(u8),
    /// The capability program counter.
    CapabilityProgramCounter,
}

impl fmt::Display for RegisterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneralPurpose(index) => write!(f, "r{index}"),
            Self::ProgramCounter => write!(f, "pc"),
            Self::Capability(index) => write!(f, "c{index}"),
            Self::CapabilityProgramCounter => write!(f, "pcc"),
        }
    }
}

/// Lookup key for one stored register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterKey {
    /// Thread or core namespace the line was observed under.
    pub thread: u32,
    /// Register the line wrote.
    pub identity: RegisterIdentity,
}

/// One stored register observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterValue {
    /// General-purpose or program-counter word.
    Word(u64),
    /// Decoded capability state.
    Capability(CapabilityValue),
    /// The dump for this key was explicitly hardware-undefined.
    Undefined,
    /// The line for this key matched a grammar but failed decoding.
    Malformed(MalformedKind),
}

impl RegisterValue {
    /// Returns the stored word if this entry is one.
    #[must_use]
    pub const fn word(&self) -> Option<u64> {
        match self {
            Self::Word(value) => Some(*value),
            Self::Capability(_) | Self::Undefined | Self::Malformed(_) => None,
        }
    }

    /// Returns the stored capability if this entry is one.
    #[must_use]
    pub const fn capability(&self) -> Option<&CapabilityValue> {
        match self {
            Self::Capability(cap) => Some(cap),
            Self::Word(_) | Self::Undefined | Self::Malformed(_) => None,
        }
    }
}

impl From<DecodeResult> for RegisterValue {
    fn from(result: DecodeResult) -> Self {
        match result {
            DecodeResult::Value(cap) => Self::Capability(cap),
            DecodeResult::Undefined => Self::Undefined,
            DecodeResult::Malformed(kind) => Self::Malformed(kind),
        }
    }
}

/// Capability dump width of the producing hardware variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareVariant {
    /// Compressed 128-bit capability registers.
    Cap128,
    /// Full-precision 256-bit capability registers.
    Cap256,
}

impl HardwareVariant {
    /// Digit count (tag included) of this variant's binary dumps.
    #[must_use]
    pub const fn dump_digits(self) -> usize {
        match self {
            Self::Cap128 => COMPRESSED_DUMP_DIGITS,
            Self::Cap256 => FULL_DUMP_DIGITS,
        }
    }
}

/// Faults surfaced by the scan and query boundary.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A queried key was never written during the parse pass.
    #[error("register {identity} of thread {thread} was never observed")]
    MissingRegister {
        /// Thread namespace of the missing key.
        thread: u32,
        /// Register of the missing key.
        identity: RegisterIdentity,
    },
    /// A thread finished the scan without any program-counter line.
    #[error("no program counter was observed for thread {thread}")]
    MissingProgramCounter {
        /// Thread that lacks a program counter.
        thread: u32,
    },
    /// A well-formed dump of the wrong width for the configured variant.
    #[error("{found}-digit capability dump in a log configured for {expected}-digit dumps")]
    FormatMismatch {
        /// Digit count the configured variant requires.
        expected: usize,
        /// Digit count the line carried.
        found: usize,
    },
    /// The log artifact could not be read.
    #[error("failed to read log artifact")]
    Io(#[from] std::io::Error),
}

/// What `observe` did with one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The line decoded (or failed decoding) and was stored under this key.
    Recorded(RegisterKey),
    /// The line switched the current thread namespace.
    ThreadSwitch(u32),
    /// The line matched no grammar and was skipped.
    Ignored,
}

/// Queryable snapshot of every observed thread's register file.
#[derive(Debug)]
pub struct RegisterBank {
    variant: HardwareVariant,
    registers: HashMap<RegisterKey, RegisterValue>,
    threads: BTreeSet<u32>,
    current_thread: u32,
}

impl RegisterBank {
    /// Creates an empty bank for one hardware variant.
    ///
    /// Lines observed before any core marker belong to thread 0.
    #[must_use]
    pub fn new(variant: HardwareVariant) -> Self {
        Self {
            variant,
            registers: HashMap::new(),
            threads: BTreeSet::new(),
            current_thread: 0,
        }
    }

    /// The hardware variant this bank expects binary dumps from.
    #[must_use]
    pub const fn variant(&self) -> HardwareVariant {
        self.variant
    }

    /// Thread namespaces observed so far, ascending.
    pub fn threads(&self) -> impl Iterator<Item = u32> + '_ {
        self.threads.iter().copied()
    }

    /// Classifies, decodes, and stores one log line.
    ///
    /// Unmatched lines are skipped, never fatal. Lines that match a grammar
    /// but fail decoding are recorded as [`RegisterValue::Malformed`] or
    /// [`RegisterValue::Undefined`] for their key rather than dropped.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::FormatMismatch` for a well-formed binary dump of
    /// the wrong width for the configured hardware variant.
    pub fn observe(&mut self, line: &str) -> Result<Observation, ScanError> {
        let line = line.trim_end();
        let Some(kind) = classify(line) else {
            debug!("skipping unclassified line {line:?}");
            return Ok(Observation::Ignored);
        };

        match kind {
            LineKind::CoreMarker(thread) => {
                self.current_thread = thread;
                self.threads.insert(thread);
                Ok(Observation::ThreadSwitch(thread))
            }
            LineKind::GeneralPurpose { index, value } => {
                if index >= GENERAL_REGISTER_COUNT {
                    warn!("ignoring out-of-range general register index {index}");
                    return Ok(Observation::Ignored);
                }
                Ok(self.store(
                    RegisterIdentity::GeneralPurpose(truncate_index(index)),
                    RegisterValue::Word(value),
                ))
            }
            LineKind::ProgramCounter(value) => Ok(self.store(
                RegisterIdentity::ProgramCounter,
                RegisterValue::Word(value),
            )),
            LineKind::StructuredCapability { register, fields } => {
                let Some(identity) = capability_identity(register) else {
                    warn!("ignoring out-of-range capability register {register:?}");
                    return Ok(Observation::Ignored);
                };
                Ok(self.store(identity, decode_structured(fields).into()))
            }
            LineKind::BinaryCapability { register, digits } => {
                let Some(identity) = capability_identity(register) else {
                    warn!("ignoring out-of-range capability register {register:?}");
                    return Ok(Observation::Ignored);
                };
                let result = self.decode_binary(digits)?;
                Ok(self.store(identity, result.into()))
            }
        }
    }

    /// Routes a binary dump by digit count, enforcing the configured width.
    fn decode_binary(&self, digits: &str) -> Result<DecodeResult, ScanError> {
        let expected = self.variant.dump_digits();
        if digits.len() == expected {
            return Ok(match self.variant {
                HardwareVariant::Cap128 => decode_compressed(digits),
                HardwareVariant::Cap256 => decode_full(digits),
            });
        }
        if digits.len() == COMPRESSED_DUMP_DIGITS || digits.len() == FULL_DUMP_DIGITS {
            return Err(ScanError::FormatMismatch {
                expected,
                found: digits.len(),
            });
        }
        Ok(DecodeResult::Malformed(MalformedKind::WrongWidth {
            expected,
            actual: digits.len(),
        }))
    }

    fn store(&mut self, identity: RegisterIdentity, value: RegisterValue) -> Observation {
        if let RegisterValue::Malformed(kind) = &value {
            warn!(
                "thread {} register {identity}: malformed line ({kind})",
                self.current_thread
            );
        }
        let key = RegisterKey {
            thread: self.current_thread,
            identity,
        };
        self.threads.insert(self.current_thread);
        self.registers.insert(key, value);
        Observation::Recorded(key)
    }

    /// Seals the scan: forces the architectural zero register and validates
    /// that every observed thread logged a program counter.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::MissingProgramCounter` for the lowest-numbered
    /// thread without one.
    pub fn finish(&mut self) -> Result<(), ScanError> {
        let threads: Vec<u32> = self.threads.iter().copied().collect();
        for thread in threads {
            self.registers.insert(
                RegisterKey {
                    thread,
                    identity: RegisterIdentity::GeneralPurpose(0),
                },
                RegisterValue::Word(0),
            );
            let pc = RegisterKey {
                thread,
                identity: RegisterIdentity::ProgramCounter,
            };
            if !self.registers.contains_key(&pc) {
                return Err(ScanError::MissingProgramCounter { thread });
            }
        }
        Ok(())
    }

    /// Returns the stored value for one key.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::MissingRegister` when the key was never observed;
    /// no value is ever defaulted silently.
    pub fn get(
        &self,
        thread: u32,
        identity: RegisterIdentity,
    ) -> Result<&RegisterValue, ScanError> {
        self.registers
            .get(&RegisterKey { thread, identity })
            .ok_or(ScanError::MissingRegister { thread, identity })
    }

    /// Scans an in-memory sequence of lines and seals the bank.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal `observe` fault or `finish` validation
    /// failure.
    pub fn scan_lines<'a>(
        variant: HardwareVariant,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ScanError> {
        let mut bank = Self::new(variant);
        for line in lines {
            bank.observe(line)?;
        }
        bank.finish()?;
        Ok(bank)
    }

    /// Scans a whole artifact from a buffered reader and seals the bank.
    ///
    /// # Errors
    ///
    /// Propagates read failures as `ScanError::Io` in addition to the
    /// `scan_lines` faults.
    pub fn scan_reader(
        variant: HardwareVariant,
        reader: impl BufRead,
    ) -> Result<Self, ScanError> {
        let mut bank = Self::new(variant);
        for line in reader.lines() {
            bank.observe(&line?)?;
        }
        bank.finish()?;
        Ok(bank)
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn truncate_index(index: u32) -> u8 {
    (index & 0xFF) as u8
}

const fn capability_identity(register: CapRegister) -> Option<RegisterIdentity> {
    match register {
        CapRegister::ProgramCounter => Some(RegisterIdentity::CapabilityProgramCounter),
        CapRegister::Index(index) if index < CAPABILITY_REGISTER_COUNT => {
            Some(RegisterIdentity::Capability(truncate_index(index)))
        }
        CapRegister::Index(_) => None,
    }
}
