//! Log artifact scanning into a queryable per-thread register bank.
//!
//! One pass over a closed simulator log classifies each line against the
//! fixed grammars, routes capability dumps to the `capdecode-core` decoders,
//! and aggregates everything by `(thread, register)` with last-write-wins
//! semantics. The result is the oracle state that assertion-based test
//! suites compare against.

/// Line grammars and classification.
pub mod grammar;
pub use grammar::{classify, CapRegister, LineKind};

/// Register bank aggregation and query surface.
pub mod bank;
pub use bank::{
    HardwareVariant, Observation, RegisterBank, RegisterIdentity, RegisterKey, RegisterValue,
    ScanError, CAPABILITY_REGISTER_COUNT, GENERAL_REGISTER_COUNT,
};

#[cfg(test)]
use tempfile as _;
