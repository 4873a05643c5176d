//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm. The orchestrator owns the single stream and
//! threads it through every agent step by `&mut`.
//! CRITICAL: All randomness in the simulator MUST go through this module.

mod xorshift;

pub use xorshift::RngManager;
