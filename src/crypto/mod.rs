//! Cryptographic primitives
//!
//! The secp256k1 recovery engine consumed by the signed-message code.

pub mod recovery;

pub use recovery::{RecoveryEngine, Secp256k1Engine};
