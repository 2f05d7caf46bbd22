//! Hash and comparison helpers
//!
//! Thin wrappers over `bitcoin::hashes` returning plain byte arrays, plus a
//! constant-time byte comparison for address fingerprints.

use bitcoin::hashes::{hash160, sha256d, Hash};
use subtle::ConstantTimeEq;

/// Double SHA-256
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(data).to_byte_array()
}

/// RIPEMD-160 of SHA-256
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// Compare two byte strings without an early exit on the first mismatch.
/// Slices of different lengths are never equal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    bool::from(a.ct_eq(b))
}
