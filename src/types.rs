//! Shared types for signed messages
//!
//! Data structures that cross module boundaries: raw ECDSA scalars, the
//! recovery id, and the address families a signature can advertise.

use crate::error::{MessageError, RecoveryError};
use secp256k1::constants::CURVE_ORDER;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Signature Types
// =============================================================================

/// An ECDSA signature as two 32-byte big-endian scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl RawSignature {
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Self { r, s }
    }

    /// Split a 64-byte `r || s` buffer
    pub fn from_compact(bytes: &[u8; 64]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self { r, s }
    }

    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    /// Check that both scalars lie in the open interval (0, n).
    ///
    /// Big-endian arrays of equal width order the same way as the integers
    /// they encode, so a lexicographic comparison against the curve order is
    /// a numeric one.
    pub fn validate(&self) -> Result<(), RecoveryError> {
        if !in_scalar_range(&self.r) {
            return Err(RecoveryError::InvalidR);
        }
        if !in_scalar_range(&self.s) {
            return Err(RecoveryError::InvalidS);
        }
        Ok(())
    }
}

fn in_scalar_range(value: &[u8; 32]) -> bool {
    value.iter().any(|b| *b != 0) && *value < CURVE_ORDER
}

impl fmt::Display for RawSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", hex::encode(self.r), hex::encode(self.s))
    }
}

/// Public-key recovery id (0..=3)
///
/// Bit 0 selects an odd y-coordinate, bit 1 selects the `x = r + n`
/// candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecoveryId(u8);

impl RecoveryId {
    pub const ALL: [RecoveryId; 4] = [RecoveryId(0), RecoveryId(1), RecoveryId(2), RecoveryId(3)];

    pub fn new(id: u8) -> Option<Self> {
        (id <= 3).then_some(Self(id))
    }

    pub fn to_u8(self) -> u8 {
        self.0
    }

    pub fn is_y_odd(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn is_second_key(self) -> bool {
        self.0 & 2 == 2
    }
}

impl TryFrom<u8> for RecoveryId {
    type Error = RecoveryError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        RecoveryId::new(id).ok_or_else(|| {
            RecoveryError::PointNotRecoverable(format!("recovery id {} out of range", id))
        })
    }
}

impl From<RecoveryId> for u8 {
    fn from(id: RecoveryId) -> u8 {
        id.0
    }
}

/// A signature together with the id that recovers its public key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSig {
    pub signature: RawSignature,
    pub recovery_id: RecoveryId,
}

// =============================================================================
// Address Families
// =============================================================================

/// Segwit address hint carried in the flag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegwitType {
    /// P2WPKH wrapped in P2SH (base58, `3...` on mainnet)
    #[serde(rename = "p2sh(p2wpkh)")]
    P2shP2wpkh,
    /// Native segwit v0 (bech32, `bc1q...` on mainnet)
    #[serde(rename = "p2wpkh")]
    P2wpkh,
}

impl SegwitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegwitType::P2shP2wpkh => "p2sh(p2wpkh)",
            SegwitType::P2wpkh => "p2wpkh",
        }
    }
}

impl fmt::Display for SegwitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegwitType {
    type Err = MessageError;

    /// Parse the textual literal, ignoring ASCII case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p2sh(p2wpkh)" => Ok(SegwitType::P2shP2wpkh),
            "p2wpkh" => Ok(SegwitType::P2wpkh),
            _ => Err(MessageError::UnrecognizedSegwitType(s.to_string())),
        }
    }
}

/// Address encodings a public key can be matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressKind {
    P2pkh,
    P2shP2wpkh,
    P2wpkh,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::P2pkh => "p2pkh",
            AddressKind::P2shP2wpkh => "p2sh-p2wpkh",
            AddressKind::P2wpkh => "p2wpkh",
        }
    }

    pub fn requires_compressed(&self) -> bool {
        !matches!(self, AddressKind::P2pkh)
    }

    /// The flag-byte hint that advertises this family
    pub fn segwit_type(&self) -> Option<SegwitType> {
        match self {
            AddressKind::P2pkh => None,
            AddressKind::P2shP2wpkh => Some(SegwitType::P2shP2wpkh),
            AddressKind::P2wpkh => Some(SegwitType::P2wpkh),
        }
    }
}

impl From<Option<SegwitType>> for AddressKind {
    fn from(segwit: Option<SegwitType>) -> Self {
        match segwit {
            None => AddressKind::P2pkh,
            Some(SegwitType::P2shP2wpkh) => AddressKind::P2shP2wpkh,
            Some(SegwitType::P2wpkh) => AddressKind::P2wpkh,
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
