//! Compact Signature Codec
//!
//! Wire format: `flag_byte || r (32 bytes BE) || s (32 bytes BE)`, 65 bytes.
//!
//! `flag = flag_byte - 27`:
//! - bits 0-1: recovery id
//! - bit 2: compressed key (legacy), or native segwit when bit 3 is set
//! - bit 3: segwit hint present
//!
//! | flag  | meaning                     |
//! |-------|-----------------------------|
//! | 0-3   | P2PKH, uncompressed key     |
//! | 4-7   | P2PKH, compressed key       |
//! | 8-11  | P2SH-P2WPKH                 |
//! | 12-15 | P2WPKH                      |

use crate::error::{MessageError, MessageResult};
use crate::types::{AddressKind, RawSignature, RecoverableSig, RecoveryId, SegwitType};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encoded signature length
pub const COMPACT_SIGNATURE_LEN: usize = 65;

const FLAG_BASE: u8 = 27;
const FLAG_COMPRESSED: u8 = 4;
const FLAG_SEGWIT: u8 = 8;
const FLAG_MAX: u8 = 15;

/// Decoded view of a 65-byte compact signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactSignature {
    pub recovery_id: RecoveryId,
    pub compressed: bool,
    pub segwit_type: Option<SegwitType>,
    pub signature: RawSignature,
}

impl CompactSignature {
    /// Segwit-flagged signatures always describe a compressed key.
    pub fn new(
        sig: RecoverableSig,
        compressed: bool,
        segwit_type: Option<SegwitType>,
    ) -> Self {
        Self {
            recovery_id: sig.recovery_id,
            compressed: compressed || segwit_type.is_some(),
            segwit_type,
            signature: sig.signature,
        }
    }

    /// The leading byte of the wire format
    pub fn flag_byte(&self) -> u8 {
        let mut flag = self.recovery_id.to_u8();
        match self.segwit_type {
            Some(segwit) => {
                flag += FLAG_SEGWIT;
                if segwit == SegwitType::P2wpkh {
                    flag += FLAG_COMPRESSED;
                }
            }
            None => {
                if self.compressed {
                    flag += FLAG_COMPRESSED;
                }
            }
        }
        flag + FLAG_BASE
    }

    pub fn encode(&self) -> [u8; COMPACT_SIGNATURE_LEN] {
        let mut out = [0u8; COMPACT_SIGNATURE_LEN];
        out[0] = self.flag_byte();
        out[1..33].copy_from_slice(&self.signature.r);
        out[33..].copy_from_slice(&self.signature.s);
        out
    }

    pub fn decode(bytes: &[u8]) -> MessageResult<Self> {
        if bytes.len() != COMPACT_SIGNATURE_LEN {
            return Err(MessageError::InvalidSignatureLength(bytes.len()));
        }

        let flag_byte = bytes[0];
        let flag = match flag_byte.checked_sub(FLAG_BASE) {
            Some(flag) if flag <= FLAG_MAX => flag,
            _ => return Err(MessageError::InvalidSignatureParameter(flag_byte)),
        };

        let segwit_type = if flag & FLAG_SEGWIT == 0 {
            None
        } else if flag & FLAG_COMPRESSED == 0 {
            Some(SegwitType::P2shP2wpkh)
        } else {
            Some(SegwitType::P2wpkh)
        };

        let recovery_id = RecoveryId::new(flag & 3)
            .ok_or(MessageError::InvalidSignatureParameter(flag_byte))?;

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[1..33]);
        s.copy_from_slice(&bytes[33..]);

        Ok(Self {
            recovery_id,
            compressed: flag & (FLAG_COMPRESSED | FLAG_SEGWIT) != 0,
            segwit_type,
            signature: RawSignature { r, s },
        })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.encode())
    }

    pub fn from_base64(text: &str) -> MessageResult<Self> {
        let bytes = STANDARD.decode(text.trim())?;
        Self::decode(&bytes)
    }

    /// The address family this signature advertises
    pub fn address_kind(&self) -> AddressKind {
        AddressKind::from(self.segwit_type)
    }
}

/// A signature as received from a caller: raw bytes or base64 text
#[derive(Debug, Clone, Copy)]
pub enum SignatureInput<'a> {
    Bytes(&'a [u8]),
    Base64(&'a str),
}

impl SignatureInput<'_> {
    pub fn decode(self) -> MessageResult<CompactSignature> {
        match self {
            SignatureInput::Bytes(bytes) => CompactSignature::decode(bytes),
            SignatureInput::Base64(text) => CompactSignature::from_base64(text),
        }
    }
}

impl<'a> From<&'a [u8]> for SignatureInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        SignatureInput::Bytes(bytes)
    }
}

impl<'a> From<&'a [u8; COMPACT_SIGNATURE_LEN]> for SignatureInput<'a> {
    fn from(bytes: &'a [u8; COMPACT_SIGNATURE_LEN]) -> Self {
        SignatureInput::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for SignatureInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        SignatureInput::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for SignatureInput<'a> {
    fn from(text: &'a str) -> Self {
        SignatureInput::Base64(text)
    }
}

impl<'a> From<&'a String> for SignatureInput<'a> {
    fn from(text: &'a String) -> Self {
        SignatureInput::Base64(text)
    }
}
