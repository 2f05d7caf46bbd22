//! secp256k1 Recoverable Signatures
//!
//! The recovery engine is the narrow seam between the signed-message code and
//! the curve arithmetic:
//! - Recoverable ECDSA signing (RFC 6979 nonces, optional extra entropy)
//! - Public key recovery from `(digest, r, s, recovery id)` per SEC1 §4.1.6
//!
//! secp256k1 has cofactor 1, so every point that satisfies the curve
//! equation is in the prime-order subgroup and the `nR == O` check of the
//! recovery algorithm reduces to the curve-membership check.

use crate::error::RecoveryError;
use crate::types::{RawSignature, RecoverableSig, RecoveryId};
use secp256k1::ecdsa::{
    RecoverableSignature as SecpRecoverableSignature, RecoveryId as SecpRecoveryId,
};
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};

/// Recoverable signing and public key recovery over a 32-byte digest
pub trait RecoveryEngine {
    /// Sign `digest`, returning `(r, s)` and the id that recovers the signer
    fn sign_recoverable(
        &self,
        digest: &[u8; 32],
        secret_key: &SecretKey,
        extra_entropy: Option<&[u8; 32]>,
    ) -> Result<RecoverableSig, RecoveryError>;

    /// Reconstruct the public key `Q = r⁻¹(sR − eG)` for one recovery id
    fn recover(
        &self,
        digest: &[u8; 32],
        signature: &RawSignature,
        recovery_id: RecoveryId,
    ) -> Result<PublicKey, RecoveryError>;

    /// Find the recovery id that reproduces `expected`.
    ///
    /// Candidates that do not map to a curve point are skipped; the scalar
    /// range check still fails fast.
    fn recovery_id_for(
        &self,
        digest: &[u8; 32],
        signature: &RawSignature,
        expected: &PublicKey,
    ) -> Result<RecoveryId, RecoveryError> {
        signature.validate()?;

        RecoveryId::ALL
            .into_iter()
            .find(|id| {
                self.recover(digest, signature, *id)
                    .map(|candidate| candidate == *expected)
                    .unwrap_or(false)
            })
            .ok_or(RecoveryError::NoMatchingRecoveryId)
    }
}

/// libsecp256k1-backed recovery engine
#[derive(Debug, Clone)]
pub struct Secp256k1Engine {
    secp: Secp256k1<All>,
}

impl Secp256k1Engine {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// Public key for a secret key, for callers that need to derive addresses
    pub fn public_key(&self, secret_key: &SecretKey) -> PublicKey {
        PublicKey::from_secret_key(&self.secp, secret_key)
    }
}

impl Default for Secp256k1Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryEngine for Secp256k1Engine {
    fn sign_recoverable(
        &self,
        digest: &[u8; 32],
        secret_key: &SecretKey,
        extra_entropy: Option<&[u8; 32]>,
    ) -> Result<RecoverableSig, RecoveryError> {
        let msg = Message::from_digest(*digest);

        let sig = match extra_entropy {
            Some(entropy) => self
                .secp
                .sign_ecdsa_recoverable_with_noncedata(&msg, secret_key, entropy),
            None => self.secp.sign_ecdsa_recoverable(&msg, secret_key),
        };

        let (recovery_id, serialized) = sig.serialize_compact();
        let recovery_id = u8::try_from(recovery_id.to_i32())
            .map_err(|e| RecoveryError::PointNotRecoverable(e.to_string()))
            .and_then(RecoveryId::try_from)?;

        Ok(RecoverableSig {
            signature: RawSignature::from_compact(&serialized),
            recovery_id,
        })
    }

    fn recover(
        &self,
        digest: &[u8; 32],
        signature: &RawSignature,
        recovery_id: RecoveryId,
    ) -> Result<PublicKey, RecoveryError> {
        signature.validate()?;

        let rec_id = SecpRecoveryId::from_i32(i32::from(recovery_id.to_u8())).map_err(|e| {
            RecoveryError::PointNotRecoverable(format!("Invalid recovery ID: {}", e))
        })?;

        let sig = SecpRecoverableSignature::from_compact(&signature.to_compact(), rec_id)
            .map_err(|e| RecoveryError::PointNotRecoverable(e.to_string()))?;

        let msg = Message::from_digest(*digest);

        self.secp
            .recover_ecdsa(&msg, &sig)
            .map_err(|e| RecoveryError::PointNotRecoverable(e.to_string()))
    }
}

// MARK: - Tests
