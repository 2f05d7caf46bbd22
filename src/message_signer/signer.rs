//! Signing key sources
//!
//! A message can be signed with a raw secret key (handled by the recovery
//! engine) or by delegating the digest to an external signer, such as a
//! hardware wallet or a remote service.

use crate::error::{MessageError, MessageResult};
use crate::log_debug;
use crate::types::{RecoverableSig, SegwitType};
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::SecretKey;
use std::str::FromStr;

/// Blocking signer that produces a recoverable signature over a digest
pub trait MessageSigner {
    fn sign_digest(
        &self,
        digest: &[u8; 32],
        extra_entropy: Option<&[u8; 32]>,
    ) -> MessageResult<RecoverableSig>;
}

/// Asynchronous signer, usable as `&dyn AsyncMessageSigner`
#[async_trait]
pub trait AsyncMessageSigner: Send + Sync {
    async fn sign_digest(
        &self,
        digest: [u8; 32],
        extra_entropy: Option<[u8; 32]>,
    ) -> MessageResult<RecoverableSig>;
}

/// Where the signature for `sign` comes from
#[derive(Clone, Copy)]
pub enum KeySource<'a> {
    Raw(&'a SecretKey),
    Signer(&'a dyn MessageSigner),
}

impl<'a> From<&'a SecretKey> for KeySource<'a> {
    fn from(key: &'a SecretKey) -> Self {
        KeySource::Raw(key)
    }
}

/// Where the signature for `sign_async` comes from
#[derive(Clone, Copy)]
pub enum AsyncKeySource<'a> {
    Raw(&'a SecretKey),
    Signer(&'a dyn AsyncMessageSigner),
}

impl<'a> From<&'a SecretKey> for AsyncKeySource<'a> {
    fn from(key: &'a SecretKey) -> Self {
        AsyncKeySource::Raw(key)
    }
}

/// Adapts a blocking signer to the async interface
#[derive(Debug, Clone)]
pub struct SyncSigner<S>(pub S);

#[async_trait]
impl<S> AsyncMessageSigner for SyncSigner<S>
where
    S: MessageSigner + Send + Sync,
{
    async fn sign_digest(
        &self,
        digest: [u8; 32],
        extra_entropy: Option<[u8; 32]>,
    ) -> MessageResult<RecoverableSig> {
        self.0.sign_digest(&digest, extra_entropy.as_ref())
    }
}

/// Signing options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Address family advertised in the flag byte
    pub segwit_type: Option<SegwitType>,
    /// Extra data mixed into the RFC 6979 nonce
    pub extra_entropy: Option<[u8; 32]>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segwit(mut self, segwit_type: SegwitType) -> Self {
        self.segwit_type = Some(segwit_type);
        self
    }

    /// Set the segwit type from its textual literal (`"p2sh(p2wpkh)"` or `"p2wpkh"`)
    pub fn with_segwit_str(self, segwit_type: &str) -> MessageResult<Self> {
        Ok(self.with_segwit(SegwitType::from_str(segwit_type)?))
    }

    pub fn with_extra_entropy(mut self, entropy: [u8; 32]) -> Self {
        self.extra_entropy = Some(entropy);
        self
    }

    /// Draw nonce entropy from the OS RNG; signatures become non-deterministic
    pub fn with_random_entropy(self) -> Self {
        let mut entropy = [0u8; 32];
        OsRng.fill_bytes(&mut entropy);
        self.with_extra_entropy(entropy)
    }

    /// Reject option combinations that cannot be encoded
    pub(crate) fn validate(&self, compressed: bool) -> MessageResult<()> {
        if let (Some(segwit), false) = (self.segwit_type, compressed) {
            log_debug!(
                "message_signer",
                "Segwit signature requested for an uncompressed key",
                segwit = segwit,
            );
            return Err(MessageError::SegwitRequiresCompressedKey);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::recovery::{RecoveryEngine, Secp256k1Engine};

    struct EngineSigner {
        engine: Secp256k1Engine,
        key: SecretKey,
    }

    impl MessageSigner for EngineSigner {
        fn sign_digest(
            &self,
            digest: &[u8; 32],
            extra_entropy: Option<&[u8; 32]>,
        ) -> MessageResult<RecoverableSig> {
            Ok(self.engine.sign_recoverable(digest, &self.key, extra_entropy)?)
        }
    }

    #[test]
    fn test_sign_options_builders() {
        let options = SignOptions::new()
            .with_segwit_str("P2SH(P2WPKH)")
            .unwrap()
            .with_extra_entropy([7u8; 32]);
        assert_eq!(options.segwit_type, Some(SegwitType::P2shP2wpkh));
        assert_eq!(options.extra_entropy, Some([7u8; 32]));

        assert!(matches!(
            SignOptions::new().with_segwit_str("XYZ"),
            Err(MessageError::UnrecognizedSegwitType(_))
        ));
    }

    #[test]
    fn test_random_entropy_differs() {
        let a = SignOptions::new().with_random_entropy();
        let b = SignOptions::new().with_random_entropy();
        assert!(a.extra_entropy.is_some());
        assert_ne!(a.extra_entropy, b.extra_entropy);
    }

    #[test]
    fn test_validate_rejects_uncompressed_segwit() {
        let options = SignOptions::new().with_segwit(SegwitType::P2wpkh);
        assert!(options.validate(true).is_ok());
        let err = options.validate(false).unwrap_err();
        assert_eq!(err, MessageError::SegwitRequiresCompressedKey);
        assert!(!err.to_string().contains("checkSegwitAlways"));
        assert!(SignOptions::new().validate(false).is_ok());
    }

    #[tokio::test]
    async fn test_sync_signer_adapter() {
        let key = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let signer = EngineSigner {
            engine: Secp256k1Engine::new(),
            key,
        };
        let digest = [0x99u8; 32];

        let direct = signer.sign_digest(&digest, None).unwrap();
        let adapted = SyncSigner(signer);
        let via_async = AsyncMessageSigner::sign_digest(&adapted, digest, None)
            .await
            .unwrap();
        assert_eq!(direct, via_async);
    }
}
