//! Bitcoin Signed Message
//!
//! Sign a text message with a secp256k1 key and verify the 65-byte compact
//! signature against a claimed address, without a shared secret.
//!
//! Format: `double_sha256(prefix || compact_size(len) || message)` signed with
//! recoverable ECDSA; the flag byte tells the verifier how the key was
//! serialized and which address family to check against.
//!
//! Supported address families:
//! - P2PKH (compressed or uncompressed key)
//! - P2SH-P2WPKH
//! - P2WPKH

pub mod address;
pub mod compact;
pub mod digest;
pub mod signer;

pub use address::{derive_address, matches as address_matches, pubkey_hash, segwit_redeem_hash};
pub use compact::{CompactSignature, SignatureInput, COMPACT_SIGNATURE_LEN};
pub use digest::{compact_size, magic_hash, magic_payload, MessagePrefix, BITCOIN_MESSAGE_PREFIX};
pub use signer::{
    AsyncKeySource, AsyncMessageSigner, KeySource, MessageSigner, SignOptions, SyncSigner,
};

use crate::crypto::recovery::{RecoveryEngine, Secp256k1Engine};
use crate::error::{MessageError, MessageResult};
use crate::types::{AddressKind, RecoveryId, SegwitType};
use crate::utils::network_config::NetworkParams;
use crate::log_debug;
use secp256k1::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::OnceLock;

const MODULE: &str = "message_signer";

/// Shared default front-end used by the free functions
static DEFAULT_MESSAGE: OnceLock<BitcoinMessage> = OnceLock::new();

fn default_message() -> &'static BitcoinMessage {
    DEFAULT_MESSAGE.get_or_init(BitcoinMessage::new)
}

// =============================================================================
// Front-end
// =============================================================================

/// Signing and verification bound to one recovery engine and message prefix
#[derive(Debug, Clone)]
pub struct BitcoinMessage<E: RecoveryEngine = Secp256k1Engine> {
    engine: E,
    prefix: MessagePrefix,
}

impl BitcoinMessage<Secp256k1Engine> {
    /// libsecp256k1 engine with the Bitcoin prefix
    pub fn new() -> Self {
        Self::with_engine(Secp256k1Engine::new())
    }

    /// libsecp256k1 engine with the network's message magic
    pub fn for_network(network: &NetworkParams) -> Self {
        Self::new().with_prefix(network.message_prefix())
    }
}

impl Default for BitcoinMessage<Secp256k1Engine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RecoveryEngine> BitcoinMessage<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            prefix: MessagePrefix::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<MessagePrefix>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &MessagePrefix {
        &self.prefix
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Sign `message`, returning the 65-byte compact signature
    pub fn sign(
        &self,
        message: impl AsRef<[u8]>,
        key: KeySource<'_>,
        compressed: bool,
        options: &SignOptions,
    ) -> MessageResult<[u8; COMPACT_SIGNATURE_LEN]> {
        self.sign_with_prefix(message.as_ref(), key, compressed, &self.prefix, options)
    }

    /// Async variant of [`BitcoinMessage::sign`].
    ///
    /// Option validation and hashing happen before the future is returned, so
    /// configuration errors surface immediately. The future only waits on the
    /// signer and encodes its result.
    pub fn sign_async<'a>(
        &'a self,
        message: impl AsRef<[u8]>,
        key: AsyncKeySource<'a>,
        compressed: bool,
        options: &SignOptions,
    ) -> MessageResult<impl Future<Output = MessageResult<[u8; COMPACT_SIGNATURE_LEN]>> + Send + 'a>
    where
        E: Sync,
    {
        self.sign_async_with_prefix(message.as_ref(), key, compressed, &self.prefix, options)
    }

    /// Verify `signature` over `message` against `address`.
    ///
    /// Returns `Ok(false)` when the signature is well formed but belongs to a
    /// different key. Malformed input and unrecoverable signatures are errors.
    pub fn verify<'s>(
        &self,
        message: impl AsRef<[u8]>,
        address: &str,
        signature: impl Into<SignatureInput<'s>>,
        check_segwit_always: bool,
    ) -> MessageResult<bool> {
        self.verify_with_prefix(
            message.as_ref(),
            address,
            signature.into(),
            &self.prefix,
            check_segwit_always,
        )
    }

    /// Recover the signing key and the flag information of `signature`
    pub fn recover_public_key<'s>(
        &self,
        message: impl AsRef<[u8]>,
        signature: impl Into<SignatureInput<'s>>,
    ) -> MessageResult<RecoveredKey> {
        self.recover_with_prefix(message.as_ref(), signature.into(), &self.prefix)
    }

    /// Sign `message` with a compressed key and package it with the address
    /// of `kind` on `network`
    pub fn sign_message(
        &self,
        message: &str,
        secret_key: &SecretKey,
        kind: AddressKind,
        network: &NetworkParams,
    ) -> MessageResult<SignedMessage> {
        let options = SignOptions {
            segwit_type: kind.segwit_type(),
            extra_entropy: None,
        };
        let signature = self.sign(message, KeySource::Raw(secret_key), true, &options)?;
        let recovered = self.recover_public_key(message, &signature)?;

        Ok(SignedMessage {
            message: message.to_string(),
            address: recovered.address(network)?,
            signature: CompactSignature::decode(&signature)?.to_base64(),
        })
    }

    fn sign_with_prefix(
        &self,
        message: &[u8],
        key: KeySource<'_>,
        compressed: bool,
        prefix: &MessagePrefix,
        options: &SignOptions,
    ) -> MessageResult<[u8; COMPACT_SIGNATURE_LEN]> {
        options.validate(compressed)?;
        let digest = magic_hash(message, Some(prefix));
        let extra_entropy = options.extra_entropy.as_ref();

        let sig = match key {
            KeySource::Raw(secret_key) => {
                self.engine.sign_recoverable(&digest, secret_key, extra_entropy)?
            }
            KeySource::Signer(signer) => signer.sign_digest(&digest, extra_entropy)?,
        };

        let encoded = CompactSignature::new(sig, compressed, options.segwit_type);
        log_debug!(
            MODULE,
            "Signed message",
            message_len = message.len(),
            digest = hex::encode(digest),
            flag_byte = encoded.flag_byte(),
        );

        Ok(encoded.encode())
    }

    fn sign_async_with_prefix<'a>(
        &'a self,
        message: &[u8],
        key: AsyncKeySource<'a>,
        compressed: bool,
        prefix: &MessagePrefix,
        options: &SignOptions,
    ) -> MessageResult<impl Future<Output = MessageResult<[u8; COMPACT_SIGNATURE_LEN]>> + Send + 'a>
    where
        E: Sync,
    {
        options.validate(compressed)?;
        let digest = magic_hash(message, Some(prefix));
        let segwit_type = options.segwit_type;
        let extra_entropy = options.extra_entropy;

        Ok(async move {
            let sig = match key {
                AsyncKeySource::Raw(secret_key) => {
                    self.engine
                        .sign_recoverable(&digest, secret_key, extra_entropy.as_ref())?
                }
                AsyncKeySource::Signer(signer) => signer.sign_digest(digest, extra_entropy).await?,
            };

            let encoded = CompactSignature::new(sig, compressed, segwit_type);
            log_debug!(
                MODULE,
                "Signed message (async)",
                digest = hex::encode(digest),
                flag_byte = encoded.flag_byte(),
            );

            Ok::<_, MessageError>(encoded.encode())
        })
    }

    fn verify_with_prefix(
        &self,
        message: &[u8],
        address: &str,
        signature: SignatureInput<'_>,
        prefix: &MessagePrefix,
        check_segwit_always: bool,
    ) -> MessageResult<bool> {
        let decoded = signature.decode()?;

        if check_segwit_always && !decoded.compressed {
            return Err(MessageError::SegwitCheckRequiresCompressed);
        }

        let digest = magic_hash(message, Some(prefix));
        let public_key = self
            .engine
            .recover(&digest, &decoded.signature, decoded.recovery_id)
            .map_err(|e| {
                log_debug!(MODULE, "Signature did not recover a public key", error = e);
                MessageError::from(e)
            })?;

        let valid = address::matches(
            &public_key,
            decoded.compressed,
            decoded.segwit_type,
            address,
            check_segwit_always,
        )?;

        log_debug!(
            MODULE,
            "Verified message signature",
            address = address,
            flag_byte = decoded.flag_byte(),
            valid = valid,
        );

        Ok(valid)
    }

    fn recover_with_prefix(
        &self,
        message: &[u8],
        signature: SignatureInput<'_>,
        prefix: &MessagePrefix,
    ) -> MessageResult<RecoveredKey> {
        let decoded = signature.decode()?;
        let digest = magic_hash(message, Some(prefix));
        let public_key = self
            .engine
            .recover(&digest, &decoded.signature, decoded.recovery_id)?;

        Ok(RecoveredKey {
            public_key,
            compressed: decoded.compressed,
            segwit_type: decoded.segwit_type,
            recovery_id: decoded.recovery_id,
        })
    }
}

// =============================================================================
// Free functions
// =============================================================================

/// Sign `message` with the libsecp256k1 engine.
///
/// `prefix` defaults to the Bitcoin prefix.
pub fn sign(
    message: impl AsRef<[u8]>,
    key: KeySource<'_>,
    compressed: bool,
    prefix: Option<&MessagePrefix>,
    options: &SignOptions,
) -> MessageResult<[u8; COMPACT_SIGNATURE_LEN]> {
    let default = default_message();
    default.sign_with_prefix(
        message.as_ref(),
        key,
        compressed,
        prefix.unwrap_or(&default.prefix),
        options,
    )
}

/// Async signing; configuration errors are returned before any future exists
pub fn sign_async<'a>(
    message: impl AsRef<[u8]>,
    key: AsyncKeySource<'a>,
    compressed: bool,
    prefix: Option<&MessagePrefix>,
    options: &SignOptions,
) -> MessageResult<impl Future<Output = MessageResult<[u8; COMPACT_SIGNATURE_LEN]>> + Send + 'a> {
    let default = default_message();
    default.sign_async_with_prefix(
        message.as_ref(),
        key,
        compressed,
        prefix.unwrap_or(&default.prefix),
        options,
    )
}

/// Verify a signature (raw bytes or base64) against `address`
pub fn verify<'s>(
    message: impl AsRef<[u8]>,
    address: &str,
    signature: impl Into<SignatureInput<'s>>,
    prefix: Option<&MessagePrefix>,
    check_segwit_always: bool,
) -> MessageResult<bool> {
    let default = default_message();
    default.verify_with_prefix(
        message.as_ref(),
        address,
        signature.into(),
        prefix.unwrap_or(&default.prefix),
        check_segwit_always,
    )
}

pub fn recover_public_key<'s>(
    message: impl AsRef<[u8]>,
    signature: impl Into<SignatureInput<'s>>,
    prefix: Option<&MessagePrefix>,
) -> MessageResult<RecoveredKey> {
    let default = default_message();
    default.recover_with_prefix(
        message.as_ref(),
        signature.into(),
        prefix.unwrap_or(&default.prefix),
    )
}

// =============================================================================
// Results
// =============================================================================

/// Public key recovered from a signature, with its decoded flag information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveredKey {
    pub public_key: PublicKey,
    pub compressed: bool,
    pub segwit_type: Option<SegwitType>,
    pub recovery_id: RecoveryId,
}

impl RecoveredKey {
    /// Key bytes in the serialization the flag byte announced
    pub fn serialize(&self) -> Vec<u8> {
        if self.compressed {
            self.public_key.serialize().to_vec()
        } else {
            self.public_key.serialize_uncompressed().to_vec()
        }
    }

    pub fn address_kind(&self) -> AddressKind {
        AddressKind::from(self.segwit_type)
    }

    /// Address of the family advertised by the flag byte
    pub fn address(&self, network: &NetworkParams) -> MessageResult<String> {
        derive_address(&self.public_key, self.compressed, self.address_kind(), network)
    }
}

/// Portable `{ message, address, signature }` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub message: String,
    pub address: String,
    /// Base64 compact signature
    pub signature: String,
}

impl SignedMessage {
    /// Verify with the Bitcoin prefix
    pub fn verify(&self) -> MessageResult<bool> {
        verify(&self.message, &self.address, &self.signature, None, false)
    }

    /// Verify with the engine and prefix of `message_format`
    pub fn verify_with<E: RecoveryEngine>(
        &self,
        message_format: &BitcoinMessage<E>,
    ) -> MessageResult<bool> {
        message_format.verify(&self.message, &self.address, &self.signature, false)
    }
}
