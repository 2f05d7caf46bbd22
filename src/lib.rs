//! Bitcoin Signed Message Library
//!
//! Sign text messages with a secp256k1 key and verify them against a
//! Bitcoin address (the "Sign Message / Verify Message" feature of Bitcoin
//! wallets).
//!
//! # Architecture
//!
//! This crate provides:
//! - **message_signer**: magic hash, compact signature codec, address
//!   matching, and the `sign` / `sign_async` / `verify` entry points
//! - **crypto**: the recovery engine (recoverable ECDSA over libsecp256k1)
//! - **utils**: hashing helpers, network presets, structured logging
//!
//! # Example
//!
//! ```rust,ignore
//! use bitcoin_message::{sign, verify, KeySource, SignOptions, SegwitType};
//!
//! let options = SignOptions::new().with_segwit(SegwitType::P2wpkh);
//! let signature = sign("Sign me", KeySource::Raw(&secret_key), true, None, &options)?;
//! assert!(verify("Sign me", "bc1q...", &signature, None, false)?);
//! ```

pub mod crypto;
pub mod error;
pub mod message_signer;
pub mod types;
pub mod utils;

// Re-export key types for convenience
pub use error::{ErrorKind, MessageError, MessageResult, RecoveryError};
pub use types::*;

pub use crypto::recovery::{RecoveryEngine, Secp256k1Engine};
pub use message_signer::{
    derive_address, magic_hash, recover_public_key, sign, sign_async, verify, AsyncKeySource,
    AsyncMessageSigner, BitcoinMessage, CompactSignature, KeySource, MessagePrefix,
    MessageSigner, RecoveredKey, SignOptions, SignatureInput, SignedMessage, SyncSigner,
};
pub use utils::network_config::NetworkParams;
