//! Error types for signed-message operations
//!
//! Every fallible operation in the crate returns [`MessageResult`]. Errors are
//! grouped into a small number of categories ([`ErrorKind`]) so callers can
//! tell a malformed signature apart from a configuration mistake or an
//! unrecoverable signature.

use serde::{Deserialize, Serialize};

/// Failures raised by the public-key recovery primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecoveryError {
    #[error("Invalid r value")]
    InvalidR,

    #[error("Invalid s value")]
    InvalidS,

    #[error("Public key not recoverable: {0}")]
    PointNotRecoverable(String),

    #[error("Unable to find valid recovery factor")]
    NoMatchingRecoveryId,
}

/// Main error type for signing and verification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("Invalid signature parameter: flag byte {0}")]
    InvalidSignatureParameter(u8),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unrecognized segwitType {0:?}: use \"p2sh(p2wpkh)\" or \"p2wpkh\"")]
    UnrecognizedSegwitType(String),

    #[error("checkSegwitAlways can only be used with a compressed pubkey signature flagbyte")]
    SegwitCheckRequiresCompressed,

    #[error("Segwit address types require a compressed public key")]
    SegwitRequiresCompressedKey,

    #[error("Address kind {kind} is not available on {network}")]
    UnsupportedAddressKind {
        kind: &'static str,
        network: &'static str,
    },

    #[error("Recovery failed: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("Signer failed: {0}")]
    Signer(String),
}

/// Error categories for callers that branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed signature bytes or address text
    Format,
    /// Invalid options or incompatible option combination
    Config,
    /// The signature does not recover to a valid public key
    Recovery,
    /// A delegated signer reported a failure
    Signer,
}

impl MessageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MessageError::InvalidSignatureLength(_)
            | MessageError::InvalidSignatureParameter(_)
            | MessageError::InvalidSignatureEncoding(_)
            | MessageError::InvalidAddress(_) => ErrorKind::Format,
            MessageError::UnrecognizedSegwitType(_)
            | MessageError::SegwitCheckRequiresCompressed
            | MessageError::SegwitRequiresCompressedKey
            | MessageError::UnsupportedAddressKind { .. } => ErrorKind::Config,
            MessageError::Recovery(_) => ErrorKind::Recovery,
            MessageError::Signer(_) => ErrorKind::Signer,
        }
    }

    pub fn signer(msg: impl Into<String>) -> Self {
        MessageError::Signer(msg.into())
    }

    pub fn invalid_address(msg: impl std::fmt::Display) -> Self {
        MessageError::InvalidAddress(msg.to_string())
    }
}

impl From<base64::DecodeError> for MessageError {
    fn from(e: base64::DecodeError) -> Self {
        MessageError::InvalidSignatureEncoding(e.to_string())
    }
}

/// Result type alias for signed-message operations
pub type MessageResult<T> = Result<T, MessageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(MessageError::InvalidSignatureLength(64).kind(), ErrorKind::Format);
        assert_eq!(MessageError::InvalidSignatureParameter(43).kind(), ErrorKind::Format);
        assert_eq!(MessageError::invalid_address("bad").kind(), ErrorKind::Format);
        assert_eq!(MessageError::SegwitRequiresCompressedKey.kind(), ErrorKind::Config);
        assert_eq!(MessageError::SegwitCheckRequiresCompressed.kind(), ErrorKind::Config);
        assert_eq!(
            MessageError::UnrecognizedSegwitType("xyz".into()).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            MessageError::from(RecoveryError::InvalidR).kind(),
            ErrorKind::Recovery
        );
        assert_eq!(MessageError::signer("offline").kind(), ErrorKind::Signer);
    }

    #[test]
    fn test_error_messages() {
        let err = MessageError::UnrecognizedSegwitType("XYZ".into());
        assert!(err.to_string().contains(r#"use "p2sh(p2wpkh)" or "p2wpkh""#));

        let err = MessageError::SegwitRequiresCompressedKey;
        assert!(!err.to_string().contains("checkSegwitAlways"));
        assert_eq!(
            MessageError::SegwitCheckRequiresCompressed.to_string(),
            "checkSegwitAlways can only be used with a compressed pubkey signature flagbyte"
        );

        let err = MessageError::from(RecoveryError::InvalidS);
        assert_eq!(err.to_string(), "Recovery failed: Invalid s value");
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::Recovery).unwrap();
        assert_eq!(json, "\"recovery\"");
    }
}
