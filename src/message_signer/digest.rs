//! Message digest ("magic hash")
//!
//! Format: prefix + compact_size(len(message)) + message, double SHA-256.
//!
//! The default prefix is `"\x18Bitcoin Signed Message:\n"`: the magic text
//! preceded by its own length. Other networks swap in their own magic.

use crate::utils::crypto::sha256d;
use bitcoin::consensus::encode::{serialize, VarInt};

/// Bitcoin message prefix, length byte included
pub const BITCOIN_MESSAGE_PREFIX: &[u8] = b"\x18Bitcoin Signed Message:\n";

/// Domain-separation prefix fed into the magic hash
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessagePrefix(Vec<u8>);

impl MessagePrefix {
    /// Use `bytes` verbatim
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Build `compact_size(len(magic)) || magic`
    pub fn from_magic(magic: &str) -> Self {
        let mut bytes = compact_size(magic.len() as u64);
        bytes.extend_from_slice(magic.as_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for MessagePrefix {
    fn default() -> Self {
        Self::from_bytes(BITCOIN_MESSAGE_PREFIX)
    }
}

impl From<&str> for MessagePrefix {
    fn from(prefix: &str) -> Self {
        Self::from_bytes(prefix.as_bytes())
    }
}

impl From<&[u8]> for MessagePrefix {
    fn from(prefix: &[u8]) -> Self {
        Self::from_bytes(prefix)
    }
}

impl From<Vec<u8>> for MessagePrefix {
    fn from(prefix: Vec<u8>) -> Self {
        Self(prefix)
    }
}

impl AsRef<[u8]> for MessagePrefix {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Bitcoin compact-size ("varint") encoding of `n`
pub fn compact_size(n: u64) -> Vec<u8> {
    serialize(&VarInt(n))
}

/// Build the exact byte sequence that gets double-hashed
pub fn magic_payload(message: &[u8], prefix: Option<&MessagePrefix>) -> Vec<u8> {
    let prefix = prefix.map(MessagePrefix::as_bytes).unwrap_or(BITCOIN_MESSAGE_PREFIX);
    let length = compact_size(message.len() as u64);

    let mut data = Vec::with_capacity(prefix.len() + length.len() + message.len());
    data.extend_from_slice(prefix);
    data.extend_from_slice(&length);
    data.extend_from_slice(message);
    data
}

/// Hash a message with the signed-message prefix
///
/// # Arguments
/// * `message` - The raw message bytes (UTF-8 text or arbitrary bytes)
/// * `prefix` - Network prefix; `None` selects the Bitcoin prefix
///
/// # Returns
/// The 32-byte double SHA-256 digest that gets signed
pub fn magic_hash(message: impl AsRef<[u8]>, prefix: Option<&MessagePrefix>) -> [u8; 32] {
    sha256d(&magic_payload(message.as_ref(), prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;

    #[test]
    fn test_default_prefix() {
        let prefix = MessagePrefix::default();
        assert_eq!(prefix.as_bytes()[0], 0x18);
        assert_eq!(prefix.as_bytes().len(), 25);
        assert_eq!(MessagePrefix::from_magic("Bitcoin Signed Message:\n"), prefix);
    }

    #[test]
    fn test_compact_size_tiers() {
        assert_eq!(compact_size(0), vec![0x00]);
        assert_eq!(compact_size(0xfc), vec![0xfc]);
        assert_eq!(compact_size(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(compact_size(0xffff), vec![0xfd, 0xff, 0xff]);
        assert_eq!(compact_size(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(compact_size(0xffff_ffff), vec![0xfe, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(
            compact_size(0x1_0000_0000),
            vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_magic_payload_layout() {
        let prefix = MessagePrefix::from_bytes(vec![1, 2, 3, 4]);
        let payload = magic_payload(b"Sign me", Some(&prefix));
        assert_eq!(&payload[..4], &[1, 2, 3, 4]);
        assert_eq!(payload[4], 7);
        assert_eq!(&payload[5..], b"Sign me");
    }

    #[test]
    fn test_long_message_uses_three_byte_length() {
        let message = vec![b'a'; 300];
        let payload = magic_payload(&message, None);
        let offset = BITCOIN_MESSAGE_PREFIX.len();
        assert_eq!(&payload[offset..offset + 3], &[0xfd, 0x2c, 0x01]);
        assert_eq!(payload.len(), offset + 3 + 300);
    }

    #[test]
    fn test_magic_hash_matches_rust_bitcoin() {
        for message in ["", "hello world", "Sign me", "vires in numeris"] {
            let expected = bitcoin::sign_message::signed_msg_hash(message);
            assert_eq!(magic_hash(message, None), expected.to_byte_array());
        }
    }

    #[test]
    fn test_text_and_bytes_agree() {
        assert_eq!(magic_hash("Sign me", None), magic_hash(b"Sign me".to_vec(), None));

        let text_prefix = MessagePrefix::from("\u{0018}Bitcoin Signed Message:\n");
        assert_eq!(text_prefix, MessagePrefix::default());
    }

    #[test]
    fn test_prefix_changes_digest() {
        let litecoin = MessagePrefix::from_magic("Litecoin Signed Message:\n");
        assert_ne!(magic_hash("hello", None), magic_hash("hello", Some(&litecoin)));
    }
}
