//! Network Parameters
//!
//! Explicit presets for the coin variants that share the Bitcoin signed
//! message format: the message magic and the version bytes and bech32 prefix
//! used when deriving addresses. Presets are plain constants; callers pass
//! the one they want instead of mutating a process-wide default.

use crate::message_signer::digest::MessagePrefix;

/// Address and message parameters for one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    pub name: &'static str,
    /// Magic text, without its length prefix
    pub message_magic: &'static str,
    pub pubkey_hash_version: u8,
    pub script_hash_version: u8,
    /// Bech32 human-readable part, if the network has native segwit
    pub bech32_hrp: Option<&'static str>,
}

impl NetworkParams {
    pub const BITCOIN: NetworkParams = NetworkParams {
        name: "bitcoin",
        message_magic: "Bitcoin Signed Message:\n",
        pubkey_hash_version: 0x00,
        script_hash_version: 0x05,
        bech32_hrp: Some("bc"),
    };

    pub const TESTNET: NetworkParams = NetworkParams {
        name: "testnet",
        message_magic: "Bitcoin Signed Message:\n",
        pubkey_hash_version: 0x6f,
        script_hash_version: 0xc4,
        bech32_hrp: Some("tb"),
    };

    pub const LITECOIN: NetworkParams = NetworkParams {
        name: "litecoin",
        message_magic: "Litecoin Signed Message:\n",
        pubkey_hash_version: 0x30,
        script_hash_version: 0x32,
        bech32_hrp: Some("ltc"),
    };

    pub const DOGECOIN: NetworkParams = NetworkParams {
        name: "dogecoin",
        message_magic: "Dogecoin Signed Message:\n",
        pubkey_hash_version: 0x1e,
        script_hash_version: 0x16,
        bech32_hrp: None,
    };

    pub const ALL: [NetworkParams; 4] = [
        NetworkParams::BITCOIN,
        NetworkParams::TESTNET,
        NetworkParams::LITECOIN,
        NetworkParams::DOGECOIN,
    ];

    /// Look up a preset by name (case-insensitive)
    pub fn by_name(name: &str) -> Option<NetworkParams> {
        Self::ALL
            .into_iter()
            .find(|params| params.name.eq_ignore_ascii_case(name.trim()))
    }

    /// The length-prefixed message prefix fed into the magic hash
    pub fn message_prefix(&self) -> MessagePrefix {
        MessagePrefix::from_magic(self.message_magic)
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        NetworkParams::BITCOIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitcoin_prefix_matches_default() {
        assert_eq!(NetworkParams::BITCOIN.message_prefix(), MessagePrefix::default());
        assert_eq!(NetworkParams::TESTNET.message_prefix(), MessagePrefix::default());
    }

    #[test]
    fn test_litecoin_prefix_bytes() {
        let prefix = NetworkParams::LITECOIN.message_prefix();
        assert_eq!(prefix.as_bytes()[0], 0x19);
        assert_eq!(&prefix.as_bytes()[1..], b"Litecoin Signed Message:\n");
    }

    #[test]
    fn test_by_name() {
        assert_eq!(NetworkParams::by_name("Litecoin"), Some(NetworkParams::LITECOIN));
        assert_eq!(NetworkParams::by_name(" dogecoin "), Some(NetworkParams::DOGECOIN));
        assert_eq!(NetworkParams::by_name("ethereum"), None);
    }

    #[test]
    fn test_default_network_is_bitcoin() {
        assert_eq!(NetworkParams::default(), NetworkParams::BITCOIN);
        assert!(NetworkParams::DOGECOIN.bech32_hrp.is_none());
    }
}
