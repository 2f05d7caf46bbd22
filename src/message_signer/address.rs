//! Address Matcher
//!
//! Maps a recovered public key onto the three address encodings a signed
//! message can be checked against:
//! - P2PKH: `hash160(pubkey)` behind a base58check version byte
//! - P2SH-P2WPKH: `hash160(0x00 0x14 || hash160(pubkey))` behind a base58check version byte
//! - P2WPKH: `hash160(pubkey)` as a bech32 witness v0 program

use crate::error::{MessageError, MessageResult};
use crate::types::{AddressKind, SegwitType};
use crate::utils::crypto::{constant_time_eq, hash160};
use crate::utils::network_config::NetworkParams;
use bech32::{u5, FromBase32, ToBase32, Variant};
use bitcoin::base58;
use secp256k1::PublicKey;

/// `hash160` of the serialized public key
pub fn pubkey_hash(public_key: &PublicKey, compressed: bool) -> [u8; 20] {
    if compressed {
        hash160(&public_key.serialize())
    } else {
        hash160(&public_key.serialize_uncompressed())
    }
}

/// P2SH redeem-script hash of the witness v0 program `OP_0 <20-byte hash>`
pub fn segwit_redeem_hash(pubkey_hash: &[u8; 20]) -> [u8; 20] {
    let mut script = [0u8; 22];
    script[0] = 0x00;
    script[1] = 0x14;
    script[2..].copy_from_slice(pubkey_hash);
    hash160(&script)
}

/// Base58check payload with the version byte stripped
fn decode_base58_payload(address: &str) -> MessageResult<Vec<u8>> {
    let mut data = base58::decode_check(address).map_err(MessageError::invalid_address)?;
    if !data.is_empty() {
        data.remove(0);
    }
    Ok(data)
}

/// Bech32 witness program with the version unit stripped
fn decode_bech32_program(address: &str) -> MessageResult<Vec<u8>> {
    let (_hrp, data, variant) = bech32::decode(address).map_err(MessageError::invalid_address)?;
    if variant != Variant::Bech32 {
        return Err(MessageError::invalid_address("expected a bech32 checksum, found bech32m"));
    }

    let program = data.get(1..).unwrap_or(&[]);
    Vec::<u8>::from_base32(program).map_err(MessageError::invalid_address)
}

/// Check whether `public_key` controls `address`.
///
/// The comparison strategy is chosen by the segwit hint from the flag byte.
/// Without a hint and with `check_segwit_always` set, a bech32 address is
/// matched as P2WPKH; otherwise the base58 payload is accepted as either a
/// P2PKH hash or a P2SH-P2WPKH redeem hash, since both families share the
/// base58 space and the version byte alone does not tell them apart.
pub fn matches(
    public_key: &PublicKey,
    compressed: bool,
    segwit_type: Option<SegwitType>,
    address: &str,
    check_segwit_always: bool,
) -> MessageResult<bool> {
    if !compressed && check_segwit_always {
        return Err(MessageError::SegwitCheckRequiresCompressed);
    }
    if !compressed && segwit_type.is_some() {
        return Err(MessageError::SegwitRequiresCompressedKey);
    }

    let pubkey_hash = pubkey_hash(public_key, compressed);

    match segwit_type {
        Some(SegwitType::P2shP2wpkh) => {
            let expected = decode_base58_payload(address)?;
            Ok(constant_time_eq(&segwit_redeem_hash(&pubkey_hash), &expected))
        }
        Some(SegwitType::P2wpkh) => {
            let expected = decode_bech32_program(address)?;
            Ok(constant_time_eq(&pubkey_hash, &expected))
        }
        None if check_segwit_always => match decode_bech32_program(address) {
            Ok(expected) => Ok(constant_time_eq(&pubkey_hash, &expected)),
            Err(_) => {
                let expected = decode_base58_payload(address)?;
                let redeem_hash = segwit_redeem_hash(&pubkey_hash);
                Ok(constant_time_eq(&pubkey_hash, &expected)
                    | constant_time_eq(&redeem_hash, &expected))
            }
        },
        None => {
            let expected = decode_base58_payload(address)?;
            Ok(constant_time_eq(&pubkey_hash, &expected))
        }
    }
}

/// Encode the address of `kind` for `public_key` on `network`
pub fn derive_address(
    public_key: &PublicKey,
    compressed: bool,
    kind: AddressKind,
    network: &NetworkParams,
) -> MessageResult<String> {
    if kind.requires_compressed() && !compressed {
        return Err(MessageError::SegwitRequiresCompressedKey);
    }

    let pubkey_hash = pubkey_hash(public_key, compressed);

    match kind {
        AddressKind::P2pkh => {
            let mut payload = Vec::with_capacity(21);
            payload.push(network.pubkey_hash_version);
            payload.extend_from_slice(&pubkey_hash);
            Ok(base58::encode_check(&payload))
        }
        AddressKind::P2shP2wpkh => {
            let mut payload = Vec::with_capacity(21);
            payload.push(network.script_hash_version);
            payload.extend_from_slice(&segwit_redeem_hash(&pubkey_hash));
            Ok(base58::encode_check(&payload))
        }
        AddressKind::P2wpkh => {
            let hrp = network.bech32_hrp.ok_or(MessageError::UnsupportedAddressKind {
                kind: kind.as_str(),
                network: network.name,
            })?;

            let mut data = vec![u5::try_from_u8(0).map_err(MessageError::invalid_address)?];
            data.extend(pubkey_hash.to_base32());
            bech32::encode(hrp, data, Variant::Bech32).map_err(MessageError::invalid_address)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::key::CompressedPublicKey;
    use bitcoin::{Address, Network};
    use secp256k1::{Secp256k1, SecretKey};

    fn key(byte: u8) -> PublicKey {
        let mut bytes = [0u8; 32];
        bytes[31] = byte;
        let sk = SecretKey::from_slice(&bytes).unwrap();
        PublicKey::from_secret_key(&Secp256k1::new(), &sk)
    }

    #[test]
    fn test_generator_point_addresses() {
        let g = key(1);
        let btc = NetworkParams::BITCOIN;

        assert_eq!(
            hex::encode(pubkey_hash(&g, true)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
        assert_eq!(
            derive_address(&g, true, AddressKind::P2pkh, &btc).unwrap(),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
        assert_eq!(
            derive_address(&g, false, AddressKind::P2pkh, &btc).unwrap(),
            "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm"
        );
        assert_eq!(
            derive_address(&g, true, AddressKind::P2wpkh, &btc).unwrap(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
    }

    #[test]
    fn test_derivation_matches_rust_bitcoin() {
        for byte in [2u8, 77, 200] {
            let pk = key(byte);
            let compressed = CompressedPublicKey(pk);
            let btc = NetworkParams::BITCOIN;

            assert_eq!(
                derive_address(&pk, true, AddressKind::P2pkh, &btc).unwrap(),
                Address::p2pkh(bitcoin::PublicKey::new(pk), Network::Bitcoin).to_string()
            );
            assert_eq!(
                derive_address(&pk, true, AddressKind::P2shP2wpkh, &btc).unwrap(),
                Address::p2shwpkh(&compressed, Network::Bitcoin).to_string()
            );
            assert_eq!(
                derive_address(&pk, true, AddressKind::P2wpkh, &btc).unwrap(),
                Address::p2wpkh(&compressed, Network::Bitcoin).to_string()
            );
            assert_eq!(
                derive_address(&pk, true, AddressKind::P2wpkh, &NetworkParams::TESTNET).unwrap(),
                Address::p2wpkh(&compressed, Network::Testnet).to_string()
            );
        }
    }

    #[test]
    fn test_derivation_rejects_unsupported_combinations() {
        let pk = key(5);
        assert_eq!(
            derive_address(&pk, false, AddressKind::P2wpkh, &NetworkParams::BITCOIN),
            Err(MessageError::SegwitRequiresCompressedKey)
        );
        assert!(matches!(
            derive_address(&pk, true, AddressKind::P2wpkh, &NetworkParams::DOGECOIN),
            Err(MessageError::UnsupportedAddressKind { .. })
        ));
    }

    #[test]
    fn test_matches_each_family() {
        let pk = key(11);
        let btc = NetworkParams::BITCOIN;
        let p2pkh = derive_address(&pk, true, AddressKind::P2pkh, &btc).unwrap();
        let p2sh = derive_address(&pk, true, AddressKind::P2shP2wpkh, &btc).unwrap();
        let p2wpkh = derive_address(&pk, true, AddressKind::P2wpkh, &btc).unwrap();

        assert!(matches(&pk, true, None, &p2pkh, false).unwrap());
        assert!(matches(&pk, true, Some(SegwitType::P2shP2wpkh), &p2sh, false).unwrap());
        assert!(matches(&pk, true, Some(SegwitType::P2wpkh), &p2wpkh, false).unwrap());

        // Wrong family for the hint
        assert!(!matches(&pk, true, None, &p2sh, false).unwrap());
        assert!(!matches(&pk, true, Some(SegwitType::P2shP2wpkh), &p2pkh, false).unwrap());
        assert!(matches(&pk, true, Some(SegwitType::P2wpkh), &p2pkh, false).is_err());
    }

    #[test]
    fn test_check_segwit_always_tries_every_family() {
        let pk = key(12);
        let btc = NetworkParams::BITCOIN;
        for kind in [AddressKind::P2pkh, AddressKind::P2shP2wpkh, AddressKind::P2wpkh] {
            let address = derive_address(&pk, true, kind, &btc).unwrap();
            assert!(matches(&pk, true, None, &address, true).unwrap(), "{}", kind);
        }

        let other = derive_address(&key(13), true, AddressKind::P2shP2wpkh, &btc).unwrap();
        assert!(!matches(&pk, true, None, &other, true).unwrap());
    }

    #[test]
    fn test_uncompressed_key_cannot_match_segwit() {
        let pk = key(14);
        let address =
            derive_address(&pk, false, AddressKind::P2pkh, &NetworkParams::BITCOIN).unwrap();
        assert!(matches(&pk, false, None, &address, false).unwrap());
        assert_eq!(
            matches(&pk, false, None, &address, true),
            Err(MessageError::SegwitCheckRequiresCompressed)
        );
        assert_eq!(
            matches(&pk, false, Some(SegwitType::P2wpkh), &address, false),
            Err(MessageError::SegwitRequiresCompressedKey)
        );
    }

    #[test]
    fn test_malformed_addresses_are_errors() {
        let pk = key(15);
        for address in ["", "not-an-address", "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMi"] {
            assert!(matches!(
                matches(&pk, true, None, address, false),
                Err(MessageError::InvalidAddress(_))
            ));
        }
        assert!(matches!(
            matches(
                &pk,
                true,
                Some(SegwitType::P2wpkh),
                "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5",
                false
            ),
            Err(MessageError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_bech32m_address_rejected() {
        let pk = key(16);
        // BIP-350 taproot example (bech32m checksum)
        let taproot = "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0";
        assert!(matches!(
            matches(&pk, true, Some(SegwitType::P2wpkh), taproot, false),
            Err(MessageError::InvalidAddress(_))
        ));
    }
}
