//! Key armor: encrypted private keys, bare public keys, and key-info
//! records.
//!
//! Private-key armor headers:
//!
//! ```text
//! version: 1
//! type: secp256k1
//! cipher: chacha20-poly1305
//! kdf: argon2id
//! kdf-params: m=65536,t=3,p=4
//! salt: <hex, 16 bytes>
//! nonce: <hex, 12 bytes>
//! ```
//!
//! The body is `ciphertext || tag`. Salt, nonce and KDF parameters all feed
//! the key schedule, so tampering with any of them fails authentication.

use zeroize::Zeroizing;

use crate::armor::{decode_block, encode_block, ArmorBlock};
use crate::crypto::encryption::{self, KdfParams, Sealed};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::error::{KeyringError, Result};

pub const PRIVATE_KEY_BLOCK: &str = "KEYRING PRIVATE KEY";
pub const PUBLIC_KEY_BLOCK: &str = "KEYRING PUBLIC KEY";
pub const KEY_INFO_BLOCK: &str = "KEYRING KEY INFO";

const ARMOR_VERSION: &str = "1";
const KEY_TYPE: &str = "secp256k1";
const CIPHER: &str = "chacha20-poly1305";
const KDF: &str = "argon2id";

// ── Private keys ──────────────────────────────────────────────────────────────

/// Encrypt `key` under `passphrase` and armor the result.
///
/// Every call draws a fresh salt and nonce, so the output differs across
/// calls for the same input.
pub fn encrypt_armor_private_key(
    key: &PrivateKey,
    passphrase: &str,
    kdf: &KdfParams,
) -> Result<String> {
    let sealed = encryption::encrypt_with_passphrase(passphrase.as_bytes(), key.as_bytes(), kdf)?;
    let headers = [
        ("version", ARMOR_VERSION.to_string()),
        ("type", KEY_TYPE.to_string()),
        ("cipher", CIPHER.to_string()),
        ("kdf", KDF.to_string()),
        ("kdf-params", format_kdf_params(kdf)),
        ("salt", hex::encode(sealed.salt)),
        ("nonce", hex::encode(sealed.nonce)),
    ];
    Ok(encode_block(PRIVATE_KEY_BLOCK, &headers, &sealed.ciphertext))
}

/// Parse, decrypt and authenticate a private-key armor.
///
/// Framing problems are [`KeyringError::MalformedArmor`]; a wrong passphrase
/// and a tampered ciphertext are indistinguishable
/// [`KeyringError::DecryptionFailed`].
pub fn unarmor_decrypt_private_key(armor: &str, passphrase: &str) -> Result<PrivateKey> {
    let block = decode_block(armor)?;
    block.expect_type(PRIVATE_KEY_BLOCK)?;
    check_header(&block, "version", ARMOR_VERSION)?;
    check_header(&block, "type", KEY_TYPE)?;
    check_header(&block, "cipher", CIPHER)?;
    check_header(&block, "kdf", KDF)?;

    let kdf = parse_kdf_params(block.require_header("kdf-params")?)?;
    kdf.check_bounds()?;
    let sealed = Sealed {
        salt: fixed_hex(block.require_header("salt")?, "salt")?,
        nonce: fixed_hex(block.require_header("nonce")?, "nonce")?,
        ciphertext: block.body,
    };

    let plaintext: Zeroizing<Vec<u8>> =
        encryption::decrypt_with_passphrase(passphrase.as_bytes(), &sealed, &kdf)?;
    PrivateKey::from_bytes(&plaintext).map_err(|_| KeyringError::DecryptionFailed)
}

// ── Public keys ───────────────────────────────────────────────────────────────

/// Armor a public key. No passphrase involved.
pub fn armor_public_key(public_key: &PublicKey) -> String {
    let headers = [
        ("version", ARMOR_VERSION.to_string()),
        ("type", KEY_TYPE.to_string()),
    ];
    encode_block(PUBLIC_KEY_BLOCK, &headers, public_key.as_bytes())
}

pub fn unarmor_public_key(armor: &str) -> Result<PublicKey> {
    let block = decode_block(armor)?;
    block.expect_type(PUBLIC_KEY_BLOCK)?;
    check_header(&block, "version", ARMOR_VERSION)?;
    check_header(&block, "type", KEY_TYPE)?;
    PublicKey::from_bytes(&block.body)
}

// ── Key info records ──────────────────────────────────────────────────────────

/// Armor serialized record bytes for `export`.
pub fn armor_info_bytes(bytes: &[u8]) -> String {
    encode_block(
        KEY_INFO_BLOCK,
        &[("version", ARMOR_VERSION.to_string())],
        bytes,
    )
}

pub fn unarmor_info_bytes(armor: &str) -> Result<Vec<u8>> {
    let block = decode_block(armor)?;
    block.expect_type(KEY_INFO_BLOCK)?;
    check_header(&block, "version", ARMOR_VERSION)?;
    Ok(block.body)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn check_header(block: &ArmorBlock, key: &str, expected: &str) -> Result<()> {
    let value = block.require_header(key)?;
    if value != expected {
        return Err(KeyringError::MalformedArmor(format!(
            "unsupported {key} '{value}'"
        )));
    }
    Ok(())
}

fn format_kdf_params(kdf: &KdfParams) -> String {
    format!("m={},t={},p={}", kdf.m_cost, kdf.t_cost, kdf.p_cost)
}

fn parse_kdf_params(value: &str) -> Result<KdfParams> {
    let mut m = None;
    let mut t = None;
    let mut p = None;
    for part in value.split(',') {
        let (k, v) = part
            .split_once('=')
            .ok_or_else(|| KeyringError::MalformedArmor(format!("bad kdf-params '{value}'")))?;
        let v: u32 = v
            .trim()
            .parse()
            .map_err(|_| KeyringError::MalformedArmor(format!("bad kdf-params '{value}'")))?;
        match k.trim() {
            "m" => m = Some(v),
            "t" => t = Some(v),
            "p" => p = Some(v),
            other => {
                return Err(KeyringError::MalformedArmor(format!(
                    "unknown kdf parameter '{other}'"
                )))
            }
        }
    }
    match (m, t, p) {
        (Some(m), Some(t), Some(p)) => Ok(KdfParams::new(m, t, p)),
        _ => Err(KeyringError::MalformedArmor(format!(
            "incomplete kdf-params '{value}'"
        ))),
    }
}

fn fixed_hex<const N: usize>(value: &str, what: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(value)
        .map_err(|e| KeyringError::MalformedArmor(format!("invalid {what} hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| KeyringError::MalformedArmor(format!("{what} must be {N} bytes")))
}
