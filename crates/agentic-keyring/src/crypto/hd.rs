//! BIP32 hierarchical deterministic key derivation over secp256k1.
//!
//! # Derivation path format
//!
//! ```text
//! m/44'/118'/0'/0'/0'
//! ```
//!
//! The leading `m/` is optional. A `'` or `h` suffix marks a hardened
//! index. Both hardened and normal children are supported.
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki>

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, Scalar};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::keys::PrivateKey;
use crate::error::{KeyringError, Result};

type HmacSha512 = Hmac<Sha512>;

/// The hardened index offset (0x80000000).
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// HMAC key for master key generation.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// BIP44 purpose constant.
pub const BIP44_PURPOSE: u32 = 44;

/// Coin type of the fundraiser path.
pub const FUNDRAISER_COIN_TYPE: u32 = 118;

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// One path segment, with the hardened bit folded into the raw index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildNumber(u32);

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(KeyringError::InvalidPath(format!(
                "index {index} out of range"
            )));
        }
        Ok(Self(index))
    }

    pub fn hardened(index: u32) -> Result<Self> {
        Self::normal(index).map(|c| Self(c.0 | HARDENED_OFFSET))
    }

    pub fn is_hardened(&self) -> bool {
        self.0 & HARDENED_OFFSET != 0
    }

    /// Index without the hardened bit.
    pub fn index(&self) -> u32 {
        self.0 & !HARDENED_OFFSET
    }

    fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hardened() {
            write!(f, "{}'", self.index())
        } else {
            write!(f, "{}", self.index())
        }
    }
}

/// A BIP32 derivation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdPath(Vec<ChildNumber>);

impl HdPath {
    pub fn new(segments: Vec<ChildNumber>) -> Result<Self> {
        if segments.is_empty() {
            return Err(KeyringError::InvalidPath(
                "path must contain at least one segment".into(),
            ));
        }
        Ok(Self(segments))
    }

    /// The default path `m/44'/118'/0'/0'/0'`, hardened at every segment.
    pub fn fundraiser() -> Self {
        Self(vec![
            ChildNumber(BIP44_PURPOSE | HARDENED_OFFSET),
            ChildNumber(FUNDRAISER_COIN_TYPE | HARDENED_OFFSET),
            ChildNumber(HARDENED_OFFSET),
            ChildNumber(HARDENED_OFFSET),
            ChildNumber(HARDENED_OFFSET),
        ])
    }

    pub fn segments(&self) -> &[ChildNumber] {
        &self.0
    }
}

impl fmt::Display for HdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for HdPath {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix("m/").unwrap_or(trimmed);
        if body.is_empty() || body == "m" {
            return Err(KeyringError::InvalidPath(
                "path must contain at least one segment".into(),
            ));
        }

        let mut segments = Vec::new();
        for part in body.split('/') {
            let (digits, hardened) = match part
                .strip_suffix('\'')
                .or_else(|| part.strip_suffix('h'))
            {
                Some(d) => (d, true),
                None => (part, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| KeyringError::InvalidPath(format!("invalid segment '{part}' in '{s}'")))?;
            segments.push(if hardened {
                ChildNumber::hardened(index)?
            } else {
                ChildNumber::normal(index)?
            });
        }
        Self::new(segments)
    }
}

/// BIP44 parameters: `purpose'/coin_type'/account'/change/address_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bip44Params {
    pub purpose: u32,
    pub coin_type: u32,
    pub account: u32,
    pub change: bool,
    pub address_index: u32,
}

impl Bip44Params {
    pub fn new(coin_type: u32, account: u32, change: bool, address_index: u32) -> Self {
        Self {
            purpose: BIP44_PURPOSE,
            coin_type,
            account,
            change,
            address_index,
        }
    }

    /// Purpose, coin type and account hardened; change and index normal.
    pub fn to_path(&self) -> Result<HdPath> {
        HdPath::new(vec![
            ChildNumber::hardened(self.purpose)?,
            ChildNumber::hardened(self.coin_type)?,
            ChildNumber::hardened(self.account)?,
            ChildNumber::normal(u32::from(self.change))?,
            ChildNumber::normal(self.address_index)?,
        ])
    }
}

impl fmt::Display for Bip44Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}'/{}'/{}'/{}/{}",
            self.purpose,
            self.coin_type,
            self.account,
            u32::from(self.change),
            self.address_index
        )
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A private key together with its chain code. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ExtendedKey {
    key: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    pub fn key_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    fn from_hmac(output: &[u8; 64]) -> Self {
        let mut key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        key.copy_from_slice(&output[..32]);
        chain_code.copy_from_slice(&output[32..]);
        Self { key, chain_code }
    }
}

/// Compute the master key and chain code: `HMAC-SHA512("Bitcoin seed", seed)`.
pub fn master_key(seed: &[u8]) -> Result<ExtendedKey> {
    let output = hmac_sha512(MASTER_HMAC_KEY, seed)?;
    let master = ExtendedKey::from_hmac(&output);
    scalar_from_bytes(&master.key)
        .filter(|s| *s != Scalar::ZERO)
        .ok_or_else(|| KeyringError::DerivationFailed("invalid master key".into()))?;
    Ok(master)
}

/// CKDpriv: derive one child from a parent extended key.
pub fn derive_child(parent: &ExtendedKey, child: ChildNumber) -> Result<ExtendedKey> {
    let mut data = Zeroizing::new(Vec::with_capacity(37));
    if child.is_hardened() {
        data.push(0x00);
        data.extend_from_slice(&parent.key);
    } else {
        let public = PrivateKey::from_bytes(&parent.key)?.public_key()?;
        data.extend_from_slice(public.as_bytes());
    }
    data.extend_from_slice(&child.raw().to_be_bytes());

    let output = hmac_sha512(&parent.chain_code, &data)?;
    let tweak = scalar_from_bytes(&output[..32])
        .ok_or_else(|| KeyringError::DerivationFailed(format!("invalid child {child}")))?;
    let parent_scalar = scalar_from_bytes(&parent.key)
        .ok_or_else(|| KeyringError::DerivationFailed("invalid parent key".into()))?;

    let child_scalar = tweak + parent_scalar;
    if child_scalar == Scalar::ZERO {
        return Err(KeyringError::DerivationFailed(format!(
            "child {child} is zero"
        )));
    }

    let mut derived = ExtendedKey::from_hmac(&output);
    derived.key.copy_from_slice(&child_scalar.to_repr());
    Ok(derived)
}

/// Walk `path` from `master` and return the final private key.
///
/// Intermediate extended keys are dropped (and zeroized) as soon as the
/// next level exists.
pub fn derive_private_key_for_path(master: &ExtendedKey, path: &HdPath) -> Result<PrivateKey> {
    let mut segments = path.segments().iter();
    let first = segments
        .next()
        .ok_or_else(|| KeyringError::InvalidPath("empty path".into()))?;
    let mut current = derive_child(master, *first)?;
    for segment in segments {
        current = derive_child(&current, *segment)?;
    }
    PrivateKey::from_bytes(&current.key)
}

fn scalar_from_bytes(bytes: &[u8]) -> Option<Scalar> {
    Option::from(Scalar::from_repr(*FieldBytes::from_slice(bytes)))
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<Zeroizing<[u8; 64]>> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| KeyringError::DerivationFailed(format!("HMAC-SHA512 init: {e}")))?;
    mac.update(data);
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}
