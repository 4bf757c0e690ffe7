//! secp256k1 key types.
//!
//! [`PrivateKey`] is zeroized on drop and implements neither `Clone` nor
//! `Debug`. [`PublicKey`] is the 33-byte SEC1 compressed point and is
//! validated on construction and deserialization.

use std::fmt;

use k256::ecdsa::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{KeyringError, Result};

/// Length of a raw secp256k1 secret scalar.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length of a compressed SEC1 public key.
pub const PUBLIC_KEY_LEN: usize = 33;

/// A secp256k1 private key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; PRIVATE_KEY_LEN]);

impl PrivateKey {
    /// Reconstruct from raw scalar bytes, rejecting zero and out-of-range
    /// values.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(KeyringError::InvalidKey(format!(
                "private key must be {PRIVATE_KEY_LEN} bytes"
            )));
        }
        SigningKey::from_slice(bytes)
            .map_err(|_| KeyringError::InvalidKey("not a valid secp256k1 scalar".into()))?;
        let mut key = [0u8; PRIVATE_KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Raw scalar bytes.
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.0
    }

    pub(crate) fn signing_key(&self) -> Result<SigningKey> {
        SigningKey::from_slice(&self.0)
            .map_err(|_| KeyringError::InvalidKey("not a valid secp256k1 scalar".into()))
    }

    /// Derive the compressed public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        Ok(PublicKey::from_verifying_key(self.signing_key()?.verifying_key()))
    }
}

/// A compressed secp256k1 public key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Parse SEC1 bytes (compressed or uncompressed); stored compressed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|_| KeyringError::InvalidKey("not a valid secp256k1 public key".into()))?;
        Ok(Self::from_verifying_key(&key))
    }

    /// Parse a hex-encoded SEC1 public key.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| KeyringError::InvalidKey(format!("invalid hex public key: {e}")))?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_verifying_key(key: &VerifyingKey) -> Self {
        Self(key.to_encoded_point(true).as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub(crate) fn verifying_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|_| KeyringError::InvalidKey("not a valid secp256k1 public key".into()))
    }
}

impl TryFrom<Vec<u8>> for PublicKey {
    type Error = KeyringError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(&bytes)
    }
}

impl From<PublicKey> for Vec<u8> {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
