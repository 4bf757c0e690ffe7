//! Symmetric encryption using ChaCha20-Poly1305 and passphrase-based
//! key derivation using Argon2id.
//!
//! Used by the private-key armor to encrypt key material at rest.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::random::{random_nonce_12, random_salt_16};
use crate::error::{KeyringError, Result};

/// Argon2id cost parameters.
///
/// Stored in every private-key armor header so that a store tuned for
/// fast tests or slow hardware stays decodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Iterations.
    pub t_cost: u32,
    /// Parallel lanes.
    pub p_cost: u32,
}

impl KdfParams {
    /// Upper bounds accepted when reading parameters back from armor.
    pub const MAX_M_COST: u32 = 1 << 21; // 2 GiB
    pub const MAX_T_COST: u32 = 64;
    pub const MAX_P_COST: u32 = 64;

    pub const fn new(m_cost: u32, t_cost: u32, p_cost: u32) -> Self {
        Self {
            m_cost,
            t_cost,
            p_cost,
        }
    }

    /// Reject parameters an attacker could use to exhaust memory on decode,
    /// and anything Argon2 itself refuses (m < 8p, t = 0, p = 0).
    pub fn check_bounds(&self) -> Result<()> {
        let too_large = self.m_cost > Self::MAX_M_COST
            || self.t_cost > Self::MAX_T_COST
            || self.p_cost > Self::MAX_P_COST;
        let too_small = self.t_cost == 0
            || self.p_cost == 0
            || u64::from(self.m_cost) < 8 * u64::from(self.p_cost);
        if too_large || too_small {
            return Err(KeyringError::MalformedArmor(format!(
                "kdf parameters out of range: m={},t={},p={}",
                self.m_cost, self.t_cost, self.p_cost
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    /// 64 MiB, 3 iterations, 4 lanes.
    fn default() -> Self {
        Self::new(65536, 3, 4)
    }
}

/// Derive a 32-byte encryption key from a passphrase and salt using Argon2id.
pub fn derive_passphrase_key(
    passphrase: &[u8],
    salt: &[u8; 16],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>> {
    let params = Params::new(kdf.m_cost, kdf.t_cost, kdf.p_cost, Some(32))
        .map_err(|e| KeyringError::DerivationFailed(format!("Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase, salt, &mut output[..])
        .map_err(|e| KeyringError::DerivationFailed(format!("Argon2 hash: {e}")))?;

    Ok(output)
}

/// Encrypt plaintext with ChaCha20-Poly1305 under a caller-chosen nonce.
///
/// Returns ciphertext with the 16-byte tag appended.
pub fn encrypt(key: &[u8; 32], nonce: &[u8; 12], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| KeyringError::EncryptionFailed(format!("cipher init: {e}")))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| KeyringError::EncryptionFailed(format!("encrypt: {e}")))
}

/// Decrypt and authenticate ciphertext with ChaCha20-Poly1305.
///
/// Every failure collapses into [`KeyringError::DecryptionFailed`].
pub fn decrypt(key: &[u8; 32], nonce: &[u8; 12], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let cipher =
        ChaCha20Poly1305::new_from_slice(key).map_err(|_| KeyringError::DecryptionFailed)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| KeyringError::DecryptionFailed)
}

/// Output of [`encrypt_with_passphrase`].
pub struct Sealed {
    pub salt: [u8; 16],
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

/// Encrypt data with a passphrase under a fresh salt and nonce.
pub fn encrypt_with_passphrase(
    passphrase: &[u8],
    plaintext: &[u8],
    kdf: &KdfParams,
) -> Result<Sealed> {
    let salt = random_salt_16();
    let nonce = random_nonce_12();
    let key = derive_passphrase_key(passphrase, &salt, kdf)?;
    let ciphertext = encrypt(&key, &nonce, plaintext)?;
    Ok(Sealed {
        salt,
        nonce,
        ciphertext,
    })
}

/// Decrypt data with a passphrase.
pub fn decrypt_with_passphrase(
    passphrase: &[u8],
    sealed: &Sealed,
    kdf: &KdfParams,
) -> Result<Zeroizing<Vec<u8>>> {
    let key = derive_passphrase_key(passphrase, &sealed.salt, kdf)?;
    decrypt(&key, &sealed.nonce, &sealed.ciphertext)
}
