//! BIP39 mnemonic generation, validation, and seed derivation.
//!
//! Wraps the `bip39` crate with zeroizing containers. Only the English
//! wordlist is supported.

use bip39::Language as Bip39Language;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::random::random_entropy_32;
use crate::error::{KeyringError, Result};

/// Word count of freshly generated mnemonics.
pub const FRESH_WORD_COUNT: usize = 24;

/// A BIP39 mnemonic phrase, space separated.
///
/// Zeroized on drop. Does not implement `Clone` or `Debug`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic(String);

impl Mnemonic {
    /// Parse and checksum-validate a phrase, normalizing whitespace.
    pub fn parse(phrase: &str) -> Result<Self> {
        let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        bip39::Mnemonic::parse_in_normalized(Bip39Language::English, &normalized)
            .map_err(|e| KeyringError::InvalidMnemonic(e.to_string()))?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn words(&self) -> Vec<&str> {
        self.0.split_whitespace().collect()
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

/// A 64-byte BIP39 seed. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Generate a fresh English mnemonic of `word_count` words.
pub fn generate_mnemonic(word_count: usize) -> Result<Mnemonic> {
    let entropy_len = match word_count {
        12 => 16,
        15 => 20,
        18 => 24,
        21 => 28,
        24 => 32,
        actual => {
            return Err(KeyringError::InvalidMnemonicLength {
                expected: "12, 15, 18, 21 or 24",
                actual,
            })
        }
    };

    let mut entropy = random_entropy_32();
    let result = bip39::Mnemonic::from_entropy_in(Bip39Language::English, &entropy[..entropy_len])
        .map(|m| Mnemonic(m.to_string()))
        .map_err(|e| KeyringError::DerivationFailed(format!("mnemonic from entropy: {e}")));
    entropy.zeroize();
    result
}

/// PBKDF2-HMAC-SHA512 seed with an empty auxiliary phrase.
pub fn mnemonic_to_seed(mnemonic: &Mnemonic) -> Result<Seed> {
    let parsed = bip39::Mnemonic::parse_in_normalized(Bip39Language::English, mnemonic.as_str())
        .map_err(|e| KeyringError::InvalidMnemonic(e.to_string()))?;
    Ok(Seed(parsed.to_seed_normalized("")))
}
