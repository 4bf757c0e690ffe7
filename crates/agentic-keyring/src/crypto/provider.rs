//! The cryptography provider seam.
//!
//! The keybase never calls curve or mnemonic code directly; it goes
//! through a [`CryptoProvider`] injected via
//! [`KeybaseConfig`](crate::config::KeybaseConfig).

use crate::crypto::hd::{self, ExtendedKey, HdPath};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::mnemonic::{self, Mnemonic, Seed};
use crate::crypto::signing;
use crate::error::Result;

/// Deterministic primitives consumed by the derivation pipeline and the
/// local signing path.
pub trait CryptoProvider: Send + Sync {
    /// Fresh mnemonic from OS entropy.
    fn generate_mnemonic(&self, word_count: usize) -> Result<Mnemonic>;

    fn mnemonic_to_seed(&self, mnemonic: &Mnemonic) -> Result<Seed>;

    /// `(masterKey, chainCode)` from a seed.
    fn compute_master(&self, seed: &Seed) -> Result<ExtendedKey>;

    fn derive_child(&self, master: &ExtendedKey, path: &HdPath) -> Result<PrivateKey>;

    fn sign(&self, key: &PrivateKey, message: &[u8]) -> Result<Vec<u8>>;

    fn public_key_of(&self, key: &PrivateKey) -> Result<PublicKey>;
}

/// BIP39 + BIP32 + secp256k1 ECDSA.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Provider;

impl CryptoProvider for Secp256k1Provider {
    fn generate_mnemonic(&self, word_count: usize) -> Result<Mnemonic> {
        mnemonic::generate_mnemonic(word_count)
    }

    fn mnemonic_to_seed(&self, mnemonic: &Mnemonic) -> Result<Seed> {
        mnemonic::mnemonic_to_seed(mnemonic)
    }

    fn compute_master(&self, seed: &Seed) -> Result<ExtendedKey> {
        hd::master_key(seed.as_bytes())
    }

    fn derive_child(&self, master: &ExtendedKey, path: &HdPath) -> Result<PrivateKey> {
        hd::derive_private_key_for_path(master, path)
    }

    fn sign(&self, key: &PrivateKey, message: &[u8]) -> Result<Vec<u8>> {
        signing::sign(key, message)
    }

    fn public_key_of(&self, key: &PrivateKey) -> Result<PublicKey> {
        key.public_key()
    }
}
