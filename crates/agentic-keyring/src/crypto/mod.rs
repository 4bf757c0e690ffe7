//! Cryptographic primitives for AgenticKeyring.
//!
//! This module provides:
//! - secp256k1 key types, ECDSA signing and verification
//! - BIP39 mnemonics and seeds
//! - BIP32 hierarchical derivation and BIP44 paths
//! - Argon2id passphrase-based key derivation
//! - ChaCha20-Poly1305 authenticated encryption
//! - Cryptographically secure random number generation
//! - The [`CryptoProvider`](provider::CryptoProvider) seam tying them together

pub mod encryption;
pub mod hd;
pub mod keys;
pub mod mnemonic;
pub mod provider;
pub mod random;
pub mod signing;
