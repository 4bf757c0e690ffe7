//! Secure random material for salts, nonces and mnemonic entropy.
//!
//! Draws from the operating system's CSPRNG via `rand::rngs::OsRng`.

use rand::rngs::OsRng;
use rand::RngCore;

/// Generate a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// 12-byte nonce for ChaCha20-Poly1305.
pub fn random_nonce_12() -> [u8; 12] {
    random_bytes()
}

/// 16-byte Argon2id salt.
pub fn random_salt_16() -> [u8; 16] {
    random_bytes()
}

/// 32 bytes of entropy, enough for a 24-word mnemonic. Caller zeroizes.
pub fn random_entropy_32() -> [u8; 32] {
    random_bytes()
}
