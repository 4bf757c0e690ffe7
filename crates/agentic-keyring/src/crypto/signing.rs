//! secp256k1 ECDSA signing and verification.
//!
//! Signatures are 64-byte compact `r || s` over SHA-256 of the message,
//! deterministic (RFC 6979) and low-S normalized.

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::Signature;

use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::error::{KeyringError, Result};

/// Length of a compact signature.
pub const SIGNATURE_LEN: usize = 64;

/// Sign a message with a secp256k1 private key.
pub fn sign(key: &PrivateKey, message: &[u8]) -> Result<Vec<u8>> {
    let signing_key = key.signing_key()?;
    let signature: Signature = signing_key.sign(message);
    Ok(signature.to_bytes().to_vec())
}

/// Verify a compact signature against a public key and message.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let signature = parse_signature(signature)?;
    public_key
        .verifying_key()?
        .verify(message, &signature)
        .map_err(|_| KeyringError::MalformedSignature("signature does not verify".into()))
}

/// Encode a signature the way operators hand them back for offline keys.
pub fn signature_to_base64(signature: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, signature)
}

/// Decode an operator-supplied base64 signature, checking its shape.
pub fn signature_from_base64(encoded: &str) -> Result<Vec<u8>> {
    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded.trim())
        .map_err(|e| KeyringError::MalformedSignature(format!("invalid base64: {e}")))?;
    parse_signature(&bytes)?;
    Ok(bytes)
}

fn parse_signature(bytes: &[u8]) -> Result<Signature> {
    if bytes.len() != SIGNATURE_LEN {
        return Err(KeyringError::MalformedSignature(format!(
            "signature must be {SIGNATURE_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Signature::from_slice(bytes)
        .map_err(|_| KeyringError::MalformedSignature("invalid r or s".into()))
}
