//! Error types for AgenticKeyring.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key material and passphrases are never included in error
//! messages.

use std::time::Duration;

/// Keyring error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyringError {
    #[error("unsupported language: only english is supported")]
    UnsupportedLanguage,

    #[error("unsupported signing algo: only secp256k1 is supported")]
    UnsupportedAlgorithm,

    #[error("recovering only works with {expected} word mnemonics, got: {actual} words")]
    InvalidMnemonicLength { expected: &'static str, actual: usize },

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Passphrase must not be empty")]
    EmptyPassphrase,

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key {0} not found")]
    NotFound(String),

    #[error("Cannot overwrite data for name {0}")]
    AlreadyExists(String),

    #[error("Wrong passphrase")]
    WrongPassphrase,

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("{operation} requires a locally stored key")]
    WrongKeyType { operation: &'static str },

    #[error("Private key not available for {0}")]
    NoPrivateKeyMaterial(String),

    #[error("Enter 'yes' exactly to delete the key - this cannot be undone")]
    ConfirmationRequired,

    #[error("Signing device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Signing device did not respond within {0:?}")]
    DeviceTimeout(Duration),

    #[error("No offline signer configured")]
    NoOfflineSigner,

    #[error("Malformed armor: {0}")]
    MalformedArmor(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signing request cancelled")]
    Cancelled,

    #[error("No signature supplied within {0:?}")]
    Timeout(Duration),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeyringError {
    /// Whether this error rejects caller input before any work was done.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLanguage
                | Self::UnsupportedAlgorithm
                | Self::InvalidMnemonicLength { .. }
                | Self::InvalidMnemonic(_)
                | Self::InvalidPath(_)
                | Self::EmptyPassphrase
                | Self::InvalidName(_)
                | Self::InvalidKey(_)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, KeyringError>;
