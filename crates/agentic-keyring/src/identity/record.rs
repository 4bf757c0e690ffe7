//! Identity records, the persisted unit of the keybase.
//!
//! A record is keyed by a unique human-chosen name and always carries a
//! public key. [`IdentityKind`] decides which signing strategy applies;
//! every dispatch site matches it exhaustively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::hd::HdPath;
use crate::crypto::keys::PublicKey;
use crate::device::DeviceRef;
use crate::error::{KeyringError, Result};

/// Suffix appended to a name to form its storage key.
pub const INFO_SUFFIX: &str = ".info";

/// Storage key for `name`: `"<name>.info"`.
pub fn storage_key(name: &str) -> Vec<u8> {
    format!("{name}{INFO_SUFFIX}").into_bytes()
}

/// Inverse of [`storage_key`]; `None` for keys outside the namespace.
pub fn name_from_storage_key(key: &[u8]) -> Option<String> {
    std::str::from_utf8(key)
        .ok()?
        .strip_suffix(INFO_SUFFIX)
        .map(str::to_string)
}

/// A named key pair or public-key-only reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub public_key: PublicKey,
    pub kind: IdentityKind,
}

/// Where the private key of an identity lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityKind {
    /// Passphrase-encrypted private-key armor stored with the record.
    /// `None` only for damaged records.
    Local { private_key_armor: Option<String> },
    /// The key never leaves an external signing device.
    Hardware { path: HdPath, device: DeviceRef },
    /// No private key on this host.
    WatchOnly,
}

impl Identity {
    pub fn local(name: impl Into<String>, public_key: PublicKey, private_key_armor: String) -> Self {
        Self {
            name: name.into(),
            public_key,
            kind: IdentityKind::Local {
                private_key_armor: Some(private_key_armor),
            },
        }
    }

    pub fn hardware(
        name: impl Into<String>,
        public_key: PublicKey,
        path: HdPath,
        device: DeviceRef,
    ) -> Self {
        Self {
            name: name.into(),
            public_key,
            kind: IdentityKind::Hardware { path, device },
        }
    }

    pub fn watch_only(name: impl Into<String>, public_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            public_key,
            kind: IdentityKind::WatchOnly,
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self.kind {
            IdentityKind::Local { .. } => KeyType::Local,
            IdentityKind::Hardware { .. } => KeyType::Hardware,
            IdentityKind::WatchOnly => KeyType::WatchOnly,
        }
    }
}

/// Discriminant of [`IdentityKind`], for display and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Local,
    Hardware,
    WatchOnly,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Hardware => "hardware",
            Self::WatchOnly => "watch-only",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Signing algorithms a caller may ask for. Only secp256k1 is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgo {
    Secp256k1,
    Ed25519,
}

impl SigningAlgo {
    pub fn ensure_supported(self) -> Result<()> {
        match self {
            Self::Secp256k1 => Ok(()),
            Self::Ed25519 => Err(KeyringError::UnsupportedAlgorithm),
        }
    }
}

impl FromStr for SigningAlgo {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "secp256k1" => Ok(Self::Secp256k1),
            "ed25519" => Ok(Self::Ed25519),
            _ => Err(KeyringError::UnsupportedAlgorithm),
        }
    }
}

/// BIP39 wordlist languages. Only English is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Japanese,
    Korean,
    Spanish,
    ChineseSimplified,
    ChineseTraditional,
    French,
    Italian,
}

impl Language {
    pub fn ensure_supported(self) -> Result<()> {
        match self {
            Self::English => Ok(()),
            _ => Err(KeyringError::UnsupportedLanguage),
        }
    }
}

impl FromStr for Language {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "japanese" | "ja" => Ok(Self::Japanese),
            "korean" | "ko" => Ok(Self::Korean),
            "spanish" | "es" => Ok(Self::Spanish),
            "chinese-simplified" => Ok(Self::ChineseSimplified),
            "chinese-traditional" => Ok(Self::ChineseTraditional),
            "french" | "fr" => Ok(Self::French),
            "italian" | "it" => Ok(Self::Italian),
            _ => Err(KeyringError::UnsupportedLanguage),
        }
    }
}
