//! AgenticKeyring — passphrase-protected keybase for agent identities.
//!
//! Creates identities from fresh or recovered BIP39 mnemonics, derives
//! secp256k1 keys along BIP32 paths, keeps private keys encrypted at rest,
//! and signs through local keys, hardware devices or an offline operator.
//! Identities move between hosts as ASCII armor.

pub mod armor;
pub mod config;
pub mod crypto;
pub mod device;
pub mod error;
pub mod identity;
pub mod keybase;
pub mod signer;
pub mod storage;
pub mod timeout;

// Re-export primary types
pub use config::{KeybaseConfig, KeyringSettings};
pub use error::{KeyringError, Result};
pub use identity::{Identity, IdentityKind, KeyType, Language, SigningAlgo};
pub use keybase::{Keybase, DELETE_CONFIRMATION};

// Re-export key material and paths
pub use crypto::encryption::KdfParams;
pub use crypto::hd::{Bip44Params, HdPath};
pub use crypto::keys::{PrivateKey, PublicKey};
pub use crypto::mnemonic::Mnemonic;
pub use crypto::signing::{signature_from_base64, signature_to_base64, verify};

// Re-export extension seams
pub use device::{DeviceRef, HardwareDevice};
pub use signer::{ChannelSigner, ConsoleSigner, OfflineSigner, OperatorInbox, PendingSignature, SignRequest};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
