//! The keybase: a named store of identities.
//!
//! [`Keybase`] creates identities from fresh or recovered mnemonics,
//! registers hardware-backed and watch-only identities, signs through the
//! per-variant dispatcher, and moves identities in and out as armored text.
//!
//! Every creating operation validates, derives and encrypts before its
//! single write, so a failure never leaves a record behind. Names are
//! unique: creating over an occupied name fails with `AlreadyExists`.
//!
//! # Modules
//!
//! - [`derive`]: the words → seed → master → child pipeline.
//! - `sign`: the signing dispatcher.

pub mod derive;
mod sign;

use std::path::PathBuf;
use std::sync::Arc;

use crate::armor;
use crate::config::KeybaseConfig;
use crate::crypto::hd::HdPath;
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::mnemonic::{Mnemonic, FRESH_WORD_COUNT};
use crate::device::HardwareDevice;
use crate::error::{KeyringError, Result};
use crate::identity::{
    name_from_storage_key, storage_key, Identity, IdentityKind, Language, SigningAlgo,
};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::timeout::{run_with_timeout, WaitError};

/// Literal token that authorizes deleting a key with no passphrase.
pub const DELETE_CONFIRMATION: &str = "yes";

/// A named store of identities over a [`KeyValueStore`].
pub struct Keybase {
    store: Arc<dyn KeyValueStore>,
    config: KeybaseConfig,
}

impl Keybase {
    pub fn new(store: Arc<dyn KeyValueStore>, config: KeybaseConfig) -> Self {
        Self { store, config }
    }

    /// A keybase that lives only as long as the process.
    pub fn in_memory(config: KeybaseConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    /// A keybase persisted under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>, config: KeybaseConfig) -> Result<Self> {
        let store = FileStore::new(dir)?;
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn config(&self) -> &KeybaseConfig {
        &self.config
    }

    // ── Creation ──────────────────────────────────────────────────────────────

    /// Create an identity from fresh entropy.
    ///
    /// Derives at the fundraiser path from a new 24-word mnemonic. The
    /// mnemonic is returned once and never stored; it is the caller's only
    /// chance to record it.
    pub fn create_mnemonic(
        &self,
        name: &str,
        language: Language,
        passphrase: &str,
        algo: SigningAlgo,
    ) -> Result<(Identity, Mnemonic)> {
        language.ensure_supported()?;
        algo.ensure_supported()?;
        self.ensure_vacant(name)?;

        let mnemonic = self.config.provider.generate_mnemonic(FRESH_WORD_COUNT)?;
        let identity = self.persist_derived(name, &mnemonic, passphrase, &HdPath::fundraiser())?;
        Ok((identity, mnemonic))
    }

    /// Recover an identity from a 12 or 24 word mnemonic at the fundraiser
    /// path.
    pub fn restore_from_mnemonic(&self, name: &str, words: &str, passphrase: &str) -> Result<Identity> {
        let mnemonic = parse_with_length(words, &[12, 24], "12 or 24")?;
        self.ensure_vacant(name)?;
        self.persist_derived(name, &mnemonic, passphrase, &HdPath::fundraiser())
    }

    /// Recover a 12-word fundraiser identity.
    pub fn restore_fundraiser(&self, name: &str, words: &str, passphrase: &str) -> Result<Identity> {
        let mnemonic = parse_with_length(words, &[12], "12")?;
        self.ensure_vacant(name)?;
        self.persist_derived(name, &mnemonic, passphrase, &HdPath::fundraiser())
    }

    /// Recover an identity at an arbitrary HD path.
    ///
    /// Accepts any valid BIP39 mnemonic length. Use
    /// [`Bip44Params::to_path`](crate::crypto::hd::Bip44Params::to_path) to
    /// build `path` from BIP44 parameters.
    pub fn derive_at_path(
        &self,
        name: &str,
        words: &str,
        passphrase: &str,
        path: &HdPath,
    ) -> Result<Identity> {
        let mnemonic = Mnemonic::parse(words)?;
        self.ensure_vacant(name)?;
        self.persist_derived(name, &mnemonic, passphrase, path)
    }

    /// Register a key held on the connected hardware device.
    ///
    /// Queries the device for the public key at `path`; nothing is signed.
    pub fn register_hardware(&self, name: &str, path: &HdPath, algo: SigningAlgo) -> Result<Identity> {
        algo.ensure_supported()?;
        self.ensure_vacant(name)?;

        let device = self.connected_device()?.device_ref();
        let query_path = path.clone();
        let public_key = self.device_call(move |d| d.query_public_key(&query_path))?;

        let identity = Identity::hardware(name, public_key, path.clone(), device);
        self.write_identity(&identity)?;
        log::info!("registered hardware key '{name}' at {path}");
        Ok(identity)
    }

    /// Register a public key with no private material on this host.
    pub fn register_watch_only(&self, name: &str, public_key: PublicKey) -> Result<Identity> {
        self.ensure_vacant(name)?;
        let identity = Identity::watch_only(name, public_key);
        self.write_identity(&identity)?;
        log::info!("registered watch-only key '{name}'");
        Ok(identity)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Every identity, ascending by name. A fresh snapshot on each call.
    pub fn list(&self) -> Result<Vec<Identity>> {
        let mut identities = Vec::new();
        for (key, value) in self.store.iterate()? {
            if name_from_storage_key(&key).is_none() {
                continue;
            }
            identities.push(self.config.codec.decode(&value)?);
        }
        // "a-b.info" sorts before "a.info", so key order is not name order
        identities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(identities)
    }

    /// # Errors
    ///
    /// Returns `KeyringError::NotFound` if no identity has this name.
    pub fn lookup(&self, name: &str) -> Result<Identity> {
        self.read_identity(name)?
            .ok_or_else(|| KeyringError::NotFound(name.to_string()))
    }

    // ── Export / import ───────────────────────────────────────────────────────

    /// Armor the full record. A Local record still carries only its
    /// encrypted private key, so the armor is safe to move between hosts
    /// and the original passphrase unlocks it after import.
    pub fn export(&self, name: &str) -> Result<String> {
        let identity = self.lookup(name)?;
        let bytes = self.config.codec.encode(&identity)?;
        Ok(armor::armor_info_bytes(&bytes))
    }

    /// Store an armored record under `name`, which replaces the exported
    /// name.
    pub fn import(&self, name: &str, armor_text: &str) -> Result<Identity> {
        self.ensure_vacant(name)?;
        let bytes = armor::unarmor_info_bytes(armor_text)?;
        let mut identity = self.config.codec.decode(&bytes)?;
        identity.name = name.to_string();
        self.write_identity(&identity)?;
        log::info!("imported {} key '{name}'", identity.key_type());
        Ok(identity)
    }

    pub fn export_public(&self, name: &str) -> Result<String> {
        let identity = self.lookup(name)?;
        Ok(armor::armor_public_key(&identity.public_key))
    }

    /// Store an armored public key under `name` as a watch-only identity.
    pub fn import_public(&self, name: &str, armor_text: &str) -> Result<Identity> {
        self.ensure_vacant(name)?;
        let public_key = armor::unarmor_public_key(armor_text)?;
        let identity = Identity::watch_only(name, public_key);
        self.write_identity(&identity)?;
        log::info!("imported public key '{name}'");
        Ok(identity)
    }

    /// Decrypt and hand out the private key of a Local identity.
    pub fn export_private_key(&self, name: &str, passphrase: &str) -> Result<PrivateKey> {
        let identity = self.lookup(name)?;
        match &identity.kind {
            IdentityKind::Local { private_key_armor } => {
                self.unlock(name, private_key_armor.as_deref(), passphrase)
            }
            IdentityKind::Hardware { .. } | IdentityKind::WatchOnly => {
                Err(KeyringError::WrongKeyType {
                    operation: "exporting a private key",
                })
            }
        }
    }

    // ── Maintenance ───────────────────────────────────────────────────────────

    /// Re-encrypt a Local identity under a new passphrase.
    ///
    /// `new_passphrase` is only consulted after `old_passphrase` has been
    /// verified.
    pub fn rotate_passphrase<F>(&self, name: &str, old_passphrase: &str, new_passphrase: F) -> Result<()>
    where
        F: FnOnce() -> Result<String>,
    {
        let identity = self.lookup(name)?;
        let armor_text = match &identity.kind {
            IdentityKind::Local { private_key_armor } => private_key_armor.as_deref(),
            IdentityKind::Hardware { .. } | IdentityKind::WatchOnly => {
                return Err(KeyringError::WrongKeyType {
                    operation: "changing the passphrase",
                })
            }
        };

        let key = self.unlock(name, armor_text, old_passphrase)?;
        let new_passphrase = zeroize::Zeroizing::new(new_passphrase()?);
        if new_passphrase.is_empty() {
            return Err(KeyringError::EmptyPassphrase);
        }
        let armor_text = armor::encrypt_armor_private_key(&key, &new_passphrase, &self.config.kdf)?;
        drop(key);

        let updated = Identity::local(identity.name, identity.public_key, armor_text);
        self.write_identity(&updated)?;
        log::info!("changed passphrase of '{name}'");
        Ok(())
    }

    /// Remove an identity.
    ///
    /// A Local identity needs its passphrase. Hardware and watch-only
    /// identities, and Local records without key material, need the literal
    /// [`DELETE_CONFIRMATION`].
    pub fn delete(&self, name: &str, passphrase_or_confirmation: &str) -> Result<()> {
        let identity = self.lookup(name)?;
        match &identity.kind {
            IdentityKind::Local {
                private_key_armor: Some(armor_text),
            } => {
                // proves knowledge of the passphrase; key dropped immediately
                self.unlock(name, Some(armor_text), passphrase_or_confirmation)?;
            }
            IdentityKind::Local {
                private_key_armor: None,
            }
            | IdentityKind::Hardware { .. }
            | IdentityKind::WatchOnly => {
                if passphrase_or_confirmation != DELETE_CONFIRMATION {
                    return Err(KeyringError::ConfirmationRequired);
                }
            }
        }

        self.store.delete_durable(&storage_key(name))?;
        log::info!("deleted {} key '{name}'", identity.key_type());
        Ok(())
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn ensure_vacant(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.store.get(&storage_key(name))?.is_some() {
            return Err(KeyringError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    fn read_identity(&self, name: &str) -> Result<Option<Identity>> {
        match self.store.get(&storage_key(name))? {
            Some(bytes) => Ok(Some(self.config.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_identity(&self, identity: &Identity) -> Result<()> {
        let bytes = self.config.codec.encode(identity)?;
        self.store.set_durable(&storage_key(&identity.name), &bytes)
    }

    /// Decrypt a Local key. Any decryption failure is a wrong passphrase.
    fn unlock(&self, name: &str, armor_text: Option<&str>, passphrase: &str) -> Result<PrivateKey> {
        let armor_text =
            armor_text.ok_or_else(|| KeyringError::NoPrivateKeyMaterial(name.to_string()))?;
        armor::unarmor_decrypt_private_key(armor_text, passphrase).map_err(|e| match e {
            KeyringError::DecryptionFailed => KeyringError::WrongPassphrase,
            other => other,
        })
    }

    fn connected_device(&self) -> Result<Arc<dyn HardwareDevice>> {
        self.config
            .device
            .clone()
            .ok_or_else(|| KeyringError::DeviceUnavailable("no hardware device connected".into()))
    }

    /// Run a device call bounded by the configured device timeout.
    fn device_call<T, F>(&self, call: F) -> Result<T>
    where
        F: FnOnce(&dyn HardwareDevice) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let device = self.connected_device()?;
        let limit = self.config.device_timeout;
        match run_with_timeout(limit, move || call(device.as_ref())) {
            Ok(result) => result,
            Err(WaitError::Elapsed) => Err(KeyringError::DeviceTimeout(limit)),
            Err(WaitError::Aborted) => Err(KeyringError::DeviceUnavailable(
                "device call aborted".into(),
            )),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(KeyringError::InvalidName("name must not be empty".into()));
    }
    if name.chars().any(char::is_control) {
        return Err(KeyringError::InvalidName(
            "name must not contain control characters".into(),
        ));
    }
    Ok(())
}

/// Parse `words`, requiring one of the `allowed` word counts.
fn parse_with_length(words: &str, allowed: &[usize], expected: &'static str) -> Result<Mnemonic> {
    let actual = words.split_whitespace().count();
    if !allowed.contains(&actual) {
        return Err(KeyringError::InvalidMnemonicLength { expected, actual });
    }
    Mnemonic::parse(words)
}
