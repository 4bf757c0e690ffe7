//! Derivation pipeline: words → seed → master key → child key.
//!
//! Intermediates are dropped (and zeroized) as soon as the next stage has
//! consumed them; only the child [`PrivateKey`] leaves this module.

use crate::armor;
use crate::crypto::hd::HdPath;
use crate::crypto::keys::PrivateKey;
use crate::crypto::mnemonic::Mnemonic;
use crate::crypto::provider::CryptoProvider;
use crate::error::Result;
use crate::identity::Identity;
use crate::keybase::Keybase;

/// Derive the private key at `path` from `mnemonic`. Deterministic.
pub fn derive_key(
    provider: &dyn CryptoProvider,
    mnemonic: &Mnemonic,
    path: &HdPath,
) -> Result<PrivateKey> {
    let seed = provider.mnemonic_to_seed(mnemonic)?;
    let master = provider.compute_master(&seed)?;
    drop(seed);
    provider.derive_child(&master, path)
}

impl Keybase {
    /// Run the pipeline and persist the result under `name`.
    ///
    /// A non-empty passphrase yields a Local record holding the encrypted
    /// key; an empty one yields a WatchOnly record of the derived public key.
    /// Nothing is written unless every earlier step succeeded.
    pub(super) fn persist_derived(
        &self,
        name: &str,
        mnemonic: &Mnemonic,
        passphrase: &str,
        path: &HdPath,
    ) -> Result<Identity> {
        let provider = self.config.provider.as_ref();
        let key = derive_key(provider, mnemonic, path)?;
        let public_key = provider.public_key_of(&key)?;

        let identity = if passphrase.is_empty() {
            Identity::watch_only(name, public_key)
        } else {
            let armor = armor::encrypt_armor_private_key(&key, passphrase, &self.config.kdf)?;
            Identity::local(name, public_key, armor)
        };
        drop(key);

        self.write_identity(&identity)?;
        log::info!(
            "stored {} key '{}' derived at {}",
            identity.key_type(),
            name,
            path
        );
        Ok(identity)
    }
}
