//! Signing dispatcher.
//!
//! One branch per [`IdentityKind`]; each branch is independent:
//!
//! - **Local**: decrypt the stored armor with the passphrase, sign, drop the
//!   key before returning.
//! - **Hardware**: re-address the device named by the record and have it
//!   sign under the configured device timeout.
//! - **WatchOnly**: hand the message to the offline signer and wait for the
//!   operator's base64 reply.

use crate::crypto::hd::HdPath;
use crate::crypto::keys::PublicKey;
use crate::crypto::signing;
use crate::device::DeviceRef;
use crate::error::{KeyringError, Result};
use crate::identity::{Identity, IdentityKind};
use crate::keybase::Keybase;
use crate::signer::SignRequest;

impl Keybase {
    /// Sign `message` with the identity stored under `name`.
    ///
    /// Returns the 64-byte compact signature and the public key it verifies
    /// under. `passphrase` is only consulted for Local identities.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no identity is stored under `name`.
    /// - Local: `NoPrivateKeyMaterial`, `WrongPassphrase`.
    /// - Hardware: `DeviceUnavailable`, `DeviceTimeout`.
    /// - WatchOnly: `NoOfflineSigner`, `Cancelled`, `Timeout`,
    ///   `MalformedSignature`.
    pub fn sign(&self, name: &str, passphrase: &str, message: &[u8]) -> Result<(Vec<u8>, PublicKey)> {
        let identity = self.lookup(name)?;
        let Identity {
            name,
            public_key,
            kind,
        } = identity;

        match kind {
            IdentityKind::Local { private_key_armor } => {
                log::debug!("signing with local key '{name}'");
                self.sign_local(&name, private_key_armor.as_deref(), passphrase, message)
            }
            IdentityKind::Hardware { path, device } => {
                log::debug!("signing with hardware key '{name}' on {device}");
                let signature = self.sign_on_device(&device, path, message)?;
                Ok((signature, public_key))
            }
            IdentityKind::WatchOnly => {
                log::debug!("requesting offline signature for '{name}'");
                let signature = self.sign_offline(name, public_key.clone(), message)?;
                Ok((signature, public_key))
            }
        }
    }

    fn sign_local(
        &self,
        name: &str,
        armor: Option<&str>,
        passphrase: &str,
        message: &[u8],
    ) -> Result<(Vec<u8>, PublicKey)> {
        let key = self.unlock(name, armor, passphrase)?;
        let provider = self.config.provider.as_ref();
        let signature = provider.sign(&key, message)?;
        let public_key = provider.public_key_of(&key)?;
        Ok((signature, public_key))
    }

    fn sign_on_device(&self, device: &DeviceRef, path: HdPath, message: &[u8]) -> Result<Vec<u8>> {
        let connected = self.connected_device()?.device_ref();
        if connected != *device {
            return Err(KeyringError::DeviceUnavailable(format!(
                "key lives on device {device}, connected device is {connected}"
            )));
        }
        let message = message.to_vec();
        self.device_call(move |d| d.sign(&path, &message))
    }

    fn sign_offline(&self, name: String, public_key: PublicKey, message: &[u8]) -> Result<Vec<u8>> {
        let signer = self
            .config
            .offline_signer
            .as_ref()
            .ok_or(KeyringError::NoOfflineSigner)?;
        let reply = signer.request_signature(SignRequest {
            name,
            public_key,
            message: message.to_vec(),
        })?;
        signing::signature_from_base64(&reply)
    }
}
