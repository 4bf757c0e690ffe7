//! Hardware signing devices.
//!
//! A hardware-backed identity stores only its public key, derivation path
//! and a [`DeviceRef`]. The private key never leaves the device; the
//! keybase asks the device to sign and the device performs any user
//! confirmation itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::hd::HdPath;
use crate::crypto::keys::PublicKey;
use crate::error::Result;

/// Enough information to re-address the device that holds a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceRef {
    pub device_id: String,
}

impl DeviceRef {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.device_id)
    }
}

/// An external signing peripheral.
///
/// Calls block on device I/O; the keybase bounds them with the configured
/// device timeout. Implementations report handshake or transport failures
/// as [`KeyringError::DeviceUnavailable`](crate::error::KeyringError::DeviceUnavailable).
pub trait HardwareDevice: Send + Sync {
    /// Identity of the connected device.
    fn device_ref(&self) -> DeviceRef;

    /// Public key at `path`. Requires a round trip to the device.
    fn query_public_key(&self, path: &HdPath) -> Result<PublicKey>;

    /// Sign `message` with the key at `path`.
    fn sign(&self, path: &HdPath, message: &[u8]) -> Result<Vec<u8>>;
}
