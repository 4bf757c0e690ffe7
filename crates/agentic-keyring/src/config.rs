//! Keybase configuration.
//!
//! [`KeybaseConfig`] is the injected bundle a [`Keybase`](crate::keybase::Keybase)
//! is built with: record codec, cryptography provider, optional hardware
//! device, optional offline signer, KDF parameters and timeouts. There is no
//! process-wide registry; two keybases in one process can be configured
//! differently.
//!
//! [`KeyringSettings`] is the serializable subset a CLI reads from disk.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::encryption::KdfParams;
use crate::crypto::provider::{CryptoProvider, Secp256k1Provider};
use crate::device::HardwareDevice;
use crate::error::{KeyringError, Result};
use crate::identity::codec::{BincodeCodec, JsonCodec, RecordCodec};
use crate::signer::OfflineSigner;

pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_OFFLINE_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything a keybase needs besides its store.
#[derive(Clone)]
pub struct KeybaseConfig {
    pub codec: Arc<dyn RecordCodec>,
    pub provider: Arc<dyn CryptoProvider>,
    pub device: Option<Arc<dyn HardwareDevice>>,
    pub offline_signer: Option<Arc<dyn OfflineSigner>>,
    pub kdf: KdfParams,
    /// Upper bound on any single hardware device call.
    pub device_timeout: Duration,
}

impl Default for KeybaseConfig {
    fn default() -> Self {
        Self {
            codec: Arc::new(BincodeCodec),
            provider: Arc::new(Secp256k1Provider),
            device: None,
            offline_signer: None,
            kdf: KdfParams::default(),
            device_timeout: DEFAULT_DEVICE_TIMEOUT,
        }
    }
}

impl KeybaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from file settings. Device and offline signer stay unset.
    pub fn from_settings(settings: &KeyringSettings) -> Self {
        Self {
            codec: settings.codec.build(),
            kdf: settings.kdf,
            device_timeout: Duration::from_secs(settings.device_timeout_secs),
            ..Self::default()
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn RecordCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_device(mut self, device: Arc<dyn HardwareDevice>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_offline_signer(mut self, signer: Arc<dyn OfflineSigner>) -> Self {
        self.offline_signer = Some(signer);
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for KeybaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeybaseConfig")
            .field("codec", &self.codec.name())
            .field("device", &self.device.as_ref().map(|d| d.device_ref()))
            .field("offline_signer", &self.offline_signer.is_some())
            .field("kdf", &self.kdf)
            .field("device_timeout", &self.device_timeout)
            .finish()
    }
}

/// Record codec selectable from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Bincode,
    Json,
}

impl CodecKind {
    pub fn build(self) -> Arc<dyn RecordCodec> {
        match self {
            Self::Bincode => Arc::new(BincodeCodec),
            Self::Json => Arc::new(JsonCodec),
        }
    }
}

/// On-disk settings (`config.json`).
///
/// ```json
/// {
///     "kdf": { "m_cost": 65536, "t_cost": 3, "p_cost": 4 },
///     "codec": "bincode",
///     "device_timeout_secs": 30,
///     "offline_timeout_secs": 300
/// }
/// ```
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyringSettings {
    pub kdf: KdfParams,
    pub codec: CodecKind,
    pub device_timeout_secs: u64,
    pub offline_timeout_secs: u64,
}

impl Default for KeyringSettings {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            codec: CodecKind::default(),
            device_timeout_secs: DEFAULT_DEVICE_TIMEOUT.as_secs(),
            offline_timeout_secs: DEFAULT_OFFLINE_TIMEOUT.as_secs(),
        }
    }
}

impl KeyringSettings {
    /// Load settings from `path`; defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::SerializationError` for malformed JSON or
    /// out-of-range KDF parameters, `KeyringError::Io` for other read
    /// failures.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(KeyringError::Io(e)),
        };
        let settings: Self = serde_json::from_slice(&bytes).map_err(|e| {
            KeyringError::SerializationError(format!(
                "failed to parse settings {}: {e}",
                path.display()
            ))
        })?;
        settings
            .kdf
            .check_bounds()
            .map_err(|e| KeyringError::SerializationError(e.to_string()))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| KeyringError::SerializationError(e.to_string()))?;
        std::fs::write(path, json.as_bytes())?;
        Ok(())
    }

    pub fn offline_timeout(&self) -> Duration {
        Duration::from_secs(self.offline_timeout_secs)
    }
}
