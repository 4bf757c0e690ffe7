//! Record serialization shared by storage and info armor.
//!
//! Every record is wrapped in a versioned envelope:
//!
//! ```text
//! RecordEnvelope { version: u16, identity: Identity }
//! ```
//!
//! [`BincodeCodec`] is the default; [`JsonCodec`] produces the same
//! envelope as JSON for stores that must stay human-inspectable.

use serde::{Deserialize, Serialize};

use crate::error::{KeyringError, Result};
use crate::identity::record::Identity;

/// Current envelope version.
pub const RECORD_VERSION: u16 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u16,
    identity: &'a Identity,
}

#[derive(Deserialize)]
struct Envelope {
    version: u16,
    identity: Identity,
}

impl Envelope {
    fn into_identity(self) -> Result<Identity> {
        if self.version != RECORD_VERSION {
            return Err(KeyringError::SerializationError(format!(
                "unsupported record version {}",
                self.version
            )));
        }
        Ok(self.identity)
    }
}

/// Stable, invertible mapping between [`Identity`] and bytes.
pub trait RecordCodec: Send + Sync {
    fn name(&self) -> &'static str;

    fn encode(&self, identity: &Identity) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Identity>;
}

/// Compact binary records via `bincode`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeCodec;

impl RecordCodec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, identity: &Identity) -> Result<Vec<u8>> {
        bincode::serialize(&EnvelopeRef {
            version: RECORD_VERSION,
            identity,
        })
        .map_err(|e| KeyringError::SerializationError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Identity> {
        bincode::deserialize::<Envelope>(bytes)
            .map_err(|e| KeyringError::SerializationError(format!("record: {e}")))?
            .into_identity()
    }
}

/// JSON records via `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, identity: &Identity) -> Result<Vec<u8>> {
        serde_json::to_vec(&EnvelopeRef {
            version: RECORD_VERSION,
            identity,
        })
        .map_err(|e| KeyringError::SerializationError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Identity> {
        serde_json::from_slice::<Envelope>(bytes)
            .map_err(|e| KeyringError::SerializationError(format!("record: {e}")))?
            .into_identity()
    }
}
