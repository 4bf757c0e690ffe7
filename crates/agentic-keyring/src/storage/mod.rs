//! Storage layer: an ordered byte-keyed store the keybase persists records
//! into.
//!
//! # Directory layout
//!
//! [`FileStore`] keeps one file per key under its base directory, the key
//! hex-encoded into the file name:
//!
//! ```text
//! ~/.agentic/keyring/
//! ├── config.json
//! └── keys/
//!     ├── 616c6963652e696e666f.rec   ("alice.info")
//!     └── 626f622e696e666f.rec       ("bob.info")
//! ```
//!
//! # Modules
//!
//! - [`memory`]: in-process store for tests and ephemeral keybases.
//! - [`file_store`]: one-file-per-key store with atomic replacement.

pub mod file_store;
pub mod memory;

pub use file_store::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Ordered key-value store.
///
/// The `*_durable` variants return only once the change is on stable
/// storage. Implementations must be usable from several threads at once.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn set_durable(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Deleting an absent key succeeds.
    fn delete(&self, key: &[u8]) -> Result<()>;

    fn delete_durable(&self, key: &[u8]) -> Result<()>;

    /// Every entry, in ascending key order.
    fn iterate(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}
