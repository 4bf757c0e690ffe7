//! Identity records and their serialization.

pub mod codec;
pub mod record;

pub use codec::{BincodeCodec, JsonCodec, RecordCodec, RECORD_VERSION};
pub use record::{
    name_from_storage_key, storage_key, Identity, IdentityKind, KeyType, Language, SigningAlgo,
};
