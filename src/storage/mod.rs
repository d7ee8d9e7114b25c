pub mod memory;
pub mod snapshot;

pub use memory::{CollectionData, MemoryStore, StoreState, StoredEntry};

/// Failure raised by a private data store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
    #[error("key must not be an empty string")]
    EmptyKey,
    #[error("{0}")]
    Backend(String),
}

/// Keyed byte store partitioned into named private collections.
///
/// Within one invocation a put is visible to subsequent gets on the same
/// store; isolation between invocations is the store's concern.
pub trait PrivateDataStore {
    /// `Ok(None)` means the key is absent from the collection.
    fn get_private_data(&self, collection: &str, key: &str)
    -> Result<Option<Vec<u8>>, StoreError>;

    fn put_private_data(&self, collection: &str, key: &str, value: &[u8])
    -> Result<(), StoreError>;
}
