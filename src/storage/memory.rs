use crate::config::LedgerConfig;
use crate::storage::{PrivateDataStore, StoreError};
use im::OrdMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
    /// Write sequence of the latest put.
    pub version: u64,
    /// Write sequence of the first put.
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollectionData {
    pub entries: OrdMap<String, StoredEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub collections: OrdMap<String, CollectionData>,
    /// Total number of puts applied.
    pub seq: u64,
}

/// In-memory private data store. Collections must be declared before use,
/// matching a platform where collection membership is configured up front.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collections<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for name in names {
            store.declare_collection(name);
        }
        store
    }

    /// Store declaring every collection the given config routes to.
    pub fn for_config(config: &LedgerConfig) -> Self {
        Self::with_collections(config.collection_names())
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Declares a collection; existing contents are left untouched.
    pub fn declare_collection(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.state.lock();
        if !state.collections.contains_key(&name) {
            state.collections.insert(name, CollectionData::default());
        }
    }

    pub fn collections(&self) -> Vec<String> {
        self.state.lock().collections.keys().cloned().collect()
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        self.state
            .lock()
            .collections
            .get(collection)
            .map_or(0, |c| c.entries.len())
    }

    pub fn entry(&self, collection: &str, key: &str) -> Option<StoredEntry> {
        self.state
            .lock()
            .collections
            .get(collection)
            .and_then(|c| c.entries.get(key))
            .cloned()
    }

    pub fn current_seq(&self) -> u64 {
        self.state.lock().seq
    }

    /// Cheap structural copy of the whole store.
    pub fn state(&self) -> StoreState {
        self.state.lock().clone()
    }
}

impl PrivateDataStore for MemoryStore {
    fn get_private_data(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let state = self.state.lock();
        let data = state
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(data.entries.get(key).map(|e| e.value.clone()))
    }

    fn put_private_data(&self, collection: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let mut state = self.state.lock();
        let seq = state.seq + 1;
        let data = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        let created_at = data.entries.get(key).map_or(seq, |e| e.created_at);
        data.entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_vec(),
                version: seq,
                created_at,
            },
        );
        state.seq = seq;
        Ok(())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}
