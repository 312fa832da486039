//! Persistence boundary.
//!
//! The whole map collection lives under one key and is replaced on every
//! mutation. Implementations only need whole-value load and save.

pub mod json_dir;
pub mod memory;

use tracing::debug;

use crate::identifiers::MapId;
use crate::models::{MapData, ModelError, Result};

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

/// Key the map collection is stored under
pub const DEFAULT_STORE_KEY: &str = "world-maps";

/// Key-value storage holding serialized map collections
pub trait MapStore {
    /// Load the collection stored under `key`, or `None` if nothing was saved yet
    fn load(&self, key: &str) -> Result<Option<Vec<MapData>>>;

    /// Replace the collection stored under `key`
    fn save(&mut self, key: &str, maps: &[MapData]) -> Result<()>;
}

/// A loaded map collection that writes through to its store on every change
pub struct MapCollection<S: MapStore> {
    store: S,
    key: String,
    maps: Vec<MapData>,
}

impl<S: MapStore> MapCollection<S> {
    pub fn open(store: S, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let maps = store.load(&key)?.unwrap_or_default();
        debug!(key = %key, count = maps.len(), "loaded map collection");

        Ok(Self { store, key, maps })
    }

    pub fn maps(&self) -> &[MapData] {
        &self.maps
    }

    pub fn get(&self, id: &MapId) -> Option<&MapData> {
        self.maps.iter().find(|m| &m.id == id)
    }

    /// Insert a new map or replace the one with the same id, then save
    pub fn upsert(&mut self, map: MapData) -> Result<()> {
        match self.maps.iter_mut().find(|m| m.id == map.id) {
            Some(slot) => *slot = map,
            None => self.maps.push(map),
        }
        self.persist()
    }

    pub fn remove(&mut self, id: &MapId) -> Result<MapData> {
        let index = self
            .maps
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| ModelError::MapNotFound(id.clone()))?;
        let removed = self.maps.remove(index);
        self.persist()?;
        Ok(removed)
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.key, &self.maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::IdGenerator;

    #[test]
    fn test_collection_replaces_by_id() {
        let mut ids = IdGenerator::new();
        let mut collection = MapCollection::open(MemoryStore::new(), DEFAULT_STORE_KEY).unwrap();
        assert!(collection.maps().is_empty());

        let map = MapData::new("Middle Earth", None, &mut ids);
        collection.upsert(map.clone()).unwrap();

        let mut renamed = map.clone();
        renamed.name = "Arda".into();
        collection.upsert(renamed).unwrap();

        assert_eq!(collection.maps().len(), 1);
        assert_eq!(collection.get(&map.id).unwrap().name, "Arda");

        let store = collection.into_store();
        let reloaded = MapCollection::open(store, DEFAULT_STORE_KEY).unwrap();
        assert_eq!(reloaded.maps()[0].name, "Arda");
    }

    #[test]
    fn test_remove_missing_map() {
        let mut collection = MapCollection::open(MemoryStore::new(), "k").unwrap();
        let err = collection.remove(&MapId::new("nope"));
        assert!(matches!(err, Err(ModelError::MapNotFound(_))));
    }
}
