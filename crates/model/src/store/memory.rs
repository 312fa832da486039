use std::collections::HashMap;

use crate::models::{MapData, Result};
use crate::store::MapStore;

/// In-memory store that keeps values serialized, like browser local storage
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl MapStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<MapData>>> {
        self.values
            .get(key)
            .map(|json| serde_json::from_str(json).map_err(Into::into))
            .transpose()
    }

    fn save(&mut self, key: &str, maps: &[MapData]) -> Result<()> {
        self.values.insert(key.to_owned(), serde_json::to_string(maps)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_loads_none() {
        let store = MemoryStore::new();
        assert!(store.load("absent").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_value_is_an_error() {
        let mut store = MemoryStore::new();
        store.values.insert("k".into(), "{not json".into());
        assert!(store.load("k").is_err());
    }
}
