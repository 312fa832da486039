use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::{MapData, Result};
use crate::store::MapStore;

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MapStore for JsonDirStore {
    fn load(&self, key: &str) -> Result<Option<Vec<MapData>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&mut self, key: &str, maps: &[MapData]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let json = serde_json::to_vec_pretty(maps)?;

        // Atomic replace: write a sibling file, then rename over the target
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), count = maps.len(), "saved map collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::IdGenerator;

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(dir.path().join("nested"));
        assert!(store.load("maps").unwrap().is_none());

        let mut ids = IdGenerator::new();
        let maps = vec![MapData::new("Westeros", None, &mut ids)];
        store.save("maps", &maps).unwrap();

        assert!(store.path_for("maps").exists());
        assert_eq!(store.load("maps").unwrap().unwrap(), maps);
    }
}
