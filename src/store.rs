//! # Persistence Provider
//!
//! The monitor keeps zones in memory only. Anything that must survive a
//! restart (the user's list of saved places) goes through a [`ZoneStore`],
//! which only knows how to get and set named blobs.
//!
//! ## Implementations
//! - [`FileStore`]: one `<dir>/<key>.json` file per key
//! - [`MemoryStore`]: in-process map, for tests and as a throwaway default
//!
//! ## Saved Locations
//! The saved-place list lives under [`SAVED_LOCATIONS_KEY`] as a JSON array of
//! [`SavedLocation`]. A missing key reads back as an empty list.

use crate::error::AlarmError;
use crate::units::Meters;
use crate::zone::{NewZone, ZoneId};
use crate::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Key under which the saved-place list is stored
pub const SAVED_LOCATIONS_KEY: &str = "saved_locations";

/// Get/set access to named blobs.
pub trait ZoneStore {
    /// Read a blob. `Ok(None)` if nothing was ever stored under `key`.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, AlarmError>;

    /// Replace the blob stored under `key`.
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), AlarmError>;
}

/// Blob store backed by one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ZoneStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, AlarmError> {
        match fs::read(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), AlarmError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        fs::write(&path, blob)?;
        debug!(path = %path.display(), bytes = blob.len(), "blob saved");
        Ok(())
    }
}

/// Blob store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ZoneStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, AlarmError> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), AlarmError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}

/// A place the user saved to set alarms against later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: String,
    pub name: String,
    pub center: Coordinate,
    pub radius: Meters,
    #[serde(default)]
    pub address: Option<String>,
}

impl SavedLocation {
    /// Registration request that arms an alarm for this place.
    ///
    /// The saved id is reused as the zone id so removing the place can also
    /// disarm its alarm.
    pub fn to_new_zone(&self) -> NewZone {
        NewZone {
            id: Some(ZoneId::new(self.id.clone())),
            center: self.center,
            radius: self.radius,
            name: Some(self.name.clone()),
            address: self.address.clone(),
        }
    }
}

/// Read the saved-place list.
pub fn load_saved<S: ZoneStore + ?Sized>(store: &S) -> Result<Vec<SavedLocation>, AlarmError> {
    match store.load(SAVED_LOCATIONS_KEY)? {
        Some(blob) => Ok(serde_json::from_slice(&blob)?),
        None => Ok(Vec::new()),
    }
}

/// Overwrite the saved-place list.
pub fn save_saved<S: ZoneStore + ?Sized>(
    store: &S,
    locations: &[SavedLocation],
) -> Result<(), AlarmError> {
    let blob = serde_json::to_vec_pretty(locations)?;
    store.save(SAVED_LOCATIONS_KEY, &blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_locations() -> Vec<SavedLocation> {
        vec![
            SavedLocation {
                id: "home".to_string(),
                name: "Home".to_string(),
                center: Coordinate::new(40.0, -73.0),
                radius: Meters(150.0),
                address: Some("1 Main St".to_string()),
            },
            SavedLocation {
                id: "work".to_string(),
                name: "Work".to_string(),
                center: Coordinate::new(40.75, -73.99),
                radius: Meters(300.0),
                address: None,
            },
        ]
    }

    #[test]
    fn test_missing_key_loads_empty() {
        let store = MemoryStore::new();
        assert!(load_saved(&store).unwrap().is_empty());

        let dir = TempDir::new().unwrap();
        let files = FileStore::new(dir.path().join("not-yet-created"));
        assert!(load_saved(&files).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_saved_locations() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("data"));
        save_saved(&store, &sample_locations()).unwrap();

        assert!(dir.path().join("data/saved_locations.json").exists());

        // A fresh store over the same directory sees the same list
        let reopened = FileStore::new(dir.path().join("data"));
        assert_eq!(load_saved(&reopened).unwrap(), sample_locations());
    }

    #[test]
    fn test_corrupt_blob_is_an_error() {
        let store = MemoryStore::new();
        store.save(SAVED_LOCATIONS_KEY, b"{not json").unwrap();
        assert!(matches!(
            load_saved(&store),
            Err(AlarmError::Serialization(_))
        ));
    }

    #[test]
    fn test_saved_location_arms_zone_with_same_id() {
        let location = &sample_locations()[0];
        let request = location.to_new_zone();
        assert_eq!(request.id, Some(ZoneId::new("home")));
        assert_eq!(request.name.as_deref(), Some("Home"));
        assert_eq!(request.radius, Meters(150.0));
    }
}
