//! Per-location record persistence.
//!
//! One file per [`LocationKey`] under a storage root, named
//! `<world>;<x>;<y>;<z>.<ext>` and holding an [`InventoryRecord`] as pretty JSON.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::location::LocationKey;
use crate::record::InventoryRecord;

/// Default storage root, relative to the server directory.
pub const DEFAULT_STORAGE_ROOT: &str = "data-storage/stored-inventories";

/// Default record file extension.
pub const DEFAULT_EXTENSION: &str = "inv";

/// Backing store for inventory records, keyed by location.
pub trait RecordStorage: Send + Sync {
    /// Read the record for `location`; `Ok(None)` when none exists.
    fn load(&self, location: &LocationKey) -> Result<Option<InventoryRecord>, StoreError>;

    /// Create or replace the record for `location`.
    fn save(&self, location: &LocationKey, record: &InventoryRecord) -> Result<(), StoreError>;

    /// Remove the record for `location`, returning whether one existed.
    fn remove(&self, location: &LocationKey) -> Result<bool, StoreError>;

    /// Every location with a stored record, in key order.
    fn keys(&self) -> Result<Vec<LocationKey>, StoreError>;

    /// Human-readable name of the record for `location`, used in logs.
    fn describe(&self, location: &LocationKey) -> String;
}

/// Filesystem-backed [`RecordStorage`].
#[derive(Debug, Clone)]
pub struct FsRecordStorage {
    root: PathBuf,
    extension: String,
}

impl FsRecordStorage {
    /// Storage rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File path of the record for `location`.
    pub fn path_for(&self, location: &LocationKey) -> Result<PathBuf, StoreError> {
        validate_world_name(location.world())?;
        Ok(self
            .root
            .join(format!("{}.{}", location.serialize(), self.extension)))
    }

    fn display_path(&self, location: &LocationKey) -> String {
        self.root
            .join(format!("{}.{}", location.serialize(), self.extension))
            .display()
            .to_string()
    }
}

impl RecordStorage for FsRecordStorage {
    fn load(&self, location: &LocationKey) -> Result<Option<InventoryRecord>, StoreError> {
        let path = self.path_for(location)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(path.display().to_string(), err)),
        };

        let text = String::from_utf8(bytes)
            .map_err(|err| StoreError::corrupt(path.display().to_string(), err))?;
        let record = InventoryRecord::from_json(&text)
            .map_err(|err| StoreError::corrupt(path.display().to_string(), err))?;
        Ok(Some(record))
    }

    fn save(&self, location: &LocationKey, record: &InventoryRecord) -> Result<(), StoreError> {
        let path = self.path_for(location)?;
        fs::create_dir_all(&self.root)
            .map_err(|err| StoreError::io(self.root.display().to_string(), err))?;

        let json = record
            .to_json_pretty()
            .map_err(|err| StoreError::corrupt(path.display().to_string(), err))?;
        fs::write(&path, json).map_err(|err| StoreError::io(path.display().to_string(), err))?;

        debug!(path = %path.display(), entries = record.len(), "wrote inventory record");
        Ok(())
    }

    fn remove(&self, location: &LocationKey) -> Result<bool, StoreError> {
        let path = self.path_for(location)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::io(path.display().to_string(), err)),
        }
    }

    fn keys(&self) -> Result<Vec<LocationKey>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(self.root.display().to_string(), err)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(self.root.display().to_string(), err))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match stem.parse::<LocationKey>() {
                Ok(key) => keys.push(key),
                Err(err) => warn!(path = %path.display(), %err, "skipping unrecognised record file"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn describe(&self, location: &LocationKey) -> String {
        self.display_path(location)
    }
}

/// World names end up in file names, so anything that escapes the storage
/// root or collides with the key separator is rejected.
fn validate_world_name(world: &str) -> Result<(), StoreError> {
    let bad = world.is_empty()
        || world == "."
        || world == ".."
        || world.contains(['/', '\\', ';', '\0']);
    if bad {
        return Err(StoreError::InvalidWorldName(world.to_string()));
    }
    Ok(())
}
