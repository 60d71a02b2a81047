#![warn(missing_docs)]
//! Test fixtures for block inventories: in-memory storage with write
//! counting and failure injection, scratch directories and sample presets.

mod snapshot;

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use blockstash_core::ItemStack;
use blockstash_inventory::{
    InventoryRecord, LayoutPreset, LocationKey, LocationLabel, PresetDefinition, PresetRegistry,
    RecordStorage, SlotPreset, StoreError,
};

pub use snapshot::*;

/// Id of [`info_preset`].
pub const INFO_PRESET: &str = "info_chest";

/// Id of [`machine_preset`].
pub const MACHINE_PRESET: &str = "labelled_machine";

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<LocationKey, InventoryRecord>,
    corrupt: BTreeSet<LocationKey>,
    failing_saves: BTreeSet<LocationKey>,
    fail_all_saves: bool,
    fail_removes: bool,
}

/// [`RecordStorage`] kept in memory, counting every write and removal.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
    writes: AtomicUsize,
    removes: AtomicUsize,
}

impl MemoryStorage {
    /// Empty storage behind an `Arc`, ready to hand to inventories.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Successful removals of an existing record so far.
    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    /// Stored record at `location`, bypassing failure injection.
    pub fn record(&self, location: &LocationKey) -> Option<InventoryRecord> {
        self.state().records.get(location).cloned()
    }

    /// Place a record directly, without counting a write.
    pub fn insert(&self, location: LocationKey, record: InventoryRecord) {
        self.state().records.insert(location, record);
    }

    /// Make loads of `location` fail as if its file were unreadable JSON.
    pub fn mark_corrupt(&self, location: LocationKey) {
        self.state().corrupt.insert(location);
    }

    /// Make saves to `location` fail with an I/O error.
    pub fn fail_saves_at(&self, location: LocationKey) {
        self.state().failing_saves.insert(location);
    }

    /// Make every save fail (or succeed again) with an I/O error.
    pub fn fail_all_saves(&self, fail: bool) {
        self.state().fail_all_saves = fail;
    }

    /// Make every removal fail with an I/O error.
    pub fn fail_removes(&self, fail: bool) {
        self.state().fail_removes = fail;
    }
}

impl RecordStorage for MemoryStorage {
    fn load(&self, location: &LocationKey) -> Result<Option<InventoryRecord>, StoreError> {
        let state = self.state();
        if state.corrupt.contains(location) {
            return Err(StoreError::corrupt(
                self.describe(location),
                "expected value at line 1 column 1",
            ));
        }
        Ok(state.records.get(location).cloned())
    }

    fn save(&self, location: &LocationKey, record: &InventoryRecord) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.fail_all_saves || state.failing_saves.contains(location) {
            return Err(StoreError::io(
                self.describe(location),
                io::Error::new(io::ErrorKind::PermissionDenied, "injected save failure"),
            ));
        }
        state.records.insert(location.clone(), record.clone());
        state.corrupt.remove(location);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, location: &LocationKey) -> Result<bool, StoreError> {
        let mut state = self.state();
        if state.fail_removes {
            return Err(StoreError::io(
                self.describe(location),
                io::Error::new(io::ErrorKind::PermissionDenied, "injected remove failure"),
            ));
        }
        state.corrupt.remove(location);
        let existed = state.records.remove(location).is_some();
        if existed {
            self.removes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<LocationKey>, StoreError> {
        let state = self.state();
        let mut keys: BTreeSet<LocationKey> = state.records.keys().cloned().collect();
        keys.extend(state.corrupt.iter().cloned());
        Ok(keys.into_iter().collect())
    }

    fn describe(&self, location: &LocationKey) -> String {
        format!("memory:{location}.inv")
    }
}

/// Scratch directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    /// Create a fresh directory whose name starts with `label`.
    pub fn new(label: &str) -> Result<Self> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock before unix epoch")?
            .as_nanos();
        let path = env::temp_dir().join(format!(
            "blockstash_{label}_{}_{nanos}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self { path })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.path) {
            tracing::debug!(path = %self.path.display(), %err, "scratch directory left behind");
        }
    }
}

/// Marker item the info preset places in its last slot.
pub fn info_marker() -> ItemStack {
    ItemStack::named("PAPER", "&bInfo")
}

/// Definition of a 9-slot preset with the info marker fixed in slot 8.
pub fn info_definition() -> PresetDefinition {
    PresetDefinition {
        id: INFO_PRESET.to_string(),
        size: 9,
        items: BTreeMap::from([(8, info_marker())]),
        reserved: BTreeSet::new(),
        location_label: None,
    }
}

/// 9-slot preset with slot 8 fixed to [`info_marker`].
pub fn info_preset() -> Arc<dyn SlotPreset> {
    layout(info_definition())
}

/// Definition of a 27-slot machine: a glass border on the top row, an
/// output-only slot 22 and a coordinate label in slot 4.
pub fn machine_definition() -> PresetDefinition {
    let border = ItemStack::named("GRAY_STAINED_GLASS_PANE", " ");
    let items = (0..9)
        .filter(|slot| *slot != 4)
        .map(|slot| (slot, border.clone()))
        .collect();
    PresetDefinition {
        id: MACHINE_PRESET.to_string(),
        size: 27,
        items,
        reserved: BTreeSet::from([22]),
        location_label: Some(LocationLabel {
            slot: 4,
            item: ItemStack::named("COMPASS", "&eLocation"),
        }),
    }
}

/// Preset built from [`machine_definition`].
pub fn machine_preset() -> Arc<dyn SlotPreset> {
    layout(machine_definition())
}

/// Registry holding both fixture presets.
pub fn fixture_registry() -> PresetRegistry {
    match PresetRegistry::from_definitions([info_definition(), machine_definition()]) {
        Ok(registry) => registry,
        Err(errors) => panic!("fixture presets are invalid: {errors}"),
    }
}

fn layout(definition: PresetDefinition) -> Arc<dyn SlotPreset> {
    match LayoutPreset::from_definition(definition) {
        Ok(preset) => Arc::new(preset),
        Err(errors) => panic!("fixture preset is invalid: {errors:?}"),
    }
}
