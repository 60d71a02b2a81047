//! Owner of every live block inventory.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::location::LocationKey;
use crate::menu::{delete_record, BlockInventory};
use crate::preset::PresetRegistry;
use crate::storage::RecordStorage;

/// Outcome of [`InventoryManager::save_all`].
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Inventories written.
    pub saved: usize,
    /// Inventories skipped because nothing changed.
    pub clean: usize,
    /// Inventories whose write failed; they stay dirty.
    pub failed: Vec<(LocationKey, StoreError)>,
}

impl SaveReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of [`InventoryManager::restore_all`].
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Locations brought back from storage.
    pub restored: Vec<LocationKey>,
    /// Locations already live, left as they were.
    pub already_live: usize,
    /// Records that could not be restored; their files are left untouched.
    pub failed: Vec<(LocationKey, StoreError)>,
}

impl RestoreReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Keeps at most one live [`BlockInventory`] per location.
pub struct InventoryManager {
    presets: PresetRegistry,
    storage: Arc<dyn RecordStorage>,
    live: BTreeMap<LocationKey, BlockInventory>,
}

impl InventoryManager {
    pub fn new(presets: PresetRegistry, storage: Arc<dyn RecordStorage>) -> Self {
        Self {
            presets,
            storage,
            live: BTreeMap::new(),
        }
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    pub fn storage(&self) -> &Arc<dyn RecordStorage> {
        &self.storage
    }

    /// Live inventory at `location`, restoring or creating it with
    /// `preset_id` when none is loaded.
    pub fn open(
        &mut self,
        location: LocationKey,
        preset_id: &str,
    ) -> Result<&mut BlockInventory, StoreError> {
        match self.live.entry(location) {
            Entry::Occupied(entry) => {
                let bound = entry.get().preset().id();
                if bound != preset_id {
                    return Err(StoreError::PresetMismatch {
                        location: entry.key().clone(),
                        bound: bound.to_string(),
                        requested: preset_id.to_string(),
                    });
                }
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let preset = self
                    .presets
                    .get(preset_id)
                    .ok_or_else(|| StoreError::UnknownPreset(preset_id.to_string()))?;
                let location = entry.key().clone();

                let inventory = match self.storage.load(&location)? {
                    Some(record) => {
                        if let Some(stored) = record.preset_id().filter(|id| *id != preset_id) {
                            warn!(%location, stored, requested = preset_id, "stored preset differs; using requested preset");
                        }
                        BlockInventory::restore(preset, location, &record, self.storage.clone())
                    }
                    None => BlockInventory::new(preset, location, self.storage.clone()),
                };
                Ok(entry.insert(inventory))
            }
        }
    }

    /// Load every stored record that is not already live, using the preset
    /// named in the record itself.
    pub fn restore_all(&mut self) -> Result<RestoreReport, StoreError> {
        let mut report = RestoreReport::default();

        for location in self.storage.keys()? {
            if self.live.contains_key(&location) {
                report.already_live += 1;
                continue;
            }
            match self.restore_one(&location) {
                Ok(inventory) => {
                    self.live.insert(location.clone(), inventory);
                    report.restored.push(location);
                }
                Err(err) => {
                    warn!(%location, error = %err, "skipping stored inventory");
                    report.failed.push((location, err));
                }
            }
        }

        info!(
            restored = report.restored.len(),
            failed = report.failed.len(),
            "restored block inventories"
        );
        Ok(report)
    }

    fn restore_one(&self, location: &LocationKey) -> Result<BlockInventory, StoreError> {
        let describe = || self.storage.describe(location);
        let record = self
            .storage
            .load(location)?
            .ok_or_else(|| StoreError::corrupt(describe(), "record vanished while restoring"))?;
        let preset_id = record
            .preset_id()
            .ok_or_else(|| StoreError::corrupt(describe(), "record has no preset id"))?;
        let preset = self
            .presets
            .get(preset_id)
            .ok_or_else(|| StoreError::UnknownPreset(preset_id.to_string()))?;
        Ok(BlockInventory::restore(
            preset,
            location.clone(),
            &record,
            self.storage.clone(),
        ))
    }

    /// Save every dirty inventory. A failed write is logged and reported;
    /// the remaining inventories are still saved.
    pub fn save_all(&mut self) -> SaveReport {
        let mut report = SaveReport::default();

        for (location, inventory) in &mut self.live {
            if !inventory.is_dirty() {
                report.clean += 1;
                continue;
            }
            match inventory.save() {
                Ok(()) => report.saved += 1,
                Err(err) => {
                    warn!(%location, error = %err, "failed to save block inventory");
                    report.failed.push((location.clone(), err));
                }
            }
        }

        debug!(
            saved = report.saved,
            clean = report.clean,
            failed = report.failed.len(),
            "save pass finished"
        );
        report
    }

    /// Save and drop the inventory at `location`. On a failed save the
    /// inventory stays loaded. Returns whether anything was loaded.
    pub fn unload(&mut self, location: &LocationKey) -> Result<bool, StoreError> {
        let Some(inventory) = self.live.get_mut(location) else {
            return Ok(false);
        };
        inventory.save()?;
        self.live.remove(location);
        Ok(true)
    }

    /// Move the live inventory at `from` to `to`.
    ///
    /// Refused with [`StoreError::Occupied`] when `to` holds a live inventory
    /// or a stored record. Moving onto the same location rewrites its record.
    /// When the save at `to` fails the inventory is still rebound there, and
    /// stays dirty so a later save can retry.
    pub fn relocate(&mut self, from: &LocationKey, to: LocationKey) -> Result<(), StoreError> {
        if from == &to {
            let inventory = self
                .live
                .get_mut(from)
                .ok_or_else(|| StoreError::NotLoaded(from.clone()))?;
            return inventory.move_to(to);
        }
        if !self.live.contains_key(from) {
            return Err(StoreError::NotLoaded(from.clone()));
        }
        if self.live.contains_key(&to) || self.storage.load(&to)?.is_some() {
            return Err(StoreError::Occupied(to));
        }
        let mut inventory = self
            .live
            .remove(from)
            .ok_or_else(|| StoreError::NotLoaded(from.clone()))?;

        let result = inventory.move_to(to.clone());
        self.live.insert(to, inventory);
        result
    }

    /// Drop the live inventory at `location` (if any) and delete its record.
    /// Returns whether an inventory was loaded.
    pub fn remove(&mut self, location: &LocationKey) -> bool {
        let was_live = self.live.remove(location).is_some();
        delete_record(self.storage.as_ref(), location);
        was_live
    }

    /// Re-apply presets to every live inventory.
    pub fn reload_all(&mut self) -> usize {
        for inventory in self.live.values_mut() {
            inventory.reload();
        }
        self.live.len()
    }

    pub fn get(&self, location: &LocationKey) -> Option<&BlockInventory> {
        self.live.get(location)
    }

    pub fn get_mut(&mut self, location: &LocationKey) -> Option<&mut BlockInventory> {
        self.live.get_mut(location)
    }

    pub fn is_loaded(&self, location: &LocationKey) -> bool {
        self.live.contains_key(location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &LocationKey> + '_ {
        self.live.keys()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
