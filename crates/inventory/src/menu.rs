//! Block inventories: a preset-shaped slot array bound to a world location.

use std::fmt;
use std::sync::Arc;

use blockstash_core::ItemStack;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::location::{BlockPos, LocationKey};
use crate::preset::{SlotContents, SlotPreset};
use crate::record::InventoryRecord;
use crate::storage::RecordStorage;

/// Live inventory attached to one block.
///
/// Preset slots are rebuilt from the preset whenever the inventory is
/// initialized; every other slot is player content and is written to storage
/// by [`save`](Self::save). Any mutation bumps a change counter, and a save
/// with no pending changes touches nothing.
pub struct BlockInventory {
    preset: Arc<dyn SlotPreset>,
    location: LocationKey,
    slots: SlotContents,
    changes: u32,
    storage: Arc<dyn RecordStorage>,
}

impl fmt::Debug for BlockInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockInventory")
            .field("preset", &self.preset.id())
            .field("location", &self.location)
            .field("slots", &self.slots)
            .field("changes", &self.changes)
            .finish_non_exhaustive()
    }
}

impl BlockInventory {
    /// Fresh inventory with only the preset's fixed slots filled.
    pub fn new(
        preset: Arc<dyn SlotPreset>,
        location: LocationKey,
        storage: Arc<dyn RecordStorage>,
    ) -> Self {
        let mut slots = SlotContents::new(preset.size());
        preset.populate(&mut slots, &location);
        Self {
            preset,
            location,
            slots,
            changes: 0,
            storage,
        }
    }

    /// Inventory rebuilt from a stored record.
    ///
    /// Stored data is only installed into player slots, then the preset is
    /// applied. A preset slot the preset leaves unwritten stays empty.
    pub fn restore(
        preset: Arc<dyn SlotPreset>,
        location: LocationKey,
        record: &InventoryRecord,
        storage: Arc<dyn RecordStorage>,
    ) -> Self {
        let size = preset.size();
        let mut slots = SlotContents::new(size);

        for slot in record.slots() {
            if slot >= size {
                debug!(%location, slot, size, "ignoring stored slot outside the preset");
                continue;
            }
            if preset.is_preset_slot(slot) {
                debug!(%location, slot, "ignoring stored data in a preset slot");
                continue;
            }
            install(&mut slots, record, slot, &location);
        }

        preset.populate(&mut slots, &location);

        // A trailing player slot may be overwritten by presets that grow
        // their layout dynamically; the stored item takes it back.
        if let Some(last) = size.checked_sub(1) {
            if !preset.is_preset_slot(last) && record.contains_slot(last) {
                install(&mut slots, record, last, &location);
            }
        }

        Self {
            preset,
            location,
            slots,
            changes: 0,
            storage,
        }
    }

    /// Write player slots to storage if anything changed since the last save.
    ///
    /// On error the inventory stays dirty.
    pub fn save(&mut self) -> Result<(), StoreError> {
        if self.changes == 0 {
            return Ok(());
        }

        let record = self.to_record()?;
        self.storage.save(&self.location, &record)?;
        debug!(
            location = %self.location,
            preset = self.preset.id(),
            changes = self.changes,
            "saved block inventory"
        );
        self.changes = 0;
        Ok(())
    }

    /// Record holding the preset id and every non-empty player slot.
    pub fn to_record(&self) -> Result<InventoryRecord, StoreError> {
        let mut record = InventoryRecord::new(self.preset.id());
        for slot in self.preset.inventory_slots() {
            record
                .set_slot(slot, self.slots.get(slot))
                .map_err(|source| StoreError::Encode {
                    location: self.location.clone(),
                    slot,
                    source,
                })?;
        }
        Ok(record)
    }

    /// Rebind to `to`: the old record is deleted, the preset refreshes any
    /// location-dependent slots, and the contents are saved at the new key.
    ///
    /// The old record is gone before the new one is written.
    pub fn move_to(&mut self, to: LocationKey) -> Result<(), StoreError> {
        self.delete();
        let from = std::mem::replace(&mut self.location, to);
        self.preset.on_relocate(&mut self.slots, &self.location);
        self.mark_dirty();
        info!(%from, to = %self.location, preset = self.preset.id(), "moved block inventory");
        self.save()
    }

    /// Re-apply the preset over the live contents. Storage is not touched.
    ///
    /// Preset slots are cleared first; player slots keep their items.
    pub fn reload(&mut self) {
        clear_preset_slots(&mut self.slots, self.preset.as_ref());
        self.preset.populate(&mut self.slots, &self.location);
        self.mark_dirty();
    }

    /// Remove the stored record for this location, if any.
    ///
    /// Failures are logged and swallowed.
    pub fn delete(&self) {
        delete_record(self.storage.as_ref(), &self.location);
    }

    pub fn get_item(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot)
    }

    /// Put `item` into `slot`. Returns `false` when the slot does not exist.
    pub fn set_item(&mut self, slot: usize, item: Option<ItemStack>) -> bool {
        let placed = self.slots.set(slot, item);
        if placed {
            self.mark_dirty();
        }
        placed
    }

    /// Swap `item` into `slot`, returning what was there.
    pub fn replace_existing_item(
        &mut self,
        slot: usize,
        item: Option<ItemStack>,
    ) -> Option<ItemStack> {
        if slot >= self.slots.len() {
            return None;
        }
        let previous = self.slots.take(slot);
        self.slots.set(slot, item);
        self.mark_dirty();
        previous
    }

    /// Empty `slot`, returning its item.
    pub fn take_item(&mut self, slot: usize) -> Option<ItemStack> {
        let taken = self.slots.take(slot);
        if taken.is_some() {
            self.mark_dirty();
        }
        taken
    }

    /// Insert `item` into `targets`, topping up matching stacks before using
    /// empty slots. Returns whatever did not fit.
    pub fn push_item(&mut self, item: ItemStack, targets: &[usize]) -> Option<ItemStack> {
        if item.is_empty() {
            return None;
        }
        let (after, remainder) = simulate_push(&self.slots, item, targets);
        if after != self.slots {
            self.slots = after;
            self.mark_dirty();
        }
        remainder
    }

    /// Whether `item` would fit completely into `targets`.
    pub fn fits(&self, item: &ItemStack, targets: &[usize]) -> bool {
        item.is_empty() || simulate_push(&self.slots, item.clone(), targets).1.is_none()
    }

    /// Remove up to `amount` items from `slot`, returning how many were removed.
    pub fn consume_item(&mut self, slot: usize, amount: u32) -> u32 {
        let Some(stack) = self.slots.get_mut(slot) else {
            return 0;
        };
        let removed = stack.remove(amount);
        self.slots.normalize();
        if removed > 0 {
            self.mark_dirty();
        }
        removed
    }

    pub fn contents(&self) -> &SlotContents {
        &self.slots
    }

    pub fn location(&self) -> &LocationKey {
        &self.location
    }

    /// Coordinates of the block this inventory belongs to.
    pub fn block(&self) -> BlockPos {
        self.location.block()
    }

    pub fn preset(&self) -> &Arc<dyn SlotPreset> {
        &self.preset
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.changes > 0
    }

    pub fn mark_dirty(&mut self) {
        self.changes = self.changes.saturating_add(1);
    }

    /// Mutations since the last successful save.
    pub fn changes(&self) -> u32 {
        self.changes
    }
}

/// Best-effort removal of the record at `location`.
pub(crate) fn delete_record(storage: &dyn RecordStorage, location: &LocationKey) {
    match storage.remove(location) {
        Ok(true) => debug!(%location, "deleted stored inventory"),
        Ok(false) => {}
        Err(err) => warn!(
            file = %storage.describe(location),
            error = %err,
            "could not delete stored inventory"
        ),
    }
}

fn clear_preset_slots(slots: &mut SlotContents, preset: &dyn SlotPreset) {
    for &slot in preset.preset_slots() {
        slots.set(slot, None);
    }
}

fn install(slots: &mut SlotContents, record: &InventoryRecord, slot: usize, location: &LocationKey) {
    match record.slot_item(slot) {
        Ok(item) => {
            slots.set(slot, item);
        }
        Err(err) => warn!(%location, slot, error = %err, "dropping undecodable stored item"),
    }
}

fn simulate_push(
    slots: &SlotContents,
    mut item: ItemStack,
    targets: &[usize],
) -> (SlotContents, Option<ItemStack>) {
    let mut after = slots.clone();

    for &slot in targets {
        if let Some(stack) = after.get_mut(slot) {
            if stack.can_stack_with(&item) {
                item.amount = stack.add(item.amount);
                if item.amount == 0 {
                    return (after, None);
                }
            }
        }
    }

    for &slot in targets {
        if slot < after.len() && after.get(slot).is_none() {
            let max = item.max_stack_size();
            if item.amount <= max {
                after.set(slot, Some(item));
                return (after, None);
            }
            if let Some(part) = item.split(max) {
                after.set(slot, Some(part));
            }
        }
    }

    (after, Some(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    use crate::preset::{LayoutPreset, PresetDefinition};

    #[derive(Default)]
    struct Recorder {
        records: Mutex<BTreeMap<LocationKey, InventoryRecord>>,
        writes: Mutex<usize>,
    }

    impl RecordStorage for Recorder {
        fn load(&self, location: &LocationKey) -> Result<Option<InventoryRecord>, StoreError> {
            Ok(self.records.lock().unwrap().get(location).cloned())
        }

        fn save(&self, location: &LocationKey, record: &InventoryRecord) -> Result<(), StoreError> {
            *self.writes.lock().unwrap() += 1;
            self.records
                .lock()
                .unwrap()
                .insert(location.clone(), record.clone());
            Ok(())
        }

        fn remove(&self, location: &LocationKey) -> Result<bool, StoreError> {
            Ok(self.records.lock().unwrap().remove(location).is_some())
        }

        fn keys(&self) -> Result<Vec<LocationKey>, StoreError> {
            Ok(self.records.lock().unwrap().keys().cloned().collect())
        }

        fn describe(&self, location: &LocationKey) -> String {
            location.serialize()
        }
    }

    fn preset() -> Arc<dyn SlotPreset> {
        Arc::new(
            LayoutPreset::from_definition(PresetDefinition {
                id: "info".into(),
                size: 9,
                items: BTreeMap::from([(8, ItemStack::named("PAPER", "&bInfo"))]),
                reserved: BTreeSet::new(),
                location_label: None,
            })
            .unwrap(),
        )
    }

    fn here() -> LocationKey {
        LocationKey::new("world", 4, 70, -9)
    }

    #[test]
    fn fresh_inventory_is_clean_and_populated() {
        let storage = Arc::new(Recorder::default());
        let mut inv = BlockInventory::new(preset(), here(), storage.clone());

        assert!(!inv.is_dirty());
        assert_eq!(inv.size(), 9);
        assert_eq!(inv.get_item(8), Some(&ItemStack::named("PAPER", "&bInfo")));
        inv.save().unwrap();
        assert_eq!(*storage.writes.lock().unwrap(), 0);
    }

    #[test]
    fn record_never_holds_preset_slots() {
        let storage = Arc::new(Recorder::default());
        let mut inv = BlockInventory::new(preset(), here(), storage);
        inv.set_item(2, Some(ItemStack::new("GOLD_INGOT", 4)));

        let record = inv.to_record().unwrap();
        assert_eq!(record.preset_id(), Some("info"));
        assert_eq!(record.slots().into_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn restore_ignores_out_of_range_and_bad_entries() {
        let record = InventoryRecord::from_json(
            r#"{"preset":"info",
                "1":{"material":"STONE","amount":2},
                "5":{"material":7},
                "30":{"material":"DIRT","amount":1}}"#,
        )
        .unwrap();
        let inv = BlockInventory::restore(preset(), here(), &record, Arc::new(Recorder::default()));

        assert_eq!(inv.get_item(1), Some(&ItemStack::new("STONE", 2)));
        assert_eq!(inv.get_item(5), None);
        assert!(!inv.is_dirty());
    }

    #[test]
    fn push_item_fills_partial_stacks_first() {
        let mut inv = BlockInventory::new(preset(), here(), Arc::new(Recorder::default()));
        inv.set_item(3, Some(ItemStack::new("IRON_INGOT", 60)));

        let rest = inv.push_item(ItemStack::new("IRON_INGOT", 10), &[0, 3]);
        assert_eq!(rest, None);
        assert_eq!(inv.get_item(3).unwrap().amount, 64);
        assert_eq!(inv.get_item(0).unwrap().amount, 6);

        let rest = inv.push_item(ItemStack::new("IRON_INGOT", 100), &[0, 1]);
        assert_eq!(inv.get_item(0).unwrap().amount, 64);
        assert_eq!(inv.get_item(1).unwrap().amount, 42);
        assert_eq!(rest, None);

        assert!(inv.fits(&ItemStack::new("IRON_INGOT", 22), &[1]));
        assert!(!inv.fits(&ItemStack::new("IRON_INGOT", 23), &[1]));
        assert!(!inv.fits(&ItemStack::new("DIAMOND", 1), &[0, 3]));
    }

    #[test]
    fn push_into_full_targets_returns_everything() {
        let mut inv = BlockInventory::new(preset(), here(), Arc::new(Recorder::default()));
        inv.set_item(0, Some(ItemStack::new("DIRT", 64)));
        let before = inv.changes();

        let rest = inv.push_item(ItemStack::new("DIRT", 5), &[0]);
        assert_eq!(rest, Some(ItemStack::new("DIRT", 5)));
        assert_eq!(inv.changes(), before);
    }

    #[test]
    fn consume_and_take_track_changes() {
        let mut inv = BlockInventory::new(preset(), here(), Arc::new(Recorder::default()));
        inv.set_item(0, Some(ItemStack::new("COAL", 3)));

        assert_eq!(inv.consume_item(0, 5), 3);
        assert_eq!(inv.get_item(0), None);
        assert_eq!(inv.consume_item(0, 1), 0);
        assert_eq!(inv.take_item(0), None);
        assert_eq!(inv.changes(), 2);

        assert_eq!(
            inv.replace_existing_item(1, Some(ItemStack::new("SAND", 1))),
            None
        );
        assert_eq!(
            inv.replace_existing_item(1, None),
            Some(ItemStack::new("SAND", 1))
        );
        assert!(!inv.set_item(9, Some(ItemStack::new("SAND", 1))));
    }

    #[test]
    fn reload_restores_tampered_preset_slots() {
        let mut inv = BlockInventory::new(preset(), here(), Arc::new(Recorder::default()));
        inv.set_item(8, None);
        inv.set_item(0, Some(ItemStack::new("EMERALD", 1)));
        inv.reload();

        assert_eq!(inv.get_item(8), Some(&ItemStack::named("PAPER", "&bInfo")));
        assert_eq!(inv.get_item(0), Some(&ItemStack::new("EMERALD", 1)));
    }

    #[test]
    fn move_ends_clean_with_record_at_new_key() {
        let storage = Arc::new(Recorder::default());
        let mut inv = BlockInventory::new(preset(), here(), storage.clone());
        inv.set_item(0, Some(ItemStack::new("EMERALD", 1)));
        inv.save().unwrap();

        let target = LocationKey::new("world", 5, 70, -9);
        inv.move_to(target.clone()).unwrap();

        assert!(!inv.is_dirty());
        assert_eq!(inv.location(), &target);
        assert_eq!(storage.keys().unwrap(), vec![target]);
    }
}
