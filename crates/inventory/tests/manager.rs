use blockstash_core::ItemStack;
use blockstash_inventory::{InventoryManager, InventoryRecord, LocationKey, StoreError};
use blockstash_testkit::{fixture_registry, info_marker, MemoryStorage, INFO_PRESET, MACHINE_PRESET};

fn key(x: i32) -> LocationKey {
    LocationKey::new("world", x, 64, 0)
}

fn coal(amount: u32) -> ItemStack {
    ItemStack::new("COAL", amount)
}

#[test]
fn open_returns_the_single_live_inventory() {
    let storage = MemoryStorage::shared();
    let mut manager = InventoryManager::new(fixture_registry(), storage.clone());

    manager.open(key(1), INFO_PRESET).unwrap().set_item(0, Some(coal(5)));
    let again = manager.open(key(1), INFO_PRESET).unwrap();
    assert_eq!(again.get_item(0), Some(&coal(5)));
    assert_eq!(manager.len(), 1);

    assert!(matches!(
        manager.open(key(1), MACHINE_PRESET),
        Err(StoreError::PresetMismatch { .. })
    ));
    assert!(matches!(
        manager.open(key(2), "no_such_preset"),
        Err(StoreError::UnknownPreset(_))
    ));
}

#[test]
fn open_restores_from_storage() {
    let storage = MemoryStorage::shared();
    let mut record = InventoryRecord::new(INFO_PRESET);
    record.set_slot(4, Some(&coal(9))).unwrap();
    storage.insert(key(3), record);

    let mut manager = InventoryManager::new(fixture_registry(), storage);
    let inv = manager.open(key(3), INFO_PRESET).unwrap();
    assert_eq!(inv.get_item(4), Some(&coal(9)));
    assert_eq!(inv.get_item(8), Some(&info_marker()));
    assert!(!inv.is_dirty());
}

#[test]
fn open_propagates_corrupt_records() {
    let storage = MemoryStorage::shared();
    storage.mark_corrupt(key(4));
    let mut manager = InventoryManager::new(fixture_registry(), storage);

    assert!(matches!(
        manager.open(key(4), INFO_PRESET),
        Err(StoreError::Corrupt { .. })
    ));
    assert!(!manager.is_loaded(&key(4)));
}

#[test]
fn restore_all_reports_and_skips_bad_records() {
    let storage = MemoryStorage::shared();
    storage.insert(key(1), InventoryRecord::new(INFO_PRESET));
    storage.insert(key(2), InventoryRecord::new("retired_machine"));
    storage.insert(key(3), InventoryRecord::default());
    storage.mark_corrupt(key(4));
    storage.insert(key(5), InventoryRecord::new(MACHINE_PRESET));

    let mut manager = InventoryManager::new(fixture_registry(), storage.clone());
    manager.open(key(5), MACHINE_PRESET).unwrap();
    let report = manager.restore_all().unwrap();

    assert_eq!(report.restored, vec![key(1)]);
    assert_eq!(report.already_live, 1);
    let failed: Vec<_> = report.failed.iter().map(|(key, _)| key.clone()).collect();
    assert_eq!(failed, vec![key(2), key(3), key(4)]);
    assert!(matches!(report.failed[0].1, StoreError::UnknownPreset(_)));
    assert!(matches!(report.failed[1].1, StoreError::Corrupt { .. }));
    assert!(!report.is_ok());
    assert_eq!(manager.len(), 2);
    assert_eq!(storage.writes(), 0);
}

#[test]
fn save_all_continues_past_failures() {
    let storage = MemoryStorage::shared();
    let mut manager = InventoryManager::new(fixture_registry(), storage.clone());
    for x in 0..3 {
        manager.open(key(x), INFO_PRESET).unwrap().set_item(0, Some(coal(1)));
    }
    manager.open(key(9), INFO_PRESET).unwrap();
    storage.fail_saves_at(key(1));

    let report = manager.save_all();
    assert_eq!(report.saved, 2);
    assert_eq!(report.clean, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, key(1));
    assert!(manager.get(&key(1)).unwrap().is_dirty());
    assert!(storage.record(&key(0)).is_some());
    assert!(storage.record(&key(2)).is_some());
}

#[test]
fn unload_keeps_inventory_when_save_fails() {
    let storage = MemoryStorage::shared();
    let mut manager = InventoryManager::new(fixture_registry(), storage.clone());
    manager.open(key(1), INFO_PRESET).unwrap().set_item(2, Some(coal(3)));

    storage.fail_all_saves(true);
    assert!(manager.unload(&key(1)).is_err());
    assert!(manager.is_loaded(&key(1)));

    storage.fail_all_saves(false);
    assert!(manager.unload(&key(1)).unwrap());
    assert!(!manager.is_loaded(&key(1)));
    assert!(!manager.unload(&key(1)).unwrap());
    assert_eq!(storage.record(&key(1)).unwrap().slot_item(2).unwrap(), Some(coal(3)));
}

#[test]
fn relocate_moves_record_and_live_entry() {
    let storage = MemoryStorage::shared();
    let mut manager = InventoryManager::new(fixture_registry(), storage.clone());
    manager.open(key(1), INFO_PRESET).unwrap().set_item(0, Some(coal(2)));
    manager.save_all();

    manager.relocate(&key(1), key(2)).unwrap();
    assert!(!manager.is_loaded(&key(1)));
    assert_eq!(manager.get(&key(2)).unwrap().location(), &key(2));
    assert!(storage.record(&key(1)).is_none());
    assert!(storage.record(&key(2)).unwrap().contains_slot(0));
}

#[test]
fn relocate_refuses_occupied_or_unknown_keys() {
    let storage = MemoryStorage::shared();
    let mut manager = InventoryManager::new(fixture_registry(), storage);
    manager.open(key(1), INFO_PRESET).unwrap();
    manager.open(key(2), INFO_PRESET).unwrap();

    assert!(matches!(
        manager.relocate(&key(1), key(2)),
        Err(StoreError::Occupied(_))
    ));
    assert!(matches!(
        manager.relocate(&key(7), key(8)),
        Err(StoreError::NotLoaded(_))
    ));
    assert!(manager.is_loaded(&key(1)));
}

#[test]
fn relocate_refuses_targets_with_stored_records() {
    let storage = MemoryStorage::shared();
    let mut stored = InventoryRecord::new(INFO_PRESET);
    stored
        .set_slot(0, Some(&ItemStack::new("DIAMOND", 64)))
        .unwrap();
    storage.insert(key(2), stored.clone());

    let mut manager = InventoryManager::new(fixture_registry(), storage.clone());
    manager.open(key(1), INFO_PRESET).unwrap().set_item(0, Some(coal(1)));
    manager.save_all();

    assert!(matches!(
        manager.relocate(&key(1), key(2)),
        Err(StoreError::Occupied(_))
    ));
    assert_eq!(storage.record(&key(2)), Some(stored));
    assert!(storage.record(&key(1)).unwrap().contains_slot(0));
    assert!(manager.is_loaded(&key(1)));
    assert!(!manager.is_loaded(&key(2)));
}

#[test]
fn relocate_onto_itself_persists() {
    let storage = MemoryStorage::shared();
    let mut manager = InventoryManager::new(fixture_registry(), storage.clone());
    manager.open(key(1), INFO_PRESET).unwrap();

    manager.relocate(&key(1), key(1)).unwrap();
    assert!(storage.record(&key(1)).is_some());
    assert!(!manager.get(&key(1)).unwrap().is_dirty());
    assert!(matches!(
        manager.relocate(&key(5), key(5)),
        Err(StoreError::NotLoaded(_))
    ));
}

#[test]
fn remove_drops_live_inventory_and_record() {
    let storage = MemoryStorage::shared();
    let mut manager = InventoryManager::new(fixture_registry(), storage.clone());
    manager.open(key(1), INFO_PRESET).unwrap().set_item(0, Some(coal(1)));
    manager.save_all();

    assert!(manager.remove(&key(1)));
    assert!(storage.record(&key(1)).is_none());
    assert!(!manager.remove(&key(1)));
}

#[test]
fn reload_all_repairs_preset_slots() {
    let storage = MemoryStorage::shared();
    let mut manager = InventoryManager::new(fixture_registry(), storage);
    manager.open(key(1), INFO_PRESET).unwrap().set_item(8, None);

    assert_eq!(manager.reload_all(), 1);
    assert_eq!(manager.get(&key(1)).unwrap().get_item(8), Some(&info_marker()));
}
