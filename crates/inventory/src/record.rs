//! Flat key/value record persisted for one block inventory.
//!
//! Key `"preset"` holds the preset id; keys `"0"`..`"N-1"` hold the serialized
//! item of every persisted slot that has content. A missing slot key means the
//! slot is empty (or is a preset slot, which is never written).

use std::collections::{BTreeMap, BTreeSet};

use blockstash_core::ItemStack;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record key holding the preset id.
pub const PRESET_KEY: &str = "preset";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryRecord {
    entries: BTreeMap<String, Value>,
}

impl InventoryRecord {
    /// Empty record bound to `preset_id`.
    pub fn new(preset_id: &str) -> Self {
        let mut record = Self::default();
        record.set_preset_id(preset_id);
        record
    }

    pub fn preset_id(&self) -> Option<&str> {
        self.entries.get(PRESET_KEY).and_then(Value::as_str)
    }

    pub fn set_preset_id(&mut self, preset_id: &str) {
        self.entries
            .insert(PRESET_KEY.to_string(), Value::String(preset_id.to_string()));
    }

    /// Whether the record has a value under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn contains_slot(&self, slot: usize) -> bool {
        self.contains(&slot.to_string())
    }

    /// Decode the item stored for `slot`; `Ok(None)` when the key is absent.
    pub fn slot_item(&self, slot: usize) -> Result<Option<ItemStack>, serde_json::Error> {
        match self.entries.get(&slot.to_string()) {
            Some(value) => ItemStack::deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    /// Store (or, with `None`, clear) the item for `slot`.
    pub fn set_slot(
        &mut self,
        slot: usize,
        item: Option<&ItemStack>,
    ) -> Result<(), serde_json::Error> {
        let key = slot.to_string();
        match item {
            Some(item) if !item.is_empty() => {
                self.entries.insert(key, serde_json::to_value(item)?);
            }
            _ => {
                self.entries.remove(&key);
            }
        }
        Ok(())
    }

    /// Slot indices present in the record, in numeric order.
    pub fn slots(&self) -> BTreeSet<usize> {
        self.entries
            .keys()
            .filter_map(|key| key.parse::<usize>().ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}
