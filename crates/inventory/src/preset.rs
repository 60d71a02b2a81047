//! Inventory presets: the fixed layout a block inventory is shaped by.
//!
//! A preset declares how many slots an inventory has, which of them are
//! fixed UI chrome (never persisted) and how those slots are populated. The
//! remaining slots are player storage and are persisted per location.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use blockstash_core::ItemStack;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::location::LocationKey;

/// Largest inventory a preset may declare (a double chest).
pub const MAX_INVENTORY_SIZE: usize = 54;

/// Slots per chest row; preset sizes are whole rows.
pub const ROW_SIZE: usize = 9;

/// Fixed-length slot array. Empty stacks are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotContents {
    slots: Vec<Option<ItemStack>>,
}

impl SlotContents {
    /// `size` empty slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Item in `slot`; `None` when empty or out of range.
    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut ItemStack> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Put `item` into `slot`, returning whether the slot exists.
    pub fn set(&mut self, slot: usize, item: Option<ItemStack>) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) => {
                *entry = item.filter(|item| !item.is_empty());
                true
            }
            None => false,
        }
    }

    /// Remove and return the item in `slot`.
    pub fn take(&mut self, slot: usize) -> Option<ItemStack> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Drop stacks that were emptied in place.
    pub fn normalize(&mut self) {
        for entry in &mut self.slots {
            if entry.as_ref().is_some_and(ItemStack::is_empty) {
                *entry = None;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&ItemStack>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }

    pub fn as_slice(&self) -> &[Option<ItemStack>] {
        &self.slots
    }
}

/// Shared layout template for every inventory of one kind.
pub trait SlotPreset: Send + Sync {
    /// Identifier written into persisted records.
    fn id(&self) -> &str;

    /// Total slot count.
    fn size(&self) -> usize;

    /// Slots owned by the preset. They are re-populated on every
    /// initialization and never persisted.
    fn preset_slots(&self) -> &BTreeSet<usize>;

    fn is_preset_slot(&self, slot: usize) -> bool {
        self.preset_slots().contains(&slot)
    }

    /// Slots holding player content, in ascending order.
    fn inventory_slots(&self) -> Vec<usize> {
        (0..self.size())
            .filter(|slot| !self.is_preset_slot(*slot))
            .collect()
    }

    /// Write the preset's fixed items into `slots`.
    ///
    /// Callers hand over preset slots already emptied, so a slot the preset
    /// does not write stays empty.
    fn populate(&self, slots: &mut SlotContents, location: &LocationKey);

    /// Called after an inventory has been rebound to `location`.
    fn on_relocate(&self, _slots: &mut SlotContents, _location: &LocationKey) {}
}

/// Data form of a [`LayoutPreset`], as loaded from `presets.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetDefinition {
    pub id: String,
    pub size: usize,
    /// Fixed items keyed by slot index.
    #[serde(default)]
    pub items: BTreeMap<usize, ItemStack>,
    /// Additional preset slots left empty (e.g. output-only slots).
    #[serde(default)]
    pub reserved: BTreeSet<usize>,
    /// Slot whose item shows the inventory's coordinates.
    #[serde(default)]
    pub location_label: Option<LocationLabel>,
}

/// An item whose lore carries the coordinates of the inventory it sits in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationLabel {
    pub slot: usize,
    pub item: ItemStack,
}

impl LocationLabel {
    fn render(&self, location: &LocationKey) -> ItemStack {
        let pos = location.block();
        let line = format!(
            "&7{} &8@ &f{}, {}, {}",
            location.world(),
            pos.x,
            pos.y,
            pos.z
        );
        let mut item = self.item.clone();
        let mut lore = item.lore().to_vec();
        lore.push(line);
        item.meta_mut().lore = Some(lore);
        item
    }
}

/// Problem found in a single preset definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    #[error("preset #{index} has an empty id")]
    EmptyId { index: usize },
    #[error("preset {id:?} is defined more than once")]
    Duplicate { id: String },
    #[error("preset {id:?} has size {size}; expected whole rows of 9, at most 54 slots")]
    InvalidSize { id: String, size: usize },
    #[error("preset {id:?} uses slot {slot}, outside its {size} slots")]
    SlotOutOfRange { id: String, slot: usize, size: usize },
    #[error("preset {id:?} places an empty item in slot {slot}")]
    EmptyItem { id: String, slot: usize },
}

/// Every problem found while building a [`PresetRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetErrors(pub Vec<PresetError>);

impl fmt::Display for PresetErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid preset definition(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for PresetErrors {}

/// Declarative preset built from a [`PresetDefinition`].
#[derive(Debug, Clone)]
pub struct LayoutPreset {
    id: String,
    size: usize,
    fixed: BTreeMap<usize, ItemStack>,
    label: Option<LocationLabel>,
    preset_slots: BTreeSet<usize>,
}

impl LayoutPreset {
    /// Validate `definition`, collecting every problem it has.
    pub fn from_definition(definition: PresetDefinition) -> Result<Self, Vec<PresetError>> {
        let PresetDefinition {
            id,
            size,
            items,
            reserved,
            location_label,
        } = definition;

        let mut errors = Vec::new();
        if id.trim().is_empty() {
            errors.push(PresetError::EmptyId { index: 0 });
        }
        if size == 0 || size > MAX_INVENTORY_SIZE || size % ROW_SIZE != 0 {
            errors.push(PresetError::InvalidSize {
                id: id.clone(),
                size,
            });
        }

        let label_slot = location_label.as_ref().map(|label| label.slot);
        for slot in items
            .keys()
            .chain(reserved.iter())
            .chain(label_slot.iter())
        {
            if *slot >= size {
                errors.push(PresetError::SlotOutOfRange {
                    id: id.clone(),
                    slot: *slot,
                    size,
                });
            }
        }
        for (slot, item) in &items {
            if item.is_empty() {
                errors.push(PresetError::EmptyItem {
                    id: id.clone(),
                    slot: *slot,
                });
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let preset_slots = items
            .keys()
            .copied()
            .chain(reserved)
            .chain(label_slot)
            .collect();
        Ok(Self {
            id,
            size,
            fixed: items,
            label: location_label,
            preset_slots,
        })
    }

    /// Fixed item placed in `slot`, if any.
    pub fn fixed_item(&self, slot: usize) -> Option<&ItemStack> {
        self.fixed.get(&slot)
    }
}

impl SlotPreset for LayoutPreset {
    fn id(&self) -> &str {
        &self.id
    }

    fn size(&self) -> usize {
        self.size
    }

    fn preset_slots(&self) -> &BTreeSet<usize> {
        &self.preset_slots
    }

    fn populate(&self, slots: &mut SlotContents, location: &LocationKey) {
        for &slot in &self.preset_slots {
            slots.set(slot, self.fixed.get(&slot).cloned());
        }
        if let Some(label) = &self.label {
            slots.set(label.slot, Some(label.render(location)));
        }
    }

    fn on_relocate(&self, slots: &mut SlotContents, location: &LocationKey) {
        if let Some(label) = &self.label {
            slots.set(label.slot, Some(label.render(location)));
        }
    }
}

/// Presets by id.
#[derive(Default, Clone)]
pub struct PresetRegistry {
    presets: BTreeMap<String, Arc<dyn SlotPreset>>,
}

impl fmt::Debug for PresetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.presets.keys()).finish()
    }
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from data definitions, reporting every invalid one.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, PresetErrors>
    where
        I: IntoIterator<Item = PresetDefinition>,
    {
        let mut registry = Self::new();
        let mut errors = Vec::new();

        for (index, definition) in definitions.into_iter().enumerate() {
            let id = definition.id.clone();
            match LayoutPreset::from_definition(definition) {
                Ok(preset) => {
                    if registry.presets.contains_key(&id) {
                        errors.push(PresetError::Duplicate { id });
                    } else {
                        registry.presets.insert(id, Arc::new(preset));
                    }
                }
                Err(found) => errors.extend(found.into_iter().map(|error| match error {
                    PresetError::EmptyId { .. } => PresetError::EmptyId { index },
                    other => other,
                })),
            }
        }

        if errors.is_empty() {
            debug!(presets = registry.len(), "preset registry built");
            Ok(registry)
        } else {
            Err(PresetErrors(errors))
        }
    }

    /// Parse `presets.json` (an array of definitions) and build the registry.
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        let definitions: Vec<PresetDefinition> = serde_json::from_str(input)?;
        Ok(Self::from_definitions(definitions)?)
    }

    /// Add a code-defined preset, returning the one it replaced.
    pub fn register(&mut self, preset: Arc<dyn SlotPreset>) -> Option<Arc<dyn SlotPreset>> {
        self.presets.insert(preset.id().to_string(), preset)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn SlotPreset>> {
        self.presets.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.presets.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.presets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
