//! Location-addressed block inventories.
//!
//! A [`BlockInventory`] is a fixed-size slot array shaped by a [`SlotPreset`]
//! and bound to a [`LocationKey`]. Player slots are persisted per location
//! through a [`RecordStorage`]; preset slots are rebuilt from the preset on
//! every load. [`InventoryManager`] keeps at most one live inventory per
//! location.

pub mod error;
pub mod location;
pub mod manager;
pub mod menu;
pub mod preset;
pub mod record;
pub mod storage;

pub use error::StoreError;
pub use location::{BlockPos, LocationKey, LocationParseError, LOCATION_SEPARATOR};
pub use manager::{InventoryManager, RestoreReport, SaveReport};
pub use menu::BlockInventory;
pub use preset::{
    LayoutPreset, LocationLabel, PresetDefinition, PresetError, PresetErrors, PresetRegistry,
    SlotContents, SlotPreset, MAX_INVENTORY_SIZE, ROW_SIZE,
};
pub use record::{InventoryRecord, PRESET_KEY};
pub use storage::{FsRecordStorage, RecordStorage, DEFAULT_EXTENSION, DEFAULT_STORAGE_ROOT};
