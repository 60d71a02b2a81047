#![warn(missing_docs)]
//! Core item primitives shared across the workspace.

pub mod catalog;
pub mod drops;
pub mod format;
pub mod item;
pub mod registry;

// Re-export commonly used types
pub use catalog::{
    contains_similar_item, is_item_similar, Capabilities, CatalogError, CatalogErrors,
    ItemCatalog, ItemDefinition, ItemError, ItemTemplate, SOULBOUND_LORE,
};
pub use drops::{DroppedItem, KillEvent, KillHandler, MobDropTable, UnlockCheck};
pub use item::{ItemMeta, ItemStack, AIR, DEFAULT_STACK_SIZE};
pub use registry::{IdPart, ItemId, ItemIdError, DEFAULT_NAMESPACE};
