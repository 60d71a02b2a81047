//! Item stacks and the metadata the block-inventory layer persists.

use serde::{Deserialize, Serialize};

use crate::registry::ItemId;

/// Material name the host uses for "nothing".
pub const AIR: &str = "AIR";

/// Maximum stack size for most items.
pub const DEFAULT_STACK_SIZE: u32 = 64;

/// Display metadata attached to a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMeta {
    /// Custom display name (with `&` colour codes left untranslated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Lore lines shown under the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lore: Option<Vec<String>>,
    /// Catalog id stamped on stacks created from a catalog template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    /// Persistent soulbound marker.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub soulbound: bool,
}

impl ItemMeta {
    /// Whether the metadata carries nothing at all.
    pub fn is_blank(&self) -> bool {
        self.display_name.is_none()
            && self.lore.is_none()
            && self.item_id.is_none()
            && !self.soulbound
    }
}

/// A stack of items occupying one inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Host material name (e.g. `PAPER`).
    pub material: String,
    /// Number of items in this stack.
    pub amount: u32,
    /// Optional display metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ItemMeta>,
}

impl ItemStack {
    /// Create a plain stack without metadata.
    pub fn new(material: impl Into<String>, amount: u32) -> Self {
        Self {
            material: material.into(),
            amount,
            meta: None,
        }
    }

    /// Create a single named item, the usual shape of UI marker items.
    pub fn named(material: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            amount: 1,
            meta: Some(ItemMeta {
                display_name: Some(display_name.into()),
                ..ItemMeta::default()
            }),
        }
    }

    /// Builder-style metadata override.
    pub fn with_meta(mut self, meta: ItemMeta) -> Self {
        self.meta = if meta.is_blank() { None } else { Some(meta) };
        self
    }

    /// Builder-style lore override.
    pub fn with_lore<I, S>(mut self, lore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta_mut().lore = Some(lore.into_iter().map(Into::into).collect());
        self
    }

    /// True for air or a zero-sized stack; such stacks never occupy a slot.
    pub fn is_empty(&self) -> bool {
        self.amount == 0 || self.material.eq_ignore_ascii_case(AIR)
    }

    /// Whether any metadata is attached.
    pub fn has_meta(&self) -> bool {
        self.meta.is_some()
    }

    /// Mutable metadata, created on first access.
    pub fn meta_mut(&mut self) -> &mut ItemMeta {
        self.meta.get_or_insert_with(ItemMeta::default)
    }

    /// Catalog id, if this stack was created from a template.
    pub fn item_id(&self) -> Option<&ItemId> {
        self.meta.as_ref().and_then(|meta| meta.item_id.as_ref())
    }

    /// Custom display name, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.display_name.as_deref())
    }

    /// Lore lines (empty when none are set).
    pub fn lore(&self) -> &[String] {
        self.meta
            .as_ref()
            .and_then(|meta| meta.lore.as_deref())
            .unwrap_or(&[])
    }

    /// Get the maximum stack size for this item.
    pub fn max_stack_size(&self) -> u32 {
        DEFAULT_STACK_SIZE
    }

    /// Check if this stack can merge with another stack.
    pub fn can_stack_with(&self, other: &ItemStack) -> bool {
        self.material == other.material && self.meta == other.meta
    }

    /// Check if this stack is at max capacity.
    pub fn is_full(&self) -> bool {
        self.amount >= self.max_stack_size()
    }

    /// Get remaining space in this stack.
    pub fn remaining_space(&self) -> u32 {
        self.max_stack_size().saturating_sub(self.amount)
    }

    /// Try to add items to this stack, returning the amount that didn't fit.
    pub fn add(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.remaining_space());
        self.amount += added;
        amount - added
    }

    /// Try to remove items from this stack, returning the amount actually removed.
    pub fn remove(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.amount);
        self.amount -= removed;
        removed
    }

    /// Split this stack, taking the specified amount into a new stack.
    pub fn split(&mut self, amount: u32) -> Option<ItemStack> {
        if amount == 0 || amount > self.amount {
            return None;
        }

        self.amount -= amount;
        Some(ItemStack {
            material: self.material.clone(),
            amount,
            meta: self.meta.clone(),
        })
    }
}
