//! Item catalog: the process-wide set of item templates.
//!
//! The catalog is built once from a list of [`ItemDefinition`]s. Every invalid
//! definition is reported in one [`CatalogErrors`] value; a catalog that builds
//! successfully never has a missing entry for an id it accepted.
//!
//! Item capabilities (soulbound, radioactive, ...) are resolved into
//! [`Capabilities`] flags when a template is registered and answered by flag
//! lookup afterwards.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::item::{ItemMeta, ItemStack};
use crate::registry::ItemId;

/// Lore line appended to soulbound items.
pub const SOULBOUND_LORE: &str = "&7Soulbound";

bitflags::bitflags! {
    /// Capability flags resolved at template registration time.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Kept in the inventory on death.
        const SOULBOUND = 0b0000_0001;
        /// Harms players carrying it without protection.
        const RADIOACTIVE = 0b0000_0010;
        /// Cannot be placed as a block.
        const NOT_PLACEABLE = 0b0000_0100;
        /// Golem drop that servers can switch off (see the mob drop table).
        const GOLEM_DROP = 0b0000_1000;
    }
}

/// Capability names accepted in definition files.
fn capability_by_name(name: &str) -> Option<Capabilities> {
    match name.trim().to_ascii_lowercase().as_str() {
        "soulbound" => Some(Capabilities::SOULBOUND),
        "radioactive" => Some(Capabilities::RADIOACTIVE),
        "not_placeable" => Some(Capabilities::NOT_PLACEABLE),
        "golem_drop" => Some(Capabilities::GOLEM_DROP),
        _ => None,
    }
}

/// Raw template definition as authored in data files.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDefinition {
    /// Namespaced id (`blockstash:gold_pan` or bare `gold_pan`).
    pub id: String,
    /// Host material the item is built on.
    pub material: String,
    /// Display name.
    pub name: String,
    /// Lore lines.
    #[serde(default)]
    pub lore: Vec<String>,
    /// Capability names (`soulbound`, `radioactive`, ...).
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Disabled items keep their template but lose their capabilities.
    #[serde(default)]
    pub disabled: bool,
}

/// An immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTemplate {
    id: ItemId,
    material: String,
    name: String,
    lore: Vec<String>,
    capabilities: Capabilities,
    disabled: bool,
}

impl ItemTemplate {
    /// Template id.
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Host material.
    pub fn material(&self) -> &str {
        &self.material
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw capability flags (regardless of the disabled state).
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether the item is switched off on this server.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// True when the template has `flag` and is enabled.
    pub fn has(&self, flag: Capabilities) -> bool {
        !self.disabled && self.capabilities.contains(flag)
    }

    /// Build a fresh stack of this item, stamped with its catalog id.
    pub fn create_stack(&self, amount: u32) -> ItemStack {
        ItemStack::new(self.material.clone(), amount).with_meta(ItemMeta {
            display_name: Some(self.name.clone()),
            lore: if self.lore.is_empty() {
                None
            } else {
                Some(self.lore.clone())
            },
            item_id: Some(self.id.clone()),
            soulbound: false,
        })
    }
}

/// A single rejected definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Id failed to parse.
    #[error("item #{index} has an invalid id {id:?}: {reason}")]
    InvalidId {
        /// Position in the definition list.
        index: usize,
        /// Offending id text.
        id: String,
        /// Parser message.
        reason: String,
    },
    /// Id already registered.
    #[error("item {id} is defined more than once")]
    Duplicate {
        /// The repeated id.
        id: ItemId,
    },
    /// Material missing.
    #[error("item {id} has no material")]
    MissingMaterial {
        /// The template id.
        id: ItemId,
    },
    /// Display name missing.
    #[error("item {id} has no display name")]
    MissingName {
        /// The template id.
        id: ItemId,
    },
    /// Capability name not recognised.
    #[error("item {id} lists unknown capability {capability:?}")]
    UnknownCapability {
        /// The template id.
        id: ItemId,
        /// The unrecognised name.
        capability: String,
    },
}

/// Every error found while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogErrors(pub Vec<CatalogError>);

impl fmt::Display for CatalogErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid item definition(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CatalogErrors {}

/// Misuse of a stack-level catalog operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// Operation requires a non-empty stack.
    #[error("a soulbound item cannot be empty or air")]
    EmptyStack,
}

/// Registry of item templates keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    templates: BTreeMap<ItemId, ItemTemplate>,
}

impl ItemCatalog {
    /// Build the catalog, collecting every invalid definition.
    pub fn build<I>(definitions: I) -> Result<Self, CatalogErrors>
    where
        I: IntoIterator<Item = ItemDefinition>,
    {
        let mut templates = BTreeMap::new();
        let mut errors = Vec::new();

        for (index, def) in definitions.into_iter().enumerate() {
            let id = match ItemId::parse(&def.id) {
                Ok(id) => id,
                Err(err) => {
                    errors.push(CatalogError::InvalidId {
                        index,
                        id: def.id,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let mut valid = true;
            if def.material.trim().is_empty() {
                errors.push(CatalogError::MissingMaterial { id: id.clone() });
                valid = false;
            }
            if def.name.trim().is_empty() {
                errors.push(CatalogError::MissingName { id: id.clone() });
                valid = false;
            }

            let mut capabilities = Capabilities::empty();
            for name in &def.capabilities {
                match capability_by_name(name) {
                    Some(flag) => capabilities |= flag,
                    None => {
                        errors.push(CatalogError::UnknownCapability {
                            id: id.clone(),
                            capability: name.clone(),
                        });
                        valid = false;
                    }
                }
            }

            if templates.contains_key(&id) {
                errors.push(CatalogError::Duplicate { id });
                continue;
            }
            if !valid {
                continue;
            }

            templates.insert(
                id.clone(),
                ItemTemplate {
                    id,
                    material: def.material.trim().to_string(),
                    name: def.name,
                    lore: def.lore,
                    capabilities,
                    disabled: def.disabled,
                },
            );
        }

        if errors.is_empty() {
            debug!(items = templates.len(), "item catalog built");
            Ok(Self { templates })
        } else {
            Err(CatalogErrors(errors))
        }
    }

    /// Parse definitions from JSON and build the catalog.
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        let defs: Vec<ItemDefinition> = serde_json::from_str(input)?;
        Ok(Self::build(defs)?)
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true when the catalog holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Look a template up by id.
    pub fn get(&self, id: &ItemId) -> Option<&ItemTemplate> {
        self.templates.get(id)
    }

    /// Iterate templates in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemTemplate> + '_ {
        self.templates.values()
    }

    /// Template a stack was created from, if it carries a known id.
    pub fn template_for(&self, stack: &ItemStack) -> Option<&ItemTemplate> {
        stack.item_id().and_then(|id| self.templates.get(id))
    }

    /// Whether `stack` stays with its owner on death.
    ///
    /// True for stacks carrying the soulbound marker, stacks of an enabled
    /// soulbound template, and legacy stacks whose lore contains
    /// [`SOULBOUND_LORE`].
    pub fn is_soulbound(&self, stack: &ItemStack) -> bool {
        if stack.is_empty() {
            return false;
        }
        if stack.meta.as_ref().is_some_and(|meta| meta.soulbound) {
            return true;
        }
        if let Some(template) = self.template_for(stack) {
            if template.capabilities.contains(Capabilities::SOULBOUND) {
                return !template.disabled;
            }
        }
        stack.lore().iter().any(|line| line == SOULBOUND_LORE)
    }

    /// Toggle the soulbound marker and lore line on `stack`.
    pub fn set_soulbound(&self, stack: &mut ItemStack, soulbound: bool) -> Result<(), ItemError> {
        if stack.is_empty() {
            return Err(ItemError::EmptyStack);
        }

        let was_soulbound = self.is_soulbound(stack);
        let meta = stack.meta_mut();
        meta.soulbound = soulbound;

        let lore = meta.lore.get_or_insert_with(Vec::new);
        if soulbound && !was_soulbound {
            lore.push(SOULBOUND_LORE.to_string());
        }
        if !soulbound {
            lore.retain(|line| line != SOULBOUND_LORE);
        }
        if lore.is_empty() {
            meta.lore = None;
        }
        if stack.meta.as_ref().is_some_and(ItemMeta::is_blank) {
            stack.meta = None;
        }
        Ok(())
    }

    /// Whether `stack` is radioactive.
    pub fn is_radioactive(&self, stack: &ItemStack) -> bool {
        self.template_for(stack)
            .is_some_and(|template| template.has(Capabilities::RADIOACTIVE))
    }
}

/// Compare two stacks the way machines match recipe inputs.
///
/// `expected` is the reference item. With `check_amount`, `item` must hold at
/// least as many items. Catalog ids short-circuit the comparison when both
/// stacks carry one; otherwise display name and (optionally) lore must match,
/// ignoring the soulbound lore line.
pub fn is_item_similar(
    item: Option<&ItemStack>,
    expected: Option<&ItemStack>,
    check_lore: bool,
    check_amount: bool,
) -> bool {
    let (item, expected) = match (item, expected) {
        (None, None) => return true,
        (Some(item), Some(expected)) => (item, expected),
        _ => return false,
    };

    if item.material != expected.material {
        return false;
    }
    if check_amount && item.amount < expected.amount {
        return false;
    }

    if let (Some(a), Some(b)) = (item.item_id(), expected.item_id()) {
        return a == b;
    }

    match (&item.meta, &expected.meta) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            if a.display_name != b.display_name {
                return false;
            }
            !check_lore || equals_lore(a.lore.as_deref(), b.lore.as_deref())
        }
        _ => false,
    }
}

/// Whether any non-empty slot holds an item similar to `item`.
pub fn contains_similar_item<'a, I>(slots: I, item: &ItemStack, check_lore: bool) -> bool
where
    I: IntoIterator<Item = Option<&'a ItemStack>>,
{
    slots
        .into_iter()
        .flatten()
        .filter(|stack| !stack.is_empty())
        .any(|stack| is_item_similar(Some(stack), Some(item), check_lore, true))
}

fn equals_lore(a: Option<&[String]>, b: Option<&[String]>) -> bool {
    let strip = |lore: Option<&[String]>| -> Vec<String> {
        lore.unwrap_or_default()
            .iter()
            .filter(|line| line.as_str() != SOULBOUND_LORE)
            .cloned()
            .collect()
    };
    strip(a) == strip(b)
}
