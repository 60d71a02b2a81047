//! Custom mob drops and dropped-item markers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::catalog::{Capabilities, ItemCatalog};
use crate::item::ItemStack;
use crate::registry::ItemId;

/// A mob death as seen by the drop table.
#[derive(Debug, Clone, Copy)]
pub struct KillEvent<'a> {
    /// Entity kind of the victim (e.g. `IRON_GOLEM`).
    pub entity_kind: &'a str,
    /// Name of the killing player, if a player dealt the final blow.
    pub killer: Option<&'a str>,
    /// Item in the killer's main hand.
    pub weapon: Option<&'a ItemStack>,
}

/// Research/unlock lookup for players.
pub trait UnlockCheck {
    /// Whether `player` may receive `item`.
    fn has_unlocked(&self, player: &str, item: &ItemStack) -> bool;
}

impl<F> UnlockCheck for F
where
    F: Fn(&str, &ItemStack) -> bool,
{
    fn has_unlocked(&self, player: &str, item: &ItemStack) -> bool {
        self(player, item)
    }
}

/// Behaviour of a catalog item when its holder kills a mob.
pub trait KillHandler: Send + Sync {
    /// `weapon` is the held stack; handlers may push extra items to `drops`.
    fn on_kill(&self, kill: &KillEvent<'_>, weapon: &ItemStack, drops: &mut Vec<ItemStack>);
}

impl<F> KillHandler for F
where
    F: Fn(&KillEvent<'_>, &ItemStack, &mut Vec<ItemStack>) + Send + Sync,
{
    fn on_kill(&self, kill: &KillEvent<'_>, weapon: &ItemStack, drops: &mut Vec<ItemStack>) {
        self(kill, weapon, drops)
    }
}

/// Extra drops per entity kind, plus kill handlers per catalog item.
#[derive(Clone)]
pub struct MobDropTable {
    drops: BTreeMap<String, Vec<ItemStack>>,
    kill_handlers: BTreeMap<ItemId, Arc<dyn KillHandler>>,
    golem_drops_enabled: bool,
}

impl fmt::Debug for MobDropTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MobDropTable")
            .field("drops", &self.drops)
            .field("kill_handlers", &self.kill_handlers.keys().collect::<Vec<_>>())
            .field("golem_drops_enabled", &self.golem_drops_enabled)
            .finish()
    }
}

impl Default for MobDropTable {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MobDropTable {
    /// Create an empty table. `golem_drops_enabled` gates items flagged
    /// [`Capabilities::GOLEM_DROP`].
    pub fn new(golem_drops_enabled: bool) -> Self {
        Self {
            drops: BTreeMap::new(),
            kill_handlers: BTreeMap::new(),
            golem_drops_enabled,
        }
    }

    /// Register `stack` as an extra drop of `entity_kind`.
    pub fn register(&mut self, entity_kind: impl Into<String>, stack: ItemStack) {
        self.drops.entry(entity_kind.into()).or_default().push(stack);
    }

    /// Run `handler` whenever a player kills a mob holding the item `id`.
    /// Replaces any handler already registered for `id`.
    pub fn register_kill_handler(&mut self, id: ItemId, handler: impl KillHandler + 'static) {
        self.kill_handlers.insert(id, Arc::new(handler));
    }

    /// Drops registered for `entity_kind`.
    pub fn drops_for(&self, entity_kind: &str) -> &[ItemStack] {
        self.drops
            .get(entity_kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append the custom drops for `kill` to `drops`, returning how many were added.
    ///
    /// Nothing is added unless a player made the kill; each drop is then
    /// filtered by the player's unlocks and the golem-drop switch. Afterwards
    /// the kill handler of the held catalog item runs, if the item is enabled
    /// and unlocked for the player.
    pub fn inject_drops(
        &self,
        catalog: &ItemCatalog,
        kill: KillEvent<'_>,
        unlocks: &dyn UnlockCheck,
        drops: &mut Vec<ItemStack>,
    ) -> usize {
        let Some(player) = kill.killer else {
            return 0;
        };

        let before = drops.len();
        for drop in self.drops_for(kill.entity_kind) {
            if !unlocks.has_unlocked(player, drop) {
                continue;
            }
            let golem_only = catalog
                .template_for(drop)
                .is_some_and(|template| template.has(Capabilities::GOLEM_DROP));
            if golem_only && !self.golem_drops_enabled {
                trace!(entity = kill.entity_kind, "golem drop suppressed");
                continue;
            }
            drops.push(drop.clone());
        }

        if let Some(weapon) = kill.weapon.filter(|weapon| !weapon.is_empty()) {
            self.run_kill_handler(catalog, &kill, player, weapon, unlocks, drops);
        }
        drops.len() - before
    }

    fn run_kill_handler(
        &self,
        catalog: &ItemCatalog,
        kill: &KillEvent<'_>,
        player: &str,
        weapon: &ItemStack,
        unlocks: &dyn UnlockCheck,
        drops: &mut Vec<ItemStack>,
    ) {
        let Some(template) = catalog.template_for(weapon) else {
            return;
        };
        let Some(handler) = self.kill_handlers.get(template.id()) else {
            return;
        };
        if template.is_disabled() || !unlocks.has_unlocked(player, weapon) {
            trace!(item = %template.id(), "kill handler skipped");
            return;
        }
        handler.on_kill(kill, weapon, drops);
    }
}

/// An item entity lying in the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    /// The stack the entity carries.
    pub stack: ItemStack,
    no_pickup: Option<String>,
}

impl DroppedItem {
    /// Wrap a stack as a pickable item entity.
    pub fn new(stack: ItemStack) -> Self {
        Self {
            stack,
            no_pickup: None,
        }
    }

    /// Prevent players and hoppers from picking this item up.
    ///
    /// Display items (pedestals, showcases) use this; `context` names the
    /// device that placed the item.
    pub fn mark_no_pickup(&mut self, context: impl Into<String>) {
        self.no_pickup = Some(context.into());
    }

    /// Whether the item was marked by [`mark_no_pickup`](Self::mark_no_pickup).
    pub fn has_no_pickup_flag(&self) -> bool {
        self.no_pickup.is_some()
    }

    /// The device context that marked the item, if any.
    pub fn no_pickup_context(&self) -> Option<&str> {
        self.no_pickup.as_deref()
    }
}
