//! Operator commands over the stored block inventories.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use blockstash_core::format::format_big_number;
use blockstash_core::{ItemCatalog, ItemStack};
use blockstash_inventory::{InventoryManager, InventoryRecord, LocationKey, RecordStorage};
use clap::Subcommand;
use tracing::info;

use crate::config::{check_data, StoreConfig};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every stored inventory with its preset and item count
    List,
    /// Show the stored slots of one inventory (`world;x;y;z`)
    Inspect { location: LocationKey },
    /// Delete the stored inventory at a location
    Delete { location: LocationKey },
    /// Move a stored inventory to another location
    Move { from: LocationKey, to: LocationKey },
    /// Re-apply presets to stored inventories and save them again
    Reload {
        /// Reload every stored inventory
        #[arg(long, conflicts_with = "location")]
        all: bool,
        #[arg(required_unless_present = "all")]
        location: Option<LocationKey>,
    },
    /// Validate the preset and item definition files
    Check,
}

pub fn run(command: &Command, config: &StoreConfig, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::List => list(config, out),
        Command::Inspect { location } => inspect(config, location, out),
        Command::Delete { location } => delete(config, location, out),
        Command::Move { from, to } => relocate(config, from, to, out),
        Command::Reload { all: true, .. } => reload_all(config, out),
        Command::Reload {
            location: Some(location),
            ..
        } => reload_one(config, location, out),
        Command::Reload { .. } => bail!("reload needs a location or --all"),
        Command::Check => check(config, out),
    }
}

fn list(config: &StoreConfig, out: &mut dyn Write) -> Result<()> {
    let storage = config.storage();
    let keys = storage.keys()?;
    if keys.is_empty() {
        writeln!(out, "no stored inventories under {}", storage.root().display())?;
        return Ok(());
    }

    for location in &keys {
        match storage.load(location) {
            Ok(Some(record)) => {
                let (stacks, items) = totals(&record);
                writeln!(
                    out,
                    "{location}  {}  {stacks} stacks, {} items",
                    record.preset_id().unwrap_or("<no preset>"),
                    format_big_number(items)
                )?;
            }
            Ok(None) => {}
            Err(err) => writeln!(out, "{location}  <unreadable: {err}>")?,
        }
    }
    writeln!(out, "{} stored inventories", format_big_number(keys.len() as i64))?;
    Ok(())
}

fn inspect(config: &StoreConfig, location: &LocationKey, out: &mut dyn Write) -> Result<()> {
    let storage = config.storage();
    let record = load_existing(&storage, location)?;
    let catalog = config.load_catalog()?;

    writeln!(out, "{location}")?;
    writeln!(out, "  preset: {}", record.preset_id().unwrap_or("<none>"))?;
    writeln!(out, "  file:   {}", storage.describe(location))?;
    for slot in record.slots() {
        match record.slot_item(slot) {
            Ok(Some(item)) => writeln!(out, "  [{slot:>2}] {}", describe_item(&item, &catalog))?,
            Ok(None) => {}
            Err(err) => writeln!(out, "  [{slot:>2}] <undecodable: {err}>")?,
        }
    }
    Ok(())
}

fn delete(config: &StoreConfig, location: &LocationKey, out: &mut dyn Write) -> Result<()> {
    let storage = config.storage();
    if storage.remove(location)? {
        info!(%location, "deleted stored inventory");
        writeln!(out, "deleted {}", storage.describe(location))?;
    } else {
        writeln!(out, "nothing stored at {location}")?;
    }
    Ok(())
}

fn relocate(
    config: &StoreConfig,
    from: &LocationKey,
    to: &LocationKey,
    out: &mut dyn Write,
) -> Result<()> {
    let storage: Arc<dyn RecordStorage> = Arc::new(config.storage());
    let record = load_existing(storage.as_ref(), from)?;
    let preset_id = record
        .preset_id()
        .with_context(|| format!("stored inventory at {from} names no preset"))?;

    let mut manager = InventoryManager::new(config.load_presets()?, storage);
    manager.open(from.clone(), preset_id)?;
    manager.relocate(from, to.clone())?;
    writeln!(out, "moved {from} -> {to}")?;
    Ok(())
}

fn reload_one(config: &StoreConfig, location: &LocationKey, out: &mut dyn Write) -> Result<()> {
    let storage: Arc<dyn RecordStorage> = Arc::new(config.storage());
    let record = load_existing(storage.as_ref(), location)?;
    let preset_id = record
        .preset_id()
        .with_context(|| format!("stored inventory at {location} names no preset"))?;

    let mut manager = InventoryManager::new(config.load_presets()?, storage);
    manager.open(location.clone(), preset_id)?.reload();
    manager.unload(location)?;
    writeln!(out, "reloaded {location} with preset {preset_id}")?;
    Ok(())
}

fn reload_all(config: &StoreConfig, out: &mut dyn Write) -> Result<()> {
    let storage: Arc<dyn RecordStorage> = Arc::new(config.storage());
    let mut manager = InventoryManager::new(config.load_presets()?, storage);

    let restored = manager.restore_all()?;
    for (location, err) in &restored.failed {
        writeln!(out, "skipped {location}: {err}")?;
    }
    manager.reload_all();
    let saved = manager.save_all();
    for (location, err) in &saved.failed {
        writeln!(out, "failed to save {location}: {err}")?;
    }

    writeln!(
        out,
        "reloaded {} of {} stored inventories",
        saved.saved,
        restored.restored.len() + restored.failed.len()
    )?;
    if !restored.is_ok() || !saved.is_ok() {
        bail!(
            "{} inventories could not be reloaded",
            restored.failed.len() + saved.failed.len()
        );
    }
    Ok(())
}

fn check(config: &StoreConfig, out: &mut dyn Write) -> Result<()> {
    let report = check_data(config);
    for problem in &report.unreadable {
        writeln!(out, "error: {problem}")?;
    }
    if let Some(errors) = &report.preset_errors {
        writeln!(out, "{}: {errors}", config.presets_path.display())?;
    }
    if let Some(errors) = &report.item_errors {
        writeln!(out, "{}: {errors}", config.items_path.display())?;
    }
    if !report.is_ok() {
        bail!("data files are invalid");
    }
    writeln!(out, "ok: {} presets, {} items", report.presets, report.items)?;
    Ok(())
}

fn load_existing(storage: &dyn RecordStorage, location: &LocationKey) -> Result<InventoryRecord> {
    storage
        .load(location)?
        .with_context(|| format!("nothing stored at {location}"))
}

fn totals(record: &InventoryRecord) -> (usize, i64) {
    let items: Vec<ItemStack> = record
        .slots()
        .into_iter()
        .filter_map(|slot| record.slot_item(slot).ok().flatten())
        .collect();
    let amount = items.iter().map(|item| i64::from(item.amount)).sum();
    (items.len(), amount)
}

fn describe_item(item: &ItemStack, catalog: &ItemCatalog) -> String {
    let mut text = format!("{}x {}", item.amount, item.material);
    if let Some(name) = item.display_name() {
        text.push_str(&format!(" \"{name}\""));
    }
    if let Some(id) = item.item_id() {
        text.push_str(&format!(" ({id})"));
    }
    if catalog.is_soulbound(item) {
        text.push_str(" [soulbound]");
    }
    if catalog.is_radioactive(item) {
        text.push_str(" [radioactive]");
    }
    text
}
