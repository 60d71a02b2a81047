use anyhow::{Context, Result};
use blockstash_core::{CatalogErrors, ItemCatalog, ItemDefinition};
use blockstash_inventory::{
    FsRecordStorage, PresetDefinition, PresetErrors, PresetRegistry, DEFAULT_EXTENSION,
    DEFAULT_STORAGE_ROOT,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/blockstash.toml";
const DEFAULT_PRESETS_PATH: &str = "config/presets.json";
const DEFAULT_ITEMS_PATH: &str = "config/items.json";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one record file per block inventory.
    pub storage_root: PathBuf,
    /// Record file extension, without the dot.
    pub extension: String,
    pub presets_path: PathBuf,
    pub items_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            presets_path: PathBuf::from(DEFAULT_PRESETS_PATH),
            items_path: PathBuf::from(DEFAULT_ITEMS_PATH),
        }
    }
}

impl StoreConfig {
    /// Load configuration from `path`, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<StoreConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    StoreConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Config not found at {}. Using defaults", path.display());
                }
                StoreConfig::default()
            }
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn storage(&self) -> FsRecordStorage {
        FsRecordStorage::new(&self.storage_root, &self.extension)
    }

    /// Load and validate the preset file.
    pub fn load_presets(&self) -> Result<PresetRegistry> {
        let definitions = load_preset_definitions(&self.presets_path)?;
        PresetRegistry::from_definitions(definitions)
            .with_context(|| format!("Invalid presets in {}", self.presets_path.display()))
    }

    /// Load the item catalog; a missing items file yields an empty catalog.
    pub fn load_catalog(&self) -> Result<ItemCatalog> {
        if !self.items_path.exists() {
            warn!(
                "Item definitions not found at {}. Using an empty catalog",
                self.items_path.display()
            );
            return Ok(ItemCatalog::default());
        }
        let definitions = load_item_definitions(&self.items_path)?;
        ItemCatalog::build(definitions)
            .with_context(|| format!("Invalid items in {}", self.items_path.display()))
    }
}

/// Everything wrong with the data files, reported together.
#[derive(Debug, Default)]
pub struct DataReport {
    pub presets: usize,
    pub items: usize,
    pub preset_errors: Option<PresetErrors>,
    pub item_errors: Option<CatalogErrors>,
    /// Files that could not be read or parsed at all.
    pub unreadable: Vec<String>,
}

impl DataReport {
    pub fn is_ok(&self) -> bool {
        self.preset_errors.is_none() && self.item_errors.is_none() && self.unreadable.is_empty()
    }
}

/// Validate both data files without stopping at the first problem.
pub fn check_data(config: &StoreConfig) -> DataReport {
    let mut report = DataReport::default();

    match load_preset_definitions(&config.presets_path) {
        Ok(definitions) => match PresetRegistry::from_definitions(definitions) {
            Ok(registry) => report.presets = registry.len(),
            Err(errors) => report.preset_errors = Some(errors),
        },
        Err(err) => report.unreadable.push(format!("{err:#}")),
    }

    if config.items_path.exists() {
        match load_item_definitions(&config.items_path) {
            Ok(definitions) => match ItemCatalog::build(definitions) {
                Ok(catalog) => report.items = catalog.len(),
                Err(errors) => report.item_errors = Some(errors),
            },
            Err(err) => report.unreadable.push(format!("{err:#}")),
        }
    }

    report
}

fn load_preset_definitions(path: &Path) -> Result<Vec<PresetDefinition>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read presets {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse presets {}", path.display()))
}

fn load_item_definitions(path: &Path) -> Result<Vec<ItemDefinition>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read items {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse items {}", path.display()))
}
