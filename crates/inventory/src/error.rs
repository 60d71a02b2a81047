use std::io;

use thiserror::Error;

use crate::location::LocationKey;

/// Errors raised by the block-inventory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or listing a stored inventory failed.
    #[error("I/O error on {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: io::Error,
    },
    /// A stored inventory exists but cannot be decoded.
    #[error("stored inventory {target} is corrupt: {reason}")]
    Corrupt { target: String, reason: String },
    /// A slot item could not be encoded for storage.
    #[error("slot {slot} of {location} could not be encoded: {source}")]
    Encode {
        location: LocationKey,
        slot: usize,
        #[source]
        source: serde_json::Error,
    },
    /// The world name cannot be turned into a file name.
    #[error("world name {0:?} cannot be used in a stored inventory file name")]
    InvalidWorldName(String),
    /// No preset is registered under this id.
    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
    /// A live inventory exists at the location with another preset.
    #[error("inventory at {location} uses preset {bound:?}, not {requested:?}")]
    PresetMismatch {
        location: LocationKey,
        bound: String,
        requested: String,
    },
    /// A live inventory or a stored record already occupies the location.
    #[error("an inventory already exists at {0}")]
    Occupied(LocationKey),
    /// No live inventory exists at the location.
    #[error("no inventory is loaded at {0}")]
    NotLoaded(LocationKey),
}

impl StoreError {
    pub fn io(target: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            target: target.into(),
            source,
        }
    }

    pub fn corrupt(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}
