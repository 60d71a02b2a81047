//! Namespaced item identifiers.
//!
//! Catalog templates are keyed by an [`ItemId`] such as `blockstash:gold_pan`,
//! and stacks created from a template carry the same id in their metadata so
//! the template can be found again after the stack has been persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace assumed for ids written without one.
pub const DEFAULT_NAMESPACE: &str = "blockstash";

const MAX_NAMESPACE_LEN: usize = 64;
const MAX_PATH_LEN: usize = 128;

/// Which half of an id failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPart {
    /// Text before the `:`.
    Namespace,
    /// Text after the `:`.
    Path,
}

impl fmt::Display for IdPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdPart::Namespace => "namespace",
            IdPart::Path => "path",
        })
    }
}

/// Reason an item id was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemIdError {
    /// Nothing but whitespace.
    #[error("item id is empty")]
    Empty,
    /// One side of the `:` is empty.
    #[error("item id {part} is empty")]
    EmptyPart {
        /// The empty half.
        part: IdPart,
    },
    /// One side of the `:` exceeds its length limit.
    #[error("item id {part} is longer than {max} characters")]
    TooLong {
        /// The oversized half.
        part: IdPart,
        /// Length limit for that half.
        max: usize,
    },
    /// A character outside `a-z0-9_.-` (plus `/` in paths).
    #[error("item id {part} contains {found:?}")]
    InvalidChar {
        /// The half holding the character.
        part: IdPart,
        /// The offending character.
        found: char,
    },
}

/// Identifier of a catalog item, `namespace:path`.
///
/// Sorted by namespace, then path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId {
    namespace: String,
    path: String,
}

impl ItemId {
    /// Parse `namespace:path`, or a bare `path` in [`DEFAULT_NAMESPACE`].
    ///
    /// Paths are lowercased, so legacy ids such as `GOLD_PAN` and `gold_pan`
    /// name the same item. Namespaces must already be lowercase.
    pub fn parse(input: &str) -> Result<Self, ItemIdError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ItemIdError::Empty);
        }

        let (namespace, path) = input
            .split_once(':')
            .unwrap_or((DEFAULT_NAMESPACE, input));
        let namespace = namespace.trim();
        let path = path.trim().to_ascii_lowercase();

        check_part(IdPart::Namespace, namespace, MAX_NAMESPACE_LEN)?;
        check_part(IdPart::Path, &path, MAX_PATH_LEN)?;

        Ok(Self {
            namespace: namespace.to_owned(),
            path,
        })
    }

    /// Namespace half of the id.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path half of the id.
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn check_part(part: IdPart, value: &str, max: usize) -> Result<(), ItemIdError> {
    if value.is_empty() {
        return Err(ItemIdError::EmptyPart { part });
    }
    if value.len() > max {
        return Err(ItemIdError::TooLong { part, max });
    }
    let allowed = |c: char| {
        c.is_ascii_lowercase()
            || c.is_ascii_digit()
            || matches!(c, '_' | '-' | '.')
            || (part == IdPart::Path && c == '/')
    };
    match value.chars().find(|c| !allowed(*c)) {
        Some(found) => Err(ItemIdError::InvalidChar { part, found }),
        None => Ok(()),
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ItemId {
    type Err = ItemIdError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl TryFrom<String> for ItemId {
    type Error = ItemIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_namespace_and_path() {
        let id = ItemId::parse("blockstash:gold_pan").unwrap();
        assert_eq!(id.namespace(), "blockstash");
        assert_eq!(id.path(), "gold_pan");
        assert_eq!(id.to_string(), "blockstash:gold_pan");
    }

    #[test]
    fn bare_path_gets_default_namespace() {
        assert_eq!(ItemId::parse("magnet").unwrap().to_string(), "blockstash:magnet");
    }

    #[test]
    fn legacy_upper_case_paths_fold() {
        assert_eq!(
            ItemId::parse("BACKPACK_SMALL").unwrap(),
            ItemId::parse("backpack_small").unwrap()
        );
    }

    #[test]
    fn rejections_name_the_bad_part() {
        assert_eq!(ItemId::parse("   "), Err(ItemIdError::Empty));
        assert_eq!(
            ItemId::parse(":magnet"),
            Err(ItemIdError::EmptyPart {
                part: IdPart::Namespace
            })
        );
        assert_eq!(
            ItemId::parse("blockstash:"),
            Err(ItemIdError::EmptyPart { part: IdPart::Path })
        );
        assert_eq!(
            ItemId::parse("BS:magnet"),
            Err(ItemIdError::InvalidChar {
                part: IdPart::Namespace,
                found: 'B'
            })
        );
        assert_eq!(
            ItemId::parse("blockstash:magnet?"),
            Err(ItemIdError::InvalidChar {
                part: IdPart::Path,
                found: '?'
            })
        );
        assert!(matches!(
            ItemId::parse(&"x".repeat(129)),
            Err(ItemIdError::TooLong { max: 128, .. })
        ));
    }

    #[test]
    fn slashes_only_in_paths() {
        assert!(ItemId::parse("blockstash:tools/gold_pan").is_ok());
        assert!(ItemId::parse("block/stash:gold_pan").is_err());
    }

    #[test]
    fn serde_uses_the_string_form() {
        let id = ItemId::parse("blockstash:cloth").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"blockstash:cloth\"");
        assert_eq!(serde_json::from_str::<ItemId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<ItemId>("\"bad id\"").is_err());
    }
}
