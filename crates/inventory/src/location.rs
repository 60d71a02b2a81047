use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the components of a serialized [`LocationKey`].
pub const LOCATION_SEPARATOR: char = ';';

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Identity of a block inventory: world name plus block coordinates.
///
/// Serialized as `world;x;y;z`, which doubles as the stem of the stored
/// inventory file. Ordering is `(world, x, y, z)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey {
    world: String,
    pos: BlockPos,
}

impl LocationKey {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            pos: BlockPos::new(x, y, z),
        }
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    /// Block coordinates within the world.
    pub fn block(&self) -> BlockPos {
        self.pos
    }

    /// The `world;x;y;z` form used for file names.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = LOCATION_SEPARATOR;
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.world, self.pos.x, self.pos.y, self.pos.z
        )
    }
}

/// Error returned when parsing a `world;x;y;z` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationParseError {
    #[error("expected `world;x;y;z`, got {0:?}")]
    Shape(String),
    #[error("world name is empty in {0:?}")]
    EmptyWorld(String),
    #[error("coordinate {value:?} in {input:?} is not an integer")]
    Coordinate { input: String, value: String },
}

impl FromStr for LocationKey {
    type Err = LocationParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = input.split(LOCATION_SEPARATOR).collect();
        let [world, x, y, z] = parts.as_slice() else {
            return Err(LocationParseError::Shape(input.to_string()));
        };
        if world.is_empty() {
            return Err(LocationParseError::EmptyWorld(input.to_string()));
        }

        let coord = |value: &str| {
            value
                .trim()
                .parse::<i32>()
                .map_err(|_| LocationParseError::Coordinate {
                    input: input.to_string(),
                    value: value.to_string(),
                })
        };

        Ok(Self::new(*world, coord(*x)?, coord(*y)?, coord(*z)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_semicolons() {
        let key = LocationKey::new("world_nether", -12, 64, 300);
        assert_eq!(key.serialize(), "world_nether;-12;64;300");
        assert_eq!(key.block(), BlockPos::new(-12, 64, 300));
    }

    #[test]
    fn parse_inverts_serialize() {
        let key = LocationKey::new("world", 1, 2, 3);
        assert_eq!(key.serialize().parse::<LocationKey>().unwrap(), key);
    }

    #[test]
    fn equality_needs_all_components() {
        let base = LocationKey::new("world", 1, 2, 3);
        assert_ne!(base, LocationKey::new("other", 1, 2, 3));
        assert_ne!(base, LocationKey::new("world", 0, 2, 3));
        assert_ne!(base, LocationKey::new("world", 1, 0, 3));
        assert_ne!(base, LocationKey::new("world", 1, 2, 0));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(
            "world;1;2".parse::<LocationKey>(),
            Err(LocationParseError::Shape(_))
        ));
        assert!(matches!(
            ";1;2;3".parse::<LocationKey>(),
            Err(LocationParseError::EmptyWorld(_))
        ));
        assert!(matches!(
            "world;1;two;3".parse::<LocationKey>(),
            Err(LocationParseError::Coordinate { .. })
        ));
    }

    #[test]
    fn ordering_is_world_then_coordinates() {
        let mut keys = vec![
            LocationKey::new("b", 0, 0, 0),
            LocationKey::new("a", 5, 0, 0),
            LocationKey::new("a", 1, 9, 0),
        ];
        keys.sort();
        assert_eq!(keys[0], LocationKey::new("a", 1, 9, 0));
        assert_eq!(keys[2], LocationKey::new("b", 0, 0, 0));
    }
}
