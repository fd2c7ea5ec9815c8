//! Static registry from integer content indices to constructors.
//!
//! Map files reference contents by small integers. The [`ContentRegistry`]
//! maps each index to a plain constructor function, populated once at
//! startup, so building a map never needs to look types up by name.
//!
//! # Example
//!
//! ```
//! use tandem_core::content::{ContentRegistry, ContentTag, PlayerSlot};
//!
//! let registry = ContentRegistry::standard();
//! let wall = registry.create(ContentRegistry::WALL, PlayerSlot::One).unwrap();
//! assert_eq!(wall.map(|c| c.tag()), Some(ContentTag::Wall));
//!
//! // Index 0 is the empty cell.
//! assert!(registry.create(ContentRegistry::EMPTY, PlayerSlot::One).unwrap().is_none());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use super::{ItemKind, PlayerSlot, TileContent};
use crate::position::Direction;

/// Builds a content owned by the given player.
pub type ContentConstructor = fn(PlayerSlot) -> TileContent;

/// Errors raised by registry lookups and registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No constructor is registered for this index.
    #[error("no content registered for index {0}")]
    UnknownIndex(u8),
    /// The index is already taken.
    #[error("content index {0} is already registered")]
    DuplicateIndex(u8),
    /// Index 0 always means "no content".
    #[error("content index 0 is reserved for empty cells")]
    ReservedIndex,
}

/// Index → constructor table.
#[derive(Clone, Default)]
pub struct ContentRegistry {
    constructors: BTreeMap<u8, ContentConstructor>,
}

impl fmt::Debug for ContentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentRegistry")
            .field("indices", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ContentRegistry {
    /// Empty cell; creates nothing.
    pub const EMPTY: u8 = 0;
    /// Ground.
    pub const GROUND: u8 = 1;
    /// Wall.
    pub const WALL: u8 = 2;
    /// Player one's avatar (ignores the owner).
    pub const PLAYER_ONE: u8 = 3;
    /// Player two's avatar (ignores the owner).
    pub const PLAYER_TWO: u8 = 4;
    /// Block anyone can push.
    pub const BLOCK: u8 = 5;
    /// Block that needs a crowbar.
    pub const HEAVY_BLOCK: u8 = 6;
    /// Key item.
    pub const KEY: u8 = 7;
    /// Crowbar item.
    pub const CROWBAR: u8 = 8;
    /// Gem item.
    pub const GEM: u8 = 9;
    /// Orb item.
    pub const ORB: u8 = 10;
    /// Door opened by a key.
    pub const LOCKED_DOOR: u8 = 11;
    /// Door opened only by a trigger.
    pub const SEALED_DOOR: u8 = 12;
    /// Goal.
    pub const GOAL: u8 = 13;
    /// Hole.
    pub const HOLE: u8 = 14;
    /// Conveyor running north.
    pub const CONVEYOR_NORTH: u8 = 15;
    /// Conveyor running east.
    pub const CONVEYOR_EAST: u8 = 16;
    /// Conveyor running south.
    pub const CONVEYOR_SOUTH: u8 = 17;
    /// Conveyor running west.
    pub const CONVEYOR_WEST: u8 = 18;

    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the registry with every built-in content.
    ///
    /// Portals and triggers carry positions and are placed by the map loader
    /// directly rather than through an index.
    #[must_use]
    pub fn standard() -> Self {
        let entries: [(u8, ContentConstructor); 18] = [
            (Self::GROUND, TileContent::ground),
            (Self::WALL, TileContent::wall),
            (Self::PLAYER_ONE, |_| TileContent::player(PlayerSlot::One)),
            (Self::PLAYER_TWO, |_| TileContent::player(PlayerSlot::Two)),
            (Self::BLOCK, |owner| TileContent::block(owner, None)),
            (Self::HEAVY_BLOCK, |owner| {
                TileContent::block(owner, Some(ItemKind::Crowbar))
            }),
            (Self::KEY, |owner| TileContent::item(owner, ItemKind::Key)),
            (Self::CROWBAR, |owner| TileContent::item(owner, ItemKind::Crowbar)),
            (Self::GEM, |owner| TileContent::item(owner, ItemKind::Gem)),
            (Self::ORB, |owner| TileContent::item(owner, ItemKind::Orb)),
            (Self::LOCKED_DOOR, |owner| {
                TileContent::door(owner, Some(ItemKind::Key))
            }),
            (Self::SEALED_DOOR, |owner| TileContent::door(owner, None)),
            (Self::GOAL, TileContent::goal),
            (Self::HOLE, TileContent::hole),
            (Self::CONVEYOR_NORTH, |owner| {
                TileContent::conveyor(owner, Direction::North)
            }),
            (Self::CONVEYOR_EAST, |owner| {
                TileContent::conveyor(owner, Direction::East)
            }),
            (Self::CONVEYOR_SOUTH, |owner| {
                TileContent::conveyor(owner, Direction::South)
            }),
            (Self::CONVEYOR_WEST, |owner| {
                TileContent::conveyor(owner, Direction::West)
            }),
        ];
        Self {
            constructors: entries.into_iter().collect(),
        }
    }

    /// Registers a constructor under `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ReservedIndex`] for index 0 and
    /// [`RegistryError::DuplicateIndex`] if the index is taken.
    pub fn register(&mut self, index: u8, constructor: ContentConstructor) -> Result<(), RegistryError> {
        if index == Self::EMPTY {
            return Err(RegistryError::ReservedIndex);
        }
        if self.constructors.contains_key(&index) {
            return Err(RegistryError::DuplicateIndex(index));
        }
        self.constructors.insert(index, constructor);
        Ok(())
    }

    /// Builds the content registered under `index`, owned by `owner`.
    ///
    /// Returns `Ok(None)` for [`Self::EMPTY`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownIndex`] if nothing is registered.
    pub fn create(&self, index: u8, owner: PlayerSlot) -> Result<Option<TileContent>, RegistryError> {
        if index == Self::EMPTY {
            return Ok(None);
        }
        self.constructors
            .get(&index)
            .map(|constructor| Some(constructor(owner)))
            .ok_or(RegistryError::UnknownIndex(index))
    }

    /// Number of registered constructors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
