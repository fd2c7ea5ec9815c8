//! The map: a rectangular grid of tiles.
//!
//! A [`Map`] is one peer's half of the world. It owns its tiles plus the small
//! amount of per-player state that validation needs to see (the carried item
//! and the goal flags), so that a deep clone of a map is a complete, isolated
//! sandbox for speculative execution (see [`Snapshot`](crate::snapshot::Snapshot)).
//!
//! # Bounds
//!
//! Valid positions are `[0, width) x [0, height)`. Every accessor that takes a
//! position returns [`MapError::OutOfBounds`] outside that range; positions are
//! never clamped.
//!
//! # Example
//!
//! ```
//! use tandem_core::content::{PlayerSlot, TileContent};
//! use tandem_core::map::Map;
//! use tandem_core::position::Position;
//!
//! let mut map = Map::filled(10, 4, PlayerSlot::One).unwrap();
//! map.place(Position::new(3, 1), TileContent::player(PlayerSlot::One)).unwrap();
//!
//! assert_eq!(map.tile(Position::new(3, 1)).unwrap().len(), 2);
//! assert!(map.tile(Position::new(10, 0)).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::{ContentRegistry, ItemKind, PlayerSlot, RegistryError, TileContent};
use crate::position::Position;
use crate::tile::Tile;
use crate::update::EffectKind;

/// Errors raised by map construction and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A position outside `[0, width) x [0, height)`.
    #[error("position {position} is outside the {width}x{height} map")]
    OutOfBounds {
        /// The rejected position.
        position: Position,
        /// Map width.
        width: u32,
        /// Map height.
        height: u32,
    },
    /// A map needs at least one tile.
    #[error("map dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// A content layer has the wrong number of cells.
    #[error("layer {layer} has {found} cells, expected {expected}")]
    LayerSize {
        /// Index of the offending layer.
        layer: usize,
        /// `width * height`.
        expected: usize,
        /// Cells actually supplied.
        found: usize,
    },
    /// A layer referenced a content index the registry does not know.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Whether a map is the live world or a validation sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapKind {
    /// The authoritative map, drained into by the controller.
    Live,
    /// A private copy owned by an interaction chain.
    Snapshot,
}

/// A visual or audio effect recorded on the live map for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEffect {
    /// Where it happened.
    pub position: Position,
    /// What happened.
    pub effect: EffectKind,
}

/// One peer's half of the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    width: u32,
    height: u32,
    /// Row-major tile storage.
    tiles: Vec<Tile>,
    viewer: PlayerSlot,
    kind: MapKind,
    /// The local player's single inventory slot.
    inventory: Option<ItemKind>,
    goal_reached: bool,
    level_complete: bool,
    /// Pending effects for the renderer, kept until [`Map::drain_effects`].
    /// Always empty on snapshots.
    effects: Vec<MapEffect>,
}

impl Map {
    /// Creates a live map of empty tiles.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32, viewer: PlayerSlot) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::EmptyDimensions { width, height });
        }
        let count = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            tiles: vec![Tile::new(); count],
            viewer,
            kind: MapKind::Live,
            inventory: None,
            goal_reached: false,
            level_complete: false,
            effects: Vec::new(),
        })
    }

    /// Creates a live map where every tile holds a single ground content.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyDimensions`] if either dimension is zero.
    pub fn filled(width: u32, height: u32, viewer: PlayerSlot) -> Result<Self, MapError> {
        let mut map = Self::new(width, height, viewer)?;
        for tile in &mut map.tiles {
            tile.push(TileContent::ground(viewer));
        }
        Ok(map)
    }

    /// Builds a live map from stacked index layers.
    ///
    /// Each layer holds `width * height` registry indices in row-major order;
    /// layer 0 is the bottom of every stack. [`ContentRegistry::EMPTY`] leaves
    /// the cell untouched in that layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerSize`] for a layer of the wrong length and
    /// [`MapError::Registry`] for an unknown index.
    pub fn from_layers(
        width: u32,
        height: u32,
        viewer: PlayerSlot,
        layers: &[Vec<u8>],
        registry: &ContentRegistry,
    ) -> Result<Self, MapError> {
        let mut map = Self::new(width, height, viewer)?;
        let expected = map.tiles.len();
        for (layer_index, layer) in layers.iter().enumerate() {
            if layer.len() != expected {
                return Err(MapError::LayerSize {
                    layer: layer_index,
                    expected,
                    found: layer.len(),
                });
            }
            for (tile, &index) in map.tiles.iter_mut().zip(layer) {
                if let Some(content) = registry.create(index, viewer)? {
                    tile.push(content);
                }
            }
        }
        Ok(map)
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The player whose half of the world this is.
    #[must_use]
    pub const fn viewer(&self) -> PlayerSlot {
        self.viewer
    }

    /// Live map or snapshot.
    #[must_use]
    pub const fn kind(&self) -> MapKind {
        self.kind
    }

    /// Whether this map is a validation snapshot.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.kind == MapKind::Snapshot
    }

    /// Whether `position` lies on the grid.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.index_of(position).is_ok()
    }

    fn index_of(&self, position: Position) -> Result<usize, MapError> {
        let in_x = u32::try_from(position.x).is_ok_and(|x| x < self.width);
        let in_y = u32::try_from(position.y).is_ok_and(|y| y < self.height);
        if !(in_x && in_y) {
            return Err(MapError::OutOfBounds {
                position,
                width: self.width,
                height: self.height,
            });
        }
        #[allow(clippy::cast_sign_loss)]
        Ok(position.y as usize * self.width as usize + position.x as usize)
    }

    /// The tile at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutOfBounds`] outside the grid.
    pub fn tile(&self, position: Position) -> Result<&Tile, MapError> {
        let index = self.index_of(position)?;
        Ok(&self.tiles[index])
    }

    /// The tile at `position`, mutably.
    ///
    /// Validation code never calls this on the live map; the live map is only
    /// changed by applying [`GameStateUpdate`](crate::update::GameStateUpdate)s.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutOfBounds`] outside the grid.
    pub fn tile_mut(&mut self, position: Position) -> Result<&mut Tile, MapError> {
        let index = self.index_of(position)?;
        Ok(&mut self.tiles[index])
    }

    /// Pushes `content` on top of the stack at `position`.
    ///
    /// Intended for level construction by the map loader.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutOfBounds`] outside the grid.
    pub fn place(&mut self, position: Position, content: TileContent) -> Result<(), MapError> {
        self.tile_mut(position)?.push(content);
        Ok(())
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width;
        (0..self.height).flat_map(move |y| {
            (0..width).map(move |x| {
                #[allow(clippy::cast_possible_wrap)]
                Position::new(x as i32, y as i32)
            })
        })
    }

    /// Positions whose tile holds at least one content, in row-major order.
    #[must_use]
    pub fn occupied_positions(&self) -> Vec<Position> {
        self.positions()
            .zip(&self.tiles)
            .filter(|(_, tile)| !tile.is_empty())
            .map(|(position, _)| position)
            .collect()
    }

    /// All tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The item the local player carries.
    #[must_use]
    pub const fn inventory(&self) -> Option<ItemKind> {
        self.inventory
    }

    /// Whether a player has stepped on the goal.
    #[must_use]
    pub const fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    /// Whether the level has ended. Only ever set on the live map.
    #[must_use]
    pub const fn level_complete(&self) -> bool {
        self.level_complete
    }

    /// Effects recorded since the last drain.
    #[must_use]
    pub fn effects(&self) -> &[MapEffect] {
        &self.effects
    }

    /// Takes the recorded effects, leaving the log empty.
    pub fn drain_effects(&mut self) -> Vec<MapEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Sets the carried item directly. Intended for level setup.
    pub fn set_inventory(&mut self, item: Option<ItemKind>) {
        self.inventory = item;
    }

    pub(crate) fn mark_goal_reached(&mut self) {
        self.goal_reached = true;
        if self.kind == MapKind::Live {
            self.level_complete = true;
        }
    }

    pub(crate) fn record_effect(&mut self, position: Position, effect: EffectKind) {
        if self.kind == MapKind::Live {
            self.effects.push(MapEffect { position, effect });
        }
    }

    /// Deep copy tagged as a snapshot.
    pub(crate) fn clone_as_snapshot(&self) -> Self {
        let mut copy = self.clone();
        copy.kind = MapKind::Snapshot;
        copy.effects.clear();
        copy
    }
}
