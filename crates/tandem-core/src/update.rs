//! Game state updates (GSUs): atomic, replayable map mutations.
//!
//! Every change to a map, live or snapshot, goes through a
//! [`GameStateUpdate`]. Each variant carries exactly the data it needs to
//! apply itself and is serializable, so the same value can be replayed on a
//! snapshot during validation and later on the live map.
//!
//! # Classes
//!
//! - [`UpdateClass::MapModification`]: changes what validation can observe.
//!   Re-applied to snapshots immediately and counted by stabilization.
//! - [`UpdateClass::Effect`]: visual/audio only. Queued for the live map,
//!   never applied to snapshots.
//!
//! # Slot checks
//!
//! Updates that address a content by slot also carry the tag they expect to
//! find there. Applying to a stack that has drifted (the slot is gone or holds
//! something else) fails with [`UpdateError`] instead of touching the wrong
//! content.
//!
//! # Example
//!
//! ```
//! use tandem_core::content::{ContentTag, PlayerSlot, TileContent};
//! use tandem_core::map::Map;
//! use tandem_core::position::Position;
//! use tandem_core::update::GameStateUpdate;
//!
//! let mut map = Map::filled(4, 4, PlayerSlot::One).unwrap();
//! map.place(Position::new(3, 1), TileContent::player(PlayerSlot::One)).unwrap();
//!
//! let update = GameStateUpdate::Move {
//!     from: Position::new(3, 1),
//!     slot: 1,
//!     expected: ContentTag::Player,
//!     to: Position::new(3, 0),
//! };
//! update.apply(&mut map).unwrap();
//!
//! assert_eq!(map.tile(Position::new(3, 1)).unwrap().len(), 1);
//! assert_eq!(
//!     map.tile(Position::new(3, 0)).unwrap().top().map(|c| c.tag()),
//!     Some(ContentTag::Player)
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::content::{ContentTag, ItemKind, Passability, TextureId, TileContent};
use crate::map::{Map, MapError};
use crate::position::Position;

// =============================================================================
// Errors
// =============================================================================

/// Why an update could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// A position in the update is off the map.
    #[error(transparent)]
    Map(#[from] MapError),
    /// The addressed slot does not exist.
    #[error("no content in slot {slot} at {position}")]
    MissingContent {
        /// Tile position.
        position: Position,
        /// Stack slot.
        slot: usize,
    },
    /// The addressed slot holds a different kind of content.
    #[error("slot {slot} at {position} holds {found}, expected {expected}")]
    UnexpectedContent {
        /// Tile position.
        position: Position,
        /// Stack slot.
        slot: usize,
        /// Tag the update was built for.
        expected: ContentTag,
        /// Tag actually found.
        found: ContentTag,
    },
}

// =============================================================================
// Effects
// =============================================================================

/// Visual/audio cue for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// An item was picked up.
    Chime,
    /// A door opened or closed.
    DoorCreak,
    /// A block fell into a hole.
    Splash,
    /// An item went through a portal.
    Warp,
    /// A lever was pulled.
    Click,
}

// =============================================================================
// Game State Update
// =============================================================================

/// Whether an update can cause cascading re-evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateClass {
    /// Changes map state; re-applied to snapshots.
    MapModification,
    /// Presentation only.
    Effect,
}

/// An atomic, replayable mutation of a [`Map`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStateUpdate {
    /// Move a content from one tile to the top of another.
    Move {
        /// Source tile.
        from: Position,
        /// Slot in the source stack.
        slot: usize,
        /// Tag expected in that slot.
        expected: ContentTag,
        /// Destination tile.
        to: Position,
    },
    /// Push a new content on top of a tile.
    AddContent {
        /// Target tile.
        position: Position,
        /// Content to add.
        content: TileContent,
    },
    /// Remove a content from a tile.
    RemoveContent {
        /// Target tile.
        position: Position,
        /// Slot to remove.
        slot: usize,
        /// Tag expected in that slot.
        expected: ContentTag,
    },
    /// Change the texture of a content.
    ChangeTexture {
        /// Target tile.
        position: Position,
        /// Slot to change.
        slot: usize,
        /// New texture.
        texture: TextureId,
    },
    /// Change who may pass a content.
    ChangePassability {
        /// Target tile.
        position: Position,
        /// Slot to change.
        slot: usize,
        /// New passability.
        passability: Passability,
    },
    /// Replace the local player's carried item.
    SetInventory {
        /// New inventory contents.
        item: Option<ItemKind>,
    },
    /// A player reached the goal. Completes the level on the live map.
    EndLevel,
    /// Presentation cue.
    Effect {
        /// Where to play it.
        position: Position,
        /// What to play.
        effect: EffectKind,
    },
}

impl GameStateUpdate {
    /// Classification of this update.
    #[must_use]
    pub const fn class(&self) -> UpdateClass {
        match self {
            Self::Effect { .. } => UpdateClass::Effect,
            _ => UpdateClass::MapModification,
        }
    }

    /// Applies this update to `map`.
    ///
    /// A failed apply leaves `map` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError`] if a position is off the map or an addressed
    /// slot is missing or holds an unexpected tag.
    pub fn apply(&self, map: &mut Map) -> Result<(), UpdateError> {
        match self {
            Self::Move {
                from,
                slot,
                expected,
                to,
            } => {
                // Validate the destination before taking anything out.
                map.tile(*to)?;
                check_slot(map, *from, *slot, *expected)?;
                let tile = map.tile_mut(*from)?;
                let content = tile.remove(*slot).ok_or(UpdateError::MissingContent {
                    position: *from,
                    slot: *slot,
                })?;
                map.tile_mut(*to)?.push(content);
            }
            Self::AddContent { position, content } => {
                map.tile_mut(*position)?.push(content.clone());
            }
            Self::RemoveContent {
                position,
                slot,
                expected,
            } => {
                check_slot(map, *position, *slot, *expected)?;
                map.tile_mut(*position)?.remove(*slot);
            }
            Self::ChangeTexture {
                position,
                slot,
                texture,
            } => {
                slot_mut(map, *position, *slot)?.set_texture(*texture);
            }
            Self::ChangePassability {
                position,
                slot,
                passability,
            } => {
                slot_mut(map, *position, *slot)?.set_passability(*passability);
            }
            Self::SetInventory { item } => map.set_inventory(*item),
            Self::EndLevel => map.mark_goal_reached(),
            Self::Effect { position, effect } => {
                map.tile(*position)?;
                map.record_effect(*position, *effect);
            }
        }
        Ok(())
    }
}

impl fmt::Display for GameStateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { from, slot, to, .. } => write!(f, "move {from}[{slot}] -> {to}"),
            Self::AddContent { position, content } => write!(f, "add {} at {position}", content.tag()),
            Self::RemoveContent { position, slot, .. } => write!(f, "remove {position}[{slot}]"),
            Self::ChangeTexture { position, slot, .. } => write!(f, "texture {position}[{slot}]"),
            Self::ChangePassability { position, slot, .. } => {
                write!(f, "passability {position}[{slot}]")
            }
            Self::SetInventory { item: Some(item) } => write!(f, "inventory = {item}"),
            Self::SetInventory { item: None } => write!(f, "inventory = empty"),
            Self::EndLevel => write!(f, "end level"),
            Self::Effect { position, effect } => write!(f, "effect {effect:?} at {position}"),
        }
    }
}

fn check_slot(
    map: &Map,
    position: Position,
    slot: usize,
    expected: ContentTag,
) -> Result<(), UpdateError> {
    let found = map
        .tile(position)?
        .get(slot)
        .ok_or(UpdateError::MissingContent { position, slot })?
        .tag();
    if found == expected {
        Ok(())
    } else {
        Err(UpdateError::UnexpectedContent {
            position,
            slot,
            expected,
            found,
        })
    }
}

fn slot_mut(map: &mut Map, position: Position, slot: usize) -> Result<&mut TileContent, UpdateError> {
    map.tile_mut(position)?
        .get_mut(slot)
        .ok_or(UpdateError::MissingContent { position, slot })
}
