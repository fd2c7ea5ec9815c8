//! Interactions: immutable requests to act on a tile.
//!
//! An [`Interaction`] is what the input layer (or another content, or the
//! remote peer) hands to the [`GameController`](crate::controller::GameController).
//! It names a target tile, a direction, what kind of action it is, which
//! kind of content started it, optional integer parameters, and the controller
//! it came from.
//!
//! Interactions are never mutated after construction. The `with_*` methods
//! and [`Interaction::mirrored`] return new values, so an interaction queued
//! for later (or sent to the remote peer) cannot change under anyone's feet.
//!
//! # Example
//!
//! ```
//! use tandem_core::content::ContentTag;
//! use tandem_core::interaction::{ActionKind, ControllerId, Interaction};
//! use tandem_core::position::{Direction, Position};
//!
//! let origin = ControllerId::new();
//! let step = Interaction::new(
//!     Position::new(3, 1),
//!     Direction::North,
//!     ActionKind::Step,
//!     ContentTag::Player,
//!     origin,
//! );
//!
//! let mirrored = step.mirrored();
//! assert!(mirrored.suppress_remote());
//! assert!(!step.suppress_remote());
//! assert_eq!(mirrored.origin(), origin);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::content::ContentTag;
use crate::position::{Direction, Position};

/// Identity of one controller instance, used to spot interactions that
/// bounce back to where they started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerId(Uuid);

impl ControllerId {
    /// Creates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ControllerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller:{}", self.0)
    }
}

/// What kind of action an interaction asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Walk or push in the interaction's direction.
    Step,
    /// Operate whatever is there: pick up, unlock, pull, drop into a portal.
    Use,
}

/// An immutable action request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    position: Position,
    direction: Direction,
    kind: ActionKind,
    initiator: ContentTag,
    params: Vec<i32>,
    origin: ControllerId,
    suppress_remote: bool,
}

impl Interaction {
    /// Creates an interaction with no parameters.
    #[must_use]
    pub fn new(
        position: Position,
        direction: Direction,
        kind: ActionKind,
        initiator: ContentTag,
        origin: ControllerId,
    ) -> Self {
        Self {
            position,
            direction,
            kind,
            initiator,
            params: Vec::new(),
            origin,
            suppress_remote: false,
        }
    }

    /// A player step from `position` towards `direction`.
    #[must_use]
    pub fn step(position: Position, direction: Direction, origin: ControllerId) -> Self {
        Self::new(position, direction, ActionKind::Step, ContentTag::Player, origin)
    }

    /// A player "use" at `position`, facing `direction`.
    #[must_use]
    pub fn use_at(position: Position, direction: Direction, origin: ControllerId) -> Self {
        Self::new(position, direction, ActionKind::Use, ContentTag::Player, origin)
    }

    /// Returns a copy with the given parameters.
    #[must_use]
    pub fn with_params(&self, params: Vec<i32>) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }

    /// Returns a copy aimed at a different tile.
    #[must_use]
    pub fn with_position(&self, position: Position) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    /// Returns the copy sent to the remote peer: identical, but marked so the
    /// remote side will not mirror it back.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            suppress_remote: true,
            ..self.clone()
        }
    }

    /// Target tile.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Direction of the action.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Step or use.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Kind of content that started the interaction.
    #[must_use]
    pub const fn initiator(&self) -> ContentTag {
        self.initiator
    }

    /// Integer parameters.
    #[must_use]
    pub fn params(&self) -> &[i32] {
        &self.params
    }

    /// Controller the interaction was created on.
    #[must_use]
    pub const fn origin(&self) -> ControllerId {
        self.origin
    }

    /// Whether transcendent handling of this interaction must not be mirrored.
    #[must_use]
    pub const fn suppress_remote(&self) -> bool {
        self.suppress_remote
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} at {} by {}",
            self.kind, self.direction, self.position, self.initiator
        )?;
        if !self.params.is_empty() {
            write!(f, " {:?}", self.params)?;
        }
        if self.suppress_remote {
            write!(f, " (mirrored)")?;
        }
        Ok(())
    }
}
