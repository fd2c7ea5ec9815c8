//! Tile contents: the things that stack on a tile.
//!
//! This module provides the content types stored in a [`Tile`](crate::tile::Tile):
//! - [`ContentTag`]: Data-free identifier of a behavior kind
//! - [`ContentKind`]: The closed set of behaviors, carrying only the data each needs
//! - [`TileContent`]: A behavior plus its passability, visibility and texture
//!
//! # Architecture
//!
//! Contents are plain values. Behavior lives in a single trait,
//! [`Behavior`], implemented once over [`ContentKind`] by matching on the
//! variant. A new kind of content is a new variant, never a new layer.
//!
//! - `ContentTag` doubles as the "initiating content type" of an
//!   [`Interaction`](crate::interaction::Interaction)
//! - `Visibility::Transcendent` contents are mirrored to the other peer
//!   when they handle an interaction; everything else is private to the
//!   player whose map it sits in
//!
//! # Example
//!
//! ```
//! use tandem_core::content::{Actor, ContentTag, PlayerSlot, TileContent, Visibility};
//!
//! let player = TileContent::player(PlayerSlot::One);
//! assert_eq!(player.tag(), ContentTag::Player);
//! assert_eq!(player.visibility(), Visibility::PlayerOneOnly);
//! assert!(!player.is_passable_for(Actor::Object));
//!
//! let ground = TileContent::ground(PlayerSlot::One);
//! assert!(ground.is_passable_for(Actor::Player));
//! assert!(!ground.visibility().visible_to(PlayerSlot::Two));
//! ```

mod behavior;
pub mod registry;

pub use behavior::{ActionContext, Behavior, UpdateContext};
pub use registry::{ContentRegistry, RegistryError};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::position::{Direction, Position};

// =============================================================================
// Classification
// =============================================================================

/// Which player a piece of the world belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    /// The first player (usually the hosting peer).
    One,
    /// The second player.
    Two,
}

impl PlayerSlot {
    /// The other player.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Visibility class for content private to this player.
    #[must_use]
    pub const fn private_visibility(self) -> Visibility {
        match self {
            Self::One => Visibility::PlayerOneOnly,
            Self::Two => Visibility::PlayerTwoOnly,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "PlayerOne"),
            Self::Two => write!(f, "PlayerTwo"),
        }
    }
}

/// Who can see, and act on, a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Only present in player one's half of the world.
    PlayerOneOnly,
    /// Only present in player two's half of the world.
    PlayerTwoOnly,
    /// Shared by both halves; handling it must be mirrored to the other peer.
    Transcendent,
}

impl Visibility {
    /// Whether content with this visibility is visible to `viewer`.
    #[must_use]
    pub fn visible_to(self, viewer: PlayerSlot) -> bool {
        match self {
            Self::Transcendent => true,
            Self::PlayerOneOnly => viewer == PlayerSlot::One,
            Self::PlayerTwoOnly => viewer == PlayerSlot::Two,
        }
    }
}

/// The kind of actor asking whether it may enter a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    /// A player walking.
    Player,
    /// A pushed or conveyed object.
    Object,
}

bitflags! {
    /// Which actors may share a tile with a content.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Passability: u8 {
        /// Players may enter.
        const PLAYER = 0b01;
        /// Objects may be moved in.
        const OBJECT = 0b10;
    }
}

impl Passability {
    /// Passable for nobody.
    pub const SOLID: Self = Self::empty();
    /// Passable for everybody.
    pub const OPEN: Self = Self::all();

    /// Whether `actor` may pass.
    #[must_use]
    pub fn allows(self, actor: Actor) -> bool {
        match actor {
            Actor::Player => self.contains(Self::PLAYER),
            Actor::Object => self.contains(Self::OBJECT),
        }
    }
}

/// Texture handle understood by the (external) renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(u32);

impl TextureId {
    /// Plain floor.
    pub const GROUND: Self = Self(0);
    /// Solid wall.
    pub const WALL: Self = Self(1);
    /// Player one sprite.
    pub const PLAYER_ONE: Self = Self(2);
    /// Player two sprite.
    pub const PLAYER_TWO: Self = Self(3);
    /// Movable block.
    pub const BLOCK: Self = Self(4);
    /// Item on the floor.
    pub const ITEM: Self = Self(5);
    /// Closed door.
    pub const DOOR_CLOSED: Self = Self(6);
    /// Open door.
    pub const DOOR_OPEN: Self = Self(7);
    /// Level goal.
    pub const GOAL: Self = Self(8);
    /// Portal pad.
    pub const PORTAL: Self = Self(9);
    /// Trigger lever, released.
    pub const TRIGGER: Self = Self(10);
    /// Trigger lever, pulled.
    pub const TRIGGER_ACTIVE: Self = Self(11);
    /// Hole in the floor.
    pub const HOLE: Self = Self(12);
    /// Conveyor belt.
    pub const CONVEYOR: Self = Self(13);

    /// Creates a texture id from a raw renderer index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw renderer index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Items a player can carry. One item fits in the inventory at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Opens doors keyed to it.
    Key,
    /// Lets the player shift heavy blocks.
    Crowbar,
    /// Collectible; travels well through portals.
    Gem,
    /// Collectible.
    Orb,
}

impl ItemKind {
    /// All item kinds in index order.
    pub const ALL: [ItemKind; 4] = [Self::Key, Self::Crowbar, Self::Gem, Self::Orb];

    /// Stable integer index, used as an interaction parameter.
    #[must_use]
    pub const fn index(self) -> i32 {
        match self {
            Self::Key => 0,
            Self::Crowbar => 1,
            Self::Gem => 2,
            Self::Orb => 3,
        }
    }

    /// Looks an item up by its index.
    #[must_use]
    pub fn from_index(index: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.index() == index)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => write!(f, "Key"),
            Self::Crowbar => write!(f, "Crowbar"),
            Self::Gem => write!(f, "Gem"),
            Self::Orb => write!(f, "Orb"),
        }
    }
}

// =============================================================================
// Content Kinds
// =============================================================================

/// Data-free identifier of a content behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentTag {
    /// Floor.
    Ground,
    /// Impassable wall.
    Wall,
    /// A player avatar.
    Player,
    /// A pushable block.
    Block,
    /// A pickup item.
    Item,
    /// A door, keyed or trigger-operated.
    Door,
    /// The level goal.
    Goal,
    /// A portal to the other peer's world.
    Portal,
    /// A shared lever operating a door.
    Trigger,
    /// A hole that swallows blocks.
    Hole,
    /// A belt that carries blocks.
    Conveyor,
}

impl fmt::Display for ContentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Behavior variant of a content, with the data that behavior needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// Floor.
    Ground,
    /// Impassable wall.
    Wall,
    /// A player avatar.
    Player {
        /// Which player this avatar belongs to.
        slot: PlayerSlot,
    },
    /// A pushable block.
    Block {
        /// Item the pushing player must carry, if any.
        required_item: Option<ItemKind>,
    },
    /// A pickup item.
    Item(ItemKind),
    /// A door. Open/closed state is its passability.
    Door {
        /// Key that opens it by hand; `None` means only triggers operate it.
        key: Option<ItemKind>,
    },
    /// The level goal.
    Goal,
    /// A portal. Items dropped in arrive at `exit` in the other peer's world.
    Portal {
        /// Arrival position on the other peer's map.
        exit: Position,
    },
    /// A shared lever.
    Trigger {
        /// Position of the door it operates.
        target: Position,
    },
    /// A hole.
    Hole,
    /// A conveyor belt.
    Conveyor {
        /// Direction blocks are carried in.
        direction: Direction,
    },
}

impl ContentKind {
    /// The data-free tag of this kind.
    #[must_use]
    pub const fn tag(&self) -> ContentTag {
        match self {
            Self::Ground => ContentTag::Ground,
            Self::Wall => ContentTag::Wall,
            Self::Player { .. } => ContentTag::Player,
            Self::Block { .. } => ContentTag::Block,
            Self::Item(_) => ContentTag::Item,
            Self::Door { .. } => ContentTag::Door,
            Self::Goal => ContentTag::Goal,
            Self::Portal { .. } => ContentTag::Portal,
            Self::Trigger { .. } => ContentTag::Trigger,
            Self::Hole => ContentTag::Hole,
            Self::Conveyor { .. } => ContentTag::Conveyor,
        }
    }
}

// =============================================================================
// Tile Content
// =============================================================================

/// One entry in a tile's content stack.
///
/// # Example
///
/// ```
/// use tandem_core::content::{Actor, ItemKind, PlayerSlot, TileContent};
///
/// let door = TileContent::door(PlayerSlot::One, Some(ItemKind::Key));
/// assert!(!door.is_passable_for(Actor::Player));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileContent {
    kind: ContentKind,
    passability: Passability,
    visibility: Visibility,
    texture: TextureId,
}

impl TileContent {
    /// Creates a content from its parts.
    #[must_use]
    pub fn new(
        kind: ContentKind,
        passability: Passability,
        visibility: Visibility,
        texture: TextureId,
    ) -> Self {
        Self {
            kind,
            passability,
            visibility,
            texture,
        }
    }

    /// Plain floor.
    #[must_use]
    pub fn ground(owner: PlayerSlot) -> Self {
        Self::new(
            ContentKind::Ground,
            Passability::OPEN,
            owner.private_visibility(),
            TextureId::GROUND,
        )
    }

    /// A wall.
    #[must_use]
    pub fn wall(owner: PlayerSlot) -> Self {
        Self::new(
            ContentKind::Wall,
            Passability::SOLID,
            owner.private_visibility(),
            TextureId::WALL,
        )
    }

    /// A player avatar, visible only in its own player's world.
    #[must_use]
    pub fn player(slot: PlayerSlot) -> Self {
        let texture = match slot {
            PlayerSlot::One => TextureId::PLAYER_ONE,
            PlayerSlot::Two => TextureId::PLAYER_TWO,
        };
        Self::new(
            ContentKind::Player { slot },
            Passability::SOLID,
            slot.private_visibility(),
            texture,
        )
    }

    /// A pushable block.
    #[must_use]
    pub fn block(owner: PlayerSlot, required_item: Option<ItemKind>) -> Self {
        Self::new(
            ContentKind::Block { required_item },
            Passability::SOLID,
            owner.private_visibility(),
            TextureId::BLOCK,
        )
    }

    /// An item lying on the floor.
    #[must_use]
    pub fn item(owner: PlayerSlot, item: ItemKind) -> Self {
        Self::new(
            ContentKind::Item(item),
            Passability::PLAYER,
            owner.private_visibility(),
            TextureId::ITEM,
        )
    }

    /// A closed door.
    #[must_use]
    pub fn door(owner: PlayerSlot, key: Option<ItemKind>) -> Self {
        Self::new(
            ContentKind::Door { key },
            Passability::SOLID,
            owner.private_visibility(),
            TextureId::DOOR_CLOSED,
        )
    }

    /// The level goal.
    #[must_use]
    pub fn goal(owner: PlayerSlot) -> Self {
        Self::new(
            ContentKind::Goal,
            Passability::OPEN,
            owner.private_visibility(),
            TextureId::GOAL,
        )
    }

    /// A portal pad owned by `owner`, sending items to `exit` on the other map.
    #[must_use]
    pub fn portal(owner: PlayerSlot, exit: Position) -> Self {
        Self::new(
            ContentKind::Portal { exit },
            Passability::PLAYER,
            owner.private_visibility(),
            TextureId::PORTAL,
        )
    }

    /// A lever operating the door at `target`. Levers are always shared.
    #[must_use]
    pub fn trigger(target: Position) -> Self {
        Self::new(
            ContentKind::Trigger { target },
            Passability::OPEN,
            Visibility::Transcendent,
            TextureId::TRIGGER,
        )
    }

    /// A hole.
    #[must_use]
    pub fn hole(owner: PlayerSlot) -> Self {
        Self::new(
            ContentKind::Hole,
            Passability::OBJECT,
            owner.private_visibility(),
            TextureId::HOLE,
        )
    }

    /// A conveyor belt.
    #[must_use]
    pub fn conveyor(owner: PlayerSlot, direction: Direction) -> Self {
        Self::new(
            ContentKind::Conveyor { direction },
            Passability::OPEN,
            owner.private_visibility(),
            TextureId::CONVEYOR,
        )
    }

    /// Returns a copy visible to, and mirrored between, both peers.
    #[must_use]
    pub fn shared(self) -> Self {
        self.with_visibility(Visibility::Transcendent)
    }

    /// Returns a copy with a different visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Behavior variant.
    #[must_use]
    pub fn kind(&self) -> &ContentKind {
        &self.kind
    }

    /// Data-free tag.
    #[must_use]
    pub const fn tag(&self) -> ContentTag {
        self.kind.tag()
    }

    /// Passability flags.
    #[must_use]
    pub const fn passability(&self) -> Passability {
        self.passability
    }

    /// Visibility class.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Texture handle.
    #[must_use]
    pub const fn texture(&self) -> TextureId {
        self.texture
    }

    /// Whether `actor` may share a tile with this content.
    #[must_use]
    pub fn is_passable_for(&self, actor: Actor) -> bool {
        self.passability.allows(actor)
    }

    /// Whether this content is a player avatar belonging to `slot`.
    #[must_use]
    pub fn is_player(&self, slot: PlayerSlot) -> bool {
        matches!(self.kind, ContentKind::Player { slot: s } if s == slot)
    }

    pub(crate) fn set_texture(&mut self, texture: TextureId) {
        self.texture = texture;
    }

    pub(crate) fn set_passability(&mut self, passability: Passability) {
        self.passability = passability;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_rules() {
        assert!(Visibility::Transcendent.visible_to(PlayerSlot::One));
        assert!(Visibility::Transcendent.visible_to(PlayerSlot::Two));
        assert!(Visibility::PlayerOneOnly.visible_to(PlayerSlot::One));
        assert!(!Visibility::PlayerOneOnly.visible_to(PlayerSlot::Two));
        assert!(!Visibility::PlayerTwoOnly.visible_to(PlayerSlot::One));
    }

    #[test]
    fn passability_flags() {
        assert!(Passability::OPEN.allows(Actor::Player));
        assert!(Passability::OPEN.allows(Actor::Object));
        assert!(!Passability::SOLID.allows(Actor::Player));
        assert!(Passability::OBJECT.allows(Actor::Object));
        assert!(!Passability::OBJECT.allows(Actor::Player));
    }

    #[test]
    fn item_index_round_trip() {
        for item in ItemKind::ALL {
            assert_eq!(ItemKind::from_index(item.index()), Some(item));
        }
        assert_eq!(ItemKind::from_index(99), None);
    }

    #[test]
    fn constructors_set_tags() {
        let one = PlayerSlot::One;
        assert_eq!(TileContent::wall(one).tag(), ContentTag::Wall);
        assert_eq!(TileContent::block(one, None).tag(), ContentTag::Block);
        assert_eq!(TileContent::hole(one).tag(), ContentTag::Hole);
        assert_eq!(
            TileContent::conveyor(one, Direction::East).tag(),
            ContentTag::Conveyor
        );
        assert_eq!(
            TileContent::block(one, None).shared().visibility(),
            Visibility::Transcendent
        );
        assert_eq!(
            TileContent::portal(PlayerSlot::Two, Position::new(1, 1)).visibility(),
            Visibility::PlayerTwoOnly
        );
    }

    #[test]
    fn content_serializes() {
        let content = TileContent::trigger(Position::new(4, 4));
        let json = serde_json::to_string(&content).unwrap();
        let back: TileContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }
}
