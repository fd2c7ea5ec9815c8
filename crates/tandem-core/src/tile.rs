//! Tiles and content-stack dispatch.
//!
//! A [`Tile`] is one cell of the map holding an ordered stack of
//! [`TileContent`]s: index 0 is the bottom, the last element is the top.
//!
//! # Dispatch
//!
//! [`handle_action`] offers an interaction to the target tile's stack.
//! Contents are tried bottom-up and the first one to accept wins, so two
//! contents on the same tile never both act on one interaction.
//!
//! [`handle_update`] is the stabilization-phase counterpart: every content in
//! the stack gets a chance to emit updates during each pass.
//!
//! Both work against an [`InteractionChain`]'s snapshot, never the live map.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::chain::{ChainError, InteractionChain};
use crate::content::{
    ActionContext, Actor, Behavior, ContentTag, PlayerSlot, TileContent, UpdateContext, Visibility,
};
use crate::interaction::Interaction;
use crate::position::Position;
use crate::update::UpdateClass;

// =============================================================================
// Tile
// =============================================================================

/// One map cell and its content stack.
///
/// # Example
///
/// ```
/// use tandem_core::content::{ContentTag, PlayerSlot, TileContent};
/// use tandem_core::tile::Tile;
///
/// let mut tile = Tile::new();
/// tile.push(TileContent::ground(PlayerSlot::One));
/// tile.push(TileContent::player(PlayerSlot::One));
///
/// assert_eq!(tile.top().map(TileContent::tag), Some(ContentTag::Player));
/// assert_eq!(tile.find(ContentTag::Ground, PlayerSlot::One), Some(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    contents: Vec<TileContent>,
}

impl Tile {
    /// Creates an empty tile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a content on top of the stack.
    pub fn push(&mut self, content: TileContent) {
        self.contents.push(content);
    }

    /// Removes and returns the top content.
    pub fn pop(&mut self) -> Option<TileContent> {
        self.contents.pop()
    }

    /// The top content.
    #[must_use]
    pub fn top(&self) -> Option<&TileContent> {
        self.contents.last()
    }

    /// The content at `slot` (0 = bottom).
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&TileContent> {
        self.contents.get(slot)
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut TileContent> {
        self.contents.get_mut(slot)
    }

    /// Removes the content at `slot`, keeping the order of the rest.
    pub fn remove(&mut self, slot: usize) -> Option<TileContent> {
        (slot < self.contents.len()).then(|| self.contents.remove(slot))
    }

    /// Number of stacked contents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether the tile holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// The whole stack, bottom first.
    #[must_use]
    pub fn contents(&self) -> &[TileContent] {
        &self.contents
    }

    /// Contents `viewer` can see, bottom first, with their slots.
    pub fn visible_contents(
        &self,
        viewer: PlayerSlot,
    ) -> impl Iterator<Item = (usize, &TileContent)> + '_ {
        self.contents
            .iter()
            .enumerate()
            .filter(move |(_, content)| content.visibility().visible_to(viewer))
    }

    /// Whether `actor` may enter, judged by every content `viewer` can see.
    ///
    /// An empty tile is a gap in the floor and admits nobody.
    #[must_use]
    pub fn is_passable_for(&self, actor: Actor, viewer: PlayerSlot) -> bool {
        let mut visible = self.visible_contents(viewer).peekable();
        visible.peek().is_some() && visible.all(|(_, content)| content.is_passable_for(actor))
    }

    /// Slot of the top-most visible content with `tag`.
    #[must_use]
    pub fn find(&self, tag: ContentTag, viewer: PlayerSlot) -> Option<usize> {
        self.visible_contents(viewer)
            .filter(|(_, content)| content.tag() == tag)
            .map(|(slot, _)| slot)
            .last()
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Offers `interaction` to the content stack at its target position.
///
/// Contents are tried bottom-up; the first to accept handles the interaction.
/// When the handler is [`Visibility::Transcendent`] and the interaction is not
/// already a mirrored copy, a mirrored copy is queued on the chain for the
/// remote peer.
///
/// Returns the tag of the handling content, or `None` when nothing handled it
/// (including an out-of-bounds target). A content that declines leaves the
/// chain untouched.
///
/// # Errors
///
/// Returns [`ChainError`] when an accepted action's updates fail to apply to
/// the snapshot.
pub fn handle_action(
    chain: &mut InteractionChain,
    interaction: &Interaction,
) -> Result<Option<ContentTag>, ChainError> {
    let position = interaction.position();
    let viewer = chain.snapshot().viewer();
    let Ok(tile) = chain.snapshot().tile(position) else {
        debug!(%position, "interaction target outside the map");
        return Ok(None);
    };
    let stack: Vec<(usize, TileContent)> = tile
        .visible_contents(viewer)
        .map(|(slot, content)| (slot, content.clone()))
        .collect();

    for (slot, content) in stack {
        let mut ctx = ActionContext::new(chain, interaction, position, slot);
        if content.action(&mut ctx)? {
            trace!(%position, slot, handler = %content.tag(), "interaction handled");
            if content.visibility() == Visibility::Transcendent && !interaction.suppress_remote() {
                chain.queue_remote(interaction.mirrored());
            }
            return Ok(Some(content.tag()));
        }
    }
    Ok(None)
}

/// Lets every content at `position` emit updates for one stabilization pass.
///
/// `interaction` and `handler` describe what set the cascade off. Updates are
/// added to the chain as they are produced, so contents higher up the stack
/// (and later tiles in the pass) observe them. Returns the number of
/// map-modification updates produced.
///
/// # Errors
///
/// Returns [`ChainError`] when an update fails to apply to the snapshot.
pub fn handle_update(
    chain: &mut InteractionChain,
    interaction: &Interaction,
    position: Position,
    handler: ContentTag,
) -> Result<usize, ChainError> {
    let mut changes = 0;
    let mut slot = 0;
    loop {
        let updates = {
            let map = chain.snapshot();
            let Some(content) = map.tile(position).ok().and_then(|tile| tile.get(slot)) else {
                break;
            };
            if !content.visibility().visible_to(map.viewer()) {
                slot += 1;
                continue;
            }
            let ctx = UpdateContext::new(map, interaction, handler, position, slot);
            content.update(&ctx)
        };
        for update in updates {
            if update.class() == UpdateClass::MapModification {
                changes += 1;
            }
            chain.add_update(update)?;
        }
        slot += 1;
    }
    Ok(changes)
}
