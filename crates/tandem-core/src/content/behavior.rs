//! Content behavior: how each kind of content reacts to interactions and to
//! stabilization passes.
//!
//! # Architecture
//!
//! The [`Behavior`] trait has two hooks:
//! - [`Behavior::action`] runs when an interaction is dispatched to the tile
//!   holding the content. It validates against the chain's snapshot and, on
//!   success, adds updates and follow-ups through [`ActionContext`].
//! - [`Behavior::update`] runs once per stabilization pass and returns the
//!   updates the content wants to make, judged from a read-only
//!   [`UpdateContext`].
//!
//! A content that declines an action must leave the chain as it found it.
//! Multi-step actions use [`ActionContext::transaction`] so that a late
//! refusal discards earlier writes.

use crate::chain::{ChainError, InteractionChain};
use crate::interaction::{ActionKind, Interaction};
use crate::map::Map;
use crate::position::{Direction, Position};
use crate::tile;
use crate::update::{EffectKind, GameStateUpdate};

use super::{Actor, ContentKind, ContentTag, ItemKind, Passability, PlayerSlot, TextureId, TileContent};

// =============================================================================
// Trait
// =============================================================================

/// Reaction of a content to interactions and stabilization passes.
pub trait Behavior {
    /// Attempts to handle the interaction in `ctx`.
    ///
    /// Returns `Ok(true)` if handled. Returning `Ok(false)` means "not mine":
    /// dispatch moves on to the next content in the stack.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] when an update the content produced does not
    /// apply to the snapshot.
    fn action(&self, ctx: &mut ActionContext<'_>) -> Result<bool, ChainError>;

    /// Updates this content wants to make during a stabilization pass.
    fn update(&self, ctx: &UpdateContext<'_>) -> Vec<GameStateUpdate>;
}

// =============================================================================
// Contexts
// =============================================================================

/// Everything a content may touch while handling an interaction.
#[derive(Debug)]
pub struct ActionContext<'a> {
    chain: &'a mut InteractionChain,
    interaction: &'a Interaction,
    position: Position,
    slot: usize,
}

impl<'a> ActionContext<'a> {
    /// Creates a context for the content at `slot` of `position`.
    pub fn new(
        chain: &'a mut InteractionChain,
        interaction: &'a Interaction,
        position: Position,
        slot: usize,
    ) -> Self {
        Self {
            chain,
            interaction,
            position,
            slot,
        }
    }

    /// The interaction being handled.
    #[must_use]
    pub fn interaction(&self) -> &Interaction {
        self.interaction
    }

    /// Position of the handling content.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Stack slot of the handling content.
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// The chain's snapshot, including every update accepted so far.
    #[must_use]
    pub fn map(&self) -> &Map {
        self.chain.snapshot()
    }

    /// Whose half of the world is being validated.
    #[must_use]
    pub fn viewer(&self) -> PlayerSlot {
        self.chain.snapshot().viewer()
    }

    /// Adds an update to the chain.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] if the update does not apply to the snapshot.
    pub fn add_update(&mut self, update: GameStateUpdate) -> Result<(), ChainError> {
        self.chain.add_update(update)
    }

    /// Queues a follow-up to run locally once this interaction stabilizes.
    pub fn queue_local(&mut self, interaction: Interaction) {
        self.chain.queue_local(interaction);
    }

    /// Queues a follow-up for the remote peer.
    pub fn queue_remote(&mut self, interaction: Interaction) {
        self.chain.queue_remote(interaction);
    }

    /// Dispatches another interaction within the same chain.
    ///
    /// It runs against a nested chain; its writes are kept only if something
    /// handled it.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] if the nested handler's updates do not apply.
    pub fn dispatch(&mut self, interaction: Interaction) -> Result<bool, ChainError> {
        let mut child = self.chain.nested(interaction.clone());
        let handled = tile::handle_action(&mut child, &interaction)?.is_some();
        if handled {
            self.chain.absorb(child);
        }
        Ok(handled)
    }

    /// Runs `body` against a nested chain and keeps its writes only if it
    /// returns `Ok(true)`.
    ///
    /// # Errors
    ///
    /// Propagates errors from `body`; the nested writes are dropped.
    pub fn transaction<F>(&mut self, body: F) -> Result<bool, ChainError>
    where
        F: FnOnce(&mut ActionContext<'_>) -> Result<bool, ChainError>,
    {
        let mut child = self.chain.nested(self.interaction.clone());
        let accepted = {
            let mut ctx = ActionContext::new(&mut child, self.interaction, self.position, self.slot);
            body(&mut ctx)?
        };
        if accepted {
            self.chain.absorb(child);
        }
        Ok(accepted)
    }
}

/// Read-only view handed to contents during a stabilization pass.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    map: &'a Map,
    interaction: &'a Interaction,
    handler: ContentTag,
    position: Position,
    slot: usize,
}

impl<'a> UpdateContext<'a> {
    /// Creates a context for the content at `slot` of `position`.
    #[must_use]
    pub fn new(
        map: &'a Map,
        interaction: &'a Interaction,
        handler: ContentTag,
        position: Position,
        slot: usize,
    ) -> Self {
        Self {
            map,
            interaction,
            handler,
            position,
            slot,
        }
    }

    /// The snapshot as of this point in the pass.
    #[must_use]
    pub fn map(&self) -> &'a Map {
        self.map
    }

    /// The interaction that started the cascade.
    #[must_use]
    pub fn interaction(&self) -> &'a Interaction {
        self.interaction
    }

    /// Tag of the content that handled that interaction.
    #[must_use]
    pub const fn handler(&self) -> ContentTag {
        self.handler
    }

    /// Position of the updating content.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Stack slot of the updating content.
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }
}

// =============================================================================
// Behavior
// =============================================================================

impl Behavior for TileContent {
    fn action(&self, ctx: &mut ActionContext<'_>) -> Result<bool, ChainError> {
        let interaction = ctx.interaction();
        let by_player = interaction.initiator() == ContentTag::Player;
        let by_trigger = interaction.initiator() == ContentTag::Trigger;
        match (self.kind(), interaction.kind()) {
            (ContentKind::Player { .. }, ActionKind::Step) if by_player => player_step(ctx),
            (ContentKind::Player { .. }, ActionKind::Use) if by_player => player_use(ctx),
            (ContentKind::Block { required_item }, ActionKind::Step) if by_player => {
                push_block(ctx, *required_item)
            }
            (ContentKind::Item(item), ActionKind::Use) if by_player => pick_up(ctx, *item),
            (ContentKind::Door { key: Some(key) }, ActionKind::Use) if by_player => {
                unlock_door(ctx, self, *key)
            }
            (ContentKind::Door { .. }, ActionKind::Use) if by_trigger => toggle_door(ctx, self),
            (ContentKind::Portal { exit }, ActionKind::Use) => use_portal(ctx, *exit),
            (ContentKind::Trigger { target }, ActionKind::Use) if by_player => {
                pull_trigger(ctx, self, *target)
            }
            _ => Ok(false),
        }
    }

    fn update(&self, ctx: &UpdateContext<'_>) -> Vec<GameStateUpdate> {
        match self.kind() {
            ContentKind::Goal => reach_goal(ctx),
            ContentKind::Hole => swallow_block(ctx),
            ContentKind::Conveyor { direction } => convey_block(ctx, *direction),
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// Actions
// =============================================================================

fn player_step(ctx: &mut ActionContext<'_>) -> Result<bool, ChainError> {
    let interaction = ctx.interaction().clone();
    let from = ctx.position();
    let slot = ctx.slot();
    let to = from.step(interaction.direction());

    ctx.transaction(|ctx| {
        let viewer = ctx.viewer();
        let Ok(target) = ctx.map().tile(to) else {
            return Ok(false);
        };
        if target.find(ContentTag::Block, viewer).is_some()
            && !ctx.dispatch(interaction.with_position(to))?
        {
            return Ok(false);
        }
        if !is_passable(ctx.map(), to, Actor::Player) {
            return Ok(false);
        }
        ctx.add_update(GameStateUpdate::Move {
            from,
            slot,
            expected: ContentTag::Player,
            to,
        })?;
        Ok(true)
    })
}

fn player_use(ctx: &mut ActionContext<'_>) -> Result<bool, ChainError> {
    let interaction = ctx.interaction();
    let front = ctx.position().step(interaction.direction());
    let forwarded = interaction.with_position(front);
    ctx.dispatch(forwarded)
}

fn push_block(ctx: &mut ActionContext<'_>, required_item: Option<ItemKind>) -> Result<bool, ChainError> {
    if required_item.is_some_and(|item| ctx.map().inventory() != Some(item)) {
        return Ok(false);
    }
    let from = ctx.position();
    let to = from.step(ctx.interaction().direction());
    if !is_passable(ctx.map(), to, Actor::Object) {
        return Ok(false);
    }
    ctx.add_update(GameStateUpdate::Move {
        from,
        slot: ctx.slot(),
        expected: ContentTag::Block,
        to,
    })?;
    Ok(true)
}

fn pick_up(ctx: &mut ActionContext<'_>, item: ItemKind) -> Result<bool, ChainError> {
    let position = ctx.position();
    if !has_player(ctx.map(), position) {
        return Ok(false);
    }
    let carried = ctx.map().inventory();
    let viewer = ctx.viewer();

    ctx.add_update(GameStateUpdate::RemoveContent {
        position,
        slot: ctx.slot(),
        expected: ContentTag::Item,
    })?;
    if let Some(previous) = carried {
        ctx.add_update(GameStateUpdate::AddContent {
            position,
            content: TileContent::item(viewer, previous),
        })?;
    }
    ctx.add_update(GameStateUpdate::SetInventory { item: Some(item) })?;
    ctx.add_update(GameStateUpdate::Effect {
        position,
        effect: EffectKind::Chime,
    })?;
    Ok(true)
}

fn unlock_door(ctx: &mut ActionContext<'_>, door: &TileContent, key: ItemKind) -> Result<bool, ChainError> {
    if door.is_passable_for(Actor::Player) || ctx.map().inventory() != Some(key) {
        return Ok(false);
    }
    let position = ctx.position();
    let slot = ctx.slot();
    ctx.add_update(GameStateUpdate::ChangePassability {
        position,
        slot,
        passability: Passability::OPEN,
    })?;
    ctx.add_update(GameStateUpdate::ChangeTexture {
        position,
        slot,
        texture: TextureId::DOOR_OPEN,
    })?;
    ctx.add_update(GameStateUpdate::Effect {
        position,
        effect: EffectKind::DoorCreak,
    })?;
    Ok(true)
}

fn use_portal(ctx: &mut ActionContext<'_>, exit: Position) -> Result<bool, ChainError> {
    let position = ctx.position();
    let interaction = ctx.interaction().clone();
    match interaction.initiator() {
        ContentTag::Player => {
            let Some(item) = ctx.map().inventory() else {
                return Ok(false);
            };
            ctx.add_update(GameStateUpdate::SetInventory { item: None })?;
            ctx.add_update(GameStateUpdate::Effect {
                position,
                effect: EffectKind::Warp,
            })?;
            let arrival = Interaction::new(
                exit,
                interaction.direction(),
                ActionKind::Use,
                ContentTag::Portal,
                interaction.origin(),
            )
            .with_params(vec![item.index()]);
            ctx.queue_remote(arrival);
            Ok(true)
        }
        ContentTag::Portal => {
            let Some(item) = interaction.params().first().copied().and_then(ItemKind::from_index) else {
                return Ok(false);
            };
            let viewer = ctx.viewer();
            ctx.add_update(GameStateUpdate::AddContent {
                position,
                content: TileContent::item(viewer, item),
            })?;
            ctx.add_update(GameStateUpdate::Effect {
                position,
                effect: EffectKind::Warp,
            })?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn toggle_door(ctx: &mut ActionContext<'_>, door: &TileContent) -> Result<bool, ChainError> {
    let position = ctx.position();
    let slot = ctx.slot();
    let open = door.is_passable_for(Actor::Player);
    if open && is_occupied(ctx.map(), position) {
        return Ok(false);
    }
    let (passability, texture) = if open {
        (Passability::SOLID, TextureId::DOOR_CLOSED)
    } else {
        (Passability::OPEN, TextureId::DOOR_OPEN)
    };
    ctx.add_update(GameStateUpdate::ChangePassability {
        position,
        slot,
        passability,
    })?;
    ctx.add_update(GameStateUpdate::ChangeTexture {
        position,
        slot,
        texture,
    })?;
    ctx.add_update(GameStateUpdate::Effect {
        position,
        effect: EffectKind::DoorCreak,
    })?;
    Ok(true)
}

/// Flips the lever and queues the door toggle as a local follow-up.
fn pull_trigger(
    ctx: &mut ActionContext<'_>,
    lever: &TileContent,
    target: Position,
) -> Result<bool, ChainError> {
    let map = ctx.map();
    let Ok(doorway) = map.tile(target) else {
        return Ok(false);
    };
    let Some(door) = doorway
        .find(ContentTag::Door, map.viewer())
        .and_then(|slot| doorway.get(slot))
    else {
        return Ok(false);
    };
    if door.is_passable_for(Actor::Player) && is_occupied(map, target) {
        return Ok(false);
    }

    let texture = if lever.texture() == TextureId::TRIGGER_ACTIVE {
        TextureId::TRIGGER
    } else {
        TextureId::TRIGGER_ACTIVE
    };
    let position = ctx.position();
    ctx.add_update(GameStateUpdate::ChangeTexture {
        position,
        slot: ctx.slot(),
        texture,
    })?;
    ctx.add_update(GameStateUpdate::Effect {
        position,
        effect: EffectKind::Click,
    })?;

    let interaction = ctx.interaction();
    let toggle = Interaction::new(
        target,
        interaction.direction(),
        ActionKind::Use,
        ContentTag::Trigger,
        interaction.origin(),
    );
    ctx.queue_local(toggle);
    Ok(true)
}

// =============================================================================
// Updates
// =============================================================================

fn reach_goal(ctx: &UpdateContext<'_>) -> Vec<GameStateUpdate> {
    let map = ctx.map();
    if !map.goal_reached() && has_player(map, ctx.position()) {
        vec![GameStateUpdate::EndLevel]
    } else {
        Vec::new()
    }
}

fn swallow_block(ctx: &UpdateContext<'_>) -> Vec<GameStateUpdate> {
    let position = ctx.position();
    let Some(block) = block_above(ctx.map(), position, ctx.slot()) else {
        return Vec::new();
    };
    // Higher slot first so the hole's slot stays valid.
    vec![
        GameStateUpdate::RemoveContent {
            position,
            slot: block,
            expected: ContentTag::Block,
        },
        GameStateUpdate::RemoveContent {
            position,
            slot: ctx.slot(),
            expected: ContentTag::Hole,
        },
        GameStateUpdate::Effect {
            position,
            effect: EffectKind::Splash,
        },
    ]
}

fn convey_block(ctx: &UpdateContext<'_>, direction: Direction) -> Vec<GameStateUpdate> {
    let from = ctx.position();
    let Some(block) = block_above(ctx.map(), from, ctx.slot()) else {
        return Vec::new();
    };
    let to = from.step(direction);
    if !is_passable(ctx.map(), to, Actor::Object) {
        return Vec::new();
    }
    vec![GameStateUpdate::Move {
        from,
        slot: block,
        expected: ContentTag::Block,
        to,
    }]
}

// =============================================================================
// Helpers
// =============================================================================

fn is_passable(map: &Map, position: Position, actor: Actor) -> bool {
    map.tile(position)
        .is_ok_and(|tile| tile.is_passable_for(actor, map.viewer()))
}

fn has_player(map: &Map, position: Position) -> bool {
    map.tile(position)
        .is_ok_and(|tile| tile.find(ContentTag::Player, map.viewer()).is_some())
}

/// Whether a player or block stands at `position`.
fn is_occupied(map: &Map, position: Position) -> bool {
    map.tile(position).is_ok_and(|tile| {
        tile.find(ContentTag::Player, map.viewer()).is_some()
            || tile.find(ContentTag::Block, map.viewer()).is_some()
    })
}

/// Top-most visible block stacked above `slot`.
fn block_above(map: &Map, position: Position, slot: usize) -> Option<usize> {
    let tile = map.tile(position).ok()?;
    tile.find(ContentTag::Block, map.viewer())
        .filter(|&block| block > slot)
}
