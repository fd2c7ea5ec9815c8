//! Interaction chains: the transaction for one interaction.
//!
//! An [`InteractionChain`] owns everything produced while validating one
//! interaction:
//! - a private [`Snapshot`] of the map
//! - the ordered log of accepted [`GameStateUpdate`]s
//! - follow-up interactions to run locally before the chain closes
//! - follow-up interactions to mirror to the remote peer
//!
//! # Visibility of writes
//!
//! [`InteractionChain::add_update`] applies map modifications to the chain's
//! own snapshot immediately, so later validation in the same chain sees them.
//! Nothing reaches the live map until the controller commits the chain's log.
//! Effect-class updates are logged but never applied to the snapshot.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::trace;

use crate::interaction::Interaction;
use crate::remote::TransactionId;
use crate::snapshot::Snapshot;
use crate::update::{GameStateUpdate, UpdateClass, UpdateError};

/// Chain-level failure: the interaction is treated as not handled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// An update failed its speculative apply to the snapshot.
    #[error("update `{update}` rejected by snapshot: {source}")]
    UpdateRejected {
        /// The offending update.
        update: Box<GameStateUpdate>,
        /// Why it did not apply.
        #[source]
        source: UpdateError,
    },
}

/// Where a chain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOrigin {
    /// Opened by a local `trigger_action`, or nested under one.
    Local,
    /// Opened on behalf of the remote peer's transaction.
    Remote(TransactionId),
}

/// Transactional context for one interaction.
#[derive(Debug, Clone)]
pub struct InteractionChain {
    origin: ChainOrigin,
    interaction: Option<Interaction>,
    snapshot: Snapshot,
    updates: Vec<GameStateUpdate>,
    local_queue: VecDeque<Interaction>,
    remote_queue: VecDeque<Interaction>,
}

impl InteractionChain {
    /// Opens a chain for `interaction` over `snapshot`.
    #[must_use]
    pub fn new(origin: ChainOrigin, interaction: Interaction, snapshot: Snapshot) -> Self {
        Self::with_interaction(origin, Some(interaction), snapshot)
    }

    /// Opens the root chain of a remote transaction.
    ///
    /// It has no interaction of its own; appended interactions run in chains
    /// nested under it.
    #[must_use]
    pub fn open_remote(transaction: TransactionId, snapshot: Snapshot) -> Self {
        Self::with_interaction(ChainOrigin::Remote(transaction), None, snapshot)
    }

    fn with_interaction(
        origin: ChainOrigin,
        interaction: Option<Interaction>,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            origin,
            interaction,
            snapshot,
            updates: Vec::new(),
            local_queue: VecDeque::new(),
            remote_queue: VecDeque::new(),
        }
    }

    /// Where this chain came from.
    #[must_use]
    pub const fn origin(&self) -> ChainOrigin {
        self.origin
    }

    /// The interaction that opened this chain, if any.
    #[must_use]
    pub fn interaction(&self) -> Option<&Interaction> {
        self.interaction.as_ref()
    }

    /// The chain's private map.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Updates accepted so far, in order.
    #[must_use]
    pub fn updates(&self) -> &[GameStateUpdate] {
        &self.updates
    }

    /// Interactions waiting to run locally.
    #[must_use]
    pub fn local_queue(&self) -> &VecDeque<Interaction> {
        &self.local_queue
    }

    /// Interactions waiting to be mirrored remotely.
    #[must_use]
    pub fn remote_queue(&self) -> &VecDeque<Interaction> {
        &self.remote_queue
    }

    /// Accepts an update into the chain.
    ///
    /// Map modifications are applied to the snapshot first; if that fails the
    /// update is not logged.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UpdateRejected`] when the snapshot rejects it.
    pub fn add_update(&mut self, update: GameStateUpdate) -> Result<(), ChainError> {
        if update.class() == UpdateClass::MapModification {
            if let Err(source) = self.snapshot.apply(&update) {
                return Err(ChainError::UpdateRejected {
                    update: Box::new(update),
                    source,
                });
            }
        }
        trace!(%update, "update accepted");
        self.updates.push(update);
        Ok(())
    }

    /// Queues an interaction to run locally after this one stabilizes.
    pub fn queue_local(&mut self, interaction: Interaction) {
        self.local_queue.push_back(interaction);
    }

    /// Queues an interaction to mirror to the remote peer.
    pub fn queue_remote(&mut self, interaction: Interaction) {
        self.remote_queue.push_back(interaction);
    }

    pub(crate) fn next_local(&mut self) -> Option<Interaction> {
        self.local_queue.pop_front()
    }

    pub(crate) fn take_remote_queue(&mut self) -> VecDeque<Interaction> {
        std::mem::take(&mut self.remote_queue)
    }

    /// Opens a nested chain over a copy of this chain's current snapshot.
    #[must_use]
    pub fn nested(&self, interaction: Interaction) -> Self {
        Self::new(self.origin, interaction, self.snapshot.derive())
    }

    /// Folds a successful nested chain back in: its snapshot replaces ours and
    /// its updates and both follow-up queues are appended in order.
    pub fn absorb(&mut self, child: InteractionChain) {
        self.snapshot = child.snapshot;
        self.updates.extend(child.updates);
        self.local_queue.extend(child.local_queue);
        self.remote_queue.extend(child.remote_queue);
    }

    /// Consumes the chain, yielding its update log.
    #[must_use]
    pub fn into_updates(self) -> Vec<GameStateUpdate> {
        self.updates
    }
}
