//! The game controller: one peer's interaction pipeline.
//!
//! [`GameController`] owns the live [`Map`], a stack of open
//! [`InteractionChain`]s and a FIFO of updates waiting to reach the live map.
//! It is an explicit context object; callers that share it between threads
//! wrap it in a `Mutex` themselves.
//!
//! # Pipeline
//!
//! [`GameController::trigger_action`] runs one local action to completion:
//!
//! 1. **OPEN**: push a chain over a snapshot of the live map with every
//!    pending update replayed
//! 2. **DISPATCH**: offer the interaction to the target tile's contents
//! 3. **STABILIZE**: run cascades to a fixed point
//! 4. **FOLLOW-UPS**: run queued local follow-ups in nested chains
//! 5. **MIRROR**: send queued remote follow-ups in one remote transaction
//! 6. **COMMIT**: move the chain's updates to the pending FIFO, apply remotely
//!
//! The chain is popped whatever happens. Nothing touches the live map until
//! the caller drains the FIFO with [`GameController::apply_next`] or
//! [`GameController::apply_pending`]. Actions may be triggered while earlier
//! ones are still queued; each validates against the state the queue will
//! leave behind.
//!
//! # Remote Chains
//!
//! The receiving side of the protocol uses
//! [`create_remote_chain`](GameController::create_remote_chain),
//! [`append_remote_interaction`](GameController::append_remote_interaction),
//! [`apply_remote`](GameController::apply_remote) and
//! [`abort_remote`](GameController::abort_remote). A remote chain is only
//! opened on an empty stack, and while it is open local actions are refused.
//!
//! # Example
//!
//! ```
//! use tandem_core::content::{PlayerSlot, TileContent};
//! use tandem_core::controller::GameController;
//! use tandem_core::interaction::Interaction;
//! use tandem_core::map::Map;
//! use tandem_core::position::{Direction, Position};
//!
//! let mut live = Map::filled(5, 5, PlayerSlot::One).unwrap();
//! live.place(Position::new(2, 2), TileContent::player(PlayerSlot::One)).unwrap();
//!
//! let mut controller = GameController::new(live);
//! let step = Interaction::step(Position::new(2, 2), Direction::North, controller.id());
//!
//! let outcome = controller.trigger_action(step).unwrap();
//! assert!(outcome.is_committed());
//! assert_eq!(controller.pending_updates().len(), 1);
//!
//! controller.apply_pending().unwrap();
//! assert_eq!(controller.live_map().tile(Position::new(2, 1)).unwrap().len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::chain::{ChainError, ChainOrigin, InteractionChain};
use crate::content::ContentTag;
use crate::interaction::{ControllerId, Interaction};
use crate::map::Map;
use crate::remote::{RemoteChainId, RemoteError, RemotePeer, TransactionId};
use crate::snapshot::Snapshot;
use crate::stabilize::{stabilize, StabilizationError, DEFAULT_MAX_PASSES};
use crate::tile::handle_action;
use crate::update::{GameStateUpdate, UpdateError};

// =============================================================================
// Configuration
// =============================================================================

/// Tunables for a [`GameController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Stabilization passes allowed before a cascade counts as a cycle.
    pub max_stabilization_passes: u32,
    /// Maximum number of chains open at once, root included.
    pub max_chain_depth: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_stabilization_passes: DEFAULT_MAX_PASSES,
            max_chain_depth: 16,
        }
    }
}

// =============================================================================
// Errors & Outcomes
// =============================================================================

/// A broken chain-stack invariant. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A local action was triggered while a remote chain is open.
    #[error("remote chain {transaction} is open; local actions are refused")]
    RemoteChainOutstanding {
        /// The open remote transaction.
        transaction: TransactionId,
    },
    /// The chain stack was expected to be empty.
    #[error("chain stack holds {depth} chain(s)")]
    ChainStackOccupied {
        /// Chains currently open.
        depth: usize,
    },
    /// A remote request named a transaction with no open chain.
    #[error("no remote chain is open for {transaction}")]
    NoRemoteChain {
        /// Transaction named by the request.
        transaction: TransactionId,
    },
    /// A remote request named a different transaction than the open one.
    #[error("remote chain {open} is open, request named {requested}")]
    TransactionMismatch {
        /// Transaction of the open chain.
        open: TransactionId,
        /// Transaction named by the request.
        requested: TransactionId,
    },
    /// Follow-ups nested deeper than the configured limit.
    #[error("chain depth limit of {limit} exceeded")]
    ChainDepthExceeded {
        /// The configured limit.
        limit: usize,
    },
    /// A chain was expected on the stack.
    #[error("chain stack is empty")]
    EmptyChainStack,
}

/// Why a remote interaction was turned down by the receiving controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The interaction started on this controller and came back.
    #[error("interaction originated here")]
    Loopback,
    /// No content handled it.
    #[error("not handled")]
    NotHandled,
    /// A content handled it but its updates did not apply.
    #[error(transparent)]
    Failed(ChainError),
}

/// Controller failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// A chain-stack invariant was broken.
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    /// A cascade did not settle.
    #[error("stabilization failed: {0}")]
    Stabilization(#[from] StabilizationError),
    /// Committed updates no longer fit the live map, so no snapshot can be
    /// built on top of them.
    #[error("pending updates do not fit the live map: {0}")]
    PendingDiverged(#[from] UpdateError),
    /// An appended remote interaction was turned down.
    #[error("remote interaction `{interaction}` rejected: {reason}")]
    RemoteInteractionRejected {
        /// The interaction.
        interaction: Box<Interaction>,
        /// Why.
        reason: RejectReason,
    },
}

impl ControllerError {
    /// Whether the controller's state can no longer be trusted.
    ///
    /// A rejected remote interaction is an answer to the caller, not a
    /// failure of this controller.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RemoteInteractionRejected { .. })
    }
}

/// Result of a local action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action was accepted and its updates queued.
    Committed {
        /// Tag of the content that handled the action.
        handler: ContentTag,
        /// Updates appended to the pending FIFO.
        updates: usize,
        /// Remote transaction that was applied, if any.
        transaction: Option<TransactionId>,
    },
    /// No content handled the action.
    NotHandled,
    /// A handler's updates did not apply; nothing was queued.
    Rejected(ChainError),
    /// The remote peer failed; the remote transaction was aborted.
    RemoteFailed(RemoteError),
}

impl Outcome {
    /// Whether the action was committed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// How a chain on top of the stack resolved.
enum Resolution {
    Handled(ContentTag),
    NotHandled,
    Rejected(ChainError),
}

// =============================================================================
// GameController
// =============================================================================

/// One peer's interaction pipeline.
pub struct GameController {
    id: ControllerId,
    config: ControllerConfig,
    /// The authoritative map. Only changed by draining `pending`.
    live: Map,
    /// Open chains, root first.
    chains: Vec<InteractionChain>,
    /// Committed updates not yet applied to `live`.
    pending: VecDeque<GameStateUpdate>,
    /// Length of each committed action's run in `pending`, oldest first.
    batches: VecDeque<usize>,
    remote: Option<Box<dyn RemotePeer>>,
    remote_chains_opened: u64,
}

impl fmt::Debug for GameController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameController")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("live", &self.live)
            .field("chains", &self.chains.len())
            .field("pending", &self.pending.len())
            .field("remote", &self.remote.is_some())
            .finish_non_exhaustive()
    }
}

impl GameController {
    /// Creates a controller over `live` with the default configuration.
    #[must_use]
    pub fn new(live: Map) -> Self {
        Self::with_config(live, ControllerConfig::default())
    }

    /// Creates a controller over `live` with `config`.
    #[must_use]
    pub fn with_config(live: Map, config: ControllerConfig) -> Self {
        Self {
            id: ControllerId::new(),
            config,
            live,
            chains: Vec::new(),
            pending: VecDeque::new(),
            batches: VecDeque::new(),
            remote: None,
            remote_chains_opened: 0,
        }
    }

    /// This controller's identity.
    #[must_use]
    pub const fn id(&self) -> ControllerId {
        self.id
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The live map.
    #[must_use]
    pub fn live_map(&self) -> &Map {
        &self.live
    }

    /// The live map, mutably. For renderers draining effects.
    pub fn live_map_mut(&mut self) -> &mut Map {
        &mut self.live
    }

    /// Number of open chains.
    #[must_use]
    pub fn chain_depth(&self) -> usize {
        self.chains.len()
    }

    /// Committed updates waiting for the live map, oldest first.
    #[must_use]
    pub fn pending_updates(&self) -> &VecDeque<GameStateUpdate> {
        &self.pending
    }

    /// Transaction of the open remote chain, if any.
    #[must_use]
    pub fn open_remote_transaction(&self) -> Option<TransactionId> {
        self.chains.first().and_then(|chain| match chain.origin() {
            ChainOrigin::Remote(transaction) => Some(transaction),
            ChainOrigin::Local => None,
        })
    }

    /// Attaches the remote peer used for mirroring.
    pub fn set_remote(&mut self, remote: Box<dyn RemotePeer>) {
        self.remote = Some(remote);
    }

    /// Detaches the remote peer.
    pub fn take_remote(&mut self) -> Option<Box<dyn RemotePeer>> {
        self.remote.take()
    }

    // -------------------------------------------------------------------------
    // Draining
    // -------------------------------------------------------------------------

    /// Applies the oldest pending update to the live map.
    ///
    /// Returns the applied update, or `None` when nothing is pending. Effect
    /// updates land in the live map's effect log, which keeps growing until
    /// the renderer empties it with [`Map::drain_effects`].
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError`] if the update does not fit the live map. The
    /// update is dropped together with the rest of the action that queued it;
    /// later actions stay queued.
    pub fn apply_next(&mut self) -> Result<Option<GameStateUpdate>, UpdateError> {
        let Some(update) = self.pending.pop_front() else {
            return Ok(None);
        };
        let rest_of_batch = self.consume_from_batch();
        if let Err(err) = update.apply(&mut self.live) {
            let dropped = self.pending.drain(..rest_of_batch.min(self.pending.len())).count();
            if rest_of_batch > 0 {
                self.batches.pop_front();
            }
            error!(%update, error = %err, dropped, "pending update does not fit the live map");
            return Err(err);
        }
        Ok(Some(update))
    }

    /// Applies every pending update. Returns how many were applied.
    ///
    /// # Errors
    ///
    /// Stops at the first update that fails; see [`Self::apply_next`].
    pub fn apply_pending(&mut self) -> Result<usize, UpdateError> {
        let mut applied = 0;
        while self.apply_next()?.is_some() {
            applied += 1;
        }
        Ok(applied)
    }

    // -------------------------------------------------------------------------
    // Local actions
    // -------------------------------------------------------------------------

    /// Runs one local action through the whole pipeline.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`ControllerError`] when a remote chain is open, the
    /// stack is otherwise occupied, a cascade does not settle, or follow-ups
    /// nest too deeply. Ordinary refusals are reported through [`Outcome`].
    pub fn trigger_action(&mut self, interaction: Interaction) -> Result<Outcome, ControllerError> {
        if let Some(transaction) = self.open_remote_transaction() {
            error!(%transaction, %interaction, "local action while a remote chain is open");
            return Err(InvariantViolation::RemoteChainOutstanding { transaction }.into());
        }
        if !self.chains.is_empty() {
            error!(depth = self.chains.len(), %interaction, "local action on an occupied chain stack");
            return Err(InvariantViolation::ChainStackOccupied {
                depth: self.chains.len(),
            }
            .into());
        }

        debug!(%interaction, "opening chain");
        let root = InteractionChain::new(ChainOrigin::Local, interaction, self.projected_snapshot()?);
        self.chains.push(root);

        let mut transaction = None;
        let result = self.run_local_action(&mut transaction);
        let root = self.chains.pop();
        self.chains.clear();

        match (&result, root) {
            (Ok(Outcome::Committed { handler, updates, .. }), Some(root)) => {
                self.enqueue(root.into_updates());
                if let Some(transaction) = transaction {
                    if let Err(err) = self.remote_mut().and_then(|remote| remote.apply(transaction)) {
                        warn!(%transaction, error = %err, "failed to send remote apply");
                    }
                }
                info!(%handler, updates, pending = self.pending.len(), "action committed");
            }
            _ => {
                if let Some(transaction) = transaction {
                    self.send_abort(transaction);
                }
                match &result {
                    Ok(outcome) => debug!(?outcome, "action not committed"),
                    Err(err) => error!(error = %err, "action failed"),
                }
            }
        }
        result
    }

    fn run_local_action(
        &mut self,
        transaction: &mut Option<TransactionId>,
    ) -> Result<Outcome, ControllerError> {
        let handler = match self.resolve_top()? {
            Resolution::Handled(handler) => handler,
            Resolution::NotHandled => return Ok(Outcome::NotHandled),
            Resolution::Rejected(err) => return Ok(Outcome::Rejected(err)),
        };
        if let Err(err) = self.mirror_remote_queue(transaction)? {
            warn!(error = %err, "remote mirroring failed");
            return Ok(Outcome::RemoteFailed(err));
        }
        Ok(Outcome::Committed {
            handler,
            updates: self.top()?.updates().len(),
            transaction: *transaction,
        })
    }

    /// Dispatches, stabilizes and drains local follow-ups of the top chain.
    fn resolve_top(&mut self) -> Result<Resolution, ControllerError> {
        let Some(interaction) = self.top()?.interaction().cloned() else {
            return Ok(Resolution::NotHandled);
        };
        let max_passes = self.config.max_stabilization_passes;
        let chain = self.top_mut()?;

        let handler = match handle_action(chain, &interaction) {
            Ok(Some(handler)) => handler,
            Ok(None) => {
                debug!(%interaction, "interaction not handled");
                return Ok(Resolution::NotHandled);
            }
            Err(err) => {
                debug!(%interaction, error = %err, "interaction rejected");
                return Ok(Resolution::Rejected(err));
            }
        };

        match stabilize(chain, &interaction, handler, max_passes) {
            Ok(report) => debug!(passes = report.passes, changes = report.changes, "stabilized"),
            Err(StabilizationError::Chain(err)) => return Ok(Resolution::Rejected(err)),
            Err(err) => return Err(err.into()),
        }

        while let Some(follow_up) = self.top_mut()?.next_local() {
            self.resolve_nested(follow_up)?;
        }
        Ok(Resolution::Handled(handler))
    }

    /// Runs `interaction` in a chain nested under the top one and folds it
    /// back in if it was handled. Returns whether it was.
    fn resolve_nested(&mut self, interaction: Interaction) -> Result<bool, ControllerError> {
        let limit = self.config.max_chain_depth;
        if self.chains.len() >= limit {
            error!(limit, %interaction, "follow-ups nested too deeply");
            return Err(InvariantViolation::ChainDepthExceeded { limit }.into());
        }
        let child = self.top()?.nested(interaction);
        self.chains.push(child);
        let resolution = self.resolve_top();
        let child = self.chains.pop().ok_or(InvariantViolation::EmptyChainStack)?;

        match resolution? {
            Resolution::Handled(_) => {
                self.top_mut()?.absorb(child);
                Ok(true)
            }
            Resolution::NotHandled => {
                debug!("follow-up not handled, skipped");
                Ok(false)
            }
            Resolution::Rejected(err) => {
                debug!(error = %err, "follow-up rejected, skipped");
                Ok(false)
            }
        }
    }

    /// Sends the top chain's remote queue, opening the transaction on first
    /// use. Follow-ups the remote returns run here as mirrored nested chains.
    fn mirror_remote_queue(
        &mut self,
        transaction: &mut Option<TransactionId>,
    ) -> Result<Result<(), RemoteError>, ControllerError> {
        let limit = self.config.max_chain_depth;
        let mut rounds = 0;
        loop {
            let queue = self.top_mut()?.take_remote_queue();
            if queue.is_empty() {
                return Ok(Ok(()));
            }
            rounds += 1;
            if rounds > limit {
                error!(limit, "remote follow-ups kept coming back");
                return Err(InvariantViolation::ChainDepthExceeded { limit }.into());
            }

            for interaction in queue {
                let open = match *transaction {
                    Some(open) => open,
                    None => {
                        let fresh = TransactionId::new();
                        *transaction = Some(fresh);
                        match self.remote_mut().and_then(|remote| remote.open_chain(fresh)) {
                            Ok(chain) => info!(transaction = %fresh, %chain, "remote chain opened"),
                            Err(err) => return Ok(Err(err)),
                        }
                        fresh
                    }
                };
                debug!(transaction = %open, %interaction, "mirroring interaction");
                let follow_ups = match self
                    .remote_mut()
                    .and_then(|remote| remote.append(open, &interaction))
                {
                    Ok(follow_ups) => follow_ups,
                    Err(err) => return Ok(Err(err)),
                };
                for follow_up in follow_ups {
                    self.resolve_nested(follow_up.mirrored())?;
                }
            }
        }
    }

    fn send_abort(&mut self, transaction: TransactionId) {
        match self.remote_mut().and_then(|remote| remote.abort(transaction)) {
            Ok(()) => info!(%transaction, "remote transaction aborted"),
            Err(err) => warn!(%transaction, error = %err, "failed to send remote abort"),
        }
    }

    // -------------------------------------------------------------------------
    // Remote chains
    // -------------------------------------------------------------------------

    /// Opens a chain on behalf of the remote peer's `transaction`.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::ChainStackOccupied`] unless the stack is
    /// empty, and [`ControllerError::PendingDiverged`] if the pending updates
    /// no longer fit the live map.
    pub fn create_remote_chain(
        &mut self,
        transaction: TransactionId,
    ) -> Result<RemoteChainId, ControllerError> {
        if !self.chains.is_empty() {
            error!(%transaction, depth = self.chains.len(), "remote chain requested on an occupied stack");
            return Err(InvariantViolation::ChainStackOccupied {
                depth: self.chains.len(),
            }
            .into());
        }
        let snapshot = self.projected_snapshot()?;
        self.chains.push(InteractionChain::open_remote(transaction, snapshot));
        self.remote_chains_opened += 1;
        let chain = RemoteChainId::new(self.remote_chains_opened);
        info!(%transaction, %chain, "remote chain created");
        Ok(chain)
    }

    /// Runs a remote peer's interaction inside its open chain.
    ///
    /// Returns the remote follow-ups it produced so the caller can send them
    /// back instead of this controller mirroring them itself.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::RemoteInteractionRejected`] if the
    /// interaction originated here or was not handled, and a fatal error when
    /// `transaction` does not name the open remote chain.
    pub fn append_remote_interaction(
        &mut self,
        transaction: TransactionId,
        interaction: Interaction,
    ) -> Result<Vec<Interaction>, ControllerError> {
        self.expect_remote_root(transaction)?;
        if interaction.origin() == self.id {
            warn!(%transaction, %interaction, "remote interaction originated here");
            return Err(ControllerError::RemoteInteractionRejected {
                interaction: Box::new(interaction),
                reason: RejectReason::Loopback,
            });
        }

        let child = self.top()?.nested(interaction.clone());
        self.chains.push(child);
        let resolution = self.resolve_top();
        let mut child = self.chains.pop().ok_or(InvariantViolation::EmptyChainStack)?;

        let reason = match resolution? {
            Resolution::Handled(handler) => {
                let follow_ups: Vec<Interaction> = child.take_remote_queue().into();
                self.top_mut()?.absorb(child);
                debug!(%transaction, %handler, follow_ups = follow_ups.len(), "remote interaction appended");
                return Ok(follow_ups);
            }
            Resolution::NotHandled => RejectReason::NotHandled,
            Resolution::Rejected(err) => RejectReason::Failed(err),
        };
        debug!(%transaction, %interaction, %reason, "remote interaction rejected");
        Err(ControllerError::RemoteInteractionRejected {
            interaction: Box::new(interaction),
            reason,
        })
    }

    /// Commits the open remote chain: its updates join the pending FIFO.
    ///
    /// Returns the number of updates queued.
    ///
    /// # Errors
    ///
    /// Returns a fatal error unless exactly one chain is open and it belongs
    /// to `transaction`.
    pub fn apply_remote(&mut self, transaction: TransactionId) -> Result<usize, ControllerError> {
        self.expect_remote_root(transaction)?;
        let root = self.chains.pop().ok_or(InvariantViolation::EmptyChainStack)?;
        let updates = root.into_updates();
        let count = updates.len();
        self.enqueue(updates);
        info!(%transaction, updates = count, "remote chain applied");
        Ok(count)
    }

    /// Discards the open remote chain.
    ///
    /// The stack is cleared when the open remote chain belongs to
    /// `transaction` or when no remote chain is open. An abort naming some
    /// other transaction is stale and ignored. Returns whether anything was
    /// cleared.
    pub fn abort_remote(&mut self, transaction: TransactionId) -> bool {
        match self.open_remote_transaction() {
            Some(open) if open != transaction => {
                warn!(%transaction, %open, "ignoring abort for another transaction");
                false
            }
            _ => {
                let dropped = self.chains.len();
                self.chains.clear();
                info!(%transaction, dropped, "remote chain aborted");
                dropped > 0
            }
        }
    }

    fn expect_remote_root(&self, transaction: TransactionId) -> Result<(), InvariantViolation> {
        match self.chains.as_slice() {
            [root] => match root.origin() {
                ChainOrigin::Remote(open) if open == transaction => Ok(()),
                ChainOrigin::Remote(open) => Err(InvariantViolation::TransactionMismatch {
                    open,
                    requested: transaction,
                }),
                ChainOrigin::Local => Err(InvariantViolation::NoRemoteChain { transaction }),
            },
            [] => Err(InvariantViolation::NoRemoteChain { transaction }),
            chains => Err(InvariantViolation::ChainStackOccupied {
                depth: chains.len(),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// A snapshot of the live map with every pending update replayed, so a
    /// new chain validates against the state its updates will land on.
    fn projected_snapshot(&self) -> Result<Snapshot, UpdateError> {
        let mut snapshot = Snapshot::of(&self.live);
        for update in &self.pending {
            if let Err(err) = snapshot.apply(update) {
                error!(%update, error = %err, "pending update does not replay");
                return Err(err);
            }
        }
        Ok(snapshot)
    }

    fn enqueue(&mut self, updates: Vec<GameStateUpdate>) {
        if updates.is_empty() {
            return;
        }
        self.batches.push_back(updates.len());
        self.pending.extend(updates);
    }

    /// Counts one update off the oldest batch. Returns how many updates of
    /// that batch are still queued.
    fn consume_from_batch(&mut self) -> usize {
        match self.batches.front_mut() {
            Some(left) if *left > 1 => {
                *left -= 1;
                *left
            }
            Some(_) => {
                self.batches.pop_front();
                0
            }
            None => 0,
        }
    }

    fn top(&self) -> Result<&InteractionChain, InvariantViolation> {
        self.chains.last().ok_or(InvariantViolation::EmptyChainStack)
    }

    fn top_mut(&mut self) -> Result<&mut InteractionChain, InvariantViolation> {
        self.chains.last_mut().ok_or(InvariantViolation::EmptyChainStack)
    }

    fn remote_mut(&mut self) -> Result<&mut (dyn RemotePeer + 'static), RemoteError> {
        self.remote.as_deref_mut().ok_or(RemoteError::Unavailable)
    }
}
