//! The remote-peer seam.
//!
//! A [`GameController`](crate::controller::GameController) mirrors some
//! interactions to the other peer through a [`RemotePeer`]. The trait is the
//! whole contract: open a remote transaction, append interactions to it, then
//! apply or abort it. How requests travel (and how long the controller waits
//! for answers) is up to the implementation; `tandem-sync` provides one over
//! a message transport.
//!
//! # Transactions
//!
//! One top-level action opens at most one remote transaction, named by a
//! [`TransactionId`]. Every request that belongs to it carries that id, so
//! the receiving controller can tell a stale abort from a current one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::interaction::Interaction;

/// Names one remote transaction across every request that belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

/// Id the receiving controller assigns to a remote chain it opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemoteChainId(u64);

impl RemoteChainId {
    /// Creates a chain id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RemoteChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

/// Why a remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// No answer within the allowed time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Request that timed out.
        operation: &'static str,
        /// How long the caller waited.
        after: Duration,
    },
    /// The remote controller refused the request.
    #[error("remote rejected request: {0}")]
    Rejected(String),
    /// The remote answered with something that does not fit the request.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The link to the remote peer is gone.
    #[error("remote peer disconnected")]
    Disconnected,
    /// No remote peer is attached.
    #[error("no remote peer attached")]
    Unavailable,
}

/// Client side of the remote synchronization protocol.
///
/// Implementations block until the remote answers or their own timeout
/// expires. `apply` and `abort` are fire-and-forget on the wire; an error
/// from them only means the message could not be sent.
pub trait RemotePeer: Send {
    /// Opens a remote chain for `transaction`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on timeout, rejection or transport failure.
    fn open_chain(&mut self, transaction: TransactionId) -> Result<RemoteChainId, RemoteError>;

    /// Runs `interaction` inside the remote chain and returns the follow-ups
    /// the remote side wants run back here.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on timeout, rejection or transport failure.
    fn append(
        &mut self,
        transaction: TransactionId,
        interaction: &Interaction,
    ) -> Result<Vec<Interaction>, RemoteError>;

    /// Commits the remote chain.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the message could not be sent.
    fn apply(&mut self, transaction: TransactionId) -> Result<(), RemoteError>;

    /// Discards the remote chain.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the message could not be sent.
    fn abort(&mut self, transaction: TransactionId) -> Result<(), RemoteError>;
}
