//! Routing responses back to the callers waiting for them.
//!
//! Each outgoing request that expects an answer registers a one-shot slot
//! keyed by its [`RequestId`]. The inbound pump delivers responses into the
//! matching slot without touching the game controller; the caller blocks on
//! its own slot with a timeout. A slot is removed when it is answered or
//! when its caller gives up, so a late response finds nothing and is dropped.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use tandem_core::RemoteError;

use crate::protocol::{RequestId, Response};

/// Outstanding requests awaiting a response.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    slots: Mutex<HashMap<RequestId, Sender<Response>>>,
}

/// The caller's end of one registered slot.
#[derive(Debug)]
pub struct PendingResponse {
    id: RequestId,
    receiver: Receiver<Response>,
}

impl PendingResponse {
    /// Id of the request this slot answers.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }
}

impl CorrelationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a slot for request `id`.
    pub fn register(&self, id: RequestId) -> PendingResponse {
        let (sender, receiver) = mpsc::channel();
        if self.slots().insert(id, sender).is_some() {
            warn!(%id, "request id registered twice; previous waiter dropped");
        }
        PendingResponse { id, receiver }
    }

    /// Hands `response` to the caller waiting on `id`.
    ///
    /// Returns `false` when nobody is waiting (unknown id, or the caller
    /// already timed out); the response is dropped.
    pub fn deliver(&self, id: RequestId, response: Response) -> bool {
        let Some(sender) = self.slots().remove(&id) else {
            debug!(%id, "dropping response nobody is waiting for");
            return false;
        };
        // The receiver is gone only if the caller stopped waiting between
        // the removal above and now.
        sender.send(response).is_ok()
    }

    /// Blocks until `pending` is answered or `timeout` passes.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Timeout`] naming `operation` if no answer
    /// arrives in time. The slot is removed either way.
    pub fn wait(
        &self,
        pending: PendingResponse,
        timeout: Duration,
        operation: &'static str,
    ) -> Result<Response, RemoteError> {
        match pending.receiver.recv_timeout(timeout) {
            Ok(response) => Ok(response),
            Err(RecvTimeoutError::Timeout) => {
                self.cancel(pending.id);
                warn!(id = %pending.id, operation, ?timeout, "request timed out");
                Err(RemoteError::Timeout {
                    operation,
                    after: timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.cancel(pending.id);
                Err(RemoteError::Disconnected)
            }
        }
    }

    /// Removes the slot for `id` without answering it.
    pub fn cancel(&self, id: RequestId) {
        self.slots().remove(&id);
    }

    /// Number of requests still waiting.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.slots().len()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<RequestId, Sender<Response>>> {
        // Every critical section is a single map call.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
