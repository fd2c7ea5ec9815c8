//! Receiving side of the protocol and the per-peer wiring.
//!
//! # Architecture
//!
//! A [`PeerNode`] owns one [`GameController`] behind an `Arc<Mutex<_>>` and
//! two background threads:
//!
//! - **pump**: drains inbound frames. Responses go straight into the
//!   [`CorrelationTable`]; requests are handed to the handler thread. The
//!   pump never takes the controller lock, so an action blocked waiting on
//!   the other peer still gets its answer.
//! - **handler**: locks the controller for each request, runs it through
//!   [`handle_request`], and sends back the response if one is due.
//!
//! Shutting down is two-phase because each node's pump waits on the other
//! node's senders: call [`PeerNode::shutdown`] on both nodes, then
//! [`PeerNode::join`] them.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use tandem_core::{ControllerError, GameController, Interaction, Map, Outcome, UpdateError};

use crate::config::SyncConfig;
use crate::correlation::CorrelationTable;
use crate::protocol::{decode, encode, PeerMessage, Request, RequestId, Response};
use crate::remote::RemoteGameController;
use crate::transport::{Endpoint, MemoryTransport, Transport};

/// Failure of a peer node.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The controller mutex was poisoned by a panicking thread.
    #[error("game controller lock poisoned")]
    Poisoned,
    /// The controller failed fatally.
    #[error(transparent)]
    Controller(#[from] ControllerError),
    /// A pending update did not fit the live map.
    #[error(transparent)]
    Update(#[from] UpdateError),
    /// A background thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Request handling
// =============================================================================

/// Runs one inbound request against `controller`.
///
/// Returns the response to send back, or `None` for fire-and-forget
/// requests. Refusals become [`Response::Error`]; a fatal controller error is
/// logged as such but still answered so the caller stops waiting.
pub fn handle_request(controller: &mut GameController, request: Request) -> Option<Response> {
    match request {
        Request::CreateRemoteInteractionChain { transaction } => {
            Some(match controller.create_remote_chain(transaction) {
                Ok(chain) => Response::ChainCreated { chain },
                Err(err) => refuse(&err),
            })
        }
        Request::AppendRemoteInteraction {
            transaction,
            interaction,
            suppress_follow_up,
        } => {
            let interaction = if suppress_follow_up {
                interaction.mirrored()
            } else {
                interaction
            };
            Some(match controller.append_remote_interaction(transaction, interaction) {
                Ok(interactions) => Response::FollowUps { interactions },
                Err(err) => refuse(&err),
            })
        }
        Request::ApplyRemoteGsus { transaction } => {
            if let Err(err) = controller.apply_remote(transaction) {
                error!(%transaction, error = %err, "remote apply failed");
            }
            None
        }
        Request::AbortRemoteGsus { transaction } => {
            controller.abort_remote(transaction);
            None
        }
    }
}

fn refuse(err: &ControllerError) -> Response {
    if err.is_fatal() {
        error!(error = %err, "request broke a controller invariant");
    } else {
        debug!(error = %err, "request refused");
    }
    Response::Error {
        reason: err.to_string(),
    }
}

// =============================================================================
// Peer node
// =============================================================================

/// Work for the handler thread.
enum Job {
    Handle(RequestId, Request),
    Stop,
}

/// One peer: a controller wired to the other peer over a transport.
pub struct PeerNode {
    controller: Arc<Mutex<GameController>>,
    table: Arc<CorrelationTable>,
    jobs: Sender<Job>,
    threads: Vec<JoinHandle<()>>,
}

impl fmt::Debug for PeerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerNode")
            .field("outstanding", &self.table.outstanding())
            .field("threads", &self.threads.len())
            .finish_non_exhaustive()
    }
}

impl PeerNode {
    /// Attaches a [`RemoteGameController`] to `controller` and starts the
    /// pump and handler threads on `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Spawn`] if a thread cannot be started.
    pub fn spawn(
        name: &str,
        mut controller: GameController,
        endpoint: Endpoint,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        let Endpoint { transport, inbound } = endpoint;
        let table = Arc::new(CorrelationTable::new());
        controller.set_remote(Box::new(RemoteGameController::new(
            Arc::clone(&transport),
            Arc::clone(&table),
            config,
        )));
        let controller = Arc::new(Mutex::new(controller));
        let (jobs, queued) = mpsc::channel();

        let pump = spawn_named(format!("{name}-pump"), {
            let table = Arc::clone(&table);
            let jobs = jobs.clone();
            move || pump(&inbound, &table, &jobs)
        })?;
        let handler = spawn_named(format!("{name}-handler"), {
            let controller = Arc::clone(&controller);
            move || serve(&queued, &controller, transport.as_ref())
        })?;
        info!(peer = name, "peer node started");

        Ok(Self {
            controller,
            table,
            jobs,
            threads: vec![pump, handler],
        })
    }

    /// Shared handle to the controller.
    #[must_use]
    pub fn controller(&self) -> Arc<Mutex<GameController>> {
        Arc::clone(&self.controller)
    }

    /// Locks the controller.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] if a thread panicked while holding it.
    pub fn lock(&self) -> Result<MutexGuard<'_, GameController>, SyncError> {
        self.controller.lock().map_err(|_| SyncError::Poisoned)
    }

    /// Runs a local action.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Controller`] on a fatal controller error.
    pub fn trigger_action(&self, interaction: Interaction) -> Result<Outcome, SyncError> {
        Ok(self.lock()?.trigger_action(interaction)?)
    }

    /// Drains the pending FIFO into the live map.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Update`] if a pending update does not fit.
    pub fn apply_pending(&self) -> Result<usize, SyncError> {
        Ok(self.lock()?.apply_pending()?)
    }

    /// Requests still waiting for the other peer.
    #[must_use]
    pub fn outstanding_requests(&self) -> usize {
        self.table.outstanding()
    }

    /// Stops handling requests and releases this node's end of the link.
    ///
    /// Local actions that need the other peer fail with
    /// [`RemoteError::Unavailable`](tandem_core::RemoteError::Unavailable)
    /// from here on.
    pub fn shutdown(&self) {
        if self.jobs.send(Job::Stop).is_err() {
            debug!("request handler already stopped");
        }
        match self.controller.lock() {
            Ok(mut controller) => drop(controller.take_remote()),
            Err(_) => error!("game controller lock poisoned during shutdown"),
        }
    }

    /// Waits for the background threads. The pump finishes once the other
    /// node has shut down too.
    pub fn join(self) {
        for handle in self.threads {
            if handle.join().is_err() {
                error!("peer thread panicked");
            }
        }
    }
}

/// Builds two nodes over an in-memory link.
///
/// # Errors
///
/// Returns [`SyncError::Spawn`] if a thread cannot be started.
pub fn linked_nodes(one: Map, two: Map, config: SyncConfig) -> Result<(PeerNode, PeerNode), SyncError> {
    let (first, second) = MemoryTransport::pair();
    let one = PeerNode::spawn("one", GameController::new(one), first, config)?;
    let two = PeerNode::spawn("two", GameController::new(two), second, config)?;
    Ok((one, two))
}

fn spawn_named<F>(name: String, body: F) -> Result<JoinHandle<()>, SyncError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(body)
        .map_err(|source| SyncError::Spawn { name, source })
}

fn pump(inbound: &Receiver<Vec<u8>>, table: &CorrelationTable, jobs: &Sender<Job>) {
    for frame in inbound {
        match decode(&frame) {
            Ok(PeerMessage::Response { id, response }) => {
                table.deliver(id, response);
            }
            Ok(PeerMessage::Request { id, request }) => {
                if jobs.send(Job::Handle(id, request)).is_err() {
                    warn!(%id, "request handler gone; dropping request");
                    break;
                }
            }
            Err(err) => warn!(error = %err, bytes = frame.len(), "dropping malformed frame"),
        }
    }
    debug!("inbound link closed");
}

fn serve(queued: &Receiver<Job>, controller: &Mutex<GameController>, transport: &dyn Transport) {
    for job in queued {
        let Job::Handle(id, request) = job else {
            debug!("request handler stopping");
            return;
        };
        debug!(%id, operation = request.name(), transaction = %request.transaction(), "handling request");
        let response = {
            let Ok(mut controller) = controller.lock() else {
                error!("game controller lock poisoned; handler stopping");
                return;
            };
            handle_request(&mut controller, request)
        };
        let Some(response) = response else {
            continue;
        };
        match encode(&PeerMessage::Response { id, response }) {
            Ok(frame) => {
                if transport.send(frame).is_err() {
                    warn!(%id, "link closed before response was sent");
                }
            }
            Err(err) => error!(%id, error = %err, "failed to encode response"),
        }
    }
}
