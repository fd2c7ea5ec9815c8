//! Client side of the protocol: a [`RemotePeer`] that talks over a
//! [`Transport`].
//!
//! `open_chain` and `append` send a request, register it in the shared
//! [`CorrelationTable`] and block until the pump delivers the answer or the
//! configured timeout passes. `apply` and `abort` are sent without waiting.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use tandem_core::{Interaction, RemoteChainId, RemoteError, RemotePeer, TransactionId};

use crate::config::SyncConfig;
use crate::correlation::CorrelationTable;
use crate::protocol::{encode, PeerMessage, Request, RequestId, Response};
use crate::transport::Transport;

/// Proxy for the other peer's game controller.
pub struct RemoteGameController {
    transport: Arc<dyn Transport>,
    table: Arc<CorrelationTable>,
    config: SyncConfig,
}

impl fmt::Debug for RemoteGameController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteGameController")
            .field("config", &self.config)
            .field("outstanding", &self.table.outstanding())
            .finish_non_exhaustive()
    }
}

impl RemoteGameController {
    /// Creates a proxy sending over `transport`. Responses must be delivered
    /// into `table` by whoever drains the inbound frames.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, table: Arc<CorrelationTable>, config: SyncConfig) -> Self {
        Self {
            transport,
            table,
            config,
        }
    }

    /// Sends `request` and waits up to `timeout` for its answer.
    fn call(&self, request: Request, timeout: Duration) -> Result<Response, RemoteError> {
        let id = RequestId::new();
        let operation = request.name();
        let pending = self.table.register(id);
        debug!(%id, operation, transaction = %request.transaction(), "sending request");
        if let Err(err) = self.send(id, request) {
            self.table.cancel(id);
            return Err(err);
        }
        match self.table.wait(pending, timeout, operation)? {
            Response::Error { reason } => Err(RemoteError::Rejected(reason)),
            response => Ok(response),
        }
    }

    /// Sends `request` without waiting.
    fn notify(&self, request: Request) -> Result<(), RemoteError> {
        let id = RequestId::new();
        debug!(%id, operation = request.name(), transaction = %request.transaction(), "sending notification");
        self.send(id, request)
    }

    fn send(&self, id: RequestId, request: Request) -> Result<(), RemoteError> {
        let frame = encode(&PeerMessage::Request { id, request })
            .map_err(|err| RemoteError::Protocol(err.to_string()))?;
        self.transport.send(frame).map_err(|err| {
            warn!(%id, error = %err, "send failed");
            RemoteError::Disconnected
        })
    }
}

impl RemotePeer for RemoteGameController {
    fn open_chain(&mut self, transaction: TransactionId) -> Result<RemoteChainId, RemoteError> {
        let request = Request::CreateRemoteInteractionChain { transaction };
        match self.call(request, self.config.create_timeout())? {
            Response::ChainCreated { chain } => Ok(chain),
            other => Err(unexpected("ChainCreated", &other)),
        }
    }

    fn append(
        &mut self,
        transaction: TransactionId,
        interaction: &Interaction,
    ) -> Result<Vec<Interaction>, RemoteError> {
        let request = Request::AppendRemoteInteraction {
            transaction,
            interaction: interaction.clone(),
            suppress_follow_up: true,
        };
        match self.call(request, self.config.append_timeout())? {
            Response::FollowUps { interactions } => Ok(interactions),
            other => Err(unexpected("FollowUps", &other)),
        }
    }

    fn apply(&mut self, transaction: TransactionId) -> Result<(), RemoteError> {
        self.notify(Request::ApplyRemoteGsus { transaction })
    }

    fn abort(&mut self, transaction: TransactionId) -> Result<(), RemoteError> {
        self.notify(Request::AbortRemoteGsus { transaction })
    }
}

fn unexpected(wanted: &str, got: &Response) -> RemoteError {
    RemoteError::Protocol(format!("expected {wanted}, got {got:?}"))
}
