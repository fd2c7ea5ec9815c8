//! The byte-frame transport seam.
//!
//! A [`Transport`] only sends. Inbound frames arrive on a plain
//! `mpsc::Receiver<Vec<u8>>` that the peer's pump thread drains, so any link
//! that can push bytes into a channel (a socket reader thread, a test
//! harness) plugs in without further glue.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use thiserror::Error;

/// Failure to hand a frame to the link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The other end has gone away.
    #[error("transport closed")]
    Closed,
}

/// Outgoing half of a link to the other peer.
pub trait Transport: Send + Sync {
    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the link is down.
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError>;
}

/// In-process transport backed by a channel.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    outbound: Sender<Vec<u8>>,
}

/// One end of a link: where to send, and where frames arrive.
pub struct Endpoint {
    /// Sends to the other end.
    pub transport: Arc<dyn Transport>,
    /// Frames sent by the other end.
    pub inbound: Receiver<Vec<u8>>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("inbound", &self.inbound)
            .finish_non_exhaustive()
    }
}

impl MemoryTransport {
    /// Creates a transport whose frames land on the returned receiver.
    #[must_use]
    pub fn channel() -> (Self, Receiver<Vec<u8>>) {
        let (outbound, inbound) = mpsc::channel();
        (Self { outbound }, inbound)
    }

    /// Creates two connected endpoints.
    #[must_use]
    pub fn pair() -> (Endpoint, Endpoint) {
        let (to_two, two_inbound) = Self::channel();
        let (to_one, one_inbound) = Self::channel();
        (
            Endpoint {
                transport: Arc::new(to_two),
                inbound: one_inbound,
            },
            Endpoint {
                transport: Arc::new(to_one),
                inbound: two_inbound,
            },
        )
    }
}

impl Transport for MemoryTransport {
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.outbound.send(frame).map_err(|_| TransportError::Closed)
    }
}
