//! # Tandem Sync
//!
//! The two-peer synchronization protocol for Tandem. Each peer runs its own
//! [`GameController`](tandem_core::GameController); when an action is handled
//! by shared content the acting controller mirrors it to the other peer in a
//! two-phase transaction (create, append, then apply or abort).
//!
//! ## Architecture
//!
//! - **Protocol**: [`protocol::PeerMessage`] frames, JSON-encoded
//! - **Correlation**: [`correlation::CorrelationTable`] routes each response
//!   to the caller blocked on it, with a timeout
//! - **Client**: [`remote::RemoteGameController`] implements
//!   [`RemotePeer`](tandem_core::RemotePeer) over a [`transport::Transport`]
//! - **Server**: [`peer::handle_request`] runs inbound requests against the
//!   local controller; [`peer::PeerNode`] wires it all to background threads
//!
//! ## Usage
//!
//! ```
//! use tandem_core::content::{PlayerSlot, TileContent};
//! use tandem_core::map::Map;
//! use tandem_core::position::{Direction, Position};
//! use tandem_core::Interaction;
//! use tandem_sync::{linked_nodes, SyncConfig};
//!
//! let mut one = Map::filled(3, 1, PlayerSlot::One).unwrap();
//! one.place(Position::new(0, 0), TileContent::player(PlayerSlot::One)).unwrap();
//! let two = Map::filled(3, 1, PlayerSlot::Two).unwrap();
//!
//! let (one, two) = linked_nodes(one, two, SyncConfig::default()).unwrap();
//! let origin = one.lock().unwrap().id();
//! let outcome = one
//!     .trigger_action(Interaction::step(Position::new(0, 0), Direction::East, origin))
//!     .unwrap();
//! assert!(outcome.is_committed());
//!
//! one.shutdown();
//! two.shutdown();
//! one.join();
//! two.join();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod correlation;
pub mod peer;
pub mod protocol;
pub mod remote;
pub mod transport;

pub use config::SyncConfig;
pub use correlation::CorrelationTable;
pub use peer::{handle_request, linked_nodes, PeerNode, SyncError};
pub use protocol::{CodecError, PeerMessage, Request, RequestId, Response};
pub use remote::RemoteGameController;
pub use transport::{Endpoint, MemoryTransport, Transport, TransportError};

#[cfg(test)]
mod tests;
