//! Test helper functions for building maps, controllers and fake peers.

use std::sync::{Arc, Mutex};

use crate::content::{ContentTag, PlayerSlot, TileContent};
use crate::controller::GameController;
use crate::interaction::Interaction;
use crate::map::Map;
use crate::position::Position;
use crate::remote::{RemoteChainId, RemoteError, RemotePeer, TransactionId};

// =============================================================================
// Maps
// =============================================================================

/// A ground-filled map for player one.
pub fn open_map(width: u32, height: u32) -> Map {
    Map::filled(width, height, PlayerSlot::One).unwrap()
}

/// A ground-filled map for `viewer` with its player at `player`.
pub fn map_with_player(width: u32, height: u32, viewer: PlayerSlot, player: Position) -> Map {
    let mut map = Map::filled(width, height, viewer).unwrap();
    map.place(player, TileContent::player(viewer)).unwrap();
    map
}

/// Places each content on top of the stack at its position.
pub fn place_all(map: &mut Map, contents: impl IntoIterator<Item = (Position, TileContent)>) {
    for (position, content) in contents {
        map.place(position, content).unwrap();
    }
}

/// Tags of the stack at `position`, bottom first.
pub fn tags_at(map: &Map, position: Position) -> Vec<ContentTag> {
    map.tile(position)
        .unwrap()
        .contents()
        .iter()
        .map(TileContent::tag)
        .collect()
}

// =============================================================================
// Fake Peers
// =============================================================================

/// A call a [`ScriptedPeer`] received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCall {
    Open(TransactionId),
    Append(TransactionId, Interaction),
    Apply(TransactionId),
    Abort(TransactionId),
}

/// Shared log of calls, readable after the peer is boxed into a controller.
pub type CallLog = Arc<Mutex<Vec<PeerCall>>>;

/// A remote peer that records calls and answers from a script.
#[derive(Debug, Default)]
pub struct ScriptedPeer {
    calls: CallLog,
    /// Error returned by `open_chain`, if any.
    pub open_error: Option<RemoteError>,
    /// Error returned by `append`, if any.
    pub append_error: Option<RemoteError>,
    /// Follow-ups returned by the first successful `append`.
    pub follow_ups: Vec<Interaction>,
}

impl ScriptedPeer {
    /// Creates a peer that accepts everything, plus its call log.
    pub fn new() -> (Self, CallLog) {
        let peer = Self::default();
        let calls = Arc::clone(&peer.calls);
        (peer, calls)
    }

    fn record(&self, call: PeerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RemotePeer for ScriptedPeer {
    fn open_chain(&mut self, transaction: TransactionId) -> Result<RemoteChainId, RemoteError> {
        self.record(PeerCall::Open(transaction));
        match self.open_error.clone() {
            Some(err) => Err(err),
            None => Ok(RemoteChainId::new(1)),
        }
    }

    fn append(
        &mut self,
        transaction: TransactionId,
        interaction: &Interaction,
    ) -> Result<Vec<Interaction>, RemoteError> {
        self.record(PeerCall::Append(transaction, interaction.clone()));
        match self.append_error.clone() {
            Some(err) => Err(err),
            None => Ok(std::mem::take(&mut self.follow_ups)),
        }
    }

    fn apply(&mut self, transaction: TransactionId) -> Result<(), RemoteError> {
        self.record(PeerCall::Apply(transaction));
        Ok(())
    }

    fn abort(&mut self, transaction: TransactionId) -> Result<(), RemoteError> {
        self.record(PeerCall::Abort(transaction));
        Ok(())
    }
}

/// A remote peer that calls straight into another controller, with no
/// transport in between.
pub struct DirectPeer {
    other: Arc<Mutex<GameController>>,
}

impl DirectPeer {
    pub fn new(other: &Arc<Mutex<GameController>>) -> Self {
        Self {
            other: Arc::clone(other),
        }
    }
}

impl RemotePeer for DirectPeer {
    fn open_chain(&mut self, transaction: TransactionId) -> Result<RemoteChainId, RemoteError> {
        self.other
            .lock()
            .unwrap()
            .create_remote_chain(transaction)
            .map_err(|err| RemoteError::Rejected(err.to_string()))
    }

    fn append(
        &mut self,
        transaction: TransactionId,
        interaction: &Interaction,
    ) -> Result<Vec<Interaction>, RemoteError> {
        self.other
            .lock()
            .unwrap()
            .append_remote_interaction(transaction, interaction.mirrored())
            .map_err(|err| RemoteError::Rejected(err.to_string()))
    }

    fn apply(&mut self, transaction: TransactionId) -> Result<(), RemoteError> {
        self.other
            .lock()
            .unwrap()
            .apply_remote(transaction)
            .map(|_| ())
            .map_err(|err| RemoteError::Rejected(err.to_string()))
    }

    fn abort(&mut self, transaction: TransactionId) -> Result<(), RemoteError> {
        self.other.lock().unwrap().abort_remote(transaction);
        Ok(())
    }
}

/// Two controllers, one per player, each mirroring into the other.
pub fn linked_pair(one: Map, two: Map) -> (Arc<Mutex<GameController>>, Arc<Mutex<GameController>>) {
    let one = Arc::new(Mutex::new(GameController::new(one)));
    let two = Arc::new(Mutex::new(GameController::new(two)));
    one.lock().unwrap().set_remote(Box::new(DirectPeer::new(&two)));
    two.lock().unwrap().set_remote(Box::new(DirectPeer::new(&one)));
    (one, two)
}
