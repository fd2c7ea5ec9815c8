//! Maps and polling helpers for session tests.

use std::thread;
use std::time::{Duration, Instant};

use tandem_core::content::{Actor, ContentTag, PlayerSlot, TileContent};
use tandem_core::map::Map;
use tandem_core::GameController;
use tandem_core::position::Position;

use crate::peer::PeerNode;

/// Lever position in [`lever_corridor`].
pub const LEVER: Position = Position::new(1, 0);
/// Door position in [`lever_corridor`].
pub const DOORWAY: Position = Position::new(3, 0);

/// A 4x1 corridor with a shared lever at (1,0) operating a door at (3,0),
/// and optionally the viewer's player at (0,0).
pub fn lever_corridor(viewer: PlayerSlot, with_player: bool) -> Map {
    let mut map = Map::filled(4, 1, viewer).unwrap();
    if with_player {
        map.place(Position::new(0, 0), TileContent::player(viewer)).unwrap();
    }
    map.place(LEVER, TileContent::trigger(DOORWAY)).unwrap();
    map.place(DOORWAY, TileContent::door(viewer, None)).unwrap();
    map
}

/// Whether the door in `map`'s corridor lets players through.
pub fn door_is_open(map: &Map) -> bool {
    let tile = map.tile(DOORWAY).unwrap();
    let slot = tile.find(ContentTag::Door, map.viewer()).unwrap();
    tile.get(slot).unwrap().is_passable_for(Actor::Player)
}

/// Polls `node` until `ready` holds, or panics after two seconds.
pub fn wait_until(node: &PeerNode, what: &str, ready: impl Fn(&GameController) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if ready(&*node.lock().unwrap()) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

/// Shuts both nodes down and waits for their threads.
pub fn stop(one: PeerNode, two: PeerNode) {
    one.shutdown();
    two.shutdown();
    one.join();
    two.join();
}
