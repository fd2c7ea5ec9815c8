//! Remote transactions: the mirroring side against a scripted peer, the
//! receiving side's chain-stack rules, and two controllers wired together.

use std::time::Duration;

use crate::content::{Actor, ContentTag, ItemKind, PlayerSlot, TileContent};
use crate::controller::{ControllerError, GameController, InvariantViolation, Outcome, RejectReason};
use crate::interaction::{ActionKind, ControllerId, Interaction};
use crate::map::Map;
use crate::position::{Direction, Position};
use crate::remote::{RemoteChainId, RemoteError, TransactionId};

use super::helpers::{linked_pair, map_with_player, open_map, place_all, tags_at, PeerCall, ScriptedPeer};

const LEVER: Position = Position::new(1, 0);
const DOORWAY: Position = Position::new(3, 0);

/// A 4x1 corridor: player, lever, ground, trigger-operated door.
fn lever_corridor(viewer: PlayerSlot, with_player: bool) -> Map {
    let mut map = if with_player {
        map_with_player(4, 1, viewer, Position::new(0, 0))
    } else {
        Map::filled(4, 1, viewer).unwrap()
    };
    place_all(
        &mut map,
        [
            (LEVER, TileContent::trigger(DOORWAY)),
            (DOORWAY, TileContent::door(viewer, None)),
        ],
    );
    map
}

fn pull_lever(origin: ControllerId) -> Interaction {
    Interaction::use_at(Position::new(0, 0), Direction::East, origin)
}

fn door_is_open(controller: &GameController) -> bool {
    let tile = controller.live_map().tile(DOORWAY).unwrap();
    let slot = tile
        .find(ContentTag::Door, controller.live_map().viewer())
        .unwrap();
    tile.get(slot).unwrap().is_passable_for(Actor::Player)
}

fn committed_transaction(outcome: &Outcome) -> TransactionId {
    match outcome {
        Outcome::Committed {
            transaction: Some(transaction),
            ..
        } => *transaction,
        other => panic!("expected a committed remote transaction, got {other:?}"),
    }
}

// =============================================================================
// Mirroring side
// =============================================================================

#[test]
fn shared_lever_runs_one_remote_transaction() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, true));
    let (peer, calls) = ScriptedPeer::new();
    controller.set_remote(Box::new(peer));
    let origin = controller.id();

    let outcome = controller.trigger_action(pull_lever(origin)).unwrap();
    let transaction = committed_transaction(&outcome);
    assert!(matches!(
        outcome,
        Outcome::Committed {
            handler: ContentTag::Player,
            updates: 5,
            ..
        }
    ));

    let mirrored = Interaction::use_at(LEVER, Direction::East, origin).mirrored();
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            PeerCall::Open(transaction),
            PeerCall::Append(transaction, mirrored),
            PeerCall::Apply(transaction),
        ]
    );
}

#[test]
fn open_timeout_aborts_and_queues_nothing() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, true));
    let (mut peer, calls) = ScriptedPeer::new();
    let timeout = RemoteError::Timeout {
        operation: "create remote chain",
        after: Duration::from_millis(5000),
    };
    peer.open_error = Some(timeout.clone());
    controller.set_remote(Box::new(peer));
    let before = controller.live_map().clone();

    let outcome = controller.trigger_action(pull_lever(controller.id())).unwrap();
    assert_eq!(outcome, Outcome::RemoteFailed(timeout));
    assert!(controller.pending_updates().is_empty());
    assert_eq!(controller.chain_depth(), 0);
    assert_eq!(controller.live_map(), &before);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    let PeerCall::Open(opened) = &calls[0] else {
        panic!("expected open first, got {:?}", calls[0]);
    };
    assert_eq!(calls[1], PeerCall::Abort(*opened));
}

#[test]
fn append_failure_aborts() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, true));
    let (mut peer, calls) = ScriptedPeer::new();
    peer.append_error = Some(RemoteError::Rejected("not handled".to_string()));
    controller.set_remote(Box::new(peer));

    let outcome = controller.trigger_action(pull_lever(controller.id())).unwrap();
    assert!(matches!(outcome, Outcome::RemoteFailed(RemoteError::Rejected(_))));
    assert!(controller.pending_updates().is_empty());

    let calls = calls.lock().unwrap();
    assert!(matches!(calls.as_slice(), [PeerCall::Open(_), PeerCall::Append(..), PeerCall::Abort(_)]));
}

#[test]
fn private_actions_never_touch_the_peer() {
    let mut controller = GameController::new(map_with_player(3, 3, PlayerSlot::One, Position::new(1, 1)));
    let (peer, calls) = ScriptedPeer::new();
    controller.set_remote(Box::new(peer));

    let step = Interaction::step(Position::new(1, 1), Direction::South, controller.id());
    let outcome = controller.trigger_action(step).unwrap();
    assert!(matches!(outcome, Outcome::Committed { transaction: None, .. }));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn remote_follow_ups_run_locally() {
    let arrival_pad = Position::new(2, 0);
    let mut map = lever_corridor(PlayerSlot::One, true);
    place_all(
        &mut map,
        [(arrival_pad, TileContent::portal(PlayerSlot::One, Position::new(0, 0)))],
    );
    let mut controller = GameController::new(map);

    let (mut peer, _calls) = ScriptedPeer::new();
    peer.follow_ups = vec![Interaction::new(
        arrival_pad,
        Direction::East,
        ActionKind::Use,
        ContentTag::Portal,
        ControllerId::new(),
    )
    .with_params(vec![ItemKind::Orb.index()])];
    controller.set_remote(Box::new(peer));

    let outcome = controller.trigger_action(pull_lever(controller.id())).unwrap();
    assert!(matches!(outcome, Outcome::Committed { updates: 7, .. }));

    controller.apply_pending().unwrap();
    assert_eq!(
        tags_at(controller.live_map(), arrival_pad),
        vec![ContentTag::Ground, ContentTag::Portal, ContentTag::Item]
    );
    assert!(door_is_open(&controller));
}

// =============================================================================
// Receiving side
// =============================================================================

#[test]
fn local_action_during_remote_chain_is_fatal() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, true));
    let transaction = TransactionId::new();
    assert_eq!(controller.create_remote_chain(transaction).unwrap(), RemoteChainId::new(1));

    let err = controller.trigger_action(pull_lever(controller.id())).unwrap_err();
    assert_eq!(
        err,
        ControllerError::Invariant(InvariantViolation::RemoteChainOutstanding { transaction })
    );
    assert!(err.is_fatal());
    assert_eq!(controller.open_remote_transaction(), Some(transaction));

    assert!(controller.abort_remote(transaction));
    assert_eq!(controller.chain_depth(), 0);
}

#[test]
fn second_remote_chain_is_refused() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, false));
    controller.create_remote_chain(TransactionId::new()).unwrap();

    let err = controller.create_remote_chain(TransactionId::new()).unwrap_err();
    assert_eq!(
        err,
        ControllerError::Invariant(InvariantViolation::ChainStackOccupied { depth: 1 })
    );
}

#[test]
fn aborted_chain_frees_the_stack() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, false));
    let first = TransactionId::new();
    controller.create_remote_chain(first).unwrap();
    assert!(controller.abort_remote(first));

    let second = controller.create_remote_chain(TransactionId::new()).unwrap();
    assert_eq!(second, RemoteChainId::new(2));
}

#[test]
fn stale_abort_is_ignored() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, false));
    let open = TransactionId::new();
    controller.create_remote_chain(open).unwrap();

    assert!(!controller.abort_remote(TransactionId::new()));
    assert_eq!(controller.open_remote_transaction(), Some(open));
    assert!(controller.abort_remote(open));
    assert!(!controller.abort_remote(open));
}

#[test]
fn apply_for_another_transaction_is_fatal() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, false));
    let open = TransactionId::new();
    let requested = TransactionId::new();
    controller.create_remote_chain(open).unwrap();

    let err = controller.apply_remote(requested).unwrap_err();
    assert_eq!(
        err,
        ControllerError::Invariant(InvariantViolation::TransactionMismatch { open, requested })
    );
    assert!(err.is_fatal());
}

#[test]
fn append_without_chain_is_fatal() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, false));
    let transaction = TransactionId::new();
    let foreign = Interaction::use_at(LEVER, Direction::East, ControllerId::new()).mirrored();

    let err = controller
        .append_remote_interaction(transaction, foreign)
        .unwrap_err();
    assert_eq!(
        err,
        ControllerError::Invariant(InvariantViolation::NoRemoteChain { transaction })
    );
}

#[test]
fn loopback_interaction_is_rejected_softly() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, false));
    let transaction = TransactionId::new();
    controller.create_remote_chain(transaction).unwrap();

    let own = Interaction::use_at(LEVER, Direction::East, controller.id()).mirrored();
    let err = controller
        .append_remote_interaction(transaction, own)
        .unwrap_err();
    assert!(matches!(
        err,
        ControllerError::RemoteInteractionRejected {
            reason: RejectReason::Loopback,
            ..
        }
    ));
    assert!(!err.is_fatal());
    assert_eq!(controller.open_remote_transaction(), Some(transaction));
}

#[test]
fn unhandled_remote_interaction_leaves_chain_clean() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, false));
    let transaction = TransactionId::new();
    controller.create_remote_chain(transaction).unwrap();

    let nothing_there = Interaction::use_at(Position::new(2, 0), Direction::East, ControllerId::new()).mirrored();
    let err = controller
        .append_remote_interaction(transaction, nothing_there)
        .unwrap_err();
    assert!(matches!(
        err,
        ControllerError::RemoteInteractionRejected {
            reason: RejectReason::NotHandled,
            ..
        }
    ));
    assert_eq!(controller.apply_remote(transaction).unwrap(), 0);
    assert!(controller.pending_updates().is_empty());
}

#[test]
fn applied_remote_chain_waits_for_drain() {
    let mut controller = GameController::new(lever_corridor(PlayerSlot::One, false));
    let transaction = TransactionId::new();
    controller.create_remote_chain(transaction).unwrap();

    let lever = Interaction::use_at(LEVER, Direction::East, ControllerId::new()).mirrored();
    let follow_ups = controller
        .append_remote_interaction(transaction, lever)
        .unwrap();
    assert!(follow_ups.is_empty());
    assert!(!door_is_open(&controller));

    assert_eq!(controller.apply_remote(transaction).unwrap(), 5);
    assert_eq!(controller.chain_depth(), 0);
    assert!(!door_is_open(&controller));

    controller.apply_pending().unwrap();
    assert!(door_is_open(&controller));
}

// =============================================================================
// Two controllers
// =============================================================================

#[test]
fn lever_opens_both_doors() {
    let (one, two) = linked_pair(
        lever_corridor(PlayerSlot::One, true),
        lever_corridor(PlayerSlot::Two, false),
    );

    let outcome = {
        let mut one = one.lock().unwrap();
        let origin = one.id();
        one.trigger_action(pull_lever(origin)).unwrap()
    };
    assert!(outcome.is_committed());

    let mut one = one.lock().unwrap();
    let mut two = two.lock().unwrap();
    assert_eq!(two.chain_depth(), 0);
    assert_eq!(two.pending_updates().len(), 5);

    one.apply_pending().unwrap();
    two.apply_pending().unwrap();
    assert!(door_is_open(&one));
    assert!(door_is_open(&two));
}

#[test]
fn gem_travels_through_portal() {
    let pad = Position::new(1, 1);
    let mut first = open_map(3, 3);
    place_all(
        &mut first,
        [
            (pad, TileContent::portal(PlayerSlot::One, pad)),
            (pad, TileContent::player(PlayerSlot::One)),
        ],
    );
    first.set_inventory(Some(ItemKind::Gem));

    let mut second = Map::filled(3, 3, PlayerSlot::Two).unwrap();
    place_all(&mut second, [(pad, TileContent::portal(PlayerSlot::Two, pad))]);

    let (one, two) = linked_pair(first, second);
    let outcome = {
        let mut one = one.lock().unwrap();
        let origin = one.id();
        one.trigger_action(Interaction::use_at(pad, Direction::North, origin))
            .unwrap()
    };
    assert!(matches!(
        outcome,
        Outcome::Committed {
            handler: ContentTag::Portal,
            transaction: Some(_),
            ..
        }
    ));

    let mut one = one.lock().unwrap();
    let mut two = two.lock().unwrap();
    one.apply_pending().unwrap();
    two.apply_pending().unwrap();

    assert_eq!(one.live_map().inventory(), None);
    assert_eq!(
        tags_at(two.live_map(), pad),
        vec![ContentTag::Ground, ContentTag::Portal, ContentTag::Item]
    );
    let arrived = two.live_map().tile(pad).unwrap().get(2).unwrap().clone();
    assert_eq!(arrived, TileContent::item(PlayerSlot::Two, ItemKind::Gem));
}

#[test]
fn empty_handed_portal_use_is_not_mirrored() {
    let pad = Position::new(1, 1);
    let mut first = open_map(3, 3);
    place_all(
        &mut first,
        [
            (pad, TileContent::portal(PlayerSlot::One, pad)),
            (pad, TileContent::player(PlayerSlot::One)),
        ],
    );
    let second = Map::filled(3, 3, PlayerSlot::Two).unwrap();

    let (one, two) = linked_pair(first, second);
    let mut one = one.lock().unwrap();
    let origin = one.id();
    // The portal declines, so the player forwards the use to the empty tile north.
    let outcome = one
        .trigger_action(Interaction::use_at(pad, Direction::North, origin))
        .unwrap();
    assert_eq!(outcome, Outcome::NotHandled);
    assert_eq!(two.lock().unwrap().chain_depth(), 0);
}
