//! Property tests over randomly generated levels.

use proptest::prelude::*;

use crate::content::{ContentTag, ItemKind, PlayerSlot, TileContent};
use crate::controller::{ControllerConfig, ControllerError, GameController, Outcome};
use crate::interaction::Interaction;
use crate::map::Map;
use crate::position::{Direction, Position};
use crate::stabilize::StabilizationError;

use super::helpers::{map_with_player, place_all, tags_at};

const ONE: PlayerSlot = PlayerSlot::One;
const SIZE: i32 = 5;

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::North),
        Just(Direction::East),
        Just(Direction::South),
        Just(Direction::West),
    ]
}

fn position() -> impl Strategy<Value = Position> {
    (0..SIZE, 0..SIZE).prop_map(|(x, y)| Position::new(x, y))
}

/// Contents that never react during stabilization.
fn inert_content() -> impl Strategy<Value = TileContent> {
    prop_oneof![
        Just(TileContent::goal(ONE)),
        Just(TileContent::item(ONE, ItemKind::Key)),
        Just(TileContent::item(ONE, ItemKind::Orb)),
        Just(TileContent::portal(ONE, Position::new(0, 0))),
    ]
}

#[allow(clippy::cast_sign_loss)]
fn grid() -> u32 {
    SIZE as u32
}

proptest! {
    #[test]
    fn blocked_step_changes_nothing(
        player in position(),
        facing in direction(),
    ) {
        let mut map = map_with_player(grid(), grid(), ONE, player);
        let target = player.step(facing);
        if map.contains(target) {
            place_all(&mut map, [(target, TileContent::wall(ONE))]);
        }
        let mut controller = GameController::new(map);
        let before = controller.live_map().clone();

        let outcome = controller
            .trigger_action(Interaction::step(player, facing, controller.id()))
            .unwrap();
        prop_assert_eq!(outcome, Outcome::NotHandled);
        prop_assert!(controller.pending_updates().is_empty());
        prop_assert_eq!(controller.live_map(), &before);
    }

    #[test]
    fn step_keeps_stack_order(
        player in position(),
        facing in direction(),
        underfoot in proptest::collection::vec(inert_content(), 0..3),
        ahead in proptest::collection::vec(inert_content(), 0..3),
    ) {
        let target = player.step(facing);
        let mut map = Map::filled(grid(), grid(), ONE).unwrap();
        prop_assume!(map.contains(target));

        place_all(&mut map, underfoot.iter().cloned().map(|content| (player, content)));
        place_all(&mut map, [(player, TileContent::player(ONE))]);
        place_all(&mut map, ahead.iter().cloned().map(|content| (target, content)));
        let mut expected_ahead = tags_at(&map, target);
        let mut expected_behind = tags_at(&map, player);
        expected_behind.retain(|tag| *tag != ContentTag::Player);
        expected_ahead.push(ContentTag::Player);

        let mut controller = GameController::new(map);
        let outcome = controller
            .trigger_action(Interaction::step(player, facing, controller.id()))
            .unwrap();
        prop_assert!(outcome.is_committed());
        controller.apply_pending().unwrap();

        prop_assert_eq!(tags_at(controller.live_map(), target), expected_ahead);
        prop_assert_eq!(tags_at(controller.live_map(), player), expected_behind);
    }

    #[test]
    fn oscillating_belts_always_hit_the_ceiling(max_passes in 1u32..40) {
        let mut map = map_with_player(5, 1, ONE, Position::new(0, 0));
        place_all(
            &mut map,
            [
                (Position::new(1, 0), TileContent::block(ONE, None)),
                (Position::new(2, 0), TileContent::conveyor(ONE, Direction::East)),
                (Position::new(3, 0), TileContent::conveyor(ONE, Direction::West)),
            ],
        );
        let config = ControllerConfig {
            max_stabilization_passes: max_passes,
            ..ControllerConfig::default()
        };
        let mut controller = GameController::with_config(map, config);

        let err = controller
            .trigger_action(Interaction::step(Position::new(0, 0), Direction::East, controller.id()))
            .unwrap_err();
        prop_assert_eq!(
            err,
            ControllerError::Stabilization(StabilizationError::CycleDetected { passes: max_passes })
        );
        prop_assert!(controller.pending_updates().is_empty());
        prop_assert_eq!(controller.chain_depth(), 0);
    }
}
