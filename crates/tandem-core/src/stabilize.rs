//! Stabilization: resolving cascades to a fixed point.
//!
//! After an interaction is handled, contents may want to react to the new
//! state (a block lands on a hole, a conveyor carries a block onward). The
//! stabilization loop gives every occupied tile a [`handle_update`] call per
//! pass, in row-major order, until a whole pass produces no map modification.
//!
//! A cascade that is still changing the map after the configured number of
//! passes is treated as a cycle and fails with
//! [`StabilizationError::CycleDetected`]. That error is fatal to the
//! controller; it means the level contains a loop of contents feeding each
//! other.

use thiserror::Error;
use tracing::{debug, error};

use crate::chain::{ChainError, InteractionChain};
use crate::content::ContentTag;
use crate::interaction::Interaction;
use crate::tile::handle_update;

/// Default pass ceiling.
pub const DEFAULT_MAX_PASSES: u32 = 25;

/// Why stabilization did not reach a fixed point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StabilizationError {
    /// The map was still changing after `passes` passes.
    #[error("map still changing after {passes} stabilization passes")]
    CycleDetected {
        /// Passes run before giving up.
        passes: u32,
    },
    /// An update produced during a pass did not apply.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Summary of a successful stabilization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilizationReport {
    /// Passes run, including the final quiet pass.
    pub passes: u32,
    /// Map modifications produced across all passes.
    pub changes: usize,
}

/// Runs stabilization passes on `chain` until the map stops changing.
///
/// # Errors
///
/// Returns [`StabilizationError::CycleDetected`] if pass `max_passes` still
/// produced changes, and [`StabilizationError::Chain`] if an update failed to
/// apply to the snapshot.
pub fn stabilize(
    chain: &mut InteractionChain,
    interaction: &Interaction,
    handler: ContentTag,
    max_passes: u32,
) -> Result<StabilizationReport, StabilizationError> {
    let mut report = StabilizationReport::default();
    for pass in 1..=max_passes {
        let positions = chain.snapshot().occupied_positions();
        let mut changes = 0;
        for position in positions {
            changes += handle_update(chain, interaction, position, handler)?;
        }
        report.passes = pass;
        report.changes += changes;
        if changes == 0 {
            debug!(passes = pass, changes = report.changes, "map stabilized");
            return Ok(report);
        }
    }
    error!(passes = max_passes, %interaction, "stabilization ceiling reached");
    Err(StabilizationError::CycleDetected { passes: max_passes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainOrigin;
    use crate::content::{PlayerSlot, TileContent};
    use crate::interaction::ControllerId;
    use crate::map::Map;
    use crate::position::{Direction, Position};
    use crate::snapshot::Snapshot;

    const ONE: PlayerSlot = PlayerSlot::One;

    fn chain_over(map: &Map) -> (InteractionChain, Interaction) {
        let interaction = Interaction::step(Position::new(0, 0), Direction::East, ControllerId::new());
        let chain = InteractionChain::new(ChainOrigin::Local, interaction.clone(), Snapshot::of(map));
        (chain, interaction)
    }

    #[test]
    fn quiet_map_takes_one_pass() {
        let map = Map::filled(3, 3, ONE).unwrap();
        let (mut chain, interaction) = chain_over(&map);
        let report = stabilize(&mut chain, &interaction, ContentTag::Player, DEFAULT_MAX_PASSES).unwrap();
        assert_eq!(report, StabilizationReport { passes: 1, changes: 0 });
        assert!(chain.updates().is_empty());
    }

    #[test]
    fn conveyor_into_hole_settles() {
        let mut map = Map::filled(3, 1, ONE).unwrap();
        map.place(Position::new(0, 0), TileContent::conveyor(ONE, Direction::East)).unwrap();
        map.place(Position::new(0, 0), TileContent::block(ONE, None)).unwrap();
        map.place(Position::new(1, 0), TileContent::hole(ONE)).unwrap();
        let (mut chain, interaction) = chain_over(&map);

        let report = stabilize(&mut chain, &interaction, ContentTag::Player, DEFAULT_MAX_PASSES).unwrap();
        // Move, then two removals in the same pass, then a quiet pass.
        assert_eq!(report.changes, 3);
        assert_eq!(report.passes, 2);
        assert_eq!(chain.snapshot().tile(Position::new(1, 0)).unwrap().len(), 1);
    }

    #[test]
    fn facing_conveyors_hit_the_ceiling() {
        let mut map = Map::filled(2, 1, ONE).unwrap();
        map.place(Position::new(0, 0), TileContent::conveyor(ONE, Direction::East)).unwrap();
        map.place(Position::new(1, 0), TileContent::conveyor(ONE, Direction::West)).unwrap();
        map.place(Position::new(0, 0), TileContent::block(ONE, None)).unwrap();
        let (mut chain, interaction) = chain_over(&map);

        let err = stabilize(&mut chain, &interaction, ContentTag::Player, 7).unwrap_err();
        assert_eq!(err, StabilizationError::CycleDetected { passes: 7 });
    }

    #[test]
    fn fixed_point_is_idempotent() {
        let mut map = Map::filled(3, 1, ONE).unwrap();
        map.place(Position::new(0, 0), TileContent::conveyor(ONE, Direction::East)).unwrap();
        map.place(Position::new(0, 0), TileContent::block(ONE, None)).unwrap();
        let (mut chain, interaction) = chain_over(&map);

        stabilize(&mut chain, &interaction, ContentTag::Player, DEFAULT_MAX_PASSES).unwrap();
        let settled = chain.snapshot().clone();
        let logged = chain.updates().len();

        let again = stabilize(&mut chain, &interaction, ContentTag::Player, DEFAULT_MAX_PASSES).unwrap();
        assert_eq!(again, StabilizationReport { passes: 1, changes: 0 });
        assert_eq!(chain.snapshot(), &settled);
        assert_eq!(chain.updates().len(), logged);
    }
}
