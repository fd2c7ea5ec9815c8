//! Isolated map copies for speculative validation.
//!
//! A [`Snapshot`] is a deep clone of a [`Map`] tagged [`MapKind::Snapshot`].
//! Interaction chains validate and apply updates against their snapshot; the
//! live map only changes when the controller drains committed updates into it.
//!
//! Two rules differ on snapshots:
//! - level completion never fires (the goal is only *marked* as reached)
//! - effect updates are never recorded
//!
//! [`MapKind::Snapshot`]: crate::map::MapKind::Snapshot

use std::ops::Deref;

use crate::map::Map;
use crate::update::{GameStateUpdate, UpdateError};

/// A private, mutable copy of a map.
///
/// Dereferences to [`Map`] for reads. Writes go through [`Snapshot::apply`] so
/// that a snapshot only ever changes by the same updates the live map will
/// later receive.
///
/// # Example
///
/// ```
/// use tandem_core::content::PlayerSlot;
/// use tandem_core::map::Map;
/// use tandem_core::snapshot::Snapshot;
///
/// let live = Map::filled(3, 3, PlayerSlot::One).unwrap();
/// let snapshot = Snapshot::of(&live);
///
/// assert!(snapshot.is_snapshot());
/// assert!(!live.is_snapshot());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    map: Map,
}

impl Snapshot {
    /// Deep-copies a live map.
    #[must_use]
    pub fn of(live: &Map) -> Self {
        Self {
            map: live.clone_as_snapshot(),
        }
    }

    /// Deep-copies another snapshot, for a nested chain.
    #[must_use]
    pub fn derive(&self) -> Self {
        self.clone()
    }

    /// Applies an update to this snapshot only.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError`] if the update does not fit the snapshot.
    pub fn apply(&mut self, update: &GameStateUpdate) -> Result<(), UpdateError> {
        update.apply(&mut self.map)
    }

    /// Unwraps the copied map.
    #[must_use]
    pub fn into_map(self) -> Map {
        self.map
    }
}

impl Deref for Snapshot {
    type Target = Map;

    fn deref(&self) -> &Map {
        &self.map
    }
}
