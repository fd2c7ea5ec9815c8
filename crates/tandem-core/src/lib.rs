//! # Tandem Core
//!
//! Tile interaction and speculative state-update engine for Tandem, a
//! two-player puzzle game where each peer owns half of the world.
//!
//! This crate provides the single-peer half of the engine: the grid model,
//! the content behaviors, and the controller that validates every action
//! against a private snapshot before anything reaches the live map.
//!
//! ## Architecture
//!
//! - **Grid**: [`map::Map`] of [`tile::Tile`]s, each an ordered stack of
//!   [`content::TileContent`]
//! - **Interactions**: immutable [`interaction::Interaction`] requests
//! - **Chains**: [`chain::InteractionChain`] transactions over a
//!   [`snapshot::Snapshot`], producing [`update::GameStateUpdate`]s
//! - **Stabilization**: [`stabilize::stabilize`] resolves cascades to a fixed
//!   point
//! - **Controller**: [`controller::GameController`] runs the pipeline and
//!   mirrors shared actions through the [`remote::RemotePeer`] seam
//!
//! ## Usage
//!
//! ```
//! use tandem_core::content::{ContentRegistry, PlayerSlot};
//! use tandem_core::controller::GameController;
//! use tandem_core::interaction::Interaction;
//! use tandem_core::map::Map;
//! use tandem_core::position::{Direction, Position};
//!
//! let registry = ContentRegistry::standard();
//! let ground = vec![ContentRegistry::GROUND; 9];
//! let mut actors = vec![ContentRegistry::EMPTY; 9];
//! actors[4] = ContentRegistry::PLAYER_ONE;
//!
//! let live = Map::from_layers(3, 3, PlayerSlot::One, &[ground, actors], &registry).unwrap();
//! let mut controller = GameController::new(live);
//!
//! let step = Interaction::step(Position::new(1, 1), Direction::West, controller.id());
//! assert!(controller.trigger_action(step).unwrap().is_committed());
//! assert_eq!(controller.apply_pending().unwrap(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chain;
pub mod content;
pub mod controller;
pub mod interaction;
pub mod map;
pub mod position;
pub mod remote;
pub mod snapshot;
pub mod stabilize;
pub mod tile;
pub mod update;

pub use chain::{ChainError, ChainOrigin, InteractionChain};
pub use controller::{ControllerConfig, ControllerError, GameController, InvariantViolation, Outcome};
pub use interaction::{ActionKind, ControllerId, Interaction};
pub use map::{Map, MapError};
pub use remote::{RemoteChainId, RemoteError, RemotePeer, TransactionId};
pub use update::{GameStateUpdate, UpdateError};

#[cfg(test)]
mod tests;
