//! Scenario and property tests for the interaction pipeline.
//!
//! # Test Structure
//!
//! - `helpers.rs`: Map builders and a scripted remote peer
//! - `scenarios.rs`: End-to-end local actions through the controller
//! - `remote_chains.rs`: Remote transactions, chain-stack invariants and two
//!   controllers wired back to back
//! - `properties.rs`: Property tests over generated maps

mod helpers;
mod properties;
mod remote_chains;

pub use helpers::*;
