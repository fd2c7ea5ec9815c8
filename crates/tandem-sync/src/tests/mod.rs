//! Two-peer session tests over the in-memory transport.

mod helpers;

pub use helpers::*;
