//! Snapshot output.

pub mod snapshot;

pub use snapshot::*;
