//! Snapshot jobs.
//!
//! This module runs the configured sources in order and hands the
//! combined records to the snapshot writer.

pub mod aggregator;

pub use aggregator::*;
