//! High-level API for tracking a remote producer's clock.

mod tracker;

pub use tracker::ClockTracker;
