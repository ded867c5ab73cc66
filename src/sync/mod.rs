//! CLOCKWAVE estimation layer.
//!
//! - **Offset handoff**: [`OffsetStore`], the only state shared between the
//!   background worker and foreground callers
//! - **Wave protocol**: [`Wave`], per-wave estimate collection and
//!   minimum-uncertainty aggregation
//! - **Scheduling**: [`Scheduler`], the cooperative reactor driving
//!   periodic waves
//! - **Recovery**: [`RecoveryWatcher`], store invalidation on reconnection
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ClockTracker (foreground callers)           │
//! ├──────────────────────────────────────────────┤
//! │  OffsetStore  ◄─ publish ─  Scheduler/Wave   │  ← this module
//! │       ▲                        (worker task) │
//! │   invalidate ─ RecoveryWatcher               │
//! ├──────────────────────────────────────────────┤
//! │  Transport (probe datagrams, lifecycle)      │
//! └──────────────────────────────────────────────┘
//! ```

mod recovery;
mod scheduler;
mod store;
mod wave;

pub use recovery::RecoveryWatcher;
pub use scheduler::Scheduler;
pub use store::{ClockOffset, OffsetStore};
pub use wave::{Estimate, TimedSample, Wave};
