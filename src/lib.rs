//! frameflow
//!
//! Per-frame scheduler for batched asynchronous work units.
//!
//! Real-time hosts (render loops, simulations, interactive tools) often run
//! many independent, stateful units whose expensive computation happens off
//! the main path every frame. frameflow batch-issues that work, guarantees
//! completion before dependent consumption, and finalizes results at one of
//! two per-frame phases according to each unit's [`Cadence`]:
//! default-cadence results are consumed at the start of the *next* frame,
//! immediate-cadence results before the current frame ends.
//!
//! The scheduler never owns units. Registration stores a non-owning
//! reference, so creators control unit lifetimes and dropped units are
//! pruned instead of called.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use frameflow::{Cadence, FrameScheduler, WorkUnit};
//!
//! struct Blur; // does its own staging and bookkeeping
//!
//! impl WorkUnit for Blur {
//!     fn cadence(&self) -> Cadence {
//!         Cadence::Default
//!     }
//!     fn prepare_schedule(&self) {}
//!     fn schedule(&self) {}
//!     fn complete(&self) {}
//!     fn apply_data(&self) {}
//!     fn force_immediate_update(&self) {}
//! }
//!
//! let scheduler = FrameScheduler::new();
//! let unit: Arc<dyn WorkUnit> = Arc::new(Blur);
//! scheduler.add(&unit);
//!
//! // Host loop, once per frame:
//! scheduler.run_early_phase();
//! // ... frame work that reads applied results ...
//! scheduler.run_late_phase();
//! ```

#![doc(html_root_url = "https://docs.rs/frameflow")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod bridge;
pub mod dispatch;
pub mod job;
pub mod registry;
pub mod scheduler;
pub mod unit;

// Utility modules
pub mod util;

// Re-exports
pub use bridge::{BridgeError, MirrorBridge, NoMirror};
pub use dispatch::{EagerDispatch, JobDispatcher};
pub use job::{spawn_job, JobHandle};
pub use registry::UnitRegistry;
pub use scheduler::{
    default_scheduler, teardown_default_scheduler, FrameScheduler, FrameStats,
    SchedulerConfig, DEFAULT_SCHEDULER_NAME,
};
pub use unit::{Cadence, WorkUnit};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "frameflow";
