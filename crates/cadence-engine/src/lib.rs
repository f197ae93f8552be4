//! Cadence Engine -- fixed-timestep driver and host utilities for lifecycle
//! coordinators.
//!
//! This crate builds on [`cadence_core`] to provide what a host application
//! needs around a [`Coordinator`](cadence_core::coordinator::Coordinator):
//!
//! - [`tick::TickLoop`] -- owns the coordinator and host state, converts frame
//!   time into fixed steps.
//! - [`params`] -- immutable tunable-parameter records loaded from JSON.
//! - [`snapshot`] -- hashed snapshots for determinism checks and rewind.
//! - [`logging`] -- `tracing` subscriber setup.
//!
//! # Quick Start
//!
//! ```
//! use cadence_engine::prelude::*;
//!
//! let counter = Shared::new(0u32);
//! let deps = Dependencies::new().with(counter.clone());
//!
//! let coordinator = CoordinatorBuilder::<()>::new()
//!     .with_module("increment", |deps| {
//!         let counter = deps.require_cloned::<Shared<u32>>()?;
//!         Ok(from_fn(move |_: &TickContext, _: &mut ()| {
//!             counter.set(counter.get() + 1);
//!             Ok(())
//!         }))
//!     })
//!     .build(&deps)
//!     .unwrap();
//!
//! let mut tick_loop = TickLoop::new(coordinator, (), TickConfig::default()).unwrap();
//! tick_loop.start().unwrap();
//! tick_loop.run_ticks(100).unwrap();
//! assert_eq!(counter.get(), 100);
//! ```

#![deny(unsafe_code)]

pub mod logging;
pub mod params;
pub mod snapshot;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use cadence_core;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the core prelude.
    pub use cadence_core::prelude::*;

    // Engine-specific exports.
    pub use crate::logging::init_tracing;
    pub use crate::params::{load_params_file, load_params_str, ParamsError, ParamsRecord};
    pub use crate::snapshot::LifecycleSnapshot;
    pub use crate::tick::{TickConfig, TickError, TickLoop};
}
