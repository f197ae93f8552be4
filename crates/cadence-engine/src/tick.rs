//! Fixed-timestep tick driver for a lifecycle coordinator.
//!
//! The [`TickLoop`] owns a [`Coordinator`] and the host state its modules
//! operate on. Each tick:
//!
//! 1. Every module updates in declaration order with a [`TickContext`]
//!    describing this step.
//! 2. If the whole tick succeeded, the tick counter advances.
//!
//! The host's per-frame callback feeds wall-clock time into
//! [`TickLoop::advance`], which converts it into whole fixed steps. Simulation
//! time is always `tick_count * fixed_dt`, never accumulated, so identical
//! inputs produce identical results.
//!
//! # Example
//!
//! ```
//! use cadence_engine::prelude::*;
//!
//! let coordinator = CoordinatorBuilder::<u64>::new()
//!     .with_instance("count", from_fn(|_: &TickContext, n: &mut u64| {
//!         *n += 1;
//!         Ok(())
//!     }))
//!     .build(&Dependencies::new())
//!     .unwrap();
//!
//! let config = TickConfig { fixed_dt: 1.0 / 60.0, ..Default::default() };
//! let mut tick_loop = TickLoop::new(coordinator, 0u64, config).unwrap();
//! tick_loop.start().unwrap();
//! tick_loop.run_ticks(10).unwrap();
//!
//! assert_eq!(tick_loop.tick_count(), 10);
//! assert_eq!(*tick_loop.state(), 10);
//! ```

use std::time::Duration;

use cadence_core::coordinator::{Coordinator, LifecycleState};
use cadence_core::module::TickContext;
use cadence_core::LifecycleError;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Upper bound on ticks run by one [`TickLoop::advance`] call. Elapsed
    /// time beyond this is dropped.
    pub max_steps_per_frame: u32,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick), at most 8 catch-up steps.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_steps_per_frame: 8,
        }
    }
}

impl TickConfig {
    /// Check the configuration invariants.
    pub fn validate(&self) -> Result<(), TickError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(TickError::InvalidConfig(format!(
                "fixed_dt must be positive and finite, got {}",
                self.fixed_dt
            )));
        }
        if self.max_steps_per_frame == 0 {
            return Err(TickError::InvalidConfig(
                "max_steps_per_frame must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TickError
// ---------------------------------------------------------------------------

/// Errors produced by the tick loop.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The [`TickConfig`] violates an invariant.
    #[error("invalid tick config: {0}")]
    InvalidConfig(String),

    /// A lifecycle call on the underlying coordinator failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// Drives a [`Coordinator`] at a fixed time step.
///
/// # Determinism Guarantee
///
/// Given the same initial host state, the same module sequence, and the same
/// sequence of `tick`/`advance` calls, the loop produces identical state. This
/// holds because:
///
/// - module order is fixed at construction,
/// - every update receives a [`TickContext`] computed from the tick counter,
/// - `advance` only ever runs whole `fixed_dt` steps.
pub struct TickLoop<S: 'static> {
    coordinator: Coordinator<S>,
    state: S,
    config: TickConfig,
    tick_counter: u64,
    /// Wall-clock time not yet consumed by a fixed step.
    accumulator: f64,
}

impl<S: 'static> TickLoop<S> {
    /// Create a tick loop around a constructed coordinator.
    ///
    /// The tick counter starts at 0 and simulation time at 0.0.
    pub fn new(coordinator: Coordinator<S>, state: S, config: TickConfig) -> Result<Self, TickError> {
        config.validate()?;
        Ok(Self {
            coordinator,
            state,
            config,
            tick_counter: 0,
            accumulator: 0.0,
        })
    }

    /// Initialize every module. Must be called once before ticking.
    pub fn start(&mut self) -> Result<(), TickError> {
        self.coordinator.initialize_all(&mut self.state)?;
        tracing::info!(fixed_dt = self.config.fixed_dt, "tick loop started");
        Ok(())
    }

    /// Execute one simulation tick.
    ///
    /// The tick counter only advances when every module updated successfully.
    pub fn tick(&mut self) -> Result<(), TickError> {
        let ctx = TickContext::new(self.tick_counter, self.config.fixed_dt);
        self.coordinator.update_all(&ctx, &mut self.state)?;
        self.tick_counter += 1;
        Ok(())
    }

    /// Run `count` ticks in sequence, stopping at the first error.
    pub fn run_ticks(&mut self, count: u64) -> Result<(), TickError> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    /// Feed elapsed wall-clock time from the host frame callback.
    ///
    /// Runs as many whole fixed steps as the accumulated time allows, capped
    /// at `max_steps_per_frame`. Returns the number of ticks executed.
    pub fn advance(&mut self, elapsed: Duration) -> Result<u32, TickError> {
        // Reject before banking any time.
        match self.coordinator.state() {
            LifecycleState::Initialized => {}
            LifecycleState::Constructed => return Err(LifecycleError::NotInitialized.into()),
            LifecycleState::TornDown => return Err(LifecycleError::TornDown.into()),
        }

        self.accumulator += elapsed.as_secs_f64();
        let mut steps = 0u32;
        while self.accumulator >= self.config.fixed_dt {
            if steps == self.config.max_steps_per_frame {
                let dropped = self.accumulator;
                self.accumulator %= self.config.fixed_dt;
                tracing::warn!(
                    steps,
                    dropped_secs = dropped - self.accumulator,
                    "tick loop falling behind; dropping elapsed time"
                );
                break;
            }
            self.tick()?;
            self.accumulator -= self.config.fixed_dt;
            steps += 1;
        }
        Ok(steps)
    }

    /// Tear down every module.
    pub fn shutdown(&mut self) -> Result<(), TickError> {
        self.coordinator.teardown()?;
        tracing::info!(ticks = self.tick_counter, "tick loop shut down");
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid floating-point drift from
    /// repeated addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    /// Configuration used to create this tick loop.
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Wall-clock seconds banked toward the next fixed step.
    pub fn pending_time(&self) -> f64 {
        self.accumulator
    }

    /// Lifecycle state of the underlying coordinator.
    pub fn lifecycle(&self) -> LifecycleState {
        self.coordinator.state()
    }

    /// Read-only access to the host state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable access to the host state.
    ///
    /// Intended for injecting per-frame input between ticks and for setup in
    /// tests.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// The owned coordinator.
    pub fn coordinator(&self) -> &Coordinator<S> {
        &self.coordinator
    }

    /// Replace host state and tick metadata. Callers validate `fixed_dt`.
    pub(crate) fn restore_parts(&mut self, state: S, tick_counter: u64, fixed_dt: f64) {
        self.state = state;
        self.tick_counter = tick_counter;
        self.config.fixed_dt = fixed_dt;
        self.accumulator = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
