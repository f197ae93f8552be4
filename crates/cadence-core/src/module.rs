//! The module capability: a unit of behavior with an explicit lifecycle.
//!
//! A [`Module`] is constructed with its dependencies already resolved, then
//! initialized once, then updated once per tick. The coordinator tracks
//! whether each module has been initialized; module code never has to guard
//! against being updated early.

use crate::ModuleError;

// ---------------------------------------------------------------------------
// TickContext
// ---------------------------------------------------------------------------

/// Per-tick context shared by every module update within one tick.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TickContext {
    /// Zero-based index of the tick being executed.
    pub tick: u64,
    /// Duration of this tick in seconds.
    pub dt: f64,
    /// Simulation time in seconds at the start of this tick.
    pub sim_time: f64,
}

impl TickContext {
    /// Build the context for tick `tick` of a fixed `dt` simulation.
    ///
    /// `sim_time` is computed as `tick * dt` rather than accumulated, so it
    /// does not drift.
    pub fn new(tick: u64, dt: f64) -> Self {
        Self {
            tick,
            dt,
            sim_time: tick as f64 * dt,
        }
    }
}

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// An independently initialized and updated unit of behavior.
///
/// `S` is the host-owned state passed to every hook. Dependencies that are
/// not part of `S` (parameter records, capability handles) are injected into
/// the module's constructor and held as fields.
pub trait Module<S> {
    /// One-time setup. Called exactly once, before the first update.
    fn initialize(&mut self, _state: &mut S) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Advance this module by one tick.
    fn update(&mut self, tick: &TickContext, state: &mut S) -> Result<(), ModuleError>;

    /// Release hook, called once when the owning coordinator is torn down.
    /// Only modules that were initialized receive this call.
    fn teardown(&mut self) {}
}

impl<S, M: Module<S> + ?Sized> Module<S> for Box<M> {
    fn initialize(&mut self, state: &mut S) -> Result<(), ModuleError> {
        (**self).initialize(state)
    }

    fn update(&mut self, tick: &TickContext, state: &mut S) -> Result<(), ModuleError> {
        (**self).update(tick, state)
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}

// ---------------------------------------------------------------------------
// FnModule
// ---------------------------------------------------------------------------

/// A module made from an update closure, with no setup or teardown.
///
/// Built with [`from_fn`].
pub struct FnModule<F> {
    update: F,
}

impl<F> std::fmt::Debug for FnModule<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModule").finish_non_exhaustive()
    }
}

/// Wrap an update closure as a [`Module`].
pub fn from_fn<S, F>(update: F) -> FnModule<F>
where
    F: FnMut(&TickContext, &mut S) -> Result<(), ModuleError>,
{
    FnModule { update }
}

impl<S, F> Module<S> for FnModule<F>
where
    F: FnMut(&TickContext, &mut S) -> Result<(), ModuleError>,
{
    fn update(&mut self, tick: &TickContext, state: &mut S) -> Result<(), ModuleError> {
        (self.update)(tick, state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
