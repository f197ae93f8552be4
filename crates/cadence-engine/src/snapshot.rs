//! Lifecycle snapshots with BLAKE3 hashing.
//!
//! Provides [`LifecycleSnapshot`] -- a serializable record of a tick loop's
//! host state, tick counter, fixed dt, lifecycle state and module sequence,
//! with a BLAKE3 content hash for integrity checks and determinism testing.
//!
//! # Usage
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
//! let mut tick_loop = TickLoop::new(coordinator, 0u64, TickConfig::default()).unwrap();
//! tick_loop.start().unwrap();
//! tick_loop.run_ticks(10).unwrap();
//!
//! let snapshot = tick_loop.capture_snapshot().unwrap();
//! assert_eq!(snapshot.tick_counter, 10);
//! assert_eq!(snapshot.hash.len(), 64); // BLAKE3 hex digest
//!
//! tick_loop.run_ticks(5).unwrap();
//! tick_loop.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(tick_loop.tick_count(), 10);
//! assert_eq!(*tick_loop.state(), 10);
//! ```
//!
//! # What Is NOT Serialized
//!
//! - **Modules** -- module values are behavior plus private per-tick state
//!   and are not serializable. Restoring keeps the running coordinator's
//!   modules; only host state and tick metadata are replaced.
//! - **Injected dependencies** -- owned by the host, not by the loop.
//! - **Diagnostics and pending frame time** -- transient.

use cadence_core::coordinator::LifecycleState;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::tick::TickLoop;

// ---------------------------------------------------------------------------
// LifecycleSnapshot
// ---------------------------------------------------------------------------

/// A serializable snapshot of a tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleSnapshot<S> {
    /// Lifecycle state at capture time.
    pub lifecycle: LifecycleState,
    /// Module names in execution order.
    pub module_names: Vec<String>,
    /// Number of ticks executed at capture time.
    pub tick_counter: u64,
    /// Fixed time step in seconds per tick.
    pub fixed_dt: f64,
    /// Host state.
    pub state: S,
    /// BLAKE3 hex digest (64 lowercase hex chars) of every other field.
    pub hash: String,
}

impl<S: Serialize> LifecycleSnapshot<S> {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, anyhow::Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Recompute the hash from the snapshot's data.
    pub fn recompute_hash(&self) -> Result<String, anyhow::Error> {
        compute_hash(
            self.lifecycle,
            &self.module_names,
            self.tick_counter,
            self.fixed_dt,
            &self.state,
        )
    }

    /// Whether the stored hash matches the snapshot's data.
    pub fn verify(&self) -> Result<bool, anyhow::Error> {
        Ok(self.recompute_hash()? == self.hash)
    }
}

impl<S: DeserializeOwned> LifecycleSnapshot<S> {
    /// Parse a snapshot from JSON. The hash is not verified here.
    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

/// Compute the BLAKE3 hex digest of the hashable snapshot fields.
///
/// The hash field itself is NOT included (it is derived).
fn compute_hash<S: Serialize>(
    lifecycle: LifecycleState,
    module_names: &[String],
    tick_counter: u64,
    fixed_dt: f64,
    state: &S,
) -> Result<String, anyhow::Error> {
    #[derive(Serialize)]
    struct HashableState<'a, S> {
        lifecycle: LifecycleState,
        module_names: &'a [String],
        tick_counter: u64,
        fixed_dt: f64,
        state: &'a S,
    }

    let hashable = HashableState {
        lifecycle,
        module_names,
        tick_counter,
        fixed_dt,
        state,
    };

    let json_bytes = serde_json::to_vec(&hashable)?;
    Ok(blake3::hash(&json_bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// TickLoop snapshot/restore methods
// ---------------------------------------------------------------------------

impl<S: Serialize + Clone + 'static> TickLoop<S> {
    fn owned_module_names(&self) -> Vec<String> {
        self.coordinator()
            .module_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Capture a snapshot of the host state and tick metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the host state cannot be serialized to JSON.
    pub fn capture_snapshot(&self) -> Result<LifecycleSnapshot<S>, anyhow::Error> {
        let lifecycle = self.lifecycle();
        let module_names = self.owned_module_names();
        let tick_counter = self.tick_count();
        let fixed_dt = self.fixed_dt();
        let state = self.state().clone();

        let hash = compute_hash(lifecycle, &module_names, tick_counter, fixed_dt, &state)?;

        Ok(LifecycleSnapshot {
            lifecycle,
            module_names,
            tick_counter,
            fixed_dt,
            state,
            hash,
        })
    }

    /// Compute the BLAKE3 state hash without cloning the host state.
    pub fn state_hash(&self) -> Result<String, anyhow::Error> {
        compute_hash(
            self.lifecycle(),
            &self.owned_module_names(),
            self.tick_count(),
            self.fixed_dt(),
            self.state(),
        )
    }

    /// Restore host state and tick metadata from a snapshot.
    ///
    /// The snapshot is validated before anything is modified:
    /// - its hash must match its data,
    /// - its `fixed_dt` must be positive and finite,
    /// - its module sequence must equal this loop's module sequence,
    /// - this loop must not be torn down,
    /// - its lifecycle state must equal this loop's lifecycle state.
    ///
    /// Modules are kept as they are; only the host state, tick counter and
    /// fixed dt are replaced, and pending frame time is discarded.
    pub fn restore_from_snapshot(
        &mut self,
        snapshot: &LifecycleSnapshot<S>,
    ) -> Result<(), anyhow::Error> {
        if !(snapshot.fixed_dt > 0.0 && snapshot.fixed_dt.is_finite()) {
            return Err(anyhow::anyhow!(
                "snapshot has invalid fixed_dt: {}. Must be positive and finite.",
                snapshot.fixed_dt
            ));
        }

        let expected_hash = snapshot.recompute_hash()?;
        if expected_hash != snapshot.hash {
            return Err(anyhow::anyhow!(
                "snapshot hash mismatch: recorded {} but recomputed {}. \
                 The snapshot may be corrupted or tampered with.",
                snapshot.hash,
                expected_hash
            ));
        }

        if self.lifecycle() == LifecycleState::TornDown {
            return Err(anyhow::anyhow!(
                "cannot restore into a torn-down tick loop"
            ));
        }

        if snapshot.lifecycle != self.lifecycle() {
            return Err(anyhow::anyhow!(
                "snapshot was captured in lifecycle state {:?} but the loop is {:?}",
                snapshot.lifecycle,
                self.lifecycle()
            ));
        }

        let running = self.owned_module_names();
        if running != snapshot.module_names {
            return Err(anyhow::anyhow!(
                "snapshot module sequence {:?} does not match running sequence {:?}",
                snapshot.module_names,
                running
            ));
        }

        self.restore_parts(snapshot.state.clone(), snapshot.tick_counter, snapshot.fixed_dt);
        tracing::debug!(tick = snapshot.tick_counter, "tick loop restored from snapshot");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
