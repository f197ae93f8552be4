//! The lifecycle coordinator: ordered construction, initialization, update
//! and teardown of a fixed sequence of modules.
//!
//! A [`CoordinatorBuilder`] collects named module factories in declaration
//! order. [`CoordinatorBuilder::build`] validates the declarations, then runs
//! each factory against a [`Dependencies`] registry. The resulting
//! [`Coordinator`] exclusively owns its modules and walks them in the same
//! order for every lifecycle phase:
//!
//! ```text
//! Constructed --initialize_all--> Initialized --teardown--> TornDown
//!      \______________________________teardown_____________/^
//! ```
//!
//! There is no way back to an earlier state. Out-of-order calls return a
//! [`LifecycleError`] and leave every module untouched.
//!
//! # Failure policy
//!
//! A module hook that returns an error halts the sequence at that module and
//! the error is propagated as [`LifecycleError::ModuleFailed`]:
//!
//! - during `initialize_all`, the coordinator tears itself down, because the
//!   modules that were already set up cannot be initialized a second time;
//! - during `update_all`, the remaining modules are skipped for this tick and
//!   the coordinator stays `Initialized`. The caller decides whether to keep
//!   ticking.

use std::time::{Duration, Instant};

use crate::dependencies::{Dependencies, Resolver};
use crate::module::{Module, TickContext};
use crate::{LifecycleError, Phase};

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// The linear lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LifecycleState {
    /// Modules are built but none has been initialized.
    Constructed,
    /// Every module has been initialized; updates are allowed.
    Initialized,
    /// All modules have been released.
    TornDown,
}

// ---------------------------------------------------------------------------
// UpdateDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last `update_all` call.
#[derive(Debug, Clone, Default)]
pub struct UpdateDiagnostics {
    /// The tick that was executed.
    pub tick: u64,
    /// Wall-clock time per module, indexed like
    /// [`Coordinator::module_names`]. On a failed tick this ends with the
    /// module that failed.
    pub module_times: Vec<Duration>,
    /// Total time for the whole call.
    pub total_time: Duration,
    /// Whether every module updated successfully.
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

type Factory<S> = Box<dyn FnOnce(&Resolver<'_>) -> Result<Box<dyn Module<S>>, LifecycleError>>;

/// A declared module that has not been constructed yet.
struct PendingModule<S: 'static> {
    name: String,
    after: Vec<String>,
    factory: Factory<S>,
}

/// Declares the ordered module sequence of a [`Coordinator`].
///
/// Declaration order is execution order. `after` constraints do not reorder
/// anything; they document and verify that a module's predecessors really are
/// declared before it.
pub struct CoordinatorBuilder<S: 'static> {
    pending: Vec<PendingModule<S>>,
}

impl<S: 'static> Default for CoordinatorBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> CoordinatorBuilder<S> {
    /// An empty builder.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Declare the next module.
    ///
    /// `factory` runs during [`build`](Self::build) and receives a
    /// [`Resolver`] scoped to `name`.
    pub fn with_module<M, F>(self, name: &str, factory: F) -> Self
    where
        M: Module<S> + 'static,
        F: FnOnce(&Resolver<'_>) -> Result<M, LifecycleError> + 'static,
    {
        self.with_module_after(name, &[], factory)
    }

    /// Declare the next module, asserting that every module in `after` is
    /// declared before it.
    pub fn with_module_after<M, F>(mut self, name: &str, after: &[&str], factory: F) -> Self
    where
        M: Module<S> + 'static,
        F: FnOnce(&Resolver<'_>) -> Result<M, LifecycleError> + 'static,
    {
        self.pending.push(PendingModule {
            name: name.to_owned(),
            after: after.iter().map(|s| s.to_string()).collect(),
            factory: Box::new(move |resolver: &Resolver<'_>| {
                factory(resolver).map(|module| Box::new(module) as Box<dyn Module<S>>)
            }),
        });
        self
    }

    /// Declare a module that is already constructed and needs no
    /// dependencies.
    pub fn with_instance<M>(self, name: &str, module: M) -> Self
    where
        M: Module<S> + 'static,
    {
        self.with_module(name, move |_| Ok(module))
    }

    /// Number of declared modules.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no module has been declared.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Check names and ordering declarations without constructing anything.
    fn validate_declarations(&self) -> Result<(), LifecycleError> {
        for (idx, declared) in self.pending.iter().enumerate() {
            let earlier = &self.pending[..idx];
            if earlier.iter().any(|p| p.name == declared.name) {
                return Err(LifecycleError::DuplicateModule {
                    name: declared.name.clone(),
                });
            }
            for dep in &declared.after {
                if !earlier.iter().any(|p| p.name == *dep) {
                    return Err(LifecycleError::UnknownPredecessor {
                        module: declared.name.clone(),
                        predecessor: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Construct every module in declaration order.
    ///
    /// Name and ordering declarations are validated before any factory runs.
    /// The first factory error aborts the build; modules constructed so far
    /// are dropped without being initialized.
    pub fn build(self, deps: &Dependencies) -> Result<Coordinator<S>, LifecycleError> {
        self.validate_declarations()?;

        let mut slots = Vec::with_capacity(self.pending.len());
        for pending in self.pending {
            let resolver = deps.resolver(&pending.name);
            let module = (pending.factory)(&resolver)?;
            tracing::debug!(module = %pending.name, "module constructed");
            slots.push(ModuleSlot {
                name: pending.name,
                after: pending.after,
                module,
                initialized: false,
            });
        }

        tracing::info!(modules = slots.len(), "coordinator constructed");
        Ok(Coordinator {
            slots,
            state: LifecycleState::Constructed,
            last_diagnostics: UpdateDiagnostics::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// A constructed module and the lifecycle bookkeeping the coordinator keeps
/// for it.
struct ModuleSlot<S: 'static> {
    name: String,
    after: Vec<String>,
    module: Box<dyn Module<S>>,
    initialized: bool,
}

/// Owns an ordered sequence of modules and drives their lifecycle.
///
/// Modules are owned exclusively and released together, either by
/// [`teardown`](Self::teardown) or when the coordinator is dropped.
pub struct Coordinator<S: 'static> {
    slots: Vec<ModuleSlot<S>>,
    state: LifecycleState,
    last_diagnostics: UpdateDiagnostics,
}

impl<S: 'static> std::fmt::Debug for Coordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state)
            .field("modules", &self.module_names())
            .finish()
    }
}

impl<S: 'static> Coordinator<S> {
    /// Initialize every module once, in declaration order.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::AlreadyInitialized`] on a second call.
    /// - [`LifecycleError::TornDown`] after teardown.
    /// - [`LifecycleError::ModuleFailed`] if a module's `initialize` fails;
    ///   the coordinator is torn down in that case.
    pub fn initialize_all(&mut self, state: &mut S) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Constructed => {}
            LifecycleState::Initialized => return Err(LifecycleError::AlreadyInitialized),
            LifecycleState::TornDown => return Err(LifecycleError::TornDown),
        }

        for idx in 0..self.slots.len() {
            let slot = &mut self.slots[idx];
            debug_assert!(!slot.initialized, "module initialized twice");
            if let Err(source) = slot.module.initialize(state) {
                let module = slot.name.clone();
                tracing::error!(module = %module, error = %source, "module failed to initialize");
                self.release();
                return Err(LifecycleError::ModuleFailed {
                    module,
                    phase: Phase::Initialize,
                    source,
                });
            }
            slot.initialized = true;
            tracing::debug!(module = %slot.name, "module initialized");
        }

        self.state = LifecycleState::Initialized;
        tracing::info!(modules = self.slots.len(), "coordinator initialized");
        Ok(())
    }

    /// Update every module once, in declaration order.
    ///
    /// Module N observes every effect module N-1 produced earlier in the same
    /// call.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::NotInitialized`] before `initialize_all`.
    /// - [`LifecycleError::TornDown`] after teardown.
    /// - [`LifecycleError::ModuleFailed`] if a module's `update` fails; the
    ///   modules after it are not updated this tick.
    pub fn update_all(&mut self, tick: &TickContext, state: &mut S) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Initialized => {}
            LifecycleState::Constructed => return Err(LifecycleError::NotInitialized),
            LifecycleState::TornDown => return Err(LifecycleError::TornDown),
        }

        let tick_start = Instant::now();
        // Reuse last tick's buffer.
        let mut module_times = std::mem::take(&mut self.last_diagnostics.module_times);
        module_times.clear();
        let mut failure = None;

        for slot in &mut self.slots {
            debug_assert!(slot.initialized, "module updated before initialization");
            tracing::trace!(module = %slot.name, tick = tick.tick, "module update");
            let module_start = Instant::now();
            let result = slot.module.update(tick, state);
            module_times.push(module_start.elapsed());
            if let Err(source) = result {
                tracing::warn!(module = %slot.name, tick = tick.tick, error = %source, "module update failed");
                failure = Some(LifecycleError::ModuleFailed {
                    module: slot.name.clone(),
                    phase: Phase::Update,
                    source,
                });
                break;
            }
        }

        self.last_diagnostics = UpdateDiagnostics {
            tick: tick.tick,
            module_times,
            total_time: tick_start.elapsed(),
            completed: failure.is_none(),
        };

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Release all modules together.
    ///
    /// Initialized modules receive their `teardown` hook in reverse
    /// declaration order, so a module is released before the modules it was
    /// declared after. Every later lifecycle call, including a second
    /// `teardown`, returns [`LifecycleError::TornDown`].
    pub fn teardown(&mut self) -> Result<(), LifecycleError> {
        if self.state == LifecycleState::TornDown {
            return Err(LifecycleError::TornDown);
        }
        self.release();
        tracing::info!("coordinator torn down");
        Ok(())
    }

    /// Run teardown hooks and drop every module.
    fn release(&mut self) {
        for slot in self.slots.iter_mut().rev() {
            if slot.initialized {
                slot.module.teardown();
                slot.initialized = false;
            }
        }
        self.slots.clear();
        self.state = LifecycleState::TornDown;
    }

    // -- accessors ----------------------------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Number of owned modules (zero after teardown).
    pub fn module_count(&self) -> usize {
        self.slots.len()
    }

    /// Module names, in execution order.
    pub fn module_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Predecessors declared for `name`, or `None` if no such module exists.
    pub fn predecessors(&self, name: &str) -> Option<&[String]> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.after.as_slice())
    }

    /// Whether module `name` has been initialized, or `None` if no such
    /// module exists.
    pub fn is_initialized(&self, name: &str) -> Option<bool> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.initialized)
    }

    /// Diagnostics from the last `update_all` call.
    pub fn last_diagnostics(&self) -> &UpdateDiagnostics {
        &self.last_diagnostics
    }
}

impl<S: 'static> Drop for Coordinator<S> {
    fn drop(&mut self) {
        if self.state != LifecycleState::TornDown {
            self.release();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
