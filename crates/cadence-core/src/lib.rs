//! Cadence Core -- composed update-lifecycle container.
//!
//! A [`Coordinator`](coordinator::Coordinator) owns an ordered sequence of
//! [`Module`](module::Module)s and drives their lifecycle:
//!
//! 1. **Construct** -- each module is built by a factory that receives its
//!    dependencies from a typed [`Dependencies`](dependencies::Dependencies)
//!    registry. Missing or invalid dependencies fail the build immediately.
//! 2. **Initialize** -- every module is initialized once, in declared order.
//! 3. **Update** -- once per tick, every module is updated in declared order.
//! 4. **Teardown** -- all modules are released together.
//!
//! Construction order, initialization order, and update order are identical
//! and equal to the declared order. Calling lifecycle operations out of order
//! is reported as a [`LifecycleError`], never silently ignored.
//!
//! # Quick Start
//!
//! ```
//! use cadence_core::prelude::*;
//!
//! let mut coordinator = CoordinatorBuilder::<Vec<&'static str>>::new()
//!     .with_module("first", |_deps| {
//!         Ok(from_fn(|_tick: &TickContext, log: &mut Vec<&'static str>| {
//!             log.push("first");
//!             Ok(())
//!         }))
//!     })
//!     .with_module("second", |_deps| {
//!         Ok(from_fn(|_tick: &TickContext, log: &mut Vec<&'static str>| {
//!             log.push("second");
//!             Ok(())
//!         }))
//!     })
//!     .build(&Dependencies::new())
//!     .unwrap();
//!
//! let mut log = Vec::new();
//! coordinator.initialize_all(&mut log).unwrap();
//! coordinator.update_all(&TickContext::new(0, 1.0 / 60.0), &mut log).unwrap();
//! assert_eq!(log, vec!["first", "second"]);
//! ```

#![deny(unsafe_code)]

use std::fmt;

pub mod coordinator;
pub mod dependencies;
pub mod module;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Error type returned by module hooks.
pub type ModuleError = Box<dyn std::error::Error + Send + Sync>;

/// The lifecycle phase a module was executing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    /// `Module::initialize`.
    Initialize,
    /// `Module::update`.
    Update,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initialize => f.write_str("initialize"),
            Phase::Update => f.write_str("update"),
        }
    }
}

/// Errors produced by lifecycle operations.
///
/// `AlreadyInitialized`, `NotInitialized` and `TornDown` are ordering
/// violations: they never touch module state. The construction variants are
/// returned by [`CoordinatorBuilder::build`](coordinator::CoordinatorBuilder::build)
/// before any module is initialized.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// `initialize_all` was called on an already-initialized coordinator.
    #[error("coordinator is already initialized; initialize_all must be called exactly once")]
    AlreadyInitialized,

    /// `update_all` was called before `initialize_all`.
    #[error("coordinator is not initialized; call initialize_all before update_all")]
    NotInitialized,

    /// Any operation after the coordinator released its modules.
    #[error("coordinator has been torn down; its modules are released")]
    TornDown,

    /// Two modules were declared with the same name.
    #[error("duplicate module name: {name:?}")]
    DuplicateModule { name: String },

    /// A module declared a predecessor that is not declared before it.
    #[error(
        "module '{module}' must run after '{predecessor}', but '{predecessor}' is not declared before it"
    )]
    UnknownPredecessor { module: String, predecessor: String },

    /// A module factory requested a dependency that was never provided.
    #[error("module '{module}' requires dependency `{type_name}`, which was not provided")]
    MissingDependency { module: String, type_name: &'static str },

    /// A module factory received a dependency that failed validation.
    #[error("module '{module}' received invalid dependency `{type_name}`: {reason}")]
    InvalidDependency {
        module: String,
        type_name: &'static str,
        reason: String,
    },

    /// A module hook returned an error. The sequence was halted at this module.
    #[error("module '{module}' failed during {phase}: {source}")]
    ModuleFailed {
        module: String,
        phase: Phase,
        #[source]
        source: ModuleError,
    },
}

impl LifecycleError {
    /// Whether this error is a call-order violation (as opposed to a
    /// construction or module failure).
    pub fn is_ordering_violation(&self) -> bool {
        matches!(
            self,
            LifecycleError::AlreadyInitialized
                | LifecycleError::NotInitialized
                | LifecycleError::TornDown
        )
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::coordinator::{
        Coordinator, CoordinatorBuilder, LifecycleState, UpdateDiagnostics,
    };
    pub use crate::dependencies::{Dependencies, Resolver, Shared, Validate};
    pub use crate::module::{from_fn, FnModule, Module, TickContext};
    pub use crate::{LifecycleError, ModuleError, Phase};
}
