//! Construction-time dependency injection.
//!
//! The host fills a [`Dependencies`] registry with the capabilities its
//! modules need (parameter records, body handles, shared counters). Each
//! module factory receives a [`Resolver`] scoped to that module and pulls its
//! dependencies out at construction time. A dependency that is absent or
//! fails [`Validate`] aborts the build immediately, so a module can never
//! discover a missing dependency on its first update.

use std::any::{type_name, Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::LifecycleError;

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// A dependency that can check its own invariants before it is handed to a
/// module.
pub trait Validate {
    /// Returns a human-readable reason if the value is unusable.
    fn validate(&self) -> Result<(), String>;
}

impl<T: Validate + ?Sized> Validate for Arc<T> {
    fn validate(&self) -> Result<(), String> {
        (**self).validate()
    }
}

impl<T: Validate> Validate for Shared<T> {
    fn validate(&self) -> Result<(), String> {
        self.borrow().validate()
    }
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// A single-threaded shared mutable handle.
///
/// Lets two modules in the same coordinator receive the same capability
/// (e.g. a movement body) at construction. Cloning the handle shares the
/// value; it does not copy it.
#[derive(Debug, Default)]
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    /// Wrap `value` in a new shared handle.
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Immutably borrow the shared value.
    ///
    /// # Panics
    ///
    /// Panics if the value is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrow the shared value.
    ///
    /// # Panics
    ///
    /// Panics if the value is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Replace the shared value, returning the old one.
    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Number of live handles to this value.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Whether two handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Copy> Shared<T> {
    /// Copy the shared value out.
    pub fn get(&self) -> T {
        *self.0.borrow()
    }

    /// Overwrite the shared value.
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// Typed registry of host-provided capabilities, keyed by Rust type.
///
/// At most one value per type is stored. Wrap values in a newtype when two
/// dependencies would otherwise share a type.
#[derive(Default)]
pub struct Dependencies {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl Dependencies {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<T: 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Store `value`, returning the previous value of the same type, if any.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Remove and return the value of type `T`.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Borrow the value of type `T`, if present.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Whether a value of type `T` is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of stored dependencies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A resolver that attributes failures to `module`.
    pub fn resolver<'a>(&'a self, module: &'a str) -> Resolver<'a> {
        Resolver { module, deps: self }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// A view of [`Dependencies`] scoped to the module being constructed.
///
/// Every lookup failure is reported as a [`LifecycleError`] naming the module
/// and the requested type.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    module: &'a str,
    deps: &'a Dependencies,
}

impl<'a> Resolver<'a> {
    /// Name of the module being constructed.
    pub fn module_name(&self) -> &'a str {
        self.module
    }

    /// Borrow a required dependency.
    pub fn require<T: 'static>(&self) -> Result<&'a T, LifecycleError> {
        self.deps
            .get::<T>()
            .ok_or_else(|| LifecycleError::MissingDependency {
                module: self.module.to_owned(),
                type_name: type_name::<T>(),
            })
    }

    /// Clone a required dependency. Intended for handles (`Arc`, [`Shared`]).
    pub fn require_cloned<T: Clone + 'static>(&self) -> Result<T, LifecycleError> {
        self.require::<T>().cloned()
    }

    /// Borrow a required dependency after checking [`Validate`].
    pub fn require_valid<T: Validate + 'static>(&self) -> Result<&'a T, LifecycleError> {
        let value = self.require::<T>()?;
        value
            .validate()
            .map_err(|reason| LifecycleError::InvalidDependency {
                module: self.module.to_owned(),
                type_name: type_name::<T>(),
                reason,
            })?;
        Ok(value)
    }

    /// Borrow an optional dependency.
    pub fn optional<T: 'static>(&self) -> Option<&'a T> {
        self.deps.get::<T>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
