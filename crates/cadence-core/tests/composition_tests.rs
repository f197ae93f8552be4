//! Composition tests: modules that share injected capabilities.
//!
//! These exercise the full construct -> initialize -> update -> teardown
//! sequence with dependencies pulled from a [`Dependencies`] registry rather
//! than from host state, the way a composed root wires its sub-modules.

use std::sync::Arc;

use cadence_core::prelude::*;

// ---------------------------------------------------------------------------
// Shared capabilities
// ---------------------------------------------------------------------------

/// A counter injected into several modules.
#[derive(Debug, Default)]
struct Counter(u64);

/// Kinematic body shared by the movement and jump modules.
#[derive(Debug, Clone, Default, PartialEq)]
struct Body {
    x: f64,
    y: f64,
    vy: f64,
    grounded: bool,
}

/// Immutable tunables shared read-only.
#[derive(Debug)]
struct MoveParams {
    speed: f64,
    jump_velocity: f64,
    gravity: f64,
}

impl Validate for MoveParams {
    fn validate(&self) -> Result<(), String> {
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(format!("speed must be finite and non-negative, got {}", self.speed));
        }
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return Err(format!("gravity must be finite and positive, got {}", self.gravity));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 1. A -> B -> C counter handoff within one tick
// ---------------------------------------------------------------------------

struct Writer {
    counter: Shared<Counter>,
}

impl Module<()> for Writer {
    fn update(&mut self, _tick: &TickContext, _state: &mut ()) -> Result<(), ModuleError> {
        self.counter.borrow_mut().0 = 1;
        Ok(())
    }
}

struct Doubler {
    counter: Shared<Counter>,
}

impl Module<()> for Doubler {
    fn update(&mut self, _tick: &TickContext, _state: &mut ()) -> Result<(), ModuleError> {
        let mut counter = self.counter.borrow_mut();
        counter.0 *= 2;
        Ok(())
    }
}

struct Checker {
    counter: Shared<Counter>,
    observed: Shared<Vec<u64>>,
}

impl Module<()> for Checker {
    fn update(&mut self, _tick: &TickContext, _state: &mut ()) -> Result<(), ModuleError> {
        let value = self.counter.borrow().0;
        self.observed.borrow_mut().push(value);
        if value != 2 {
            return Err(format!("expected counter 2, observed {value}").into());
        }
        Ok(())
    }
}

#[test]
fn counter_handoff_is_sequential_within_a_tick() {
    let counter = Shared::new(Counter::default());
    let observed = Shared::new(Vec::<u64>::new());
    let deps = Dependencies::new()
        .with(counter.clone())
        .with(observed.clone());

    let mut coordinator = CoordinatorBuilder::<()>::new()
        .with_module("a", |deps| {
            Ok(Writer {
                counter: deps.require_cloned()?,
            })
        })
        .with_module_after("b", &["a"], |deps| {
            Ok(Doubler {
                counter: deps.require_cloned()?,
            })
        })
        .with_module_after("c", &["b"], |deps| {
            Ok(Checker {
                counter: deps.require_cloned()?,
                observed: deps.require_cloned()?,
            })
        })
        .build(&deps)
        .unwrap();

    coordinator.initialize_all(&mut ()).unwrap();
    for tick in 0..5 {
        coordinator
            .update_all(&TickContext::new(tick, 1.0 / 60.0), &mut ())
            .unwrap();
    }

    assert_eq!(counter.borrow().0, 2);
    assert_eq!(*observed.borrow(), vec![2, 2, 2, 2, 2]);
}

#[test]
fn counter_handoff_fails_when_dependency_missing() {
    // No Shared<Vec<u64>> provided: "c" cannot be constructed.
    let deps = Dependencies::new().with(Shared::new(Counter::default()));

    let err = CoordinatorBuilder::<()>::new()
        .with_module("a", |deps| {
            Ok(Writer {
                counter: deps.require_cloned()?,
            })
        })
        .with_module("c", |deps| {
            Ok(Checker {
                counter: deps.require_cloned()?,
                observed: deps.require_cloned()?,
            })
        })
        .build(&deps)
        .unwrap_err();

    match err {
        LifecycleError::MissingDependency { module, type_name } => {
            assert_eq!(module, "c");
            assert!(type_name.contains("Shared"), "{type_name}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 2. Composed root: movement then jump on a shared body
// ---------------------------------------------------------------------------

/// Horizontal input for the tick, provided by the host.
#[derive(Debug, Default)]
struct Input {
    axis: f64,
    jump: bool,
}

struct Movement {
    body: Shared<Body>,
    params: Arc<MoveParams>,
}

impl Module<Input> for Movement {
    fn update(&mut self, tick: &TickContext, input: &mut Input) -> Result<(), ModuleError> {
        self.body.borrow_mut().x += input.axis * self.params.speed * tick.dt;
        Ok(())
    }
}

struct Jump {
    body: Shared<Body>,
    params: Arc<MoveParams>,
}

impl Module<Input> for Jump {
    fn initialize(&mut self, _input: &mut Input) -> Result<(), ModuleError> {
        self.body.borrow_mut().grounded = true;
        Ok(())
    }

    fn update(&mut self, tick: &TickContext, input: &mut Input) -> Result<(), ModuleError> {
        let mut body = self.body.borrow_mut();
        if input.jump && body.grounded {
            body.vy = self.params.jump_velocity;
            body.grounded = false;
        }
        if !body.grounded {
            let vy = body.vy - self.params.gravity * tick.dt;
            body.vy = vy;
            body.y += vy * tick.dt;
            if body.y <= 0.0 {
                body.y = 0.0;
                body.vy = 0.0;
                body.grounded = true;
            }
        }
        input.jump = false;
        Ok(())
    }
}

fn player_root(deps: &Dependencies) -> Result<Coordinator<Input>, LifecycleError> {
    CoordinatorBuilder::<Input>::new()
        .with_module("movement", |deps| {
            Ok(Movement {
                body: deps.require_cloned()?,
                params: Arc::clone(deps.require_valid::<Arc<MoveParams>>()?),
            })
        })
        .with_module_after("jump", &["movement"], |deps| {
            Ok(Jump {
                body: deps.require_cloned()?,
                params: Arc::clone(deps.require_valid::<Arc<MoveParams>>()?),
            })
        })
        .build(deps)
}

#[test]
fn composed_root_drives_shared_body() {
    let body = Shared::new(Body::default());
    let params = Arc::new(MoveParams {
        speed: 4.0,
        jump_velocity: 5.0,
        gravity: 10.0,
    });
    let deps = Dependencies::new().with(body.clone()).with(params);

    let mut root = player_root(&deps).unwrap();
    let mut input = Input::default();
    root.initialize_all(&mut input).unwrap();
    assert!(body.borrow().grounded);

    input.axis = 1.0;
    input.jump = true;
    root.update_all(&TickContext::new(0, 0.1), &mut input).unwrap();

    {
        let body = body.borrow();
        assert!((body.x - 0.4).abs() < 1e-12);
        assert!(!body.grounded);
        assert!(body.y > 0.0);
    }
    assert!(!input.jump, "jump input consumed");

    // Enough ticks to land again: flight time is 2 * 5 / 10 = 1s.
    for tick in 1..20 {
        root.update_all(&TickContext::new(tick, 0.1), &mut input).unwrap();
    }
    let body = body.borrow();
    assert!(body.grounded);
    assert_eq!(body.y, 0.0);
    assert!((body.x - 8.0).abs() < 1e-9);
}

#[test]
fn composed_root_rejects_invalid_params() {
    let deps = Dependencies::new()
        .with(Shared::new(Body::default()))
        .with(Arc::new(MoveParams {
            speed: 4.0,
            jump_velocity: 5.0,
            gravity: 0.0,
        }));

    let err = player_root(&deps).unwrap_err();
    match err {
        LifecycleError::InvalidDependency { module, reason, .. } => {
            assert_eq!(module, "movement");
            assert!(reason.contains("gravity"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn modules_release_their_handles_on_teardown() {
    let body = Shared::new(Body::default());
    let deps = Dependencies::new()
        .with(body.clone())
        .with(Arc::new(MoveParams {
            speed: 1.0,
            jump_velocity: 1.0,
            gravity: 1.0,
        }));

    let mut root = player_root(&deps).unwrap();
    root.initialize_all(&mut Input::default()).unwrap();
    drop(deps);
    assert_eq!(body.handle_count(), 3, "test + movement + jump");

    root.teardown().unwrap();

    assert_eq!(body.handle_count(), 1);
    assert_eq!(root.module_count(), 0);
}
