//! Composed player root driven by a simulated frame callback.
//!
//! A single root owns three modules (input, movement, animation) with an
//! explicit order, instead of relying on whatever order a host engine happens
//! to call per-object update hooks in. Parameters come from a JSON record;
//! the body is a shared handle injected into the modules that need it.
//!
//! Run with: `cargo run --example composed_player`
//! Verbose:  `RUST_LOG=cadence_core=debug cargo run --example composed_player`

use std::sync::Arc;
use std::time::Duration;

use cadence_engine::prelude::*;

// ---------------------------------------------------------------------------
// Parameters and capabilities
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct PlayerParams {
    walk_speed: f64,
    run_multiplier: f64,
    stride_length: f64,
}

impl Validate for PlayerParams {
    fn validate(&self) -> Result<(), String> {
        if !(self.walk_speed.is_finite() && self.walk_speed > 0.0) {
            return Err(format!("walk_speed must be positive, got {}", self.walk_speed));
        }
        if !(self.run_multiplier.is_finite() && self.run_multiplier >= 1.0) {
            return Err(format!(
                "run_multiplier must be at least 1, got {}",
                self.run_multiplier
            ));
        }
        if !(self.stride_length.is_finite() && self.stride_length > 0.0) {
            return Err(format!(
                "stride_length must be positive, got {}",
                self.stride_length
            ));
        }
        Ok(())
    }
}

impl ParamsRecord for PlayerParams {
    const KIND: &'static str = "player";
}

/// The movement-capable body shared by movement and animation.
#[derive(Debug, Default)]
struct Body {
    position: f64,
    velocity: f64,
}

/// Host-owned per-frame state.
#[derive(Debug, Default)]
struct Frame {
    /// Scripted input: (axis, running) for the current tick.
    script: Vec<(f64, bool)>,
    axis: f64,
    running: bool,
    stride_phase: f64,
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

struct InputModule;

impl Module<Frame> for InputModule {
    fn update(&mut self, tick: &TickContext, frame: &mut Frame) -> Result<(), ModuleError> {
        let idx = tick.tick as usize % frame.script.len().max(1);
        let (axis, running) = frame.script.get(idx).copied().unwrap_or((0.0, false));
        frame.axis = axis;
        frame.running = running;
        Ok(())
    }
}

struct MovementModule {
    body: Shared<Body>,
    params: Arc<PlayerParams>,
}

impl Module<Frame> for MovementModule {
    fn update(&mut self, tick: &TickContext, frame: &mut Frame) -> Result<(), ModuleError> {
        let mut speed = self.params.walk_speed;
        if frame.running {
            speed *= self.params.run_multiplier;
        }
        let mut body = self.body.borrow_mut();
        body.velocity = frame.axis * speed;
        let velocity = body.velocity;
        body.position += velocity * tick.dt;
        Ok(())
    }
}

struct AnimationModule {
    body: Shared<Body>,
    params: Arc<PlayerParams>,
}

impl Module<Frame> for AnimationModule {
    fn initialize(&mut self, frame: &mut Frame) -> Result<(), ModuleError> {
        frame.stride_phase = 0.0;
        Ok(())
    }

    fn update(&mut self, tick: &TickContext, frame: &mut Frame) -> Result<(), ModuleError> {
        // Reads the velocity movement wrote earlier in this same tick.
        let distance = self.body.borrow().velocity.abs() * tick.dt;
        frame.stride_phase = (frame.stride_phase + distance / self.params.stride_length) % 1.0;
        Ok(())
    }

    fn teardown(&mut self) {
        tracing::info!("animation released");
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

const PARAMS_JSON: &str = r#"{
    "walk_speed": 2.0,
    "run_multiplier": 2.5,
    "stride_length": 1.2
}"#;

fn build_root(body: &Shared<Body>) -> Result<Coordinator<Frame>, anyhow::Error> {
    let params = load_params_str::<PlayerParams>(PARAMS_JSON)?;
    let deps = Dependencies::new().with(params).with(body.clone());

    let root = CoordinatorBuilder::<Frame>::new()
        .with_instance("input", InputModule)
        .with_module_after("movement", &["input"], |deps| {
            Ok(MovementModule {
                body: deps.require_cloned()?,
                params: Arc::clone(deps.require_valid::<Arc<PlayerParams>>()?),
            })
        })
        .with_module_after("animation", &["movement"], |deps| {
            Ok(AnimationModule {
                body: deps.require_cloned()?,
                params: Arc::clone(deps.require_valid::<Arc<PlayerParams>>()?),
            })
        })
        .build(&deps)?;
    Ok(root)
}

fn main() -> Result<(), anyhow::Error> {
    init_tracing("info");

    let body = Shared::new(Body::default());
    let root = build_root(&body)?;

    let frame = Frame {
        script: vec![(1.0, false), (1.0, false), (1.0, true), (-1.0, false)],
        ..Default::default()
    };
    let config = TickConfig {
        fixed_dt: 1.0 / 30.0,
        max_steps_per_frame: 4,
    };
    let mut tick_loop = TickLoop::new(root, frame, config)?;
    tick_loop.start()?;

    // Simulated host frames with uneven timing, including one long stall.
    let frame_times_ms = [16, 17, 33, 50, 16, 250, 16, 33];
    for ms in frame_times_ms {
        let steps = tick_loop.advance(Duration::from_millis(ms))?;
        let body = body.borrow();
        tracing::info!(
            frame_ms = ms,
            steps,
            tick = tick_loop.tick_count(),
            position = body.position,
            stride = tick_loop.state().stride_phase,
            "frame"
        );
    }

    let order = tick_loop.coordinator().module_names().join(" -> ");
    tracing::info!(%order, "module order");

    tick_loop.shutdown()?;
    Ok(())
}
