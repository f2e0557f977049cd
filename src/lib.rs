//! # Plexa
//!
//! Animated 2D particle backdrops with a simple, declarative API.
//!
//! Plexa simulates a field of particles on the CPU - movement physics,
//! pointer interaction, boundary policies, twinkle - and renders shapes,
//! glow, text glyphs and proximity connection lines through wgpu.
//! Everything is driven by one serializable config document.
//!
//! ## Quick Start
//!
//! ```ignore
//! use plexa::prelude::*;
//!
//! fn main() {
//!     let mut config = ParticleSystemConfig::default();
//!     config.amount = 120;
//!     config.modes.connect.distance = 120.0;
//!     config.hover.enable = true;
//!     config.hover.mode = HoverMode::Repulse;
//!
//!     plexa::run_window(config).unwrap();
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Configuration
//!
//! [`ParticleSystemConfig`] is a plain serde document; every field has a
//! default, so a partial JSON config deserializes cleanly. Colors accept
//! hex strings, `rgb(...)` and structured objects; size and opacity are
//! [`config::Distribution`]s (fixed value, `{min, max}` range, or a
//! named bucket like `"large"`). Normalization never fails - malformed
//! fields fall back to documented defaults.
//!
//! ### The frame loop
//!
//! One [`ParticleSystem`] owns the particle set for one surface. Each
//! frame, [`ParticleSystem::advance`] runs the simulation step (movement,
//! boundary policy, hover force, twinkle, click commands, time limit) and
//! [`ParticleSystem::plan_frame`] snapshots the result into a
//! [`render::FramePlan`] for the GPU backend. The windowed runner in
//! [`window`] wires this to winit and wgpu; embedders with their own loop
//! can drive a system directly.
//!
//! ### Interaction
//!
//! Pointer hover applies one of grab / repulse / bubble / attract within
//! its configured distance; clicks push new particles, remove the nearest
//! ones, or apply a one-shot impulse. See [`config::HoverMode`] and
//! [`config::ClickMode`].

pub mod color;
pub mod config;
pub mod error;
mod gpu;
pub mod particle;
pub mod pointer;
pub mod render;
pub mod sim;
pub mod spawn;
pub mod system;
pub mod time;
pub mod viewport;
pub mod window;

pub use color::{ColorInput, Rgb};
pub use config::{
    BoundaryPolicy, ClickMode, Distribution, HoverMode, MoveDirection, ParticleSystemConfig,
    ShapeConfig,
};
pub use error::{GpuError, RenderError, RunError};
pub use particle::Particle;
pub use render::FramePlan;
pub use sim::{Simulator, StepOutcome};
pub use spawn::Spawner;
pub use system::ParticleSystem;
pub use window::run_window;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use plexa::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::{ColorInput, Rgb};
    pub use crate::config::{
        BoundaryPolicy, ClickMode, Distribution, HoverMode, MoveDirection, ParticleSystemConfig,
        ShapeConfig,
    };
    pub use crate::render::FramePlan;
    pub use crate::sim::StepOutcome;
    pub use crate::system::ParticleSystem;
    pub use crate::window::run_window;
}
