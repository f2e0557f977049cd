//! Per-particle state.

use glam::Vec2;

use crate::color::Rgb;

/// One simulated particle.
///
/// Mutated every frame by the simulator; created and replaced wholesale
/// by the spawner. Positions and sizes are in logical pixels, y grows
/// downward. Velocity is logical px per 60 Hz reference frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Rgb,
    /// Current size; bubble scaling writes here and is undone at the top
    /// of the next frame.
    pub size: f32,
    /// Pre-bubble baseline size.
    pub original_size: f32,
    /// Base opacity; twinkle oscillates the displayed value around it.
    pub opacity: f32,
    /// Display opacity for the current frame.
    pub display_opacity: f32,
    pub twinkle_phase: f32,
    /// Accumulated gravity velocity, logical px per reference frame.
    pub gravity_vel: f32,
    /// Rotation applied to the rendered shape, radians.
    pub spin_angle: f32,
    /// Spawn counter value; keeps mixed-shape picks stable across frames.
    pub shape_index: usize,
}

impl Particle {
    /// Squared distance to a point. Squared form so callers can compare
    /// against squared thresholds without a sqrt per pair.
    #[inline]
    pub fn distance_sq(&self, point: Vec2) -> f32 {
        self.pos.distance_squared(point)
    }
}
