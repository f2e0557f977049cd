//! Particle creation.
//!
//! The spawner turns a resolved configuration plus a viewport size into a
//! particle set. All randomness flows through one injected `SmallRng`, so
//! a fixed seed reproduces the exact same set - tests and the loop-reset
//! path rely on this.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::ResolvedConfig;
use crate::particle::Particle;

/// Particle factory with an owned random source.
#[derive(Debug)]
pub struct Spawner {
    rng: SmallRng,
    /// Running spawn counter; feeds palette cycling and mixed-shape picks.
    counter: usize,
}

impl Spawner {
    /// Seed from the wall clock. Different every program execution.
    pub fn new() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::from_seed(seed)
    }

    /// Fixed seed for reproducible sets.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            counter: 0,
        }
    }

    /// Build a fresh set of `count` particles for the given viewport.
    pub fn spawn_set(&mut self, cfg: &ResolvedConfig, size: Vec2, count: usize) -> Vec<Particle> {
        self.counter = 0;
        (0..count).map(|_| self.spawn_one(cfg, size)).collect()
    }

    /// Spawn a single particle. Used for the initial set and for `push`
    /// clicks, which sample exactly the same way.
    pub fn spawn_one(&mut self, cfg: &ResolvedConfig, size: Vec2) -> Particle {
        let index = self.counter;
        self.counter += 1;

        let pos = Vec2::new(
            self.rng.gen::<f32>() * size.x,
            self.rng.gen::<f32>() * size.y,
        );
        let vel = self.initial_velocity(cfg);
        let particle_size = self.sample(cfg.size.min, cfg.size.max);
        let opacity = self.sample(cfg.opacity.min, cfg.opacity.max);

        Particle {
            pos,
            vel,
            color: cfg.palette[index % cfg.palette.len()],
            size: particle_size,
            original_size: particle_size,
            opacity,
            display_opacity: opacity,
            twinkle_phase: self.rng.gen::<f32>() * TAU,
            gravity_vel: 0.0,
            spin_angle: 0.0,
            shape_index: index,
        }
    }

    /// Re-randomize position and velocity in place, keeping the visual
    /// identity (color, size, opacity) of each particle. Used by the
    /// loop-animation reset for a seamless restart.
    pub fn respawn_motion(&mut self, cfg: &ResolvedConfig, size: Vec2, particles: &mut [Particle]) {
        for p in particles {
            p.pos = Vec2::new(
                self.rng.gen::<f32>() * size.x,
                self.rng.gen::<f32>() * size.y,
            );
            p.vel = self.initial_velocity(cfg);
            p.gravity_vel = 0.0;
            p.spin_angle = 0.0;
        }
    }

    /// Uniform coordinate in [0, extent). Used by the wrap-boundary
    /// respawn to pick a fresh entry point along the edge.
    #[inline]
    pub fn random_coord(&mut self, extent: f32) -> f32 {
        self.rng.gen::<f32>() * extent
    }

    fn initial_velocity(&mut self, cfg: &ResolvedConfig) -> Vec2 {
        let speed = cfg.movement.speed;
        match cfg.movement.direction.base_vector() {
            Some((x, y)) => Vec2::new(x, y) * speed,
            None => {
                // Random direction: uniform angle, full speed.
                let angle = self.rng.gen::<f32>() * TAU;
                Vec2::new(angle.cos(), angle.sin()) * speed
            }
        }
    }

    #[inline]
    fn sample(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            min
        } else {
            self.rng.gen_range(min..max)
        }
    }
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MoveDirection, ParticleSystemConfig};

    fn resolved() -> ResolvedConfig {
        ParticleSystemConfig::default().resolve()
    }

    #[test]
    fn test_spawn_set_count_and_bounds() {
        let cfg = resolved();
        let size = Vec2::new(400.0, 300.0);
        let set = Spawner::from_seed(7).spawn_set(&cfg, size, 25);
        assert_eq!(set.len(), 25);
        for p in &set {
            assert!(p.pos.x >= 0.0 && p.pos.x < 400.0);
            assert!(p.pos.y >= 0.0 && p.pos.y < 300.0);
            assert!(p.size > 0.0);
            assert_eq!(p.size, p.original_size);
            assert_eq!(p.gravity_vel, 0.0);
            assert_eq!(p.spin_angle, 0.0);
            assert!(p.twinkle_phase >= 0.0 && p.twinkle_phase < TAU);
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let cfg = resolved();
        let size = Vec2::new(200.0, 200.0);
        let a = Spawner::from_seed(99).spawn_set(&cfg, size, 10);
        let b = Spawner::from_seed(99).spawn_set(&cfg, size, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_directional_velocity() {
        let mut raw = ParticleSystemConfig::default();
        raw.movement.direction = MoveDirection::Bottom;
        raw.movement.speed = 2.0;
        let cfg = raw.resolve();
        let set = Spawner::from_seed(1).spawn_set(&cfg, Vec2::splat(100.0), 5);
        for p in &set {
            assert_eq!(p.vel, Vec2::new(0.0, 2.0));
        }
    }

    #[test]
    fn test_random_velocity_has_configured_speed() {
        let cfg = resolved();
        let set = Spawner::from_seed(3).spawn_set(&cfg, Vec2::splat(100.0), 8);
        for p in &set {
            assert!((p.vel.length() - cfg.movement.speed).abs() < 1e-4);
        }
    }

    #[test]
    fn test_palette_cycles_at_spawn() {
        let mut raw = ParticleSystemConfig::default();
        raw.palette = vec![
            crate::color::ColorInput::Text("#ff0000".into()),
            crate::color::ColorInput::Text("#00ff00".into()),
        ];
        let cfg = raw.resolve();
        let set = Spawner::from_seed(5).spawn_set(&cfg, Vec2::splat(50.0), 4);
        assert_eq!(set[0].color, set[2].color);
        assert_eq!(set[1].color, set[3].color);
        assert_ne!(set[0].color, set[1].color);
    }

    #[test]
    fn test_respawn_motion_keeps_identity() {
        let cfg = resolved();
        let size = Vec2::splat(300.0);
        let mut spawner = Spawner::from_seed(11);
        let mut set = spawner.spawn_set(&cfg, size, 6);
        let colors: Vec<_> = set.iter().map(|p| p.color).collect();
        let sizes: Vec<_> = set.iter().map(|p| p.original_size).collect();

        spawner.respawn_motion(&cfg, size, &mut set);
        for (i, p) in set.iter().enumerate() {
            assert_eq!(p.color, colors[i]);
            assert_eq!(p.original_size, sizes[i]);
            assert_eq!(p.gravity_vel, 0.0);
        }
    }
}
