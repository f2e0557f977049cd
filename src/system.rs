//! The particle system handle.
//!
//! One [`ParticleSystem`] owns everything for one surface: resolved
//! config, viewport, pointer state, the RNG, and the simulator. Several
//! instances can run side by side; there is no global state. Dropping the
//! handle releases the particle set - the windowed runner additionally
//! stops scheduling frames when its handle goes away.
//!
//! The particle set is recreated only when the amount, the resolved
//! palette size, or the viewport size changes; every other config update
//! applies in place and takes effect on the next frame.

use crate::config::{ParticleSystemConfig, ResolvedConfig};
use crate::particle::Particle;
use crate::pointer::PointerTracker;
use crate::render::{self, FramePlan};
use crate::sim::{Simulator, StepOutcome};
use crate::spawn::Spawner;
use crate::viewport::{SizeOutcome, Viewport};

/// A running particle system bound to one drawing surface.
#[derive(Debug)]
pub struct ParticleSystem {
    raw: ParticleSystemConfig,
    cfg: ResolvedConfig,
    viewport: Viewport,
    pointer: PointerTracker,
    spawner: Spawner,
    sim: Simulator,
    preview_cap: Option<usize>,
}

impl ParticleSystem {
    /// Create a system for a surface of the given logical size.
    /// Non-positive dimensions defer particle creation until a usable
    /// size arrives via [`ParticleSystem::resize`].
    pub fn new(config: ParticleSystemConfig, width: f32, height: f32) -> Self {
        let cfg = config.resolve();
        let mut system = Self {
            raw: config,
            cfg,
            viewport: Viewport::new(width, height, 1.0),
            pointer: PointerTracker::new(),
            spawner: Spawner::new(),
            sim: Simulator::new(Vec::new()),
            preview_cap: None,
        };
        system.reseed();
        system
    }

    /// Use a fixed RNG seed; spawns become reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.spawner = Spawner::from_seed(seed);
        self.reseed();
        self
    }

    /// Cap the particle count, for constrained preview surfaces.
    pub fn with_preview_cap(mut self, cap: usize) -> Self {
        self.preview_cap = Some(cap);
        self.reseed();
        self
    }

    /// The raw configuration as last applied.
    pub fn config(&self) -> &ParticleSystemConfig {
        &self.raw
    }

    /// Apply a new configuration. Recreates the particle set only when
    /// the amount or the resolved palette size changed.
    pub fn update_config(&mut self, config: ParticleSystemConfig) {
        let next = config.resolve();
        let recreate = next.amount != self.cfg.amount
            || next.palette.len() != self.cfg.palette.len();
        self.raw = config;
        self.cfg = next;
        if recreate {
            self.reseed();
        }
    }

    /// Apply a new surface size. A changed size recreates the particle
    /// set; non-positive dimensions defer instead of failing.
    pub fn resize(&mut self, width: f32, height: f32) {
        if self.viewport.apply(width, height) == SizeOutcome::Changed {
            self.reseed();
        }
    }

    pub fn set_scale_factor(&mut self, scale: f32) {
        self.viewport.set_scale_factor(scale);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer.moved(x, y);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.left();
    }

    pub fn clicked(&mut self, x: f32, y: f32) {
        self.pointer.clicked(x, y);
    }

    /// Advance the simulation by one frame of `dt_ms` milliseconds.
    ///
    /// Returns [`StepOutcome::Finished`] once a non-looping time limit
    /// has been reached; the loop driver should stop scheduling then.
    pub fn advance(&mut self, dt_ms: f32) -> StepOutcome {
        let Some(size) = self.viewport.logical_size() else {
            // Deferred viewport: nothing to simulate yet.
            return StepOutcome::Running;
        };
        let clicks = self.pointer.drain_clicks();
        let outcome = self.sim.step(
            &self.cfg,
            size,
            self.pointer.snapshot(),
            &clicks,
            &mut self.spawner,
            dt_ms,
            self.preview_cap,
        );
        if outcome == StepOutcome::Finished {
            log::debug!("particle system reached its time limit; loop stops");
        }
        outcome
    }

    /// Build the render plan for the current frame. The simulator's
    /// output is snapshotted read-only; nothing aliases the particle set.
    pub fn plan_frame(&self) -> FramePlan {
        match self.viewport.logical_size() {
            Some(size) => render::plan(&self.cfg, self.sim.particles(), size, self.pointer.snapshot()),
            None => FramePlan::default(),
        }
    }

    /// Count down a pending deferred-size retry. Returns `true` when the
    /// host should re-measure its container and call `resize` again.
    pub fn poll_size_retry(&mut self) -> bool {
        self.viewport.tick_retry()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        self.sim.particles()
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.sim.len()
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.sim.finished()
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn reseed(&mut self) {
        let Some(size) = self.viewport.logical_size() else {
            return;
        };
        let count = match self.preview_cap {
            Some(cap) => self.cfg.amount.min(cap),
            None => self.cfg.amount,
        };
        self.sim
            .replace_set(self.spawner.spawn_set(&self.cfg, size, count));
        log::debug!("particle set recreated: {} particles", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::REFERENCE_FRAME_MS;
    use glam::Vec2;

    const DT: f32 = REFERENCE_FRAME_MS;

    fn system(amount: u32) -> ParticleSystem {
        let mut config = ParticleSystemConfig::default();
        config.amount = amount;
        ParticleSystem::new(config, 400.0, 300.0).with_seed(42)
    }

    #[test]
    fn test_count_matches_amount() {
        let sys = system(30);
        assert_eq!(sys.particle_count(), 30);
    }

    #[test]
    fn test_amount_change_recreates() {
        let mut sys = system(10);
        let mut config = sys.config().clone();
        config.amount = 25;
        sys.update_config(config);
        assert_eq!(sys.particle_count(), 25);
    }

    #[test]
    fn test_in_place_update_preserves_particles() {
        let mut sys = system(10);
        for _ in 0..5 {
            sys.advance(DT);
        }
        let positions: Vec<Vec2> = sys.particles().iter().map(|p| p.pos).collect();

        let mut config = sys.config().clone();
        config.movement.speed = 9.0;
        sys.update_config(config);

        let after: Vec<Vec2> = sys.particles().iter().map(|p| p.pos).collect();
        assert_eq!(positions, after, "speed-only change must not reseed");
    }

    #[test]
    fn test_palette_size_change_recreates() {
        let mut sys = system(10);
        for _ in 0..5 {
            sys.advance(DT);
        }
        let before: Vec<Vec2> = sys.particles().iter().map(|p| p.pos).collect();

        let mut config = sys.config().clone();
        config.palette = vec![
            crate::color::ColorInput::Text("#ff0000".into()),
            crate::color::ColorInput::Text("#00ff00".into()),
        ];
        sys.update_config(config);

        let after: Vec<Vec2> = sys.particles().iter().map(|p| p.pos).collect();
        assert_ne!(before, after, "palette growth must reseed");
        assert_eq!(sys.particle_count(), 10);
    }

    #[test]
    fn test_resize_recreates_and_rescopes() {
        let mut sys = system(10);
        sys.resize(800.0, 600.0);
        assert_eq!(sys.particle_count(), 10);
        for p in sys.particles() {
            assert!(p.pos.x < 800.0 && p.pos.y < 600.0);
        }
        // Same size again: no reseed.
        let before: Vec<Vec2> = sys.particles().iter().map(|p| p.pos).collect();
        sys.resize(800.0, 600.0);
        let after: Vec<Vec2> = sys.particles().iter().map(|p| p.pos).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_preview_cap_limits_count() {
        let mut config = ParticleSystemConfig::default();
        config.amount = 500;
        let sys = ParticleSystem::new(config, 400.0, 300.0)
            .with_seed(1)
            .with_preview_cap(64);
        assert_eq!(sys.particle_count(), 64);
    }

    #[test]
    fn test_deferred_viewport_then_recovery() {
        let mut config = ParticleSystemConfig::default();
        config.amount = 10;
        let mut sys = ParticleSystem::new(config, 0.0, 0.0).with_seed(2);
        assert_eq!(sys.particle_count(), 0);

        // Advancing while deferred is a harmless no-op.
        assert_eq!(sys.advance(DT), StepOutcome::Running);
        assert!(sys.plan_frame().instances.is_empty());

        sys.resize(320.0, 240.0);
        assert_eq!(sys.particle_count(), 10);
    }

    #[test]
    fn test_pointer_routing() {
        let mut sys = system(5);
        sys.pointer_moved(12.0, 34.0);
        sys.clicked(12.0, 34.0);
        sys.advance(DT);
        sys.pointer_left();
        sys.advance(DT);
    }

    #[test]
    fn test_seeded_systems_agree() {
        let a = system(20);
        let b = system(20);
        assert_eq!(a.particles(), b.particles());
    }
}
