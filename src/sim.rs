//! The per-frame particle state machine.
//!
//! [`Simulator::step`] advances every particle through a fixed sequence:
//! size reset, movement physics (gravity, spin, vibrate, integration),
//! boundary policy, pointer hover force, twinkle opacity - then applies
//! queued click commands and the system-level time limit. The ordering is
//! part of the contract: bubble scaling from one frame is undone at the
//! top of the next, and a boundary respawn is never pushed back out of
//! bounds by a later stage of the same frame.
//!
//! All physics increments are scaled by the k-factor (`dt / 16.667 ms`),
//! so behavior is frame-rate independent.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::config::{BoundaryPolicy, ClickMode, HoverMode, ResolvedConfig};
use crate::particle::Particle;
use crate::pointer::{Click, PointerSnapshot};
use crate::spawn::Spawner;
use crate::time::k_factor;

/// Particles added per `push` click.
pub const PUSH_BATCH: usize = 4;
/// Particles removed per `remove` click.
pub const REMOVE_BATCH: usize = 4;

/// Converts gravity acceleration (px/s^2) into a per-reference-frame
/// velocity increment.
const GRAVITY_STEP: f32 = 1.0 / 60.0;
/// Scales `hover.force` into a per-frame pull displacement.
const PULL_STEP: f32 = 0.1;
/// Scales repulse strength into a per-frame push displacement.
const REPULSE_STEP: f32 = 0.1;
/// Scales repulse/attract strength into a one-shot click velocity impulse.
const CLICK_IMPULSE: f32 = 0.05;
/// Scales `spin.speed` into radians per reference frame.
const SPIN_STEP: f32 = 0.01;
/// Vibration wobble amplitude, px per reference frame.
const VIBRATE_AMP: f32 = 0.5;

/// Whether the loop should keep scheduling frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    /// Non-looping time limit reached. Terminal: no further mutation.
    Finished,
}

/// Owns the particle set and advances it frame by frame. The renderer
/// receives the set as an immutable snapshot via [`Simulator::particles`].
#[derive(Debug)]
pub struct Simulator {
    particles: Vec<Particle>,
    elapsed_ms: f32,
    finished: bool,
}

impl Simulator {
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            particles,
            elapsed_ms: 0.0,
            finished: false,
        }
    }

    /// Read-only snapshot of the current frame's output.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    /// Replace the whole set (config or viewport change). Restarts the
    /// elapsed timer and clears any terminal state.
    pub fn replace_set(&mut self, particles: Vec<Particle>) {
        self.particles = particles;
        self.elapsed_ms = 0.0;
        self.finished = false;
    }

    /// Advance one frame.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        cfg: &ResolvedConfig,
        size: Vec2,
        pointer: PointerSnapshot,
        clicks: &[Click],
        spawner: &mut Spawner,
        dt_ms: f32,
        particle_cap: Option<usize>,
    ) -> StepOutcome {
        if self.finished {
            return StepOutcome::Finished;
        }

        let k = k_factor(dt_ms);
        let elapsed_secs = self.elapsed_ms / 1000.0;
        self.elapsed_ms += dt_ms;

        self.particles.retain_mut(|p| {
            // 1. Undo last frame's bubble scaling.
            p.size = p.original_size;

            // 2. Movement physics and integration.
            if cfg.movement.enable {
                let mut vel = p.vel;
                if cfg.movement.gravity.enable {
                    p.gravity_vel += cfg.movement.gravity.acceleration * GRAVITY_STEP * k;
                    vel.y += if cfg.movement.gravity.reverse {
                        -p.gravity_vel
                    } else {
                        p.gravity_vel
                    };
                }
                if cfg.movement.spin.enable {
                    p.spin_angle = (p.spin_angle + cfg.movement.spin.speed * SPIN_STEP * k) % TAU;
                }
                if cfg.movement.vibrate.enable {
                    let phase = cfg.movement.vibrate.frequency * TAU * elapsed_secs + p.twinkle_phase;
                    vel += Vec2::new(phase.sin(), phase.cos()) * VIBRATE_AMP;
                }
                p.pos += vel * k;
            }

            // 3. Boundary policy.
            if !apply_boundary(p, cfg.movement.boundary, size, spawner) {
                return false;
            }

            // 4. Hover interaction.
            if cfg.hover.enable && pointer.hovering {
                apply_hover(p, cfg, pointer.pos, k);
            }

            // 5. Display opacity.
            match &cfg.twinkle {
                Some(tw) => {
                    p.twinkle_phase = (p.twinkle_phase + tw.speed * k) % TAU;
                    let wave = (p.twinkle_phase.sin() + 1.0) * 0.5;
                    p.display_opacity = tw.min_opacity + (tw.max_opacity - tw.min_opacity) * wave;
                }
                None => p.display_opacity = p.opacity,
            }

            true
        });

        // One-shot click commands, consumed exactly once.
        if let Some(mode) = cfg.click {
            for click in clicks {
                self.apply_click(mode, *click, cfg, size, spawner, particle_cap);
            }
        }

        // 6. System-level time limit.
        let limit = cfg.movement.time_limit_ms;
        if limit > 0.0 && self.elapsed_ms >= limit {
            if cfg.movement.loop_animation {
                self.elapsed_ms = 0.0;
                spawner.respawn_motion(cfg, size, &mut self.particles);
            } else {
                self.finished = true;
                return StepOutcome::Finished;
            }
        }

        StepOutcome::Running
    }

    fn apply_click(
        &mut self,
        mode: ClickMode,
        click: Click,
        cfg: &ResolvedConfig,
        size: Vec2,
        spawner: &mut Spawner,
        particle_cap: Option<usize>,
    ) {
        match mode {
            ClickMode::Push => {
                let room = particle_cap
                    .map(|cap| cap.saturating_sub(self.particles.len()))
                    .unwrap_or(PUSH_BATCH);
                for _ in 0..PUSH_BATCH.min(room) {
                    self.particles.push(spawner.spawn_one(cfg, size));
                }
            }
            ClickMode::Remove => {
                let mut by_distance: Vec<(f32, usize)> = self
                    .particles
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (p.distance_sq(click.pos), i))
                    .collect();
                by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
                let mut doomed: Vec<usize> =
                    by_distance.iter().take(REMOVE_BATCH).map(|&(_, i)| i).collect();
                doomed.sort_unstable_by(|a, b| b.cmp(a));
                for i in doomed {
                    self.particles.remove(i);
                }
            }
            ClickMode::Repulse => {
                for p in &mut self.particles {
                    let away = p.pos - click.pos;
                    let dist = away.length();
                    if dist > 0.0 && dist < cfg.repulse_distance {
                        let falloff = (cfg.repulse_distance - dist) / cfg.repulse_distance;
                        p.vel += (away / dist) * falloff * cfg.repulse_strength * CLICK_IMPULSE;
                    }
                }
            }
            ClickMode::Attract => {
                for p in &mut self.particles {
                    let toward = click.pos - p.pos;
                    let dist = toward.length();
                    if dist > 0.0 && dist < cfg.movement.attract.distance {
                        p.vel += (toward / dist) * cfg.hover.force * CLICK_IMPULSE;
                    }
                }
            }
            ClickMode::Bubble => {
                for p in &mut self.particles {
                    let dist = p.pos.distance(click.pos);
                    if dist < cfg.bubble_distance {
                        bubble(p, cfg, dist);
                    }
                }
            }
        }
    }
}

/// Returns `false` when the particle must be removed (destroy policy).
fn apply_boundary(
    p: &mut Particle,
    policy: BoundaryPolicy,
    size: Vec2,
    spawner: &mut Spawner,
) -> bool {
    match policy {
        BoundaryPolicy::Bounce => {
            if p.pos.x < 0.0 {
                p.pos.x = 0.0;
                p.vel.x = -p.vel.x;
            } else if p.pos.x > size.x {
                p.pos.x = size.x;
                p.vel.x = -p.vel.x;
            }
            if p.pos.y < 0.0 {
                p.pos.y = 0.0;
                p.vel.y = -p.vel.y;
                p.gravity_vel = -p.gravity_vel;
            } else if p.pos.y > size.y {
                p.pos.y = size.y;
                p.vel.y = -p.vel.y;
                p.gravity_vel = -p.gravity_vel;
            }
            true
        }
        BoundaryPolicy::Out => {
            let out = p.pos.x < 0.0 || p.pos.x > size.x || p.pos.y < 0.0 || p.pos.y > size.y;
            if out {
                // Respawn on the edge opposite the exit, inside bounds, so
                // the particle is visible again within this same frame.
                if p.pos.y > size.y {
                    p.pos = Vec2::new(spawner.random_coord(size.x), 0.0);
                } else if p.pos.y < 0.0 {
                    p.pos = Vec2::new(spawner.random_coord(size.x), size.y);
                } else if p.pos.x > size.x {
                    p.pos = Vec2::new(0.0, spawner.random_coord(size.y));
                } else {
                    p.pos = Vec2::new(size.x, spawner.random_coord(size.y));
                }
                p.gravity_vel = 0.0;
            }
            true
        }
        BoundaryPolicy::Destroy => {
            p.pos.x >= 0.0 && p.pos.x <= size.x && p.pos.y >= 0.0 && p.pos.y <= size.y
        }
    }
}

fn apply_hover(p: &mut Particle, cfg: &ResolvedConfig, pointer: Vec2, k: f32) {
    let toward = pointer - p.pos;
    let dist = toward.length();
    // Exactly on the pointer: no direction to push along.
    if dist == 0.0 {
        return;
    }
    let dir = toward / dist;

    match cfg.hover.mode {
        HoverMode::Repulse => {
            if dist < cfg.repulse_distance {
                let falloff = (cfg.repulse_distance - dist) / cfg.repulse_distance;
                p.pos -= dir * falloff * cfg.repulse_strength * REPULSE_STEP * k;
            }
        }
        HoverMode::Grab => {
            if dist < cfg.grab_distance {
                let step = (cfg.hover.force * PULL_STEP * k).min(dist);
                p.pos += dir * step;
            }
        }
        HoverMode::Bubble => {
            if dist < cfg.bubble_distance {
                bubble(p, cfg, dist);
            }
        }
        HoverMode::Attract => {
            if dist < cfg.movement.attract.distance {
                let step = (cfg.hover.force * PULL_STEP * k).min(dist);
                p.pos += dir * step;
            }
        }
    }
}

/// Scale `size` up from the baseline proportional to pointer proximity.
/// Undone at the top of the next frame.
fn bubble(p: &mut Particle, cfg: &ResolvedConfig, dist: f32) {
    if cfg.bubble_size <= p.original_size {
        return;
    }
    let proximity = 1.0 - dist / cfg.bubble_distance;
    p.size = p.original_size + (cfg.bubble_size - p.original_size) * proximity;
}
