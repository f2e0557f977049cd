//! Frame planning.
//!
//! The renderer is a pure function from a simulation snapshot to a
//! [`FramePlan`]: backdrop, shape instances (glow pass first, then the
//! sharp main pass), connection-line vertices, and text draws. The GPU
//! backend consumes the plan verbatim, which keeps all draw decisions -
//! what gets a border, when a glyph gets a background box, which pairs
//! connect - testable without a device.
//!
//! All shapes go through one instance builder keyed by the shape tag;
//! the glow pass reuses it with a scaled size and soft falloff instead of
//! maintaining a parallel path per shape.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::config::{ResolvedConfig, SdfShape, ShapeChoice};
use crate::particle::Particle;
use crate::pointer::PointerSnapshot;

/// Shape tag for renderer-generated rectangles (text background boxes).
/// Config shapes use tags 0..=6; see [`SdfShape::tag`].
pub const SHAPE_RECT_TAG: u32 = 7;

/// One instanced shape quad. Uploaded to the GPU as-is.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ShapeInstance {
    /// Center in logical pixels.
    pub center: [f32; 2],
    /// Half-extent in logical pixels.
    pub size: f32,
    /// Shape rotation in radians.
    pub rotation: f32,
    pub fill_color: [f32; 4],
    pub border_color: [f32; 4],
    pub border_width: f32,
    /// 0 = hard edge, 1 = soft glow falloff.
    pub softness: f32,
    pub shape: u32,
    /// Shape-specific parameter: polygon side count, rect aspect ratio.
    pub param: f32,
}

/// One endpoint of a connection line. Two per line, line-list topology.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LinkVertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

/// A glyph string centered on a particle.
#[derive(Clone, Debug, PartialEq)]
pub struct TextDraw {
    pub center: [f32; 2],
    pub content: String,
    /// Font size in logical pixels.
    pub px: f32,
    pub color: [f32; 4],
}

/// Everything the GPU backend needs to draw one frame.
#[derive(Clone, Debug, Default)]
pub struct FramePlan {
    pub width: f32,
    pub height: f32,
    /// Backdrop fill (alpha already includes background opacity, or the
    /// per-frame trail wash). `None` leaves the cleared surface bare.
    pub backdrop: Option<[f32; 4]>,
    /// Keep the previous frame's pixels and fade them with the backdrop
    /// instead of clearing.
    pub trail: bool,
    /// Glow instances first, then main-pass fills and text boxes.
    pub instances: Vec<ShapeInstance>,
    pub links: Vec<LinkVertex>,
    pub link_width: f32,
    pub texts: Vec<TextDraw>,
}

/// Build the frame plan for one simulation snapshot.
pub fn plan(
    cfg: &ResolvedConfig,
    particles: &[Particle],
    size: Vec2,
    pointer: PointerSnapshot,
) -> FramePlan {
    let mut out = FramePlan {
        width: size.x,
        height: size.y,
        backdrop: backdrop_fill(cfg),
        trail: cfg.movement.trail.enable,
        link_width: cfg.connect.width,
        ..FramePlan::default()
    };

    // Glow pass first so sharp fills layer on top of every halo.
    if let Some(glow) = &cfg.glow {
        for p in particles {
            let center = p.pos + parallax_offset(cfg, pointer, size, p);
            let shape = match cfg.shape.choose(p.shape_index) {
                ShapeChoice::Sdf(shape) => *shape,
                // Glyphs get a soft round halo; there is no SDF to blur.
                ShapeChoice::Text(_) => SdfShape::Circle,
            };
            out.instances.push(ShapeInstance {
                center: center.into(),
                size: p.size * glow.scale,
                rotation: p.spin_angle,
                fill_color: p.color.to_rgba(p.display_opacity * glow.intensity),
                border_color: [0.0; 4],
                border_width: 0.0,
                softness: 1.0,
                shape: shape.tag(),
                param: shape.param(),
            });
        }
    }

    // Main pass.
    for p in particles {
        let center = p.pos + parallax_offset(cfg, pointer, size, p);
        match cfg.shape.choose(p.shape_index) {
            ShapeChoice::Sdf(shape) => {
                let fill_alpha = if cfg.fill { p.display_opacity } else { 0.0 };
                let (border_width, border_color) = match &cfg.border {
                    Some(b) => (
                        b.width,
                        b.color.unwrap_or(p.color).to_rgba(p.display_opacity),
                    ),
                    None => (0.0, [0.0; 4]),
                };
                out.instances.push(ShapeInstance {
                    center: center.into(),
                    size: p.size,
                    rotation: p.spin_angle,
                    fill_color: p.color.to_rgba(fill_alpha),
                    border_color,
                    border_width,
                    softness: 0.0,
                    shape: shape.tag(),
                    param: shape.param(),
                });
            }
            ShapeChoice::Text(content) => {
                let px = p.size * 2.0;
                if needs_box(content) {
                    out.instances.push(text_box(cfg, p, center, px, content));
                }
                out.texts.push(TextDraw {
                    center: center.into(),
                    content: content.clone(),
                    px,
                    color: p.color.to_rgba(p.display_opacity),
                });
            }
        }
    }

    connect_pairs(cfg, particles, &mut out);
    out
}

fn backdrop_fill(cfg: &ResolvedConfig) -> Option<[f32; 4]> {
    if cfg.movement.trail.enable {
        // Translucent wash each frame; older pixels fade over ~length frames.
        let fade = (cfg.background_opacity / cfg.movement.trail.length.max(1) as f32)
            .clamp(0.01, 1.0);
        let color = cfg.backdrop.unwrap_or(crate::color::Rgb::new(0, 0, 0));
        return Some(color.to_rgba(fade));
    }
    match cfg.backdrop {
        Some(color) if cfg.background_opacity > 0.0 => {
            Some(color.to_rgba(cfg.background_opacity))
        }
        _ => None,
    }
}

/// Rendered-position offset for pointer parallax. Larger particles sit
/// "closer" and shift more; smoothing dampens the swing. Simulation
/// positions are untouched.
fn parallax_offset(
    cfg: &ResolvedConfig,
    pointer: PointerSnapshot,
    size: Vec2,
    p: &Particle,
) -> Vec2 {
    if !(cfg.hover.enable && cfg.hover.parallax && pointer.hovering) {
        return Vec2::ZERO;
    }
    (pointer.pos - size * 0.5) * (p.size * cfg.hover.force) / (cfg.hover.smoothing * 100.0)
}

/// A glyph run gets a background box only when it is an actual label:
/// more than one character with at least one letter. Single emoji and
/// icon glyphs stay bare.
fn needs_box(content: &str) -> bool {
    content.chars().count() > 1 && content.chars().any(char::is_alphabetic)
}

fn text_box(
    cfg: &ResolvedConfig,
    p: &Particle,
    center: Vec2,
    px: f32,
    content: &str,
) -> ShapeInstance {
    let chars = content.chars().count() as f32;
    let half_h = px * 0.7;
    let half_w = px * 0.32 * chars + px * 0.25;
    let border_color = cfg
        .border
        .as_ref()
        .and_then(|b| b.color)
        .unwrap_or(p.color)
        .to_rgba(p.display_opacity);
    ShapeInstance {
        center: center.into(),
        size: half_h,
        rotation: 0.0,
        fill_color: [0.0, 0.0, 0.0, 0.35 * p.display_opacity],
        border_color,
        border_width: 1.0,
        softness: 0.0,
        shape: SHAPE_RECT_TAG,
        param: half_w / half_h,
    }
}

/// Emit a line for every unordered pair closer than the connect radius.
/// Strictly closer: a pair at exactly the radius draws nothing.
fn connect_pairs(cfg: &ResolvedConfig, particles: &[Particle], out: &mut FramePlan) {
    let radius = cfg.connect.distance;
    if radius <= 0.0 || cfg.connect.opacity <= 0.0 {
        return;
    }
    let radius_sq = radius * radius;
    let color = cfg.connect.color.unwrap_or(cfg.palette[0]);

    for (i, a) in particles.iter().enumerate() {
        for b in &particles[i + 1..] {
            let dist_sq = a.pos.distance_squared(b.pos);
            if dist_sq < radius_sq {
                let dist = dist_sq.sqrt();
                let alpha = cfg.connect.opacity * (1.0 - dist / radius);
                let rgba = color.to_rgba(alpha);
                out.links.push(LinkVertex {
                    pos: a.pos.into(),
                    color: rgba,
                });
                out.links.push(LinkVertex {
                    pos: b.pos.into(),
                    color: rgba,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::config::{ParticleSystemConfig, ShapeConfig};
    use crate::spawn::Spawner;

    const SIZE: Vec2 = Vec2::new(400.0, 300.0);

    fn resolved(mutate: impl FnOnce(&mut ParticleSystemConfig)) -> ResolvedConfig {
        let mut raw = ParticleSystemConfig::default();
        mutate(&mut raw);
        raw.resolve()
    }

    fn particle_at(x: f32, y: f32) -> Particle {
        Particle {
            pos: Vec2::new(x, y),
            vel: Vec2::ZERO,
            color: Rgb::new(200, 100, 50),
            size: 3.0,
            original_size: 3.0,
            opacity: 1.0,
            display_opacity: 1.0,
            twinkle_phase: 0.0,
            gravity_vel: 0.0,
            spin_angle: 0.0,
            shape_index: 0,
        }
    }

    #[test]
    fn test_empty_set_draws_backdrop_only() {
        let cfg = resolved(|c| {
            c.backdrop = Some(crate::color::ColorInput::Text("#101020".into()));
            c.amount = 0;
        });
        let plan = plan(&cfg, &[], SIZE, PointerSnapshot::default());
        assert!(plan.backdrop.is_some());
        assert!(plan.instances.is_empty());
        assert!(plan.links.is_empty());
        assert!(plan.texts.is_empty());
    }

    #[test]
    fn test_zero_background_opacity_skips_backdrop() {
        let cfg = resolved(|c| {
            c.backdrop = Some(crate::color::ColorInput::Text("#101020".into()));
            c.background_opacity = 0.0;
        });
        let plan = plan(&cfg, &[], SIZE, PointerSnapshot::default());
        assert!(plan.backdrop.is_none());
    }

    #[test]
    fn test_connection_boundary_is_strict() {
        let cfg = resolved(|c| c.modes.connect.distance = 100.0);
        let apart_exact = [particle_at(0.0, 0.0), particle_at(100.0, 0.0)];
        let plan_exact = plan(&cfg, &apart_exact, SIZE, PointerSnapshot::default());
        assert!(plan_exact.links.is_empty(), "exactly at radius draws nothing");

        let apart_less = [particle_at(0.0, 0.0), particle_at(99.9, 0.0)];
        let plan_less = plan(&cfg, &apart_less, SIZE, PointerSnapshot::default());
        assert_eq!(plan_less.links.len(), 2);
        assert!(plan_less.links[0].color[3] > 0.0);
    }

    #[test]
    fn test_connection_opacity_scales_with_distance() {
        let cfg = resolved(|c| {
            c.modes.connect.distance = 100.0;
            c.modes.connect.opacity = 1.0;
        });
        let near = plan(
            &cfg,
            &[particle_at(0.0, 0.0), particle_at(10.0, 0.0)],
            SIZE,
            PointerSnapshot::default(),
        );
        let far = plan(
            &cfg,
            &[particle_at(0.0, 0.0), particle_at(90.0, 0.0)],
            SIZE,
            PointerSnapshot::default(),
        );
        assert!(near.links[0].color[3] > far.links[0].color[3]);
        assert!((near.links[0].color[3] - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_glow_pass_precedes_main_pass() {
        let cfg = resolved(|c| {
            c.glow.enable = true;
            c.glow.scale = 2.0;
            c.glow.intensity = 0.5;
        });
        let particles = [particle_at(50.0, 50.0), particle_at(200.0, 200.0)];
        let plan = plan(&cfg, &particles, SIZE, PointerSnapshot::default());
        assert_eq!(plan.instances.len(), 4);
        // First half is the glow pass: scaled up, soft, translucent.
        assert_eq!(plan.instances[0].softness, 1.0);
        assert_eq!(plan.instances[0].size, 6.0);
        assert!((plan.instances[0].fill_color[3] - 0.5).abs() < 1e-5);
        assert_eq!(plan.instances[2].softness, 0.0);
        assert_eq!(plan.instances[2].size, 3.0);
    }

    #[test]
    fn test_border_uses_particle_color_by_default() {
        let cfg = resolved(|c| {
            c.border.enable = true;
            c.border.width = 2.0;
        });
        let particles = [particle_at(50.0, 50.0)];
        let plan = plan(&cfg, &particles, SIZE, PointerSnapshot::default());
        let inst = &plan.instances[0];
        assert_eq!(inst.border_width, 2.0);
        assert_eq!(inst.border_color[0], inst.fill_color[0]);
    }

    #[test]
    fn test_text_boxing_rules() {
        assert!(needs_box("ab"));
        assert!(needs_box("hi!"));
        assert!(!needs_box("a"), "single letters stay bare");
        assert!(!needs_box("❄"), "single emoji stays bare");
        assert!(!needs_box("❄❄"), "no letters, no box");
    }

    #[test]
    fn test_text_shape_emits_draw_and_box() {
        let cfg = resolved(|c| {
            c.shape = ShapeConfig::Text { value: "ok".into() };
        });
        let particles = [particle_at(100.0, 100.0)];
        let labeled = plan(&cfg, &particles, SIZE, PointerSnapshot::default());
        assert_eq!(labeled.texts.len(), 1);
        assert_eq!(labeled.texts[0].content, "ok");
        assert_eq!(labeled.instances.len(), 1, "label gets a background box");
        assert_eq!(labeled.instances[0].shape, SHAPE_RECT_TAG);

        let cfg = resolved(|c| {
            c.shape = ShapeConfig::Text { value: "❄".into() };
        });
        let bare = plan(&cfg, &particles, SIZE, PointerSnapshot::default());
        assert_eq!(bare.texts.len(), 1);
        assert!(bare.instances.is_empty(), "bare glyph, no box");
    }

    #[test]
    fn test_parallax_only_while_hovering() {
        let cfg = resolved(|c| {
            c.hover.enable = true;
            c.hover.parallax = true;
        });
        let particles = [particle_at(100.0, 100.0)];

        let idle = plan(&cfg, &particles, SIZE, PointerSnapshot::default());
        assert_eq!(idle.instances[0].center, [100.0, 100.0]);

        let hovering = PointerSnapshot {
            pos: Vec2::new(400.0, 150.0),
            hovering: true,
        };
        let shifted = plan(&cfg, &particles, SIZE, hovering);
        assert_ne!(shifted.instances[0].center, [100.0, 100.0]);
    }

    #[test]
    fn test_mixed_shapes_assign_stably() {
        let cfg = resolved(|c| {
            c.shape = ShapeConfig::Mixed {
                shapes: vec![ShapeConfig::Circle, ShapeConfig::Star],
            };
        });
        let mut spawner = Spawner::from_seed(21);
        let particles = spawner.spawn_set(&cfg, SIZE, 4);
        let first = plan(&cfg, &particles, SIZE, PointerSnapshot::default());
        let second = plan(&cfg, &particles, SIZE, PointerSnapshot::default());
        let tags: Vec<u32> = first.instances.iter().map(|i| i.shape).collect();
        assert_eq!(tags, vec![0, 5, 0, 5]);
        assert_eq!(
            tags,
            second.instances.iter().map(|i| i.shape).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_trail_wash_replaces_clear() {
        let cfg = resolved(|c| {
            c.movement.trail.enable = true;
            c.movement.trail.length = 20;
            c.backdrop = Some(crate::color::ColorInput::Text("#000000".into()));
        });
        let plan = plan(&cfg, &[], SIZE, PointerSnapshot::default());
        assert!(plan.trail);
        let wash = plan.backdrop.unwrap();
        assert!(wash[3] > 0.0 && wash[3] < 0.2, "wash alpha fades slowly");
    }
}
