//! Configuration types for particle systems.
//!
//! These types mirror what a host hands us: a declarative, possibly
//! partial document. Every field carries a serde default so a sparse
//! JSON config deserializes cleanly, and [`ParticleSystemConfig::resolve`]
//! normalizes the whole thing into canonical values (colors resolved,
//! distributions turned into samplers, invariants clamped). Resolution
//! never fails; malformed fields fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{resolve_palette, ColorInput, Rgb};

fn default_true() -> bool {
    true
}

fn default_amount() -> u32 {
    50
}

fn default_background_opacity() -> f32 {
    1.0
}

fn default_size() -> Distribution {
    Distribution::Fixed(3.0)
}

fn default_opacity() -> Distribution {
    Distribution::Fixed(0.8)
}

/// Complete particle system configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSystemConfig {
    /// Backdrop fill behind the particles. `None` leaves the surface
    /// transparent.
    pub backdrop: Option<ColorInput>,
    #[serde(default = "default_background_opacity")]
    pub background_opacity: f32,
    /// Single particle color. Ignored when `palette` is non-empty.
    pub color: Option<ColorInput>,
    /// Color palette; particles cycle through it at spawn.
    pub palette: Vec<ColorInput>,
    #[serde(default = "default_amount")]
    pub amount: u32,
    #[serde(default = "default_size")]
    pub size: Distribution,
    #[serde(default = "default_opacity")]
    pub opacity: Distribution,
    pub shape: ShapeConfig,
    pub fill: FillConfig,
    pub border: BorderConfig,
    pub glow: GlowConfig,
    pub twinkle: TwinkleConfig,
    pub modes: InteractionModes,
    #[serde(rename = "move")]
    pub movement: MoveConfig,
    pub click: ClickConfig,
    pub hover: HoverConfig,
}

impl Default for ParticleSystemConfig {
    fn default() -> Self {
        Self {
            backdrop: None,
            background_opacity: default_background_opacity(),
            color: None,
            palette: Vec::new(),
            amount: default_amount(),
            size: default_size(),
            opacity: default_opacity(),
            shape: ShapeConfig::default(),
            fill: FillConfig::default(),
            border: BorderConfig::default(),
            glow: GlowConfig::default(),
            twinkle: TwinkleConfig::default(),
            modes: InteractionModes::default(),
            movement: MoveConfig::default(),
            click: ClickConfig::default(),
            hover: HoverConfig::default(),
        }
    }
}

impl ParticleSystemConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Normalize into canonical values. Pure; never fails.
    pub fn resolve(&self) -> ResolvedConfig {
        ResolvedConfig::from_raw(self)
    }
}

/// How a per-particle attribute is sampled at spawn.
///
/// Deserializes from a bare number (fixed), a `{min, max}` object
/// (range), or a bucket name (`"small"`, `"solid"`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distribution {
    Fixed(f32),
    Range { min: f32, max: f32 },
    Named(String),
}

impl Default for Distribution {
    fn default() -> Self {
        Distribution::Fixed(1.0)
    }
}

/// Named buckets for size distributions, in logical pixels.
const SIZE_BUCKETS: &[(&str, f32, f32)] = &[
    ("fine", 1.0, 2.0),
    ("small", 2.0, 4.0),
    ("medium", 3.0, 6.0),
    ("large", 6.0, 12.0),
    ("huge", 12.0, 24.0),
];

/// Named buckets for opacity distributions.
const OPACITY_BUCKETS: &[(&str, f32, f32)] = &[
    ("faint", 0.1, 0.3),
    ("soft", 0.3, 0.6),
    ("solid", 0.8, 1.0),
];

impl Distribution {
    /// Resolve against a bucket table. Unknown bucket names and inverted
    /// ranges fall back to sane values rather than failing.
    fn resolve(&self, buckets: &[(&str, f32, f32)], fallback: f32) -> Sampler {
        match self {
            Distribution::Fixed(v) => Sampler::fixed(*v),
            Distribution::Range { min, max } => Sampler::range(*min, *max),
            Distribution::Named(name) => {
                let key = name.trim().to_ascii_lowercase();
                buckets
                    .iter()
                    .find(|(n, _, _)| *n == key)
                    .map(|(_, min, max)| Sampler::range(*min, *max))
                    .unwrap_or_else(|| Sampler::fixed(fallback))
            }
        }
    }
}

/// A resolved distribution: a `[min, max]` interval sampled uniformly.
/// Fixed values are the degenerate `min == max` case, so spawning never
/// re-branches on the original variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampler {
    pub min: f32,
    pub max: f32,
}

impl Sampler {
    pub fn fixed(v: f32) -> Self {
        Self { min: v, max: v }
    }

    pub fn range(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    fn clamped(self, lo: f32, hi: f32) -> Self {
        Self {
            min: self.min.clamp(lo, hi),
            max: self.max.clamp(lo, hi),
        }
    }
}

/// Particle shape descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeConfig {
    #[default]
    Circle,
    Square,
    Triangle,
    Diamond,
    Hexagon,
    Star,
    Polygon {
        sides: u32,
    },
    Text {
        value: String,
    },
    /// Per-particle deterministic pick among a subset of shapes.
    Mixed {
        shapes: Vec<ShapeConfig>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    #[serde(default = "default_true")]
    pub enable: bool,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self { enable: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    pub enable: bool,
    pub width: f32,
    /// Border color; `None` uses the particle's own color.
    pub color: Option<ColorInput>,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            enable: false,
            width: 1.0,
            color: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
    pub enable: bool,
    /// Glow alpha relative to the particle's opacity.
    pub intensity: f32,
    /// Glow radius as a multiple of the particle size.
    pub scale: f32,
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            enable: false,
            intensity: 0.5,
            scale: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinkleConfig {
    pub enable: bool,
    /// Phase advance per 60 Hz reference frame, in radians.
    pub speed: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
}

impl Default for TwinkleConfig {
    fn default() -> Self {
        Self {
            enable: false,
            speed: 0.05,
            min_opacity: 0.1,
            max_opacity: 1.0,
        }
    }
}

/// Distance thresholds and strengths for the pointer interaction modes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InteractionModes {
    pub connect: ConnectMode,
    pub grab: GrabMode,
    pub bubble: BubbleMode,
    pub repulse: RepulseMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectMode {
    pub distance: f32,
    pub width: f32,
    /// Base line opacity; actual opacity fades with pair distance.
    pub opacity: f32,
    /// Line color; `None` uses the first palette color.
    pub color: Option<ColorInput>,
}

impl Default for ConnectMode {
    fn default() -> Self {
        Self {
            distance: 100.0,
            width: 1.0,
            opacity: 0.6,
            color: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabMode {
    pub distance: f32,
}

impl Default for GrabMode {
    fn default() -> Self {
        Self { distance: 140.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleMode {
    pub distance: f32,
    /// Size a fully-bubbled particle grows toward, in logical pixels.
    pub size: f32,
}

impl Default for BubbleMode {
    fn default() -> Self {
        Self {
            distance: 200.0,
            size: 40.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepulseMode {
    pub distance: f32,
    pub strength: f32,
}

impl Default for RepulseMode {
    fn default() -> Self {
        Self {
            distance: 100.0,
            strength: 100.0,
        }
    }
}

/// Movement configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveConfig {
    #[serde(default = "default_true")]
    pub enable: bool,
    pub direction: MoveDirection,
    pub speed: f32,
    pub gravity: GravityConfig,
    pub spin: SpinConfig,
    pub attract: AttractConfig,
    pub vibrate: VibrateConfig,
    pub trail: TrailConfig,
    pub boundary: BoundaryPolicy,
    /// Stop (or loop) after this many milliseconds; 0 disables the limit.
    pub time_limit_ms: f32,
    pub loop_animation: bool,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            enable: true,
            direction: MoveDirection::Random,
            speed: 2.0,
            gravity: GravityConfig::default(),
            spin: SpinConfig::default(),
            attract: AttractConfig::default(),
            vibrate: VibrateConfig::default(),
            trail: TrailConfig::default(),
            boundary: BoundaryPolicy::Out,
            time_limit_ms: 0.0,
            loop_animation: false,
        }
    }
}

/// Initial travel direction. Compass directions in surface coordinates
/// (y grows downward, so `Top` is negative y).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MoveDirection {
    None,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
    #[default]
    Random,
}

impl MoveDirection {
    /// Unit base vector, or `None` for the random direction.
    pub fn base_vector(&self) -> Option<(f32, f32)> {
        const D: f32 = std::f32::consts::FRAC_1_SQRT_2;
        match self {
            MoveDirection::None => Some((0.0, 0.0)),
            MoveDirection::Top => Some((0.0, -1.0)),
            MoveDirection::TopRight => Some((D, -D)),
            MoveDirection::Right => Some((1.0, 0.0)),
            MoveDirection::BottomRight => Some((D, D)),
            MoveDirection::Bottom => Some((0.0, 1.0)),
            MoveDirection::BottomLeft => Some((-D, D)),
            MoveDirection::Left => Some((-1.0, 0.0)),
            MoveDirection::TopLeft => Some((-D, -D)),
            MoveDirection::Random => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    pub enable: bool,
    /// Downward acceleration, in logical px/s^2.
    pub acceleration: f32,
    /// Optional; flips the pull upward. Defaults to off.
    pub reverse: bool,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            enable: false,
            acceleration: 9.81,
            reverse: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinConfig {
    pub enable: bool,
    pub speed: f32,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            enable: false,
            speed: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractConfig {
    pub enable: bool,
    pub distance: f32,
}

impl Default for AttractConfig {
    fn default() -> Self {
        Self {
            enable: false,
            distance: 200.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibrateConfig {
    pub enable: bool,
    /// Wobble frequency in Hz.
    pub frequency: f32,
}

impl Default for VibrateConfig {
    fn default() -> Self {
        Self {
            enable: false,
            frequency: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub enable: bool,
    /// Fade length in frames; longer trails fade slower.
    pub length: u32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            enable: false,
            length: 10,
        }
    }
}

/// What happens when a particle crosses the viewport edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    Bounce,
    #[default]
    Out,
    Destroy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClickConfig {
    pub enable: bool,
    pub mode: ClickMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClickMode {
    #[default]
    Push,
    Remove,
    Repulse,
    Attract,
    Bubble,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    pub enable: bool,
    pub mode: HoverMode,
    /// Offset rendered positions against pointer movement for depth.
    pub parallax: bool,
    pub force: f32,
    pub smoothing: f32,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            enable: false,
            mode: HoverMode::Grab,
            parallax: false,
            force: 10.0,
            smoothing: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HoverMode {
    #[default]
    Grab,
    Repulse,
    Bubble,
    Attract,
}

// ============================================================================
// Resolved (canonical) configuration
// ============================================================================

/// Shapes the SDF rasterizer knows how to draw. `tag`/`param` feed the
/// shape dispatcher in the shader; see `gpu/shader.wgsl`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SdfShape {
    Circle,
    Square,
    Triangle,
    Diamond,
    Hexagon,
    Star,
    Polygon(u32),
}

impl SdfShape {
    #[inline]
    pub fn tag(&self) -> u32 {
        match self {
            SdfShape::Circle => 0,
            SdfShape::Square => 1,
            SdfShape::Triangle => 2,
            SdfShape::Diamond => 3,
            SdfShape::Hexagon => 4,
            SdfShape::Star => 5,
            SdfShape::Polygon(_) => 6,
        }
    }

    #[inline]
    pub fn param(&self) -> f32 {
        match self {
            SdfShape::Polygon(sides) => (*sides).max(3) as f32,
            _ => 0.0,
        }
    }
}

/// One concrete per-particle shape choice.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeChoice {
    Sdf(SdfShape),
    Text(String),
}

/// Normalized shape descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedShape {
    One(ShapeChoice),
    Mixed(Vec<ShapeChoice>),
}

impl ResolvedShape {
    /// The shape for a given particle. Mixed shapes pick by spawn index,
    /// so the choice is stable across frames.
    pub fn choose(&self, index: usize) -> &ShapeChoice {
        match self {
            ResolvedShape::One(choice) => choice,
            ResolvedShape::Mixed(choices) => &choices[index % choices.len()],
        }
    }

    fn from_raw(raw: &ShapeConfig) -> ResolvedShape {
        match raw {
            ShapeConfig::Mixed { shapes } => {
                // Nested `mixed` entries are dropped rather than recursed.
                let choices: Vec<ShapeChoice> = shapes
                    .iter()
                    .filter(|s| !matches!(s, ShapeConfig::Mixed { .. }))
                    .map(Self::simple_choice)
                    .collect();
                if choices.is_empty() {
                    ResolvedShape::One(ShapeChoice::Sdf(SdfShape::Circle))
                } else {
                    ResolvedShape::Mixed(choices)
                }
            }
            other => ResolvedShape::One(Self::simple_choice(other)),
        }
    }

    fn simple_choice(raw: &ShapeConfig) -> ShapeChoice {
        match raw {
            ShapeConfig::Circle => ShapeChoice::Sdf(SdfShape::Circle),
            ShapeConfig::Square => ShapeChoice::Sdf(SdfShape::Square),
            ShapeConfig::Triangle => ShapeChoice::Sdf(SdfShape::Triangle),
            ShapeConfig::Diamond => ShapeChoice::Sdf(SdfShape::Diamond),
            ShapeConfig::Hexagon => ShapeChoice::Sdf(SdfShape::Hexagon),
            ShapeConfig::Star => ShapeChoice::Sdf(SdfShape::Star),
            ShapeConfig::Polygon { sides } => ShapeChoice::Sdf(SdfShape::Polygon((*sides).max(3))),
            ShapeConfig::Text { value } => ShapeChoice::Text(value.clone()),
            ShapeConfig::Mixed { .. } => ShapeChoice::Sdf(SdfShape::Circle),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedBorder {
    pub width: f32,
    pub color: Option<Rgb>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedGlow {
    pub intensity: f32,
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedTwinkle {
    pub speed: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedConnect {
    pub distance: f32,
    pub width: f32,
    pub opacity: f32,
    pub color: Option<Rgb>,
}

/// Hover settings, always materialized so click impulses can reuse the
/// force/smoothing values even when hover itself is off.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedHover {
    pub enable: bool,
    pub mode: HoverMode,
    pub parallax: bool,
    pub force: f32,
    pub smoothing: f32,
}

/// Canonical configuration consumed by the spawner, simulator and
/// renderer. Produced by [`ParticleSystemConfig::resolve`]; every value
/// here already satisfies its invariant.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub backdrop: Option<Rgb>,
    pub background_opacity: f32,
    pub palette: Vec<Rgb>,
    pub amount: usize,
    pub size: Sampler,
    pub opacity: Sampler,
    pub shape: ResolvedShape,
    pub fill: bool,
    pub border: Option<ResolvedBorder>,
    pub glow: Option<ResolvedGlow>,
    pub twinkle: Option<ResolvedTwinkle>,
    pub connect: ResolvedConnect,
    pub grab_distance: f32,
    pub bubble_distance: f32,
    pub bubble_size: f32,
    pub repulse_distance: f32,
    pub repulse_strength: f32,
    pub movement: MoveConfig,
    pub click: Option<ClickMode>,
    pub hover: ResolvedHover,
}

const MIN_SIZE: f32 = 0.1;

impl ResolvedConfig {
    fn from_raw(raw: &ParticleSystemConfig) -> Self {
        let mut movement = raw.movement.clone();
        movement.speed = movement.speed.max(0.0);
        movement.gravity.acceleration = movement.gravity.acceleration.max(0.0);
        movement.attract.distance = movement.attract.distance.max(0.0);
        movement.time_limit_ms = movement.time_limit_ms.max(0.0);

        let twinkle = raw.twinkle.enable.then(|| {
            let lo = raw.twinkle.min_opacity.clamp(0.0, 1.0);
            let hi = raw.twinkle.max_opacity.clamp(0.0, 1.0);
            let (min_opacity, max_opacity) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            ResolvedTwinkle {
                speed: raw.twinkle.speed.max(0.0),
                min_opacity,
                max_opacity,
            }
        });

        Self {
            backdrop: raw.backdrop.as_ref().map(Rgb::resolve),
            background_opacity: raw.background_opacity.clamp(0.0, 1.0),
            palette: resolve_palette(&raw.palette, raw.color.as_ref()),
            amount: raw.amount as usize,
            size: raw
                .size
                .resolve(SIZE_BUCKETS, 3.0)
                .clamped(MIN_SIZE, f32::MAX),
            opacity: raw.opacity.resolve(OPACITY_BUCKETS, 0.8).clamped(0.0, 1.0),
            shape: ResolvedShape::from_raw(&raw.shape),
            fill: raw.fill.enable,
            border: raw.border.enable.then(|| ResolvedBorder {
                width: raw.border.width.max(0.0),
                color: raw.border.color.as_ref().map(Rgb::resolve),
            }),
            glow: raw.glow.enable.then(|| ResolvedGlow {
                intensity: raw.glow.intensity.clamp(0.0, 1.0),
                scale: raw.glow.scale.max(1.0),
            }),
            twinkle,
            connect: ResolvedConnect {
                distance: raw.modes.connect.distance.max(0.0),
                width: raw.modes.connect.width.max(0.0),
                opacity: raw.modes.connect.opacity.clamp(0.0, 1.0),
                color: raw.modes.connect.color.as_ref().map(Rgb::resolve),
            },
            grab_distance: raw.modes.grab.distance.max(0.0),
            bubble_distance: raw.modes.bubble.distance.max(0.0),
            bubble_size: raw.modes.bubble.size.max(MIN_SIZE),
            repulse_distance: raw.modes.repulse.distance.max(0.0),
            repulse_strength: raw.modes.repulse.strength.max(0.0),
            movement,
            click: raw.click.enable.then_some(raw.click.mode),
            hover: ResolvedHover {
                enable: raw.hover.enable,
                mode: raw.hover.mode,
                parallax: raw.hover.parallax,
                force: raw.hover.force.max(0.0),
                smoothing: raw.hover.smoothing.max(1.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_deserializes() {
        let cfg: ParticleSystemConfig =
            serde_json::from_str(r#"{"amount": 12, "move": {"speed": 4.0}}"#).unwrap();
        assert_eq!(cfg.amount, 12);
        assert_eq!(cfg.movement.speed, 4.0);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.movement.boundary, BoundaryPolicy::Out);
        assert!(!cfg.twinkle.enable);
    }

    #[test]
    fn test_distribution_forms() {
        let fixed: Distribution = serde_json::from_str("2.5").unwrap();
        assert_eq!(fixed, Distribution::Fixed(2.5));

        let range: Distribution = serde_json::from_str(r#"{"min":1.0,"max":4.0}"#).unwrap();
        assert_eq!(range, Distribution::Range { min: 1.0, max: 4.0 });

        let named: Distribution = serde_json::from_str("\"large\"").unwrap();
        assert_eq!(named, Distribution::Named("large".into()));
    }

    #[test]
    fn test_inverted_range_swaps() {
        let s = Distribution::Range { min: 5.0, max: 2.0 }.resolve(SIZE_BUCKETS, 3.0);
        assert_eq!(s, Sampler { min: 2.0, max: 5.0 });
    }

    #[test]
    fn test_unknown_bucket_falls_back() {
        let s = Distribution::Named("colossal".into()).resolve(SIZE_BUCKETS, 3.0);
        assert_eq!(s, Sampler::fixed(3.0));

        let s = Distribution::Named("Large".into()).resolve(SIZE_BUCKETS, 3.0);
        assert_eq!(s, Sampler { min: 6.0, max: 12.0 });
    }

    #[test]
    fn test_resolve_clamps_invariants() {
        let mut raw = ParticleSystemConfig::default();
        raw.movement.speed = -3.0;
        raw.opacity = Distribution::Range { min: -1.0, max: 2.0 };
        raw.size = Distribution::Fixed(0.0);
        raw.twinkle.enable = true;
        raw.twinkle.min_opacity = 0.9;
        raw.twinkle.max_opacity = 0.2;

        let cfg = raw.resolve();
        assert_eq!(cfg.movement.speed, 0.0);
        assert_eq!(cfg.opacity, Sampler { min: 0.0, max: 1.0 });
        assert!(cfg.size.min > 0.0);
        let tw = cfg.twinkle.unwrap();
        assert!(tw.min_opacity <= tw.max_opacity);
    }

    #[test]
    fn test_mixed_shape_normalization() {
        let raw = ShapeConfig::Mixed {
            shapes: vec![
                ShapeConfig::Star,
                ShapeConfig::Mixed { shapes: vec![ShapeConfig::Square] },
                ShapeConfig::Polygon { sides: 2 },
            ],
        };
        let resolved = ResolvedShape::from_raw(&raw);
        match &resolved {
            ResolvedShape::Mixed(choices) => {
                assert_eq!(choices.len(), 2);
                assert_eq!(choices[0], ShapeChoice::Sdf(SdfShape::Star));
                // Degenerate polygons round up to triangles.
                assert_eq!(choices[1], ShapeChoice::Sdf(SdfShape::Polygon(3)));
            }
            other => panic!("expected mixed, got {:?}", other),
        }
        // Stable pick by index.
        assert_eq!(resolved.choose(0), resolved.choose(2));
    }

    #[test]
    fn test_empty_mixed_becomes_circle() {
        let resolved = ResolvedShape::from_raw(&ShapeConfig::Mixed { shapes: vec![] });
        assert_eq!(resolved, ResolvedShape::One(ShapeChoice::Sdf(SdfShape::Circle)));
    }

    #[test]
    fn test_direction_vectors() {
        assert_eq!(MoveDirection::Bottom.base_vector(), Some((0.0, 1.0)));
        assert_eq!(MoveDirection::Top.base_vector(), Some((0.0, -1.0)));
        assert_eq!(MoveDirection::Random.base_vector(), None);
        let (x, y) = MoveDirection::TopLeft.base_vector().unwrap();
        assert!((x * x + y * y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_config_round_trip() {
        let mut cfg = ParticleSystemConfig::default();
        cfg.shape = ShapeConfig::Text { value: "❄".into() };
        cfg.click.enable = true;
        cfg.click.mode = ClickMode::Remove;
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ParticleSystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
