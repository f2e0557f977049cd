//! Glowing drifting particles over a dark backdrop.
//!
//! Demonstrates glow, twinkle, and a color palette.
//!
//! Run with: `cargo run --example nebula`

use plexa::prelude::*;

fn main() {
    env_logger::init();

    let mut config = ParticleSystemConfig::default();
    config.backdrop = Some(ColorInput::Text("#05060f".into()));
    config.amount = 90;
    config.palette = vec![
        ColorInput::Text("#7aa2ff".into()),
        ColorInput::Text("#c084fc".into()),
        ColorInput::Text("#67e8f9".into()),
    ];
    config.size = Distribution::Range { min: 1.5, max: 5.0 };
    config.opacity = Distribution::Named("soft".into());
    config.movement.speed = 0.6;
    config.glow.enable = true;
    config.glow.scale = 3.0;
    config.twinkle.enable = true;
    config.twinkle.speed = 0.08;
    config.twinkle.min_opacity = 0.2;
    config.twinkle.max_opacity = 0.9;

    plexa::run_window(config).unwrap();
}
