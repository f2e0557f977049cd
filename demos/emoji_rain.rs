//! Text-shaped particles falling under gravity and wrapping at the
//! bottom edge.
//!
//! Run with: `cargo run --example emoji_rain`

use plexa::prelude::*;

fn main() {
    env_logger::init();

    let mut config = ParticleSystemConfig::default();
    config.backdrop = Some(ColorInput::Text("#101820".into()));
    config.amount = 60;
    config.shape = ShapeConfig::Text { value: "❄".into() };
    config.size = Distribution::Range { min: 4.0, max: 9.0 };
    config.movement.direction = MoveDirection::Bottom;
    config.movement.speed = 1.0;
    config.movement.gravity.enable = true;
    config.movement.gravity.acceleration = 4.0;
    config.movement.boundary = BoundaryPolicy::Out;

    plexa::run_window(config).unwrap();
}
