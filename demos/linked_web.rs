//! Network/web visualization: connection lines between nearby particles,
//! with repulse on hover and push on click.
//!
//! Run with: `cargo run --example linked_web`

use plexa::prelude::*;

fn main() {
    env_logger::init();

    let mut config = ParticleSystemConfig::default();
    config.backdrop = Some(ColorInput::Text("#10141c".into()));
    config.color = Some(ColorInput::Text("#9ec9ff".into()));
    config.amount = 110;
    config.movement.speed = 1.2;
    config.movement.boundary = BoundaryPolicy::Bounce;
    config.modes.connect.distance = 130.0;
    config.modes.connect.opacity = 0.5;
    config.hover.enable = true;
    config.hover.mode = HoverMode::Repulse;
    config.modes.repulse.distance = 120.0;
    config.click.enable = true;
    config.click.mode = ClickMode::Push;

    plexa::run_window(config).unwrap();
}
