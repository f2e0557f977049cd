use plexa::prelude::*;

fn main() {
    env_logger::init();

    // Load a config from the first argument, or fall back to a lively
    // default backdrop.
    let config = match std::env::args().nth(1) {
        Some(path) => match ParticleSystemConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => {
            let mut config = ParticleSystemConfig::default();
            config.backdrop = Some(ColorInput::Text("#0b1020".into()));
            config.amount = 120;
            config.size = Distribution::Range { min: 1.5, max: 4.0 };
            config.modes.connect.distance = 120.0;
            config.hover.enable = true;
            config.hover.mode = HoverMode::Grab;
            config.click.enable = true;
            config
        }
    };

    if let Err(e) = plexa::run_window(config) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
