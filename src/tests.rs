//! Test utils.

use crate::{
    config::SimConfig,
    domain::{Environment, PlacementRules, Position},
    engine::Scene,
    noise::NoiseGenerator,
};

pub const SEED: u64 = 42;

/// Default configuration without sensor noise and with a fixed seed.
pub fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.imu.noise_stddev = 0.0;
    config.encoders.noise_stddev = 0.0;
    config.random_seed = SEED;
    config
}

pub fn scene(environment: Environment) -> Scene {
    Scene::new(
        environment,
        PlacementRules::default(),
        NoiseGenerator::new(SEED),
    )
}

/// Empty default arena.
pub fn open_scene() -> Scene {
    scene(Environment::default())
}

/// Renders the occupancy of `environment` sampled at the center of `cell`-sized cells, top row
/// first: `#` is inside an obstacle, `.` is free.
pub fn plot_occupancy(environment: &Environment, cell: f64) -> String {
    let arena = environment.arena();
    let columns = (arena.width() / cell).round() as usize;
    let rows = (arena.height() / cell).round() as usize;
    (0..rows)
        .map(|row| {
            let y = arena.y_max - (row as f64 + 0.5) * cell;
            (0..columns)
                .map(|column| {
                    let x = arena.x_min + (column as f64 + 0.5) * cell;
                    if environment.is_occupied(Position::new(x, y)) {
                        '#'
                    } else {
                        '.'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
