mod config;
pub mod combat;
pub mod entities;
pub mod net;
pub mod telemetry;
pub mod world;

pub use config::AppConfig;
pub use net::server::{GameServerConfig, ServerControl};
pub use world::state::World;

use std::sync::Arc;

pub fn run(args: &[String]) -> Result<(), String> {
    let config = AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root)?;

    let data = match config.data_file.as_ref() {
        Some(path) => world::game_data::GameData::load(path)?,
        None => world::game_data::GameData::builtin()?,
    };
    let seed = config.seed.unwrap_or_else(time_seed);
    println!("wildwood: game data");
    println!("- items: {}", data.items.len());
    println!("- shop entries: {}", data.shop.len());
    println!("- creature kinds: {}", data.creatures.len());
    println!("- seed: {}", seed);

    let mut world = World::new(Arc::new(data), seed);
    let tribes = world.populate(world::time::Millis(0), config.tribe_multiplier);
    println!(
        "- tribes: {} ({} creatures)",
        tribes,
        world.creature_count()
    );
    telemetry::logging::log_game(&format!("world seeded with {}", seed));

    let server_config = GameServerConfig {
        bind_addr: config.bind_addr.clone(),
        tick_period: config.tick_period,
        ws_allowed_origins: config.ws_allowed_origins.clone(),
        ..GameServerConfig::default()
    };
    let listener = net::server::bind(&server_config)?;
    let control = Arc::new(ServerControl::new());
    net::server::serve(listener, server_config, world, control)
}

fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}
