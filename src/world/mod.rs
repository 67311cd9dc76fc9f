pub mod area;
pub mod creatures;
pub mod cron;
pub mod events;
pub mod game_data;
mod lifecycle;
pub mod loot;
pub mod players;
pub mod position;
pub mod state;
pub mod time;
pub mod trader;
pub mod tribes;
pub mod wander;
