//! Settings for the player: library scanning, playback polling, playlist
//! storage location, MPRIS and logging.
//!
//! `Settings::load` merges defaults, an optional TOML file and `ENCORE__*`
//! environment variables.

mod load;
mod schema;

pub use schema::*;
