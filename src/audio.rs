//! Playback: the player capability, the session manager wrapping it, the
//! queue service, and the owner thread that runs them.

mod backend;
mod player;
mod service;
mod session;
mod sink;
mod thread;
mod types;

#[cfg(test)]
pub use backend::MediaBackend;
pub use player::AudioPlayer;
pub use types::{AudioCmd, PlaybackInfo, PlaybackState};

#[cfg(test)]
mod tests;
