use serde::{Deserialize, Serialize};

use crate::library::Track;

/// A named, ordered list of tracks. No two songs satisfy [`Track::is_same_track`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    #[serde(default)]
    pub songs: Vec<Track>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            songs: Vec::new(),
        }
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.songs.iter().any(|s| s.is_same_track(track))
    }
}
