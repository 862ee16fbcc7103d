use tracing::{debug, info, warn};

use crate::library::Track;

use super::kv::KeyValueStore;
use super::model::Playlist;

/// Storage key holding the whole serialized playlist collection.
pub const PLAYLISTS_KEY: &str = "playlists";

/// CRUD over the playlist collection.
///
/// Every mutation reads the whole collection, changes it in memory and
/// writes it back. Single writer: concurrent mutation is not supported.
pub struct PlaylistStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> PlaylistStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// All playlists in storage order. Missing, unreadable or corrupt data reads as empty.
    pub fn list_all(&self) -> Vec<Playlist> {
        let raw = match self.storage.get(PLAYLISTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read playlists");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "stored playlists are corrupt, treating as empty");
            Vec::new()
        })
    }

    pub fn find(&self, name: &str) -> Option<Playlist> {
        self.list_all().into_iter().find(|p| p.name == name)
    }

    /// Add an empty playlist unless one with the same name exists.
    pub fn create(&mut self, name: &str) {
        let mut playlists = self.list_all();
        if playlists.iter().any(|p| p.name == name) {
            debug!(name, "playlist exists");
            return;
        }
        playlists.push(Playlist::new(name));
        if self.save(&playlists) {
            info!(name, "playlist created");
        }
    }

    /// Append `track` to the named playlist. False if the playlist is missing,
    /// the track is already in it, or the write failed.
    pub fn add_track(&mut self, playlist_name: &str, track: &Track) -> bool {
        let mut playlists = self.list_all();
        let Some(playlist) = playlists.iter_mut().find(|p| p.name == playlist_name) else {
            return false;
        };
        if playlist.contains(track) {
            return false;
        }
        playlist.songs.push(track.clone());
        self.save(&playlists)
    }

    /// Remove every entry matching `track`. True if something was removed and persisted.
    pub fn remove_track(&mut self, playlist_name: &str, track: &Track) -> bool {
        let mut playlists = self.list_all();
        let Some(playlist) = playlists.iter_mut().find(|p| p.name == playlist_name) else {
            return false;
        };
        let before = playlist.songs.len();
        playlist.songs.retain(|s| !s.is_same_track(track));
        if playlist.songs.len() == before {
            return false;
        }
        self.save(&playlists)
    }

    pub fn delete(&mut self, playlist_name: &str) {
        let mut playlists = self.list_all();
        let before = playlists.len();
        playlists.retain(|p| p.name != playlist_name);
        if playlists.len() != before && self.save(&playlists) {
            info!(name = playlist_name, "playlist deleted");
        }
    }

    fn save(&mut self, playlists: &[Playlist]) -> bool {
        let json = match serde_json::to_string(playlists) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "could not serialize playlists");
                return false;
            }
        };
        match self.storage.put(PLAYLISTS_KEY, json) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "could not write playlists");
                false
            }
        }
    }
}
