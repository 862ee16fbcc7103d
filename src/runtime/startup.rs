use std::env;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config;
use crate::playlists::{FilePreferences, KeyValueStore, MemoryPreferences, PlaylistStore};

pub type Store = PlaylistStore<Box<dyn KeyValueStore>>;

/// Library root: first positional argument, else `library.dir`, else the current directory.
pub fn library_dir(arg: Option<String>, settings: &config::Settings) -> PathBuf {
    arg.map(PathBuf::from)
        .or_else(|| settings.library.dir.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("Music"))
}

/// Playlist store over the preferences file in the data directory, or an
/// in-memory store when no data directory can be determined.
pub fn open_store(settings: &config::Settings) -> Store {
    match settings.data_dir() {
        Some(dir) => {
            let prefs = FilePreferences::new(dir.join(&settings.storage.preferences_file));
            info!(path = %prefs.path().display(), "playlists file");
            PlaylistStore::new(Box::new(prefs))
        }
        None => {
            warn!("no data directory, playlists will not be saved");
            PlaylistStore::new(Box::new(MemoryPreferences::default()))
        }
    }
}
