//! User playlists persisted as one serialized collection in key-value storage.

mod kv;
mod model;
mod store;

pub use kv::{FilePreferences, KeyValueStore, MemoryPreferences};
pub use model::Playlist;
pub use store::{PLAYLISTS_KEY, PlaylistStore};
