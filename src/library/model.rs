use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// A playable audio item, as loaded from the library and as persisted inside playlists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: Option<String>,
    /// Locator of the audio content: a filesystem path or a `file://` URI.
    pub data: String,
    /// Locator of the artwork, if any.
    pub image: Option<String>,
}

impl Track {
    /// Two tracks are the same if they share an id, or share both title and data locator.
    pub fn is_same_track(&self, other: &Track) -> bool {
        self.id == other.id || (self.title == other.title && self.data == other.data)
    }

    /// Filesystem path behind the data locator.
    pub fn path(&self) -> PathBuf {
        locator_to_path(&self.data)
    }

    pub fn artist_or_unknown(&self) -> &str {
        self.artist
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or("Unknown Artist")
    }
}

/// Resolve a data locator into a path. `file:` URIs are decoded, anything that
/// does not parse as an absolute URI is taken as a plain path.
pub fn locator_to_path(locator: &str) -> PathBuf {
    match Url::parse(locator) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .unwrap_or_else(|()| PathBuf::from(url.path())),
        _ => PathBuf::from(locator),
    }
}

/// Stable track id derived from the file path (64-bit FNV-1a), so the same file keeps
/// its id across scans and restarts.
pub fn track_id_for(path: &Path) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    path.to_string_lossy()
        .bytes()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}
