use std::path::{Path, PathBuf};

use lofty::prelude::{Accessor, TaggedFileExt};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::{Track, track_id_for};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// First configured artwork file that exists next to `path`.
fn find_artwork(path: &Path, settings: &LibrarySettings) -> Option<PathBuf> {
    let dir = path.parent()?;
    settings
        .artwork_names
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Walk `dir` and build a `Track` for every audio file, sorted by display text.
///
/// Unreadable tags are not an error: the file stem becomes the title.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<(String, Track)> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !(path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings))
        {
            continue;
        }

        let mut title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut artist: Option<String> = None;

        match lofty::read_from_path(path) {
            Ok(tagged) => {
                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    if let Some(v) = tag.title() {
                        if !v.trim().is_empty() {
                            title = v.to_string();
                        }
                    }
                    if let Some(v) = tag.artist() {
                        let v = v.trim();
                        if !v.is_empty() {
                            artist = Some(v.to_string());
                        }
                    }
                }
            }
            Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
        }

        let track = Track {
            id: track_id_for(path),
            title,
            artist,
            data: path.to_string_lossy().into_owned(),
            image: find_artwork(path, settings).map(|p| p.to_string_lossy().into_owned()),
        };
        let display = display_from_fields(
            &track,
            &settings.display_fields,
            &settings.display_separator,
        );
        tracks.push((display.to_lowercase(), track));
    }

    tracks.sort_by(|a, b| a.0.cmp(&b.0));
    tracks.into_iter().map(|(_, t)| t).collect()
}
