//! Text rendering for the console: help, now-playing status, library and
//! playlist listings. Everything returns `String`s; printing is the caller's job.

use std::time::Duration;

use crate::audio::{PlaybackInfo, PlaybackState};
use crate::config::LibrarySettings;
use crate::library::{Track, display_from_fields};
use crate::playlists::Playlist;

/// Console commands and their help text, in display order.
const CONTROLS: &[(&str, &str)] = &[
    ("ls", "list the library"),
    ("play [i]", "play the library from track i, or resume"),
    ("pause", "pause"),
    ("toggle", "play/pause"),
    ("next/prev", "next/previous song"),
    ("seek <s>", "jump to second s"),
    ("fwd/back <s>", "scrub +/- s seconds"),
    ("status", "show what is playing"),
    ("playlists", "list playlists"),
    ("pl create|delete|show <name>", "manage a playlist"),
    ("pl add <name> <i>", "add library track i"),
    ("pl rm <name> <i>", "remove the playlist's track i"),
    ("pl play <name> [i]", "play a playlist from track i"),
    ("quit", "quit"),
];

/// Render the controls help text.
pub fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("  {k:<30} {v}"))
        .collect::<Vec<String>>()
        .join("\n")
}

/// Format a `Duration` as `MM:SS`.
pub fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// One-line now-playing summary: title, artist, elapsed / total / remaining and state.
pub fn status_line(info: &PlaybackInfo) -> String {
    let Some(track) = info.track.as_ref() else {
        return "No Song".to_string();
    };

    let state = match info.state {
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
        PlaybackState::Stopped => "stopped",
    };
    let position = match info.index {
        Some(i) => format!(" [{}/{}]", i + 1, info.queue_len),
        None => String::new(),
    };

    let mut times = vec![format_mmss(info.position)];
    if !info.duration.is_zero() {
        times.push(format_mmss(info.duration));
        times.push(format!(
            "-{}",
            format_mmss(info.duration.saturating_sub(info.position))
        ));
    }

    format!(
        "{} - {}  {}  ({state}){position}",
        track.title,
        track.artist_or_unknown(),
        times.join(" / ")
    )
}

/// Numbered listing of `tracks`, one per line.
pub fn track_list(tracks: &[Track], settings: &LibrarySettings) -> String {
    if tracks.is_empty() {
        return "(no tracks)".to_string();
    }
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{i:>4}  {}",
                display_from_fields(t, &settings.display_fields, &settings.display_separator)
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn playlist_list(playlists: &[Playlist]) -> String {
    if playlists.is_empty() {
        return "(no playlists)".to_string();
    }
    playlists
        .iter()
        .map(|p| {
            let n = p.songs.len();
            format!("  {} ({n} song{})", p.name, if n == 1 { "" } else { "s" })
        })
        .collect::<Vec<String>>()
        .join("\n")
}
