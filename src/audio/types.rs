//! Audio-related small types and handles.
//!
//! This module defines the playback command surface, the lifecycle state of
//! the player handle and the snapshot shared with the console and MPRIS.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::library::Track;

/// Lifecycle of the player handle owned by the session manager.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// No source loaded.
    #[default]
    Idle,
    /// A source is loaded but not running (not yet started, or played to the end).
    Loaded,
    Playing,
    Paused,
    /// The handle faulted; `reset` rebuilds it and returns to `Idle`.
    Invalid,
}

/// Playback state as seen from outside the playback thread.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl From<PlayerState> for PlaybackState {
    fn from(state: PlayerState) -> Self {
        match state {
            PlayerState::Playing => Self::Playing,
            PlayerState::Paused | PlayerState::Loaded => Self::Paused,
            PlayerState::Idle | PlayerState::Invalid => Self::Stopped,
        }
    }
}

/// Discrete commands accepted by the playback thread.
#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the queue and play from `start_index`, or, without a queue,
    /// resume a paused track / replay the track under the cursor.
    Play {
        queue: Option<Vec<Track>>,
        start_index: usize,
    },
    /// Pause playback.
    Pause,
    /// Toggle pause/resume.
    TogglePause,
    /// Next track; stops at the end of the queue.
    Next,
    /// Previous track; stops at the start of the queue.
    Prev,
    /// Next track, wrapping to the first one.
    SkipNext,
    /// Previous track, wrapping to the last one.
    SkipPrev,
    /// Seek to an absolute position in milliseconds.
    SeekTo(u64),
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(i64),
    /// Stop the playback thread and release the player.
    Quit,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Runtime playback information shared with the console and MPRIS.
pub struct PlaybackInfo {
    /// Track currently loaded in the player.
    pub track: Option<Track>,
    /// Cursor into the active queue, if a queue is set.
    pub index: Option<usize>,
    pub queue_len: usize,
    pub position: Duration,
    pub duration: Duration,
    pub state: PlaybackState,
    /// Incremented on every track load, so observers can spot a replay of the same index.
    pub track_changes: u64,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
