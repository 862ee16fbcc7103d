//! Playback queue service: the active queue, a cursor into it, and the
//! session manager that plays the track under the cursor.
//!
//! The cursor always stays inside `[0, queue.len())` while the queue is
//! non-empty, and only tracks from the queue are handed to the session.

use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use tracing::debug;

use crate::library::Track;

use super::backend::MediaBackend;
use super::session::SessionManager;
use super::types::{AudioCmd, PlaybackInfo, PlaybackState, PlayerState};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ServiceState {
    /// No queue.
    Empty,
    /// Queue set; the cursor track is playing, paused or finished.
    Loaded,
}

pub struct PlaybackService<B: MediaBackend> {
    session: SessionManager<B>,
    queue: Vec<Track>,
    cursor: usize,
    completions: Receiver<()>,
    track_changes: u64,
}

impl<B: MediaBackend> PlaybackService<B> {
    /// Take ownership of `session` and subscribe to its completion events.
    pub fn new(mut session: SessionManager<B>) -> Self {
        let (tx, completions) = mpsc::channel::<()>();
        session.set_completion_listener(Box::new(move || {
            let _ = tx.send(());
        }));

        Self {
            session,
            queue: Vec::new(),
            cursor: 0,
            completions,
            track_changes: 0,
        }
    }

    pub fn state(&self) -> ServiceState {
        if self.queue.is_empty() {
            ServiceState::Empty
        } else {
            ServiceState::Loaded
        }
    }

    #[cfg(test)]
    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    /// Cursor position, `None` while the queue is empty.
    pub fn cursor(&self) -> Option<usize> {
        match self.state() {
            ServiceState::Empty => None,
            ServiceState::Loaded => Some(self.cursor),
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &SessionManager<B> {
        &self.session
    }

    /// Replace the queue and play from `start_index` (out of range falls back to 0).
    /// An empty `tracks` is ignored.
    pub fn set_queue_and_play(&mut self, tracks: Vec<Track>, start_index: usize) {
        if tracks.is_empty() {
            debug!("empty queue ignored");
            return;
        }
        self.cursor = if start_index < tracks.len() {
            start_index
        } else {
            0
        };
        self.queue = tracks;
        self.play_current();
    }

    /// Play the track under the cursor, if any.
    pub fn play_current(&mut self) {
        let Some(track) = self.queue.get(self.cursor) else {
            return;
        };
        self.session.play(track);
        self.track_changes += 1;
    }

    /// Move to the next track. No wrap: a no-op on the last track.
    pub fn advance(&mut self) {
        if self.cursor + 1 < self.queue.len() {
            self.cursor += 1;
            self.play_current();
        }
    }

    /// Move to the previous track. No wrap: a no-op on the first track.
    pub fn retreat(&mut self) {
        if !self.queue.is_empty() && self.cursor > 0 {
            self.cursor -= 1;
            self.play_current();
        }
    }

    /// Next track for interactive controls: wraps to the first track.
    pub fn skip_next(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.queue.len();
        self.play_current();
    }

    /// Previous track for interactive controls: wraps to the last track.
    pub fn skip_previous(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.cursor = match self.cursor {
            0 => self.queue.len() - 1,
            c => c - 1,
        };
        self.play_current();
    }

    pub fn pause(&mut self) {
        self.session.pause();
    }

    pub fn resume(&mut self) {
        self.session.resume();
    }

    pub fn toggle_pause(&mut self) {
        if self.session.is_playing() {
            self.session.pause();
        } else {
            self.resume_or_replay();
        }
    }

    pub fn seek_to(&mut self, position_ms: u64) {
        self.session.seek(position_ms);
    }

    pub fn seek_by(&mut self, secs: i64) {
        let current = self.session.current_position();
        let delta_ms = secs.unsigned_abs().saturating_mul(1000);
        let target = if secs >= 0 {
            current.saturating_add(delta_ms)
        } else {
            current.saturating_sub(delta_ms)
        };
        self.session.seek(target);
    }

    /// Periodic poll: detect end-of-track and auto-advance once per completion.
    pub fn tick(&mut self) {
        self.session.poll();
        while self.completions.try_recv().is_ok() {
            self.advance();
        }
    }

    /// Tear down: release the player and forget the queue.
    pub fn release(&mut self) {
        self.session.release();
        self.queue.clear();
        self.cursor = 0;
    }

    /// Apply one command from the command surface. Returns `false` on `Quit`.
    pub fn handle(&mut self, cmd: AudioCmd) -> bool {
        match cmd {
            AudioCmd::Play {
                queue: Some(queue),
                start_index,
            } if !queue.is_empty() => self.set_queue_and_play(queue, start_index),
            AudioCmd::Play { .. } => self.resume_or_replay(),
            AudioCmd::Pause => self.pause(),
            AudioCmd::TogglePause => self.toggle_pause(),
            AudioCmd::Next => self.advance(),
            AudioCmd::Prev => self.retreat(),
            AudioCmd::SkipNext => self.skip_next(),
            AudioCmd::SkipPrev => self.skip_previous(),
            AudioCmd::SeekTo(ms) => self.seek_to(ms),
            AudioCmd::SeekBy(secs) => self.seek_by(secs),
            AudioCmd::Quit => return false,
        }
        true
    }

    /// Snapshot for observers outside the playback thread.
    pub fn snapshot(&self) -> PlaybackInfo {
        PlaybackInfo {
            track: self.session.current_track().cloned(),
            index: self.cursor(),
            queue_len: self.queue.len(),
            position: Duration::from_millis(self.session.current_position()),
            duration: Duration::from_millis(self.session.duration()),
            state: PlaybackState::from(self.session.state()),
            track_changes: self.track_changes,
        }
    }

    /// A faulted handle is rebuilt by replaying the cursor track from the top.
    fn resume_or_replay(&mut self) {
        let faulted = self.session.state() == PlayerState::Invalid;
        if self.session.current_track().is_some() && !faulted {
            self.resume();
        } else {
            self.play_current();
        }
    }
}
