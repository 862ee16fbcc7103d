//! Playback session manager: owns the single player handle, the current track
//! and the play/pause state.
//!
//! Every call that touches the handle tolerates faults. Load and I/O failures
//! reset the handle and abandon the call; invalid-state failures rebuild the
//! handle for `play` and produce `0` / `false` for queries. Nothing is
//! returned to the caller as an error.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::BackendError;
use crate::library::Track;

use super::backend::{BackendFactory, MediaBackend};
use super::types::PlayerState;

/// Observer of natural end-of-track.
pub type CompletionListener = Box<dyn FnMut() + Send>;

pub struct SessionManager<B: MediaBackend> {
    factory: BackendFactory<B>,
    handle: Option<B>,
    state: PlayerState,
    current: Option<Track>,
    listener: Option<CompletionListener>,
}

impl<B: MediaBackend> SessionManager<B> {
    /// The handle is created lazily on the first `play`.
    pub fn new(factory: impl FnMut() -> Result<B, BackendError> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            handle: None,
            state: PlayerState::Idle,
            current: None,
            listener: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Register the completion observer.
    ///
    /// Single subscriber by contract: a new registration replaces the previous one.
    pub fn set_completion_listener(&mut self, listener: CompletionListener) {
        if self.listener.replace(listener).is_some() {
            debug!("completion listener replaced");
        }
    }

    /// Load `track` and start it immediately, replacing whatever was loaded.
    pub fn play(&mut self, track: &Track) {
        if self.state == PlayerState::Invalid {
            self.reset();
        }

        let Some(handle) = self.ensure_handle() else {
            return;
        };
        handle.reset();

        let started = handle.load(&track.data).and_then(|()| handle.start());
        match started {
            Ok(()) => {
                info!(title = %track.title, "playing");
                self.current = Some(track.clone());
                self.state = PlayerState::Playing;
            }
            Err(e) if e.is_invalid_state() => {
                warn!(error = %e, locator = %track.data, "player in invalid state, rebuilding");
                self.reset();
            }
            Err(e) => {
                warn!(error = %e, locator = %track.data, "failed to load track");
                handle.reset();
                self.current = None;
                self.state = PlayerState::Idle;
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        let result = match self.handle.as_mut() {
            Some(h) => h.pause(),
            None => Err(BackendError::InvalidState("pause without handle")),
        };
        match result {
            Ok(()) => self.state = PlayerState::Paused,
            Err(e) => self.fault("pause", e),
        }
    }

    /// Resume a paused track, or restart one that played to its end.
    pub fn resume(&mut self) {
        if !matches!(self.state, PlayerState::Paused | PlayerState::Loaded) || self.current.is_none()
        {
            return;
        }
        let Some(h) = self.handle.as_mut() else {
            return;
        };

        let result = if self.state == PlayerState::Loaded && h.is_finished() {
            h.seek(Duration::ZERO).and_then(|()| h.start())
        } else {
            h.start()
        };
        match result {
            Ok(()) => self.state = PlayerState::Playing,
            Err(e) => self.fault("resume", e),
        }
    }

    pub fn seek(&mut self, position_ms: u64) {
        if self.current.is_none() {
            return;
        }
        let Some(h) = self.handle.as_mut() else {
            return;
        };
        match h.seek(Duration::from_millis(position_ms)) {
            Ok(()) => {}
            Err(BackendError::Unsupported(reason)) => debug!(%reason, "seek ignored"),
            Err(e) => self.fault("seek", e),
        }
    }

    /// Playback position in milliseconds; 0 with no track or on fault.
    pub fn current_position(&self) -> u64 {
        self.query("position", 0, |h| h.position().map(|d| d.as_millis() as u64))
    }

    /// Length of the current track in milliseconds; 0 when unknown.
    pub fn duration(&self) -> u64 {
        self.query("duration", 0, |h| {
            h.duration().map(|d| d.map_or(0, |d| d.as_millis() as u64))
        })
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing && self.query("is_playing", false, |h| h.is_playing())
    }

    /// Stop and free the handle. Until the next `play`, the session behaves as empty.
    pub fn release(&mut self) {
        if let Some(mut h) = self.handle.take() {
            h.release();
        }
        self.current = None;
        self.state = PlayerState::Idle;
    }

    /// Discard the handle and build a fresh one: `Invalid -> Idle`.
    pub fn reset(&mut self) {
        self.release();
        self.ensure_handle();
    }

    /// Check for natural end-of-track. Fires the completion listener once per
    /// completed track and returns whether it did.
    pub fn poll(&mut self) -> bool {
        if self.state != PlayerState::Playing {
            return false;
        }
        let finished = self.handle.as_ref().is_some_and(|h| h.is_finished());
        if !finished {
            return false;
        }

        self.state = PlayerState::Loaded;
        if let Some(listener) = self.listener.as_mut() {
            listener();
        }
        true
    }

    fn ensure_handle(&mut self) -> Option<&mut B> {
        if self.handle.is_none() {
            match (self.factory)() {
                Ok(h) => self.handle = Some(h),
                Err(e) => {
                    warn!(error = %e, "could not create player");
                    self.state = PlayerState::Idle;
                    return None;
                }
            }
        }
        self.handle.as_mut()
    }

    fn query<T>(
        &self,
        op: &'static str,
        default: T,
        f: impl FnOnce(&B) -> Result<T, BackendError>,
    ) -> T {
        if self.current.is_none() || self.state == PlayerState::Invalid {
            return default;
        }
        let Some(h) = self.handle.as_ref() else {
            return default;
        };
        match f(h) {
            Ok(v) => v,
            Err(e) => {
                debug!(op, error = %e, "player query failed");
                default
            }
        }
    }

    fn fault(&mut self, op: &'static str, e: BackendError) {
        warn!(op, error = %e, "player fault");
        if e.is_invalid_state() {
            self.state = PlayerState::Invalid;
        }
    }
}
