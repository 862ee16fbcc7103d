//! Error types shared by the audio backend and the playlist storage.
//!
//! None of these escape the component boundaries: the session manager and
//! the playlist store catch them, log them and degrade to a safe default.

use thiserror::Error;

/// Faults raised by a [`MediaBackend`](crate::audio::MediaBackend) handle.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The data locator could not be opened.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The content could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// No audio output device could be opened.
    #[error("audio device error: {0}")]
    Device(String),

    /// The operation was issued against a handle in the wrong lifecycle state.
    #[error("invalid player state: {0}")]
    InvalidState(&'static str),

    /// The backend cannot perform the operation right now (e.g. seeking some formats).
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl BackendError {
    /// True for faults that leave the handle unusable until it is rebuilt.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

/// Faults raised by a [`KeyValueStore`](crate::playlists::KeyValueStore).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored data: {0}")]
    Json(#[from] serde_json::Error),
}
