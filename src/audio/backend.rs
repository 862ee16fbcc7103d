use std::time::Duration;

use crate::error::BackendError;

/// The platform player capability: one native handle that can load a locator,
/// run, pause, seek and report progress.
///
/// Implementations are free to fail any call with [`BackendError::InvalidState`]
/// when used out of order; the session manager recovers from that.
pub trait MediaBackend {
    /// Drop any loaded source and return to an empty, reusable state.
    fn reset(&mut self);
    /// Open and prepare the content behind `locator`. The source starts paused.
    fn load(&mut self, locator: &str) -> Result<(), BackendError>;
    fn start(&mut self) -> Result<(), BackendError>;
    fn pause(&mut self) -> Result<(), BackendError>;
    fn seek(&mut self, position: Duration) -> Result<(), BackendError>;
    fn position(&self) -> Result<Duration, BackendError>;
    /// Total length of the loaded source, when known.
    fn duration(&self) -> Result<Option<Duration>, BackendError>;
    fn is_playing(&self) -> Result<bool, BackendError>;
    /// True once a started source has played to its natural end.
    fn is_finished(&self) -> bool;
    /// Free the native resources. The handle is not used again afterwards.
    fn release(&mut self);
}

/// Builds a fresh backend handle; called on first use and whenever the handle is rebuilt.
pub type BackendFactory<B> = Box<dyn FnMut() -> Result<B, BackendError>>;
