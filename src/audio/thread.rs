use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::PlaybackSettings;
use crate::error::BackendError;

use super::backend::MediaBackend;
use super::service::PlaybackService;
use super::session::SessionManager;
use super::types::{AudioCmd, PlaybackHandle};

/// Spawn the playback owner thread.
///
/// The thread is the only writer of the session state. It waits on `rx` with
/// a timeout of one progress interval and ticks the service whenever an
/// interval has elapsed, so completion and position keep updating between
/// commands. On `Quit` (or when every sender is gone) the loop stops before
/// the player is released, so no tick can reach a released handle.
pub(super) fn spawn_audio_thread<B, F>(
    factory: F,
    rx: Receiver<AudioCmd>,
    playback_info: PlaybackHandle,
    settings: PlaybackSettings,
) -> JoinHandle<()>
where
    B: MediaBackend + 'static,
    F: FnMut() -> Result<B, BackendError> + Send + 'static,
{
    thread::spawn(move || {
        // The backend is created on this thread: audio output streams are not `Send`.
        let mut service = PlaybackService::new(SessionManager::new(factory));
        let interval = Duration::from_millis(settings.progress_interval_ms.max(1));
        let mut last_tick = Instant::now();

        let publish = |service: &PlaybackService<B>| {
            if let Ok(mut info) = playback_info.lock() {
                *info = service.snapshot();
            }
        };

        loop {
            let wait = interval.saturating_sub(last_tick.elapsed());
            match rx.recv_timeout(wait) {
                Ok(cmd) => {
                    debug!(?cmd, "playback command");
                    if !service.handle(cmd) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if last_tick.elapsed() >= interval {
                service.tick();
                last_tick = Instant::now();
            }
            publish(&service);
        }

        service.release();
        publish(&service);
        info!("playback thread stopped");
    })
}
