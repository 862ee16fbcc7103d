use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::PlaybackSettings;
use crate::error::BackendError;

use super::backend::MediaBackend;
use super::sink::RodioBackend;
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, PlaybackHandle, PlaybackInfo};

/// Handle to the playback owner thread.
///
/// This is the one shared entry point to playback: callers send commands and
/// read the published [`PlaybackInfo`]; all state transitions happen on the
/// owner thread.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    /// Start a playback thread that plays through the default output device.
    pub fn new(settings: PlaybackSettings) -> Self {
        Self::with_backend(RodioBackend::open, settings)
    }

    /// Start a playback thread over any backend; `factory` runs on that thread.
    pub fn with_backend<B, F>(factory: F, settings: PlaybackSettings) -> Self
    where
        B: MediaBackend + 'static,
        F: FnMut() -> Result<B, BackendError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let audio_handle = spawn_audio_thread(factory, rx, playback_info.clone(), settings);

        Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
        }
    }

    /// Latest published snapshot.
    pub fn info(&self) -> PlaybackInfo {
        self.playback
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default()
    }

    pub fn send(&self, cmd: AudioCmd) -> Result<(), mpsc::SendError<AudioCmd>> {
        self.tx.send(cmd)
    }

    /// Stop the playback thread, release the player and wait for the thread to exit.
    pub fn shutdown(&self) {
        let _ = self.send(AudioCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
