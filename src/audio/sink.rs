//! `rodio`-backed implementation of [`MediaBackend`].
//!
//! One `OutputStream` per handle; each loaded track gets its own paused
//! `Sink`. Rebuilding the handle reopens the output device.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::AudioFile;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::error::BackendError;
use crate::library::locator_to_path;

use super::backend::MediaBackend;

pub struct RodioBackend {
    stream: OutputStream,
    sink: Option<Sink>,
    locator: Option<String>,
    duration: Option<Duration>,
    started: bool,
}

impl RodioBackend {
    /// Open the default output device.
    pub fn open() -> Result<Self, BackendError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| BackendError::Device(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped; that would garble the console.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            locator: None,
            duration: None,
            started: false,
        })
    }

    fn sink(&self, op: &'static str) -> Result<&Sink, BackendError> {
        self.sink.as_ref().ok_or(BackendError::InvalidState(op))
    }

    /// A drained sink cannot seek; decode the locator again into a fresh one.
    fn reload(&mut self) -> Result<(), BackendError> {
        let locator = self
            .locator
            .clone()
            .ok_or(BackendError::InvalidState("reload"))?;
        self.reset();
        self.load(&locator)
    }
}

/// Decoders often can't tell the length of VBR streams; ask the tag reader instead.
fn probe_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
        .filter(|d| !d.is_zero())
}

impl MediaBackend for RodioBackend {
    fn reset(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.locator = None;
        self.duration = None;
        self.started = false;
    }

    fn load(&mut self, locator: &str) -> Result<(), BackendError> {
        if self.sink.is_some() {
            return Err(BackendError::InvalidState("load without reset"));
        }

        let path = locator_to_path(locator);
        let file = File::open(&path)?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| BackendError::Decode(e.to_string()))?;
        let duration = source.total_duration().or_else(|| probe_duration(&path));

        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.append(source);

        self.sink = Some(sink);
        self.locator = Some(locator.to_string());
        self.duration = duration;
        self.started = false;
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        self.sink("start")?.play();
        self.started = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        self.sink("pause")?.pause();
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), BackendError> {
        if self.is_finished() {
            self.reload()?;
            if position.is_zero() {
                return Ok(());
            }
        }
        self.sink("seek")?
            .try_seek(position)
            .map_err(|e| BackendError::Unsupported(e.to_string()))
    }

    fn position(&self) -> Result<Duration, BackendError> {
        Ok(self.sink("position")?.get_pos())
    }

    fn duration(&self) -> Result<Option<Duration>, BackendError> {
        self.sink("duration")?;
        Ok(self.duration)
    }

    fn is_playing(&self) -> Result<bool, BackendError> {
        let sink = self.sink("is_playing")?;
        Ok(!sink.is_paused() && !sink.empty())
    }

    fn is_finished(&self) -> bool {
        self.started && self.sink.as_ref().is_some_and(Sink::empty)
    }

    fn release(&mut self) {
        self.reset();
    }
}
