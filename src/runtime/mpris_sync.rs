use tracing::debug;

use crate::audio::{PlaybackInfo, PlaybackState};
use crate::mpris::MprisHandle;

/// Pushes playback snapshots to MPRIS, republishing metadata only when the
/// track or the playback status changed.
#[derive(Debug, Default)]
pub struct MprisSync {
    last_track_changes: Option<u64>,
    last_playback: PlaybackState,
}

impl MprisSync {
    /// Returns true when metadata was republished.
    pub fn update(&mut self, mpris: &MprisHandle, info: &PlaybackInfo) -> bool {
        if self.needs_publish(info) {
            debug!(
                title = info.track.as_ref().map(|t| t.title.as_str()),
                state = ?info.state,
                "publishing now playing"
            );
            mpris.set_now_playing(info);
            self.last_track_changes = Some(info.track_changes);
            self.last_playback = info.state;
            true
        } else {
            mpris.set_position(info.position);
            false
        }
    }

    fn needs_publish(&self, info: &PlaybackInfo) -> bool {
        self.last_track_changes != Some(info.track_changes) || self.last_playback != info.state
    }
}
