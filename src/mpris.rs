use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use url::Url;
use zbus::{Connection, interface, object_server::InterfaceRef};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::audio::{PlaybackInfo, PlaybackState};
use crate::config::MprisSettings;
use crate::library::Track;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const NO_TRACK_PATH: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";
const NO_SONG: &str = "No Song";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Requests coming in from the desktop media session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackState,
    title: Option<String>,
    artist: Vec<String>,
    art_url: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    track_id: Option<OwnedObjectPath>,
}

/// Publishes now-playing state to the bus thread.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// Republish track metadata and playback status, then signal the change.
    pub fn set_now_playing(&self, info: &PlaybackInfo) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = info.state;
            s.position_micros = micros(info.position);
            match info.track.as_ref() {
                Some(track) => {
                    s.title = Some(track.title.clone());
                    s.artist = vec![track.artist_or_unknown().to_string()];
                    s.art_url = track.image.as_deref().and_then(to_url);
                    s.url = to_url(&track.data);
                    s.length_micros = (!info.duration.is_zero()).then(|| micros(info.duration));
                    s.track_id = track_object_path(track);
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.art_url = None;
                    s.url = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }

    /// Position is served on request and not signalled.
    pub fn set_position(&self, position: Duration) {
        if let Ok(mut s) = self.state.lock() {
            s.position_micros = micros(position);
        }
    }
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

/// Locators that are already URIs pass through; absolute paths become `file:` URLs.
/// Anything else cannot be expressed as a URL and is left out.
fn to_url(locator: &str) -> Option<String> {
    match Url::parse(locator) {
        Ok(url) => Some(url.into()),
        Err(_) => Url::from_file_path(locator).ok().map(String::from),
    }
}

fn track_object_path(track: &Track) -> Option<OwnedObjectPath> {
    OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", track.id)).ok()
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
    identity: String,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No window to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        &self.identity
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let track_id = s
            .track_id
            .clone()
            .map(OwnedObjectPath::into_inner)
            .or_else(|| ObjectPath::try_from(NO_TRACK_PATH).ok());
        if let Some(v) = track_id.and_then(|p| owned(Value::from(p))) {
            map.insert("mpris:trackid".to_string(), v);
        }

        let title = s.title.clone().unwrap_or_else(|| NO_SONG.to_string());
        if let Some(v) = owned(Value::from(title)) {
            map.insert("xesam:title".to_string(), v);
        }

        let artist = if s.artist.is_empty() {
            vec![UNKNOWN_ARTIST.to_string()]
        } else {
            s.artist.clone()
        };
        if let Some(v) = owned(Value::from(artist)) {
            map.insert("xesam:artist".to_string(), v);
        }

        if let Some(v) = s.art_url.clone().and_then(|u| owned(Value::from(u))) {
            map.insert("mpris:artUrl".to_string(), v);
        }
        if let Some(v) = s.url.clone().and_then(|u| owned(Value::from(u))) {
            map.insert("xesam:url".to_string(), v);
        }
        if let Some(v) = s.length_micros.and_then(|l| owned(Value::from(l))) {
            map.insert("mpris:length".to_string(), v);
        }
        map
    }
}

/// Register the media-session service on the session bus in a background thread.
///
/// Bus failures are logged and leave the handle working as a no-op sink.
pub fn spawn_mpris(tx: Sender<ControlCmd>, settings: &MprisSettings) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    let identity = settings.identity.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, state_for_thread, identity, notify_rx).await {
                warn!(error = %e, "MPRIS unavailable");
            }
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    identity: String,
    notify_rx: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection
        .request_name(format!("org.mpris.MediaPlayer2.{identity}"))
        .await?;

    let object_server = connection.object_server();
    object_server
        .at(
            OBJECT_PATH,
            RootIface {
                tx: tx.clone(),
                identity,
            },
        )
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    let player: InterfaceRef<PlayerIface> =
        object_server.interface::<_, PlayerIface>(OBJECT_PATH).await?;
    info!("MPRIS service registered");

    loop {
        let mut dirty = false;
        loop {
            match notify_rx.try_recv() {
                Ok(()) => dirty = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("MPRIS handle dropped, stopping");
                    return Ok(());
                }
            }
        }

        if dirty {
            let iface = player.get().await;
            let emitter = player.signal_emitter();
            if let Err(e) = iface.playback_status_changed(emitter).await {
                warn!(error = %e, "could not signal playback status");
            }
            if let Err(e) = iface.metadata_changed(emitter).await {
                warn!(error = %e, "could not signal metadata");
            }
        }

        Timer::after(Duration::from_millis(100)).await;
    }
}
