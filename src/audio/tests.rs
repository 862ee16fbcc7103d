use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::service::{PlaybackService, ServiceState};
use super::session::SessionManager;
use super::types::PlayerState;
use super::*;
use crate::config::PlaybackSettings;
use crate::error::BackendError;
use crate::library::Track;

/// Knobs and counters shared between a test and the fake handles it spawns.
#[derive(Default)]
struct Script {
    fail_load: HashSet<String>,
    invalid_on_load: HashSet<String>,
    unsupported_seek: bool,
    invalid_on_pause: bool,
    fail_queries: bool,
    fail_factory: bool,
    created: usize,
    released: usize,
    loads: usize,
    loaded: Vec<String>,
    finished_load: Option<usize>,
    seeks: Vec<Duration>,
    position: Duration,
    duration: Option<Duration>,
}

type Shared = Arc<Mutex<Script>>;

struct FakeBackend {
    shared: Shared,
    load_no: Option<usize>,
    running: bool,
}

impl MediaBackend for FakeBackend {
    fn reset(&mut self) {
        self.load_no = None;
        self.running = false;
    }

    fn load(&mut self, locator: &str) -> Result<(), BackendError> {
        let mut s = self.shared.lock().unwrap();
        if s.invalid_on_load.contains(locator) {
            return Err(BackendError::InvalidState("load"));
        }
        if s.fail_load.contains(locator) {
            return Err(BackendError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "missing",
            )));
        }
        s.loads += 1;
        s.loaded.push(locator.to_string());
        self.load_no = Some(s.loads);
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        if self.load_no.is_none() {
            return Err(BackendError::InvalidState("start"));
        }
        self.running = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        if self.load_no.is_none() || self.shared.lock().unwrap().invalid_on_pause {
            return Err(BackendError::InvalidState("pause"));
        }
        self.running = false;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), BackendError> {
        let mut s = self.shared.lock().unwrap();
        if s.unsupported_seek {
            return Err(BackendError::Unsupported("not seekable".into()));
        }
        s.seeks.push(position);
        s.position = position;
        if s.finished_load == self.load_no {
            s.finished_load = None;
        }
        Ok(())
    }

    fn position(&self) -> Result<Duration, BackendError> {
        let s = self.shared.lock().unwrap();
        if s.fail_queries {
            return Err(BackendError::InvalidState("position"));
        }
        Ok(s.position)
    }

    fn duration(&self) -> Result<Option<Duration>, BackendError> {
        let s = self.shared.lock().unwrap();
        if s.fail_queries {
            return Err(BackendError::InvalidState("duration"));
        }
        Ok(s.duration)
    }

    fn is_playing(&self) -> Result<bool, BackendError> {
        if self.shared.lock().unwrap().fail_queries {
            return Err(BackendError::InvalidState("is_playing"));
        }
        Ok(self.running && !self.is_finished())
    }

    fn is_finished(&self) -> bool {
        self.load_no.is_some() && self.shared.lock().unwrap().finished_load == self.load_no
    }

    fn release(&mut self) {
        self.shared.lock().unwrap().released += 1;
        self.reset();
    }
}

fn script() -> Shared {
    Arc::new(Mutex::new(Script {
        duration: Some(Duration::from_secs(180)),
        ..Script::default()
    }))
}

fn factory(shared: &Shared) -> impl FnMut() -> Result<FakeBackend, BackendError> + Send + 'static {
    let shared = shared.clone();
    move || {
        let mut s = shared.lock().unwrap();
        if s.fail_factory {
            return Err(BackendError::Device("no device".into()));
        }
        s.created += 1;
        Ok(FakeBackend {
            shared: shared.clone(),
            load_no: None,
            running: false,
        })
    }
}

fn session(shared: &Shared) -> SessionManager<FakeBackend> {
    SessionManager::new(factory(shared))
}

fn service(shared: &Shared) -> PlaybackService<FakeBackend> {
    PlaybackService::new(session(shared))
}

/// Make the currently loaded fake source report a natural end.
fn end_current_track(shared: &Shared) {
    let mut s = shared.lock().unwrap();
    s.finished_load = Some(s.loads);
}

fn t(n: u64) -> Track {
    Track {
        id: n,
        title: format!("Song {n}"),
        artist: Some("Artist".into()),
        data: format!("/music/{n}.mp3"),
        image: None,
    }
}

fn tracks(n: u64) -> Vec<Track> {
    (1..=n).map(t).collect()
}

#[test]
fn play_loads_and_starts_the_track() {
    let shared = script();
    let mut s = session(&shared);

    s.play(&t(1));

    assert_eq!(s.state(), PlayerState::Playing);
    assert_eq!(s.current_track(), Some(&t(1)));
    assert!(s.is_playing());
    assert_eq!(s.duration(), 180_000);
    let script = shared.lock().unwrap();
    assert_eq!(script.created, 1);
    assert_eq!(script.loaded, vec!["/music/1.mp3".to_string()]);
}

#[test]
fn load_failure_is_swallowed_and_handle_stays_reusable() {
    let shared = script();
    shared.lock().unwrap().fail_load.insert("/music/2.mp3".into());
    let mut s = session(&shared);

    s.play(&t(2));
    assert_eq!(s.state(), PlayerState::Idle);
    assert!(s.current_track().is_none());
    assert!(!s.is_playing());

    s.play(&t(1));
    assert_eq!(s.state(), PlayerState::Playing);
    assert_eq!(shared.lock().unwrap().created, 1);
}

#[test]
fn invalid_state_during_play_rebuilds_the_handle() {
    let shared = script();
    shared
        .lock()
        .unwrap()
        .invalid_on_load
        .insert("/music/3.mp3".into());
    let mut s = session(&shared);

    s.play(&t(3));
    assert_eq!(s.state(), PlayerState::Idle);
    assert!(s.current_track().is_none());
    {
        let script = shared.lock().unwrap();
        assert_eq!(script.created, 2);
        assert_eq!(script.released, 1);
    }

    s.play(&t(1));
    assert_eq!(s.state(), PlayerState::Playing);
    assert_eq!(shared.lock().unwrap().created, 2);
}

#[test]
fn operations_without_a_track_are_safe_no_ops() {
    let shared = script();
    let mut s = session(&shared);

    s.pause();
    s.resume();
    s.seek(5_000);

    assert_eq!(s.state(), PlayerState::Idle);
    assert_eq!(s.current_position(), 0);
    assert_eq!(s.duration(), 0);
    assert!(!s.is_playing());
    assert!(!s.poll());
    assert!(shared.lock().unwrap().seeks.is_empty());
}

#[test]
fn queries_fall_back_to_defaults_on_faults() {
    let shared = script();
    let mut s = session(&shared);
    s.play(&t(1));
    shared.lock().unwrap().position = Duration::from_millis(1_500);
    assert_eq!(s.current_position(), 1_500);

    shared.lock().unwrap().fail_queries = true;
    assert_eq!(s.current_position(), 0);
    assert_eq!(s.duration(), 0);
    assert!(!s.is_playing());
}

#[test]
fn factory_failure_degrades_to_idle() {
    let shared = script();
    shared.lock().unwrap().fail_factory = true;
    let mut s = session(&shared);

    s.play(&t(1));
    assert_eq!(s.state(), PlayerState::Idle);
    assert!(s.current_track().is_none());

    shared.lock().unwrap().fail_factory = false;
    s.play(&t(1));
    assert_eq!(s.state(), PlayerState::Playing);
}

#[test]
fn release_returns_to_no_track_until_next_play() {
    let shared = script();
    let mut s = session(&shared);
    s.play(&t(1));

    s.release();
    assert_eq!(s.state(), PlayerState::Idle);
    assert!(s.current_track().is_none());
    assert_eq!(s.current_position(), 0);
    assert!(!s.is_playing());
    s.resume();
    assert_eq!(s.state(), PlayerState::Idle);
    assert_eq!(shared.lock().unwrap().released, 1);

    s.play(&t(2));
    assert_eq!(s.state(), PlayerState::Playing);
    assert_eq!(shared.lock().unwrap().created, 2);
}

#[test]
fn pause_and_resume_flip_the_state() {
    let shared = script();
    let mut s = session(&shared);
    s.play(&t(1));

    s.pause();
    assert_eq!(s.state(), PlayerState::Paused);
    assert!(!s.is_playing());

    s.resume();
    assert_eq!(s.state(), PlayerState::Playing);
    assert!(s.is_playing());
}

#[test]
fn unsupported_seek_is_ignored() {
    let shared = script();
    shared.lock().unwrap().unsupported_seek = true;
    let mut s = session(&shared);
    s.play(&t(1));

    s.seek(10_000);
    assert_eq!(s.state(), PlayerState::Playing);
}

#[test]
fn completion_fires_exactly_once_per_end_of_track() {
    let shared = script();
    let mut s = session(&shared);
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    s.set_completion_listener(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    s.play(&t(1));
    assert!(!s.poll());

    end_current_track(&shared);
    assert!(s.poll());
    assert!(!s.poll());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(s.state(), PlayerState::Loaded);
}

#[test]
fn registering_a_listener_replaces_the_previous_one() {
    let shared = script();
    let mut s = session(&shared);
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let c1 = first.clone();
    let c2 = second.clone();
    s.set_completion_listener(Box::new(move || {
        c1.fetch_add(1, Ordering::SeqCst);
    }));
    s.set_completion_listener(Box::new(move || {
        c2.fetch_add(1, Ordering::SeqCst);
    }));

    s.play(&t(1));
    end_current_track(&shared);
    s.poll();

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn resume_after_completion_restarts_from_the_top() {
    let shared = script();
    let mut s = session(&shared);
    s.play(&t(1));
    end_current_track(&shared);
    s.poll();

    s.resume();
    assert_eq!(s.state(), PlayerState::Playing);
    assert_eq!(shared.lock().unwrap().seeks, vec![Duration::ZERO]);
}

#[test]
fn empty_queue_leaves_service_empty() {
    let shared = script();
    let mut svc = service(&shared);

    svc.set_queue_and_play(Vec::new(), 3);

    assert_eq!(svc.state(), ServiceState::Empty);
    assert_eq!(svc.cursor(), None);
    assert!(svc.session().current_track().is_none());
    assert!(shared.lock().unwrap().loaded.is_empty());
}

#[test]
fn out_of_range_start_index_clamps_to_first_track() {
    let shared = script();
    let mut svc = service(&shared);

    svc.set_queue_and_play(tracks(3), 5);

    assert_eq!(svc.state(), ServiceState::Loaded);
    assert_eq!(svc.cursor(), Some(0));
    assert_eq!(svc.session().current_track(), Some(&t(1)));
}

#[test]
fn start_index_in_range_is_honored() {
    let shared = script();
    let mut svc = service(&shared);

    svc.set_queue_and_play(tracks(3), 2);

    assert_eq!(svc.cursor(), Some(2));
    assert_eq!(svc.session().current_track(), Some(&t(3)));
}

#[test]
fn advance_on_last_track_does_not_wrap() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(3), 2);

    svc.advance();

    assert_eq!(svc.cursor(), Some(2));
    assert_eq!(shared.lock().unwrap().loads, 1);
}

#[test]
fn retreat_on_first_track_does_not_wrap() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(3), 0);

    svc.retreat();
    assert_eq!(svc.cursor(), Some(0));
    assert_eq!(shared.lock().unwrap().loads, 1);

    svc.advance();
    svc.retreat();
    assert_eq!(svc.cursor(), Some(0));
    assert_eq!(shared.lock().unwrap().loads, 3);
}

#[test]
fn skip_controls_wrap_around_the_queue() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(3), 2);

    svc.skip_next();
    assert_eq!(svc.cursor(), Some(0));
    assert_eq!(svc.session().current_track(), Some(&t(1)));

    svc.skip_previous();
    assert_eq!(svc.cursor(), Some(2));
    assert_eq!(svc.session().current_track(), Some(&t(3)));
}

#[test]
fn completion_auto_advances_until_the_end() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(2), 0);

    svc.tick();
    assert_eq!(svc.cursor(), Some(0));

    end_current_track(&shared);
    svc.tick();
    assert_eq!(svc.cursor(), Some(1));
    assert_eq!(svc.session().current_track(), Some(&t(2)));

    end_current_track(&shared);
    svc.tick();
    svc.tick();
    assert_eq!(svc.cursor(), Some(1));
    assert_eq!(svc.session().state(), PlayerState::Loaded);
    assert_eq!(shared.lock().unwrap().loads, 2);
}

#[test]
fn failed_track_keeps_cursor_and_next_still_works() {
    let shared = script();
    shared.lock().unwrap().fail_load.insert("/music/2.mp3".into());
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(3), 1);

    assert_eq!(svc.cursor(), Some(1));
    assert!(svc.session().current_track().is_none());

    svc.advance();
    assert_eq!(svc.session().current_track(), Some(&t(3)));
}

#[test]
fn play_command_without_queue_resumes_or_replays() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(2), 1);
    svc.pause();
    assert_eq!(svc.session().state(), PlayerState::Paused);

    assert!(svc.handle(AudioCmd::Play {
        queue: None,
        start_index: 0,
    }));
    assert_eq!(svc.session().state(), PlayerState::Playing);
    assert_eq!(svc.cursor(), Some(1));
    assert_eq!(shared.lock().unwrap().loads, 1);

    // Empty queue payload behaves like a bare PLAY.
    svc.handle(AudioCmd::Play {
        queue: Some(Vec::new()),
        start_index: 0,
    });
    assert_eq!(svc.cursor(), Some(1));
}

#[test]
fn commands_map_to_service_operations() {
    let shared = script();
    let mut svc = service(&shared);
    svc.handle(AudioCmd::Play {
        queue: Some(tracks(3)),
        start_index: 0,
    });

    svc.handle(AudioCmd::Next);
    assert_eq!(svc.cursor(), Some(1));
    svc.handle(AudioCmd::Prev);
    assert_eq!(svc.cursor(), Some(0));
    svc.handle(AudioCmd::SkipPrev);
    assert_eq!(svc.cursor(), Some(2));
    svc.handle(AudioCmd::SkipNext);
    assert_eq!(svc.cursor(), Some(0));

    svc.handle(AudioCmd::TogglePause);
    assert_eq!(svc.session().state(), PlayerState::Paused);
    svc.handle(AudioCmd::TogglePause);
    assert_eq!(svc.session().state(), PlayerState::Playing);

    svc.handle(AudioCmd::SeekTo(42_000));
    assert_eq!(
        shared.lock().unwrap().seeks.last(),
        Some(&Duration::from_secs(42))
    );

    assert!(!svc.handle(AudioCmd::Quit));
}

#[test]
fn seek_by_clamps_at_the_start() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(1), 0);
    shared.lock().unwrap().position = Duration::from_secs(3);

    svc.seek_by(10);
    assert_eq!(
        shared.lock().unwrap().seeks.last(),
        Some(&Duration::from_secs(13))
    );

    svc.seek_by(-60);
    assert_eq!(shared.lock().unwrap().seeks.last(), Some(&Duration::ZERO));
}

#[test]
fn seek_by_saturates_on_huge_offsets() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(1), 0);
    shared.lock().unwrap().position = Duration::from_secs(3);

    svc.seek_by(9_223_372_036_854_775);
    assert_eq!(
        shared.lock().unwrap().seeks.last(),
        Some(&Duration::from_millis(9_223_372_036_854_778_000))
    );

    svc.seek_by(i64::MAX);
    assert_eq!(
        shared.lock().unwrap().seeks.last(),
        Some(&Duration::from_millis(u64::MAX))
    );

    svc.seek_by(i64::MIN);
    assert_eq!(shared.lock().unwrap().seeks.last(), Some(&Duration::ZERO));
}

#[test]
fn play_after_a_pause_fault_rebuilds_and_replays_the_cursor_track() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(3), 1);

    shared.lock().unwrap().invalid_on_pause = true;
    svc.handle(AudioCmd::Pause);
    assert_eq!(svc.session().state(), PlayerState::Invalid);
    shared.lock().unwrap().invalid_on_pause = false;

    svc.handle(AudioCmd::Play {
        queue: None,
        start_index: 0,
    });
    assert_eq!(svc.session().state(), PlayerState::Playing);
    assert_eq!(svc.session().current_track(), Some(&t(2)));
    assert_eq!(svc.cursor(), Some(1));
    let script = shared.lock().unwrap();
    assert_eq!(script.created, 2);
    assert_eq!(script.loads, 2);
}

#[test]
fn toggle_after_a_pause_fault_plays_again() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(2), 0);

    shared.lock().unwrap().invalid_on_pause = true;
    svc.pause();
    shared.lock().unwrap().invalid_on_pause = false;

    svc.handle(AudioCmd::TogglePause);
    assert_eq!(svc.session().state(), PlayerState::Playing);
    assert_eq!(svc.session().current_track(), Some(&t(1)));
}

#[test]
fn release_returns_service_to_empty() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(2), 0);

    svc.release();

    assert_eq!(svc.state(), ServiceState::Empty);
    assert!(svc.queue().is_empty());
    assert!(svc.session().current_track().is_none());
    assert_eq!(svc.snapshot(), PlaybackInfo {
        track_changes: 1,
        ..PlaybackInfo::default()
    });
}

#[test]
fn snapshot_reflects_current_track_and_progress() {
    let shared = script();
    let mut svc = service(&shared);
    svc.set_queue_and_play(tracks(3), 1);
    shared.lock().unwrap().position = Duration::from_millis(2_500);

    let info = svc.snapshot();
    assert_eq!(info.track, Some(t(2)));
    assert_eq!(info.index, Some(1));
    assert_eq!(info.queue_len, 3);
    assert_eq!(info.position, Duration::from_millis(2_500));
    assert_eq!(info.duration, Duration::from_secs(180));
    assert_eq!(info.state, PlaybackState::Playing);
    assert_eq!(info.track_changes, 1);

    svc.pause();
    assert_eq!(svc.snapshot().state, PlaybackState::Paused);
}

fn wait_for(player: &AudioPlayer, what: impl Fn(&PlaybackInfo) -> bool) -> PlaybackInfo {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let info = player.info();
        if what(&info) || Instant::now() > deadline {
            return info;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn playback_thread_runs_commands_and_auto_advances() {
    let shared = script();
    let settings = PlaybackSettings {
        progress_interval_ms: 10,
        ..PlaybackSettings::default()
    };
    let player = AudioPlayer::with_backend(factory(&shared), settings);

    player
        .send(AudioCmd::Play {
            queue: Some(tracks(3)),
            start_index: 1,
        })
        .unwrap();
    let info = wait_for(&player, |i| i.index == Some(1) && i.state == PlaybackState::Playing);
    assert_eq!(info.track, Some(t(2)));

    end_current_track(&shared);
    let info = wait_for(&player, |i| i.index == Some(2));
    assert_eq!(info.track, Some(t(3)));
    assert_eq!(info.track_changes, 2);

    player.send(AudioCmd::Pause).unwrap();
    let info = wait_for(&player, |i| i.state == PlaybackState::Paused);
    assert_eq!(info.state, PlaybackState::Paused);

    player.shutdown();
    let info = player.info();
    assert_eq!(info.state, PlaybackState::Stopped);
    assert!(info.track.is_none());
    assert_eq!(shared.lock().unwrap().released, 1);
}
