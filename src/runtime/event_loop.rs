use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::audio::{AudioCmd, AudioPlayer, PlaybackState};
use crate::config;
use crate::library::Track;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::command::Command;
use crate::runtime::mpris_sync::MprisSync;
use crate::runtime::startup::Store;
use crate::ui;

const POLL: Duration = Duration::from_millis(50);

/// Everything the console and the media-session controls act on.
pub struct Context<'a> {
    pub settings: &'a config::Settings,
    pub library: &'a [Track],
    pub store: Store,
    pub audio_player: &'a AudioPlayer,
    pub mpris: Option<&'a MprisHandle>,
}

/// Main loop: keeps MPRIS in sync with the playback thread, applies remote
/// controls and console lines. Returns when a quit is requested.
pub fn run(
    ctx: &mut Context<'_>,
    control_rx: &Receiver<ControlCmd>,
    lines: &Receiver<String>,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sync = MprisSync::default();
    let mut stdin_open = true;

    loop {
        // Covers changes from media keys and auto-advance as well as the console.
        if let Some(mpris) = ctx.mpris {
            sync.update(mpris, &ctx.audio_player.info());
        }

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, ctx) {
                return Ok(());
            }
        }

        if !stdin_open {
            thread::sleep(POLL);
            continue;
        }
        match lines.recv_timeout(POLL) {
            Ok(line) => {
                let quit = match Command::parse(&line) {
                    Ok(cmd) => execute(cmd, ctx, out)?,
                    Err(msg) => {
                        writeln!(out, "{msg} (try `help`)")?;
                        false
                    }
                };
                out.flush()?;
                if quit {
                    return Ok(());
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if ctx.mpris.is_none() {
                    return Ok(());
                }
                info!("stdin closed, still serving media controls");
                stdin_open = false;
            }
        }
    }
}

/// Remote media-session requests. Returns true on quit.
pub(super) fn handle_control_cmd(cmd: ControlCmd, ctx: &Context<'_>) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => play_or_resume(ctx),
        ControlCmd::PlayPause => match ctx.audio_player.info().state {
            PlaybackState::Stopped => play_or_resume(ctx),
            PlaybackState::Playing | PlaybackState::Paused => send(ctx, AudioCmd::TogglePause),
        },
        ControlCmd::Pause | ControlCmd::Stop => send(ctx, AudioCmd::Pause),
        ControlCmd::Next => send(ctx, AudioCmd::Next),
        ControlCmd::Prev => send(ctx, AudioCmd::Prev),
    }
    false
}

/// Apply one console command. Returns true on quit.
pub(super) fn execute(
    cmd: Command,
    ctx: &mut Context<'_>,
    out: &mut dyn Write,
) -> std::io::Result<bool> {
    match cmd {
        Command::Nothing => {}
        Command::List => writeln!(out, "{}", ui::track_list(ctx.library, &ctx.settings.library))?,
        Command::Play(None) => play_or_resume(ctx),
        Command::Play(Some(i)) => {
            if i < ctx.library.len() {
                send(
                    ctx,
                    AudioCmd::Play {
                        queue: Some(ctx.library.to_vec()),
                        start_index: i,
                    },
                );
            } else {
                writeln!(out, "no library track {i}")?;
            }
        }
        Command::Pause => send(ctx, AudioCmd::Pause),
        Command::Toggle => send(ctx, AudioCmd::TogglePause),
        Command::Next => {
            let cmd = if ctx.settings.playback.wrap_controls {
                AudioCmd::SkipNext
            } else {
                AudioCmd::Next
            };
            send(ctx, cmd);
        }
        Command::Prev => {
            let cmd = if ctx.settings.playback.wrap_controls {
                AudioCmd::SkipPrev
            } else {
                AudioCmd::Prev
            };
            send(ctx, cmd);
        }
        Command::Seek(secs) => send(ctx, AudioCmd::SeekTo(secs.saturating_mul(1000))),
        Command::SeekBy(secs) => send(ctx, AudioCmd::SeekBy(secs)),
        Command::Status => writeln!(out, "{}", ui::status_line(&ctx.audio_player.info()))?,
        Command::Playlists => writeln!(out, "{}", ui::playlist_list(&ctx.store.list_all()))?,
        Command::Create(name) => {
            ctx.store.create(&name);
            writeln!(out, "playlist {name:?} ready")?;
        }
        Command::Delete(name) => {
            if ctx.store.find(&name).is_some() {
                ctx.store.delete(&name);
                writeln!(out, "deleted {name:?}")?;
            } else {
                writeln!(out, "no playlist {name:?}")?;
            }
        }
        Command::Show(name) => match ctx.store.find(&name) {
            Some(p) => writeln!(
                out,
                "{}:\n{}",
                p.name,
                ui::track_list(&p.songs, &ctx.settings.library)
            )?,
            None => writeln!(out, "no playlist {name:?}")?,
        },
        Command::Add {
            playlist,
            library_index,
        } => {
            let Some(track) = ctx.library.get(library_index) else {
                writeln!(out, "no library track {library_index}")?;
                return Ok(false);
            };
            if ctx.store.add_track(&playlist, track) {
                writeln!(out, "added {:?} to {playlist:?}", track.title)?;
            } else {
                writeln!(out, "not added: no playlist {playlist:?}, or already in it")?;
            }
        }
        Command::Remove { playlist, index } => {
            let track = ctx
                .store
                .find(&playlist)
                .and_then(|p| p.songs.get(index).cloned());
            let Some(track) = track else {
                writeln!(out, "no track {index} in playlist {playlist:?}")?;
                return Ok(false);
            };
            if ctx.store.remove_track(&playlist, &track) {
                writeln!(out, "removed {:?} from {playlist:?}", track.title)?;
            } else {
                writeln!(out, "could not update {playlist:?}")?;
            }
        }
        Command::PlayPlaylist { playlist, start } => match ctx.store.find(&playlist) {
            None => writeln!(out, "no playlist {playlist:?}")?,
            Some(p) if start >= p.songs.len() => {
                writeln!(out, "playlist {playlist:?} has {} songs", p.songs.len())?
            }
            Some(p) => send(
                ctx,
                AudioCmd::Play {
                    queue: Some(p.songs),
                    start_index: start,
                },
            ),
        },
        Command::Help => writeln!(out, "{}", ui::controls_text())?,
        Command::Quit => return Ok(true),
    }
    Ok(false)
}

/// Resume the current queue, or start the whole library when nothing is queued.
fn play_or_resume(ctx: &Context<'_>) {
    let queue = if ctx.audio_player.info().queue_len == 0 && !ctx.library.is_empty() {
        Some(ctx.library.to_vec())
    } else {
        None
    };
    send(
        ctx,
        AudioCmd::Play {
            queue,
            start_index: 0,
        },
    );
}

fn send(ctx: &Context<'_>, cmd: AudioCmd) {
    if let Err(e) = ctx.audio_player.send(cmd) {
        debug!(cmd = ?e.0, "playback thread gone, dropping command");
    }
}
