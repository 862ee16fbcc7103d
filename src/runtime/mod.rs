use std::env;
use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use tracing::{info, warn};

use crate::audio::AudioPlayer;
use crate::library::scan;
use crate::logging;
use crate::mpris::ControlCmd;

mod command;
mod event_loop;
mod mpris_sync;
mod settings;
mod startup;


const USAGE: &str = "usage: encore [--print-config] [MUSIC_DIR]";

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_problem) = settings::load_settings();
    logging::init(&settings.logging);
    if let Some(msg) = config_problem {
        warn!("{msg}");
    }

    let mut dir_arg = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--print-config" => {
                print!("{}", toml::to_string_pretty(&settings)?);
                return Ok(());
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ if arg.starts_with('-') => return Err(format!("unknown flag {arg}\n{USAGE}").into()),
            _ => dir_arg = Some(arg),
        }
    }

    let dir = startup::library_dir(dir_arg, &settings);
    let library = scan(&dir, &settings.library);
    info!(dir = %dir.display(), tracks = library.len(), "library scanned");

    let store = startup::open_store(&settings);
    let audio_player = AudioPlayer::new(settings.playback.clone());

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = settings
        .mpris
        .enabled
        .then(|| crate::mpris::spawn_mpris(control_tx, &settings.mpris));

    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    println!(
        "{} tracks in {}. Type `help` for commands.",
        library.len(),
        dir.display()
    );

    let mut ctx = event_loop::Context {
        settings: &settings,
        library: &library,
        store,
        audio_player: &audio_player,
        mpris: mpris.as_ref(),
    };
    let result = event_loop::run(&mut ctx, &control_rx, &line_rx, &mut io::stdout());

    audio_player.shutdown();
    info!("bye");
    result
}
