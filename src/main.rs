//! sonorose - a few seconds of sound, drawn as a collage of rose curves
//!
//! Listens to the microphone (or a WAV file), turns treble, bass and
//! loudness into curve shapes, and keeps the finished collage on screen
//! for a moment before starting over.

use anyhow::Context;
use clap::Parser;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use sonorose::audio::{AudioSource, MicInput, WavInput};
use sonorose::cli::Args;
use sonorose::clock::SystemClock;
use sonorose::params::{FFTConfig, TriggerPolicy};
use sonorose::rendering::{ImageSurface, Painter};
use sonorose::session::{SessionMachine, SessionState};

/// Forward each Enter press on stdin
fn spawn_trigger_reader() -> Receiver<()> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if line.is_err() || tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = args.to_config()?;
    let fft_config = FFTConfig::default();

    let source: Box<dyn AudioSource> = match &args.input {
        Some(path) => Box::new(
            WavInput::open(path, fft_config)
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(MicInput::new(fft_config)?),
    };

    let frame = config.render.frame_duration();
    let entrance = config.placement.entrance;
    let manual = config.timing.trigger == TriggerPolicy::Manual;
    let painter = Painter::new(&config);
    let mut surface = ImageSurface::new(
        config.render.canvas_width,
        config.render.canvas_height,
        args.assets.clone(),
    );
    let mut machine = SessionMachine::new(source, SystemClock::new(), config)?;

    let presses = spawn_trigger_reader();
    if manual {
        log::info!("Press Enter to start recording");
    }

    loop {
        while presses.try_recv().is_ok() {
            if !manual {
                continue;
            }
            if let Err(e) = machine.start_capture() {
                if !e.is_retryable() {
                    return Err(e.into());
                }
                log::error!("{}. Press Enter to try again", e);
            }
        }

        match machine.tick() {
            Some(SessionState::Finished) => {
                if let Some(dir) = &args.export_dir {
                    // Export the collage with every entrance completed
                    let mut view = machine.view();
                    view.now += entrance;
                    surface.clear();
                    painter.paint(&view, &mut surface);
                    surface.save_png(dir.join(format!("episode-{:04}.png", view.episode)))?;
                }
            }
            Some(SessionState::Idle) => {
                if args
                    .sessions
                    .is_some_and(|n| machine.completed_episodes() >= n)
                {
                    log::info!("{} episode(s) complete", machine.completed_episodes());
                    break;
                }
                if manual {
                    log::info!("Press Enter to start recording");
                }
            }
            _ => {}
        }

        thread::sleep(frame);
    }

    Ok(())
}
