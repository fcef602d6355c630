//! BLITTY demo runner.
//!
//! `blitty-demos --demo canvas` opens the sprite batching demo; `triangle`
//! and `quad` exercise the static mesh path. `audio` plays generated tones;
//! build with `--features audio` to hear them.

mod audio;
mod bounce;
mod quad;
mod triangle;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use blitty_engine::core::{Game, GameConfig, Scene, report_fatal};
use blitty_engine::logging::{LoggingConfig, init_logging};
use clap::{Parser, ValueEnum};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Demo {
    Triangle,
    Quad,
    Canvas,
    Audio,
}

#[derive(Debug, Parser)]
#[command(name = "blitty-demos", about = "BLITTY engine demos")]
struct Args {
    /// Scene to run.
    #[arg(long, value_enum, default_value_t = Demo::Canvas)]
    demo: Demo,

    /// Game configuration file; created with defaults when missing.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Also write the log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run with a locked fixed-step loop instead of the unlocked one.
    #[arg(long)]
    locked: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(LoggingConfig {
        log_file: args.log_file.clone(),
        ..Default::default()
    });

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_fatal(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = GameConfig::load_or_create(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if args.locked {
        config.unlock_frame_rate = false;
    }

    let mut game = Game::new(config)?;
    let mut scene: Box<dyn Scene> = match args.demo {
        Demo::Triangle => Box::new(triangle::TriangleScene::default()),
        Demo::Quad => Box::new(quad::QuadScene::default()),
        Demo::Canvas => Box::new(bounce::BounceScene::default()),
        Demo::Audio => Box::new(audio::AudioScene::default()),
    };

    log::info!("running {:?} demo", args.demo);
    game.run(scene.as_mut())
}
