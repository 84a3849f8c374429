use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use suspense_engine::save::load;
use suspense_engine::{NullSoundService, Outcome, RecordingSoundService, SoundService};
use suspense_game::{build_game, run_walkthrough, START_SCENE};

/// Headless driver for the demo content: boots the game, optionally plays
/// the scripted walkthrough, and dumps state and event artefacts.
#[derive(Parser, Debug)]
#[command(about = "Headless host for the derelict-ship demo game", version)]
struct Args {
    /// Directory to read and write save slots in
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,

    /// Save slot name (file stem under --save-dir)
    #[arg(long, default_value = "slot0")]
    slot: String,

    /// Restore the slot before doing anything else
    #[arg(long)]
    restore: bool,

    /// Play the scripted walkthrough, then save to the slot
    #[arg(long)]
    walkthrough: bool,

    /// Path to write the final state tree as JSON
    #[arg(long)]
    state_json: Option<PathBuf>,

    /// Path to write the event log as JSON
    #[arg(long)]
    events_json: Option<PathBuf>,

    /// Discard sound cues instead of recording and printing them
    #[arg(long)]
    no_sound: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let recorder = if args.no_sound {
        None
    } else {
        Some(RecordingSoundService::new())
    };
    let sound: Rc<dyn SoundService> = match &recorder {
        Some(recorder) => Rc::new(recorder.clone()),
        None => Rc::new(NullSoundService),
    };

    let mut game = build_game(sound).context("building game content")?;

    if args.restore {
        match load(&args.save_dir, &args.slot).context("loading save slot")? {
            Some(state) => {
                game.restore(state).context("restoring saved state")?;
                info!(slot = %args.slot, "restored save");
            }
            None => {
                info!(slot = %args.slot, "no save found, starting fresh");
                game.start(START_SCENE).context("starting new game")?;
            }
        }
    } else {
        game.start(START_SCENE).context("starting new game")?;
    }

    let outcomes: Vec<Outcome> = if args.walkthrough {
        let outcomes = run_walkthrough(&mut game).context("running walkthrough")?;
        let path = game
            .save_to(&args.save_dir, &args.slot)
            .context("saving after walkthrough")?;
        info!(path = %path.display(), "walkthrough complete, state saved");
        outcomes
    } else {
        Vec::new()
    };

    for outcome in &outcomes {
        if let Some(message) = &outcome.message {
            println!("> {message}");
        }
    }
    for event in game.drain_screen_events() {
        println!("event: {}", event.name);
    }
    if let Some(recorder) = &recorder {
        for cue in recorder.cues() {
            println!("sound: {cue}");
        }
    }

    if let Some(path) = &args.state_json {
        let document = serde_json::to_string_pretty(&game.state().export())
            .context("serialising state tree")?;
        fs::write(path, document)
            .with_context(|| format!("writing state JSON to {}", path.display()))?;
        println!("state written to {}", path.display());
    }
    if let Some(path) = &args.events_json {
        let document =
            serde_json::to_string_pretty(game.events()).context("serialising event log")?;
        fs::write(path, document)
            .with_context(|| format!("writing events JSON to {}", path.display()))?;
        println!("events written to {}", path.display());
    } else {
        for entry in game.events() {
            println!("log: {entry}");
        }
    }

    Ok(())
}
