//! # Edit Session Demo
//!
//! Headless editing session driving the undo journal: sculpt strokes, an
//! area repaint and an object placed, rotated and deleted, followed by a
//! full undo and redo walk.

use std::path::PathBuf;

use clap::Parser;
use mapforge_core::HistoryConfig;
use mapforge_core::math::Vec3;
use mapforge_demos::session::{EditSession, LOADED_CHUNKS};

/// Mapforge scripted edit session.
#[derive(Parser, Debug)]
#[command(name = "edit_session", about = "Runs a scripted Mapforge edit session", version)]
struct Args {
    /// History config file (TOML). Defaults are used if it is missing.
    #[arg(long, default_value = "history.toml")]
    config: PathBuf,

    /// Number of sculpt strokes to record.
    #[arg(long, default_value = "5")]
    strokes: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    mapforge_core::init();

    let args = Args::parse();
    let config = HistoryConfig::load_or_default(&args.config);

    if let Err(e) = run(&args, &config) {
        log::error!("Session failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args, config: &HistoryConfig) -> mapforge_core::ActionResult {
    let mut session = EditSession::new(config);

    for i in 0..args.strokes {
        let x = (i % u32::from(LOADED_CHUNKS)) as u8;
        let z = (i / u32::from(LOADED_CHUNKS) % u32::from(LOADED_CHUNKS)) as u8;
        session.sculpt_stroke(x, z, 4, 0.75)?;
    }
    session.paint_area(1, 2, 42)?;

    let uid = session.place_object("world/generic/tree01.m2", Vec3::new(30.0, 0.0, 30.0))?;
    session.rotate_object(uid, 135.0)?;
    session.rotate_object(uid, 300.0)?;
    session.delete_object(uid)?;
    log::info!("After editing: {:?}", session.summary());

    for label in session.history().undo_descriptions().take(5) {
        log::info!("  undo: {label}");
    }

    let undone = session.undo_all();
    log::info!("Undid {undone} steps: {:?}", session.summary());

    while session.redo().is_ok() {}
    log::info!("After redo: {:?}", session.summary());
    Ok(())
}
