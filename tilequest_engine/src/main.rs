#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Tile Quest **
//! Checks a game's assets: loads the configuration, screen and starting level
//! the same way the game does and reports what it found.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use log::{error, info};

use tilequest_engine::assets_path::assets_root;
use tilequest_engine::level::LevelOptions;
use tilequest_engine::screen::Screen;
use tilequest_engine::{Config, Level, Loaded, ResourceManager, TILEQUEST_VERSION};

fn main() -> Result<ExitCode> {
    env_logger::init();
    let root = env::args().nth(1).map_or_else(|| assets_root().to_path_buf(), PathBuf::from);
    info!("Start: checking assets under '{}'", root.display());
    if !root.is_dir() {
        error!("assets root '{}' is not a directory", root.display());
        println!("{} '{}' is not a directory", "error:".bright_red().bold(), root.display());
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", format!("TILE QUEST {TILEQUEST_VERSION}: asset check").bright_yellow().underline());
    println!("assets: {}\n", root.display().to_string().bold());

    let mut manager = ResourceManager::new(&root);
    let mut failed = false;

    let config = Loaded::<Config>::from_default_location(&mut manager, &mut Default::default());
    failed |= report("config", config.error_message(), config.warnings());

    let screen = Loaded::<Screen>::from_default_location(&mut manager, &mut ());
    failed |= report("screen", screen.error_message(), screen.warnings());

    if let Some(config) = config.component() {
        let mut options = LevelOptions {
            popup_width: config.popup_box.char_width,
            seed: None,
        };
        let level = Loaded::<Level>::from_location(&mut manager, &config.start, &mut options);
        failed |= report(&format!("level {}", config.start), level.error_message(), level.warnings());
        if let Some(level) = level.component() {
            summarize(config, level).context("while summarizing the starting level")?;
        }
    }

    if failed {
        println!("\n{}", "assets are not playable".bright_red().bold());
        Ok(ExitCode::FAILURE)
    } else {
        println!("\n{}", "assets are playable".bright_green().bold());
        Ok(ExitCode::SUCCESS)
    }
}

/// Print one load result. Returns true when the load failed.
fn report(what: &str, error: String, warnings: &[String]) -> bool {
    if error.is_empty() {
        println!("{:>12} {what}", "ok".bright_green());
    } else {
        println!("{:>12} {what}: {error}", "invalid".bright_red().bold());
    }
    for warning in warnings {
        println!("{:>12} {warning}", "missing".yellow());
    }
    !error.is_empty()
}

fn summarize(config: &Config, level: &Level) -> Result<()> {
    let start = level.map.player_start;
    let question_count = config.question_set.len();
    anyhow::ensure!(question_count > 0, "configuration has no questions");
    println!(
        "{:>12} {}x{} tiles, start at ({}, {}), {} monsters, {} items, {} questions",
        "level".cyan(),
        level.width(),
        level.height(),
        start.x,
        start.y,
        level.monsters().len(),
        level.remaining_items(),
        question_count
    );
    Ok(())
}
