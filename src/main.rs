//! Balloon Rush headless entry point
//!
//! Plays rounds with the autopilot at the target frame rate and reports
//! what the simulation hooks emit through the log (`RUST_LOG=info`).

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use glam::Vec2;
use thiserror::Error;

use balloon_rush::audio::{SoundEffect, VisualEffect};
use balloon_rush::sim::{GameHooks, Round, TickInput};
use balloon_rush::{Difficulty, HighScoreTable, Settings, SettingsError};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CliDifficulty {
    Easy,
    Hard,
}

impl From<CliDifficulty> for Difficulty {
    fn from(value: CliDifficulty) -> Self {
        match value {
            CliDifficulty::Easy => Difficulty::Easy,
            CliDifficulty::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "balloon-rush")]
#[command(about = "Plays Balloon Rush rounds headless with the autopilot")]
struct Cli {
    /// JSON settings file (defaults apply to missing fields)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Overrides the difficulty from the settings file
    #[arg(long, value_enum)]
    difficulty: Option<CliDifficulty>,
    /// Spawner RNG seed (random when absent)
    #[arg(long)]
    seed: Option<u64>,
    /// Rounds to play back to back
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,
}

/// Hooks that narrate the round through the log
#[derive(Debug, Default)]
struct LogHooks {
    last_whole_second: Option<u32>,
}

impl GameHooks for LogHooks {
    fn play_sound(&mut self, sound: SoundEffect) {
        log::debug!("sound: {}", sound.key());
    }

    fn spawn_visual_effect(&mut self, effect: VisualEffect, pos: Vec2) {
        log::trace!("effect: {} at ({:.0}, {:.0})", effect.key(), pos.x, pos.y);
    }

    fn on_score_changed(&mut self, score: u32) {
        log::info!("Score: {}", score);
    }

    fn on_timer_updated(&mut self, remaining: f32) {
        let whole = remaining.ceil() as u32;
        if self.last_whole_second != Some(whole) {
            self.last_whole_second = Some(whole);
            log::debug!("Time left: {}s", whole);
        }
    }

    fn on_game_over(&mut self, final_score: u32, new_high_score: bool) {
        log::info!(
            "Game over: {}{}",
            final_score,
            if new_high_score { " (new high score!)" } else { "" }
        );
    }

    fn on_power_up_label_changed(&mut self, label: &str) {
        if label.is_empty() {
            log::info!("Power-ups: none");
        } else {
            log::info!("Power-ups: {}", label);
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, AppError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(difficulty) = cli.difficulty {
        settings.difficulty = difficulty.into();
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    settings.validate()?;
    Ok(settings)
}

/// Play one round to the end, pacing ticks to the target frame rate
fn play_round(round: &mut Round, table: &mut HighScoreTable, hooks: &mut LogHooks) {
    let frame_budget = Duration::from_secs_f32(1.0 / round.settings().target_fps as f32);
    let input = TickInput::idle();
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        let dt = frame_start.duration_since(last).as_secs_f32();
        last = frame_start;

        if !round.tick(&input, table, hooks, dt) {
            break;
        }

        let spent = frame_start.elapsed();
        if spent < frame_budget {
            thread::sleep(frame_budget - spent);
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let settings = load_settings(&cli)?;
    let rounds = cli.rounds;

    log::info!(
        "Balloon Rush starting: {} round(s) on {}",
        rounds,
        settings.difficulty.as_str()
    );

    let mut table = HighScoreTable::new();
    let mut hooks = LogHooks::default();
    let mut round = Round::new(&settings);

    for n in 1..=rounds {
        if n > 1 {
            round.restart();
        }
        play_round(&mut round, &mut table, &mut hooks);
        let totals = round.totals();
        log::info!(
            "Round {}: score {}, {} collected, {} power-ups, {} hazard hits, {} lost to obstacles",
            n,
            round.game().score(),
            totals.collected,
            totals.power_ups,
            totals.hazard_hits,
            totals.collectibles_lost
        );
    }

    for difficulty in Difficulty::ALL {
        let entries = table.entries(difficulty);
        if !entries.is_empty() {
            log::info!("High scores ({}): {:?}", difficulty.as_str(), entries);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("balloon-rush: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_one_round() {
        let cli = Cli::try_parse_from(["balloon-rush"]).unwrap();
        assert_eq!(cli.rounds, 1);
        assert!(cli.config.is_none() && cli.difficulty.is_none() && cli.seed.is_none());
    }

    #[test]
    fn test_cli_parses_every_flag() {
        let cli = Cli::try_parse_from([
            "balloon-rush",
            "--config",
            "rush.json",
            "--difficulty",
            "hard",
            "--seed",
            "42",
            "--rounds",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("rush.json")));
        assert_eq!(cli.difficulty.map(Difficulty::from), Some(Difficulty::Hard));
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.rounds, 3);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["balloon-rush", "--rounds", "0"]).is_err());
        assert!(Cli::try_parse_from(["balloon-rush", "--difficulty", "medium"]).is_err());
        assert!(Cli::try_parse_from(["balloon-rush", "--seed", "-1"]).is_err());
        assert!(Cli::try_parse_from(["balloon-rush", "--frames", "9"]).is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from(["balloon-rush", "--difficulty", "hard", "--seed", "7"]).unwrap();
        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.seed, Some(7));
    }
}
