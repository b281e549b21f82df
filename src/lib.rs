//! Balloon Rush - A falling-balloon arcade game
//!
//! Core modules:
//! - `sim`: Simulation (entities, collisions, power-ups, round state)
//! - `highscores`: In-memory ranked leaderboard per difficulty
//! - `settings`: Data-driven game configuration
//! - `audio`: Sound and visual effect catalogue consumed by the hooks

pub mod audio;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use highscores::HighScoreTable;
pub use settings::{Difficulty, Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Target update rate of the native driver
    pub const TARGET_FPS: u32 = 60;
    /// Nominal frame time at the target rate
    pub const FRAME_DT: f32 = 1.0 / TARGET_FPS as f32;

    /// Playfield dimensions (y-up, origin bottom-left)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;
    /// Fraction of the playfield height the player and obstacles may occupy
    pub const PLAY_AREA_FRACTION: f32 = 0.75;

    /// Round length in seconds
    pub const GAME_DURATION: f32 = 20.0;

    /// Default entity edge length
    pub const ENTITY_SIZE: f32 = 50.0;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 300.0;

    /// Collectible defaults
    pub const COLLECTIBLE_SPEED: f32 = 60.0;
    pub const COLLECTIBLE_MIN_VALUE: u32 = 1;
    pub const COLLECTIBLE_MAX_VALUE: u32 = 81;
    pub const ROW_SIZE: usize = 8;
    /// Gap between neighbours in a row, as a fraction of collectible width
    pub const ROW_GAP_RATIO: f32 = 0.5;

    /// Obstacle defaults
    pub const SPIKE_INSET: f32 = 5.0;
    pub const SPIKE_LIFETIME: f32 = 5.0;
    pub const OBSTACLE_PLAYER_CLEARANCE: f32 = 100.0;
    pub const SPAWN_ATTEMPTS: u32 = 100;

    /// Spawn timers
    pub const OBSTACLE_SPAWN_INTERVAL: f32 = 5.0;
    pub const POWER_UP_SPAWN_INTERVAL: f32 = 3.5;
    pub const POWER_UP_SPAWN_CHANCE: f64 = 0.9;

    /// Power-up entity defaults
    pub const POWER_UP_SPEED: f32 = 80.0;
    pub const POWER_UP_TTL: f32 = 6.0;

    /// Enemy defaults
    pub const ENEMY_SPEED: f32 = 120.0;

    /// Floating label defaults
    pub const EFFECT_LIFETIME: f32 = 2.0;
    pub const EFFECT_RISE_SPEED: f32 = 30.0;
}

/// Clamp each component of `v` into `[-1, 1]`
#[inline]
pub fn clamp_unit(v: Vec2) -> Vec2 {
    v.clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// Highest y an entity of `height` may reach inside the play area
#[inline]
pub fn play_area_max_y(playfield_height: f32, height: f32) -> f32 {
    (playfield_height * consts::PLAY_AREA_FRACTION - height).max(0.0)
}
