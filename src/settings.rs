//! Game settings and difficulty
//!
//! Loaded from an optional JSON file; every field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 2] = [Difficulty::Easy, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "hard" | "h" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Whether collectibles show an arithmetic expression instead of their value
    pub fn uses_math_operations(&self) -> bool {
        match self {
            Difficulty::Easy => false,
            Difficulty::Hard => true,
        }
    }

    /// Bouncing enemies placed at round start
    pub fn enemy_count(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Hard => 2,
        }
    }
}

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Playfield ===
    pub playfield_width: f32,
    pub playfield_height: f32,

    // === Round ===
    /// Round length in seconds
    pub round_duration: f32,
    /// RNG seed (random when absent)
    pub seed: Option<u64>,

    // === Speeds (px/s) ===
    pub player_speed: f32,
    pub collectible_speed: f32,
    pub enemy_speed: f32,
    pub power_up_speed: f32,

    // === Spawning ===
    /// Collectibles per row
    pub row_size: usize,
    /// Trees placed at round start
    pub initial_trees: usize,
    /// Spikes placed by each periodic obstacle wave
    pub spikes_per_wave: usize,
    /// Spike lifetime in seconds (0 = permanent)
    pub spike_lifetime: f32,
    /// Enemies placed at round start (difficulty default when absent)
    pub enemy_count: Option<usize>,

    // === Driver ===
    pub target_fps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,

            playfield_width: PLAYFIELD_WIDTH,
            playfield_height: PLAYFIELD_HEIGHT,

            round_duration: GAME_DURATION,
            seed: None,

            player_speed: PLAYER_SPEED,
            collectible_speed: COLLECTIBLE_SPEED,
            enemy_speed: ENEMY_SPEED,
            power_up_speed: POWER_UP_SPEED,

            row_size: ROW_SIZE,
            initial_trees: 3,
            spikes_per_wave: 2,
            spike_lifetime: SPIKE_LIFETIME,
            enemy_count: None,

            target_fps: TARGET_FPS,
        }
    }
}

impl Settings {
    /// Default settings at the given difficulty
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Parse settings from a JSON string and validate them
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.playfield_width < ENTITY_SIZE * 2.0 || self.playfield_height < ENTITY_SIZE * 4.0 {
            return Err(SettingsError::Invalid {
                field: "playfield",
                reason: "playfield too small for the entity size",
            });
        }
        if self.round_duration <= 1.0 {
            return Err(SettingsError::Invalid {
                field: "round_duration",
                reason: "must be longer than one second",
            });
        }
        if self.row_size == 0 {
            return Err(SettingsError::Invalid {
                field: "row_size",
                reason: "must be at least one",
            });
        }
        if self.target_fps == 0 {
            return Err(SettingsError::Invalid {
                field: "target_fps",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Enemies for this round
    pub fn effective_enemy_count(&self) -> usize {
        self.enemy_count
            .unwrap_or_else(|| self.difficulty.enemy_count())
    }

    /// Spike lifetime, `None` when spikes are permanent
    pub fn effective_spike_lifetime(&self) -> Option<f32> {
        (self.spike_lifetime > 0.0).then_some(self.spike_lifetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("e"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "difficulty": "Hard", "seed": 7 }"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.round_duration, GAME_DURATION);
        assert_eq!(settings.effective_enemy_count(), 2);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = Settings::from_json(r#"{ "row_size": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "row_size", .. }));

        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_zero_spike_lifetime_is_permanent() {
        let settings = Settings {
            spike_lifetime: 0.0,
            ..Settings::default()
        };
        assert_eq!(settings.effective_spike_lifetime(), None);
        assert_eq!(Settings::default().effective_spike_lifetime(), Some(SPIKE_LIFETIME));
    }
}
