//! Sound and visual effect catalogue
//!
//! The simulation only names effects; playback and drawing belong to the
//! host that implements [`crate::sim::GameHooks`].

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player ran into a tree or an enemy
    Hazard,
    /// Collectible picked up
    Collect,
    /// Buff power-up collected
    PowerUpGood,
    /// Debuff power-up collected
    PowerUpBad,
    /// A timed effect ran out
    EffectExpired,
    /// Round timer reached zero
    GameOver,
    /// Final score beat the stored best
    HighScore,
}

impl SoundEffect {
    /// Asset key the host uses to look the sound up
    pub fn key(&self) -> &'static str {
        match self {
            SoundEffect::Hazard => "hazard",
            SoundEffect::Collect => "collect",
            SoundEffect::PowerUpGood => "powerup_good",
            SoundEffect::PowerUpBad => "powerup_bad",
            SoundEffect::EffectExpired => "effect_expired",
            SoundEffect::GameOver => "game_over",
            SoundEffect::HighScore => "high_score",
        }
    }
}

/// One-shot visual effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualEffect {
    /// Balloon pop at the collection point
    Pop,
    /// Sparkle burst where a buff was picked up
    Sparkle,
    /// Smoke puff where a debuff was picked up
    Smoke,
    /// Hit flash on hazard contact
    Impact,
}

impl VisualEffect {
    pub fn key(&self) -> &'static str {
        match self {
            VisualEffect::Pop => "pop",
            VisualEffect::Sparkle => "sparkle",
            VisualEffect::Smoke => "smoke",
            VisualEffect::Impact => "impact",
        }
    }
}
