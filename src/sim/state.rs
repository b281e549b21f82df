//! Round state: score and countdown timer
//!
//! A round is Playing until its timer runs out, then GameOver for good.
//! The final score is written to the high score table exactly once.

use serde::{Deserialize, Serialize};

use super::hooks::GameHooks;
use crate::audio::SoundEffect;
use crate::highscores::HighScoreTable;
use crate::settings::Difficulty;

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Timer running
    Playing,
    /// Timer ran out (terminal)
    GameOver,
}

/// Serializable round state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub score: u32,
    /// Seconds since the round started, in [0, duration]
    pub elapsed: f32,
    /// Round length in seconds
    pub duration: f32,
    pub phase: GamePhase,
    /// Set once the final score has been recorded
    pub score_saved: bool,
    pub difficulty: Difficulty,
}

impl GameState {
    pub fn new(duration: f32, difficulty: Difficulty) -> Self {
        Self {
            score: 0,
            elapsed: 0.0,
            duration,
            phase: GamePhase::Playing,
            score_saved: false,
            difficulty,
        }
    }
}

/// Owns the score and the round timer
#[derive(Debug, Clone)]
pub struct GameStateManager {
    state: GameState,
}

impl GameStateManager {
    pub fn new(duration: f32, difficulty: Difficulty) -> Self {
        Self {
            state: GameState::new(duration, difficulty),
        }
    }

    /// Rebuild from a captured state
    pub fn from_state(state: GameState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn elapsed(&self) -> f32 {
        self.state.elapsed
    }

    pub fn remaining(&self) -> f32 {
        (self.state.duration - self.state.elapsed).max(0.0)
    }

    pub fn difficulty(&self) -> Difficulty {
        self.state.difficulty
    }

    pub fn is_active(&self) -> bool {
        self.state.phase == GamePhase::Playing
    }

    /// Advance the round clock. Returns false once the round is over.
    pub fn update(
        &mut self,
        dt: f32,
        high_scores: &mut HighScoreTable,
        hooks: &mut dyn GameHooks,
    ) -> bool {
        if !self.is_active() {
            return false;
        }

        self.state.elapsed = (self.state.elapsed + dt).min(self.state.duration);
        if self.state.elapsed >= self.state.duration {
            self.end_round(high_scores, hooks);
            return false;
        }
        true
    }

    fn end_round(&mut self, high_scores: &mut HighScoreTable, hooks: &mut dyn GameHooks) {
        self.state.phase = GamePhase::GameOver;
        if self.state.score_saved {
            return;
        }
        self.state.score_saved = true;

        let new_best = high_scores.record(self.state.difficulty, self.state.score);
        log::info!(
            "Round over: score {} on {}{}",
            self.state.score,
            self.state.difficulty.as_str(),
            if new_best { " (new best!)" } else { "" }
        );
        hooks.play_sound(if new_best {
            SoundEffect::HighScore
        } else {
            SoundEffect::GameOver
        });
        hooks.on_game_over(self.state.score, new_best);
    }

    /// Add points, doubled when asked. Ignored once the round is over.
    /// Returns the resulting score.
    pub fn add_score(&mut self, points: u32, doubled: bool) -> u32 {
        if !self.is_active() {
            log::debug!("Ignoring {} points after round end", points);
            return self.state.score;
        }
        let points = if doubled { points.saturating_mul(2) } else { points };
        self.state.score = self.state.score.saturating_add(points);
        self.state.score
    }

    /// Give the player more time (moves the clock back)
    pub fn extend_game_time(&mut self, seconds: f32) {
        self.state.elapsed = (self.state.elapsed - seconds).clamp(0.0, self.last_second());
    }

    /// Take time away, never leaving less than one second on the clock
    pub fn reduce_game_time(&mut self, seconds: f32) {
        let limit = self.last_second();
        // Already inside the final second: a debuff must not hand time back
        if self.state.elapsed >= limit {
            return;
        }
        self.state.elapsed = (self.state.elapsed + seconds).clamp(0.0, limit);
    }

    fn last_second(&self) -> f32 {
        (self.state.duration - 1.0).max(0.0)
    }

    /// Start a fresh round with the same duration and difficulty
    pub fn reset(&mut self) {
        self.state = GameState::new(self.state.duration, self.state.difficulty);
    }
}
