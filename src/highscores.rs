//! High score leaderboard system
//!
//! In-memory only, one ranked list per difficulty, top 5 scores each.

use serde::{Deserialize, Serialize};

use crate::settings::Difficulty;

/// Maximum number of high scores to keep per difficulty
pub const MAX_HIGH_SCORES: usize = 5;

/// A single difficulty's leaderboard, sorted descending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<u32>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u32) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|&e| score > e).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|&e| score > e);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        // Equal scores rank below the ones already present
        let pos = self.entries.iter().position(|&e| score > e);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, score);
                i + 1
            }
            None => {
                self.entries.push(score);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().copied()
    }
}

/// Ranked high scores for every difficulty, owned by the process driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreTable {
    easy: HighScores,
    hard: HighScores,
}

impl HighScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scores(&self, difficulty: Difficulty) -> &HighScores {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Hard => &self.hard,
        }
    }

    fn scores_mut(&mut self, difficulty: Difficulty) -> &mut HighScores {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Hard => &mut self.hard,
        }
    }

    /// Record a final score. Returns true when it strictly beats the previous best
    /// (the first score on an empty list always counts).
    pub fn record(&mut self, difficulty: Difficulty, score: u32) -> bool {
        let scores = self.scores_mut(difficulty);
        let new_best = scores.top_score().is_none_or(|best| score > best);
        let rank = scores.add_score(score);
        log::info!(
            "Recorded {} score {} (rank {:?}, new best: {})",
            difficulty.as_str(),
            score,
            rank,
            new_best
        );
        new_best
    }

    /// Ranked entries, best first
    pub fn entries(&self, difficulty: Difficulty) -> &[u32] {
        &self.scores(difficulty).entries
    }

    pub fn best(&self, difficulty: Difficulty) -> Option<u32> {
        self.scores(difficulty).top_score()
    }
}
