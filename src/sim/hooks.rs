//! Boundary traits between the simulation and its host
//!
//! The host passes an input source and a hook sink into every tick; the
//! simulation never holds on to either.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::{SoundEffect, VisualEffect};

/// Discrete actions an input source can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Pause,
    Restart,
}

/// Poll-based input, read once per tick
pub trait InputSource {
    /// Horizontal movement in [-1, 1]
    fn move_x(&self) -> f32;
    /// Vertical movement in [-1, 1], positive is up
    fn move_y(&self) -> f32;
    fn is_action_pressed(&self, action: Action) -> bool;

    fn movement(&self) -> Vec2 {
        Vec2::new(self.move_x(), self.move_y())
    }

    /// Let the autopilot steer instead of this source
    fn idle_mode(&self) -> bool {
        false
    }
}

/// Fire-and-forget notifications from the simulation
pub trait GameHooks {
    fn play_sound(&mut self, _sound: SoundEffect) {}
    fn spawn_visual_effect(&mut self, _effect: VisualEffect, _pos: Vec2) {}
    fn on_score_changed(&mut self, _score: u32) {}
    fn on_timer_updated(&mut self, _remaining: f32) {}
    fn on_game_over(&mut self, _final_score: u32, _new_high_score: bool) {}
    fn on_power_up_label_changed(&mut self, _label: &str) {}
}

/// Hooks that ignore everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHooks;

impl GameHooks for NullHooks {}

/// A recorded hook call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundEffect),
    Visual { effect: VisualEffect, pos: Vec2 },
    ScoreChanged(u32),
    GameOver { final_score: u32, new_high_score: bool },
    PowerUpLabel(String),
}

/// Hooks that record every call (timer updates are only counted)
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
    pub timer_updates: u32,
    pub last_remaining: Option<f32>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sounds(&self) -> impl Iterator<Item = SoundEffect> + '_ {
        self.events.iter().filter_map(|e| match e {
            GameEvent::Sound(s) => Some(*s),
            _ => None,
        })
    }

    pub fn count_sound(&self, sound: SoundEffect) -> usize {
        self.sounds().filter(|s| *s == sound).count()
    }

    pub fn game_overs(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count()
    }

    pub fn last_label(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            GameEvent::PowerUpLabel(l) => Some(l.as_str()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.timer_updates = 0;
        self.last_remaining = None;
    }
}

impl GameHooks for EventLog {
    fn play_sound(&mut self, sound: SoundEffect) {
        self.events.push(GameEvent::Sound(sound));
    }

    fn spawn_visual_effect(&mut self, effect: VisualEffect, pos: Vec2) {
        self.events.push(GameEvent::Visual { effect, pos });
    }

    fn on_score_changed(&mut self, score: u32) {
        self.events.push(GameEvent::ScoreChanged(score));
    }

    fn on_timer_updated(&mut self, remaining: f32) {
        self.timer_updates += 1;
        self.last_remaining = Some(remaining);
    }

    fn on_game_over(&mut self, final_score: u32, new_high_score: bool) {
        self.events.push(GameEvent::GameOver {
            final_score,
            new_high_score,
        });
    }

    fn on_power_up_label_changed(&mut self, label: &str) {
        self.events.push(GameEvent::PowerUpLabel(label.to_string()));
    }
}
