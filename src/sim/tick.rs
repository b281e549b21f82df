//! Variable timestep round driver
//!
//! One `tick` advances the round by `dt` seconds in a fixed order:
//! round clock, power-up timers, player movement, entity motion and
//! spawning, collisions, then HUD notifications.

use glam::Vec2;

use super::collision::{CollisionManager, CollisionTotals};
use super::entities::EntityManager;
use super::entity::{EntityId, EntityKind};
use super::hooks::{Action, GameHooks, InputSource};
use super::powerup::PowerUpManager;
use super::snapshot::{RoundSnapshot, SNAPSHOT_VERSION};
use super::state::GameStateManager;
use crate::consts::*;
use crate::highscores::HighScoreTable;
use crate::settings::Settings;

/// Autopilot ignores offsets smaller than this (pixels)
const AUTOPILOT_DEADZONE: f32 = 4.0;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal movement in [-1, 1]
    pub move_x: f32,
    /// Vertical movement in [-1, 1], positive is up
    pub move_y: f32,
    /// Pause toggle
    pub pause: bool,
    /// Start a new round
    pub restart: bool,
    /// Idle/demo mode - the autopilot plays
    pub idle_mode: bool,
}

impl TickInput {
    pub fn idle() -> Self {
        Self {
            idle_mode: true,
            ..Self::default()
        }
    }
}

impl InputSource for TickInput {
    fn move_x(&self) -> f32 {
        self.move_x
    }

    fn move_y(&self) -> f32 {
        self.move_y
    }

    fn is_action_pressed(&self, action: Action) -> bool {
        match action {
            Action::Pause => self.pause,
            Action::Restart => self.restart,
        }
    }

    fn idle_mode(&self) -> bool {
        self.idle_mode
    }
}

/// A round in progress with all of its managers
#[derive(Debug, Clone)]
pub struct Round {
    settings: Settings,
    game: GameStateManager,
    power_ups: PowerUpManager,
    entities: EntityManager,
    collisions: CollisionManager,
    paused: bool,
    /// Score last sent to the HUD
    last_score: Option<u32>,
}

impl Round {
    /// Start a fresh, populated round
    pub fn new(settings: &Settings) -> Self {
        let mut entities = EntityManager::new(settings);
        entities.populate_round();
        log::info!(
            "Round started: {:.0}s on {}",
            settings.round_duration,
            settings.difficulty.as_str()
        );
        Self {
            settings: settings.clone(),
            game: GameStateManager::new(settings.round_duration, settings.difficulty),
            power_ups: PowerUpManager::new(),
            entities,
            collisions: CollisionManager::new(),
            paused: false,
            last_score: None,
        }
    }

    /// Rebuild a round from a snapshot. The snapshot's difficulty wins over
    /// the one in `settings`.
    pub fn resume(settings: &Settings, snapshot: RoundSnapshot) -> Self {
        let mut settings = settings.clone();
        if settings.difficulty != snapshot.game.difficulty {
            log::warn!(
                "Snapshot difficulty {} overrides configured {}",
                snapshot.game.difficulty.as_str(),
                settings.difficulty.as_str()
            );
            settings.difficulty = snapshot.game.difficulty;
        }
        log::info!(
            "Round resumed at {:.1}s with score {}",
            snapshot.game.elapsed,
            snapshot.game.score
        );
        Self {
            entities: EntityManager::from_parts(&settings, snapshot.entities, snapshot.spawn),
            game: GameStateManager::from_state(snapshot.game),
            power_ups: PowerUpManager::from_state(snapshot.effects),
            collisions: CollisionManager::from_totals(snapshot.totals),
            settings,
            paused: false,
            last_score: None,
        }
    }

    /// Capture everything needed to continue this round later
    pub fn capture(&self) -> RoundSnapshot {
        RoundSnapshot {
            version: SNAPSHOT_VERSION,
            game: self.game.state().clone(),
            effects: self.power_ups.state().clone(),
            entities: self.entities.get_all(),
            spawn: self.entities.spawn_state().clone(),
            totals: *self.collisions.totals(),
        }
    }

    /// Freeze the round and capture it
    pub fn pause(&mut self) -> RoundSnapshot {
        self.paused = true;
        log::info!("Paused at {:.1}s", self.game.elapsed());
        self.capture()
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    /// Throw the current round away and start over with the same settings
    pub fn restart(&mut self) {
        self.game.reset();
        self.power_ups.reset_power_ups(&mut self.entities);
        self.entities.clear();
        self.entities.populate_round();
        self.collisions.reset();
        self.paused = false;
        self.last_score = None;
        log::info!("Round restarted on {}", self.settings.difficulty.as_str());
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn game(&self) -> &GameStateManager {
        &self.game
    }

    pub fn power_ups(&self) -> &PowerUpManager {
        &self.power_ups
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn totals(&self) -> &CollisionTotals {
        self.collisions.totals()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_over(&self) -> bool {
        !self.game.is_active()
    }

    /// Advance the round by the `dt` seconds that actually elapsed.
    /// Negative or non-finite values count as zero.
    /// Returns true while the round is still running.
    pub fn tick(
        &mut self,
        input: &impl InputSource,
        high_scores: &mut HighScoreTable,
        hooks: &mut dyn GameHooks,
        dt: f32,
    ) -> bool {
        if input.is_action_pressed(Action::Restart) {
            self.restart();
        }
        if input.is_action_pressed(Action::Pause) && self.game.is_active() {
            self.paused = !self.paused;
            log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
        }
        if self.paused || !self.game.is_active() {
            return self.game.is_active();
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if !self.game.update(dt, high_scores, hooks) {
            self.notify_hud(hooks);
            return false;
        }

        self.power_ups.update(dt, &mut self.entities, hooks);

        let movement = if input.idle_mode() {
            self.autopilot_movement()
        } else {
            input.movement()
        };
        self.entities.move_player(movement, dt);

        self.entities.update(dt);

        self.collisions.detect_collisions(
            &mut self.entities,
            &mut self.game,
            &mut self.power_ups,
            hooks,
        );

        self.notify_hud(hooks);
        self.game.is_active()
    }

    fn notify_hud(&mut self, hooks: &mut dyn GameHooks) {
        hooks.on_timer_updated(self.game.remaining());
        let score = self.game.score();
        if self.last_score != Some(score) {
            self.last_score = Some(score);
            hooks.on_score_changed(score);
        }
    }

    fn player(&self) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|e| e.active && e.is_player())
            .map(|e| e.id)
    }

    /// Steer toward the nearest collectible or helpful power-up,
    /// compensating for inverted controls
    fn autopilot_movement(&self) -> Vec2 {
        let Some(player) = self.player().and_then(|id| self.entities.get(id)) else {
            return Vec2::ZERO;
        };
        let from = player.bounds().center();

        let target = self
            .entities
            .iter()
            .filter(|e| {
                e.active
                    && match &e.kind {
                        EntityKind::Collectible(_) => true,
                        EntityKind::PowerUp { kind, .. } => kind.is_buff(),
                        _ => false,
                    }
            })
            .map(|e| e.bounds().center())
            .min_by(|a, b| {
                a.distance_squared(from)
                    .total_cmp(&b.distance_squared(from))
            });
        let Some(target) = target else {
            return Vec2::ZERO;
        };

        let steer = |d: f32| {
            if d.abs() < AUTOPILOT_DEADZONE {
                0.0
            } else {
                d.signum()
            }
        };
        let delta = target - from;
        let movement = Vec2::new(steer(delta.x), steer(delta.y));
        match player.kind {
            EntityKind::Player {
                invert_controls: true,
            } => -movement,
            _ => movement,
        }
    }
}
