//! Power-ups and timed effects
//!
//! Effect state lives here, not on the power-up entity that granted it.
//! Timed effects run Idle -> Active -> Idle; instant effects (time bonus and
//! penalty) apply once and never enter the active set. Every change an
//! effect makes to a player is undone exactly when it expires.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::EntityManager;
use super::entity::{EntityId, EntityKind};
use super::hooks::GameHooks;
use super::state::GameStateManager;
use crate::audio::{SoundEffect, VisualEffect};

/// Seconds handed back by ExtendTime
pub const EXTEND_TIME_SECONDS: f32 = 5.0;
/// Seconds taken by ReduceTime
pub const REDUCE_TIME_SECONDS: f32 = 3.0;
/// Player speed multiplier while slowed
pub const SLOW_FACTOR: f32 = 0.5;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    DoublePoints,
    ExtendTime,
    ReduceTime,
    InvertControls,
    SlowPlayer,
}

impl PowerUpKind {
    pub const BUFFS: [PowerUpKind; 2] = [PowerUpKind::DoublePoints, PowerUpKind::ExtendTime];
    pub const DEBUFFS: [PowerUpKind; 3] = [
        PowerUpKind::ReduceTime,
        PowerUpKind::InvertControls,
        PowerUpKind::SlowPlayer,
    ];
    /// Kinds with a duration, in label order
    pub const TIMED: [PowerUpKind; 3] = [
        PowerUpKind::DoublePoints,
        PowerUpKind::InvertControls,
        PowerUpKind::SlowPlayer,
    ];

    /// Nominal duration in seconds (0 = instant)
    pub fn duration(&self) -> f32 {
        match self {
            PowerUpKind::DoublePoints => 10.0,
            PowerUpKind::ExtendTime => 0.0,
            PowerUpKind::ReduceTime => 0.0,
            PowerUpKind::InvertControls => 5.0,
            PowerUpKind::SlowPlayer => 5.0,
        }
    }

    pub fn is_buff(&self) -> bool {
        Self::BUFFS.contains(self)
    }

    pub fn description(&self) -> &'static str {
        match self {
            PowerUpKind::DoublePoints => "Double Points",
            PowerUpKind::ExtendTime => "+5 Seconds",
            PowerUpKind::ReduceTime => "-3 Seconds",
            PowerUpKind::InvertControls => "Inverted Controls",
            PowerUpKind::SlowPlayer => "Slowed",
        }
    }

    /// Look up a power-up by its legacy numeric identifier
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(PowerUpKind::DoublePoints),
            1 => Some(PowerUpKind::ExtendTime),
            2 => Some(PowerUpKind::ReduceTime),
            3 => Some(PowerUpKind::InvertControls),
            4 => Some(PowerUpKind::SlowPlayer),
            _ => None,
        }
    }

    /// Pick buff or debuff with equal odds, then a kind uniformly within the pool
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Self::BUFFS[rng.random_range(0..Self::BUFFS.len())]
        } else {
            Self::DEBUFFS[rng.random_range(0..Self::DEBUFFS.len())]
        }
    }
}

/// Timer of one timed effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectTimer {
    pub active: bool,
    /// Seconds since activation
    pub timer: f32,
}

/// Serializable effect state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectState {
    pub double_points: EffectTimer,
    pub invert_controls: EffectTimer,
    pub slow_player: EffectTimer,
    /// Player speeds captured when SlowPlayer activated
    pub original_speeds: Vec<(EntityId, f32)>,
    /// Players whose controls InvertControls flipped
    pub inverted_players: Vec<EntityId>,
}

impl EffectState {
    fn timer(&self, kind: PowerUpKind) -> Option<&EffectTimer> {
        match kind {
            PowerUpKind::DoublePoints => Some(&self.double_points),
            PowerUpKind::InvertControls => Some(&self.invert_controls),
            PowerUpKind::SlowPlayer => Some(&self.slow_player),
            PowerUpKind::ExtendTime | PowerUpKind::ReduceTime => None,
        }
    }

    fn timer_mut(&mut self, kind: PowerUpKind) -> Option<&mut EffectTimer> {
        match kind {
            PowerUpKind::DoublePoints => Some(&mut self.double_points),
            PowerUpKind::InvertControls => Some(&mut self.invert_controls),
            PowerUpKind::SlowPlayer => Some(&mut self.slow_player),
            PowerUpKind::ExtendTime | PowerUpKind::ReduceTime => None,
        }
    }
}

/// Owns timed effect state and applies effects to players and the round
#[derive(Debug, Clone, Default)]
pub struct PowerUpManager {
    state: EffectState,
    label: String,
    /// Last label handed to the hooks
    announced: String,
}

impl PowerUpManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a captured state
    pub fn from_state(state: EffectState) -> Self {
        let mut manager = Self {
            state,
            ..Self::default()
        };
        manager.rebuild_label();
        manager
    }

    pub fn state(&self) -> &EffectState {
        &self.state
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.state.timer(kind).is_some_and(|t| t.active)
    }

    pub fn is_double_points(&self) -> bool {
        self.is_active(PowerUpKind::DoublePoints)
    }

    /// Seconds left on an active timed effect
    pub fn remaining(&self, kind: PowerUpKind) -> Option<f32> {
        self.state
            .timer(kind)
            .filter(|t| t.active)
            .map(|t| (kind.duration() - t.timer).max(0.0))
    }

    /// Active effects with their remaining seconds, " | "-joined
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Apply a collected power-up
    pub fn process_power_up(
        &mut self,
        kind: PowerUpKind,
        pos: Vec2,
        entities: &mut EntityManager,
        game: &mut GameStateManager,
        hooks: &mut dyn GameHooks,
    ) {
        log::debug!("Power-up {:?} collected at ({:.0}, {:.0})", kind, pos.x, pos.y);

        match kind {
            PowerUpKind::ExtendTime => game.extend_game_time(EXTEND_TIME_SECONDS),
            PowerUpKind::ReduceTime => game.reduce_game_time(REDUCE_TIME_SECONDS),
            PowerUpKind::DoublePoints | PowerUpKind::InvertControls | PowerUpKind::SlowPlayer => {
                self.activate(kind, entities)
            }
        }

        if kind.is_buff() {
            hooks.play_sound(SoundEffect::PowerUpGood);
            hooks.spawn_visual_effect(VisualEffect::Sparkle, pos);
        } else {
            hooks.play_sound(SoundEffect::PowerUpBad);
            hooks.spawn_visual_effect(VisualEffect::Smoke, pos);
        }
        entities.spawn_effect(pos, kind.description());

        self.rebuild_label();
        self.announce(hooks);
    }

    /// Dispatch a power-up by legacy numeric id; unknown ids are ignored
    pub fn process_power_up_id(
        &mut self,
        id: u8,
        pos: Vec2,
        entities: &mut EntityManager,
        game: &mut GameStateManager,
        hooks: &mut dyn GameHooks,
    ) {
        match PowerUpKind::from_id(id) {
            Some(kind) => self.process_power_up(kind, pos, entities, game, hooks),
            None => log::warn!("Unknown power-up id {}, ignoring", id),
        }
    }

    /// Start (or restart) a timed effect. Re-triggering only resets the timer
    /// so the player mutation is never applied twice.
    fn activate(&mut self, kind: PowerUpKind, entities: &mut EntityManager) {
        let Some(timer) = self.state.timer_mut(kind) else {
            return;
        };
        let already_active = timer.active;
        *timer = EffectTimer {
            active: true,
            timer: 0.0,
        };
        if already_active {
            return;
        }

        match kind {
            PowerUpKind::InvertControls => {
                for player in entities.players_mut() {
                    if let EntityKind::Player {
                        ref mut invert_controls,
                    } = player.kind
                    {
                        *invert_controls = true;
                        self.state.inverted_players.push(player.id);
                    }
                }
            }
            PowerUpKind::SlowPlayer => {
                for player in entities.players_mut() {
                    self.state.original_speeds.push((player.id, player.motion.speed));
                    player.motion.speed *= SLOW_FACTOR;
                }
            }
            _ => {}
        }
    }

    /// End a timed effect and undo its player mutations
    fn deactivate(&mut self, kind: PowerUpKind, entities: &mut EntityManager) {
        if let Some(timer) = self.state.timer_mut(kind) {
            *timer = EffectTimer::default();
        }

        match kind {
            PowerUpKind::InvertControls => {
                for id in self.state.inverted_players.drain(..) {
                    if let Some(EntityKind::Player { invert_controls }) =
                        entities.get_mut(id).map(|e| &mut e.kind)
                    {
                        *invert_controls = false;
                    }
                }
            }
            PowerUpKind::SlowPlayer => {
                for (id, speed) in self.state.original_speeds.drain(..) {
                    if let Some(player) = entities.get_mut(id) {
                        player.motion.speed = speed;
                    }
                }
            }
            _ => {}
        }
        log::debug!("{} expired", kind.description());
    }

    /// Advance timers, expire finished effects and refresh the label
    pub fn update(&mut self, dt: f32, entities: &mut EntityManager, hooks: &mut dyn GameHooks) {
        for kind in PowerUpKind::TIMED {
            let expired = match self.state.timer_mut(kind) {
                Some(timer) if timer.active => {
                    timer.timer += dt;
                    timer.timer >= kind.duration()
                }
                _ => false,
            };
            if expired {
                self.deactivate(kind, entities);
                hooks.play_sound(SoundEffect::EffectExpired);
            }
        }

        self.rebuild_label();
        self.announce(hooks);
    }

    /// Force every effect back to Idle, reverting all player mutations
    pub fn reset_power_ups(&mut self, entities: &mut EntityManager) {
        for kind in PowerUpKind::TIMED {
            if self.is_active(kind) {
                self.deactivate(kind, entities);
            }
        }
        self.state = EffectState::default();
        self.rebuild_label();
    }

    fn rebuild_label(&mut self) {
        self.label = PowerUpKind::TIMED
            .iter()
            .filter_map(|&kind| {
                self.remaining(kind)
                    .map(|left| format!("{} ({}s)", kind.description(), left.ceil() as u32))
            })
            .collect::<Vec<_>>()
            .join(" | ");
    }

    fn announce(&mut self, hooks: &mut dyn GameHooks) {
        if self.announced != self.label {
            self.announced.clone_from(&self.label);
            hooks.on_power_up_label_changed(&self.label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Difficulty, Settings};
    use crate::sim::hooks::{EventLog, NullHooks};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Fixture {
        power_ups: PowerUpManager,
        entities: EntityManager,
        game: GameStateManager,
        player: EntityId,
    }

    fn fixture() -> Fixture {
        let settings = Settings {
            seed: Some(1),
            ..Settings::default()
        };
        let mut entities = EntityManager::new(&settings);
        let player = entities.spawn_player(Vec2::new(100.0, 100.0), 200.0);
        Fixture {
            power_ups: PowerUpManager::new(),
            entities,
            game: GameStateManager::new(settings.round_duration, Difficulty::Easy),
            player,
        }
    }

    fn apply(f: &mut Fixture, kind: PowerUpKind, hooks: &mut dyn GameHooks) {
        f.power_ups
            .process_power_up(kind, Vec2::ZERO, &mut f.entities, &mut f.game, hooks);
    }

    fn speed(f: &Fixture) -> f32 {
        f.entities.get(f.player).map(|p| p.motion.speed).unwrap_or_default()
    }

    fn inverted(f: &Fixture) -> bool {
        matches!(
            f.entities.get(f.player).map(|p| &p.kind),
            Some(EntityKind::Player {
                invert_controls: true
            })
        )
    }

    #[test]
    fn test_slow_player_restores_exact_speed() {
        let mut f = fixture();
        f.entities.get_mut(f.player).unwrap().motion.speed = 173.3;
        apply(&mut f, PowerUpKind::SlowPlayer, &mut NullHooks);
        assert_eq!(speed(&f), 173.3 * SLOW_FACTOR);

        // Re-trigger while active must not compound
        f.power_ups.update(2.0, &mut f.entities, &mut NullHooks);
        apply(&mut f, PowerUpKind::SlowPlayer, &mut NullHooks);
        assert_eq!(speed(&f), 173.3 * SLOW_FACTOR);
        assert_eq!(f.power_ups.remaining(PowerUpKind::SlowPlayer), Some(5.0));

        f.power_ups.update(4.9, &mut f.entities, &mut NullHooks);
        assert!(f.power_ups.is_active(PowerUpKind::SlowPlayer));
        f.power_ups.update(0.2, &mut f.entities, &mut NullHooks);
        assert!(!f.power_ups.is_active(PowerUpKind::SlowPlayer));
        assert_eq!(speed(&f), 173.3);
    }

    #[test]
    fn test_invert_controls_reverted_on_expiry() {
        let mut f = fixture();
        let mut log = EventLog::new();
        apply(&mut f, PowerUpKind::InvertControls, &mut log);
        assert!(inverted(&f));
        assert_eq!(log.last_label(), Some("Inverted Controls (5s)"));

        f.power_ups.update(5.0, &mut f.entities, &mut log);
        assert!(!inverted(&f));
        assert_eq!(log.last_label(), Some(""));
        assert_eq!(log.count_sound(SoundEffect::EffectExpired), 1);
        assert_eq!(log.count_sound(SoundEffect::PowerUpBad), 1);
    }

    #[test]
    fn test_invert_controls_retrigger_records_player_once() {
        let mut f = fixture();
        apply(&mut f, PowerUpKind::InvertControls, &mut NullHooks);
        f.power_ups.update(3.0, &mut f.entities, &mut NullHooks);
        apply(&mut f, PowerUpKind::InvertControls, &mut NullHooks);

        assert!(inverted(&f));
        assert_eq!(f.power_ups.state().inverted_players, vec![f.player]);
        assert_eq!(f.power_ups.remaining(PowerUpKind::InvertControls), Some(5.0));

        // The restarted timer runs its full length, then one revert clears it
        f.power_ups.update(4.9, &mut f.entities, &mut NullHooks);
        assert!(inverted(&f));
        f.power_ups.update(0.2, &mut f.entities, &mut NullHooks);
        assert!(!inverted(&f));
        assert!(f.power_ups.state().inverted_players.is_empty());
    }

    #[test]
    fn test_label_joins_active_effects() {
        let mut f = fixture();
        apply(&mut f, PowerUpKind::DoublePoints, &mut NullHooks);
        apply(&mut f, PowerUpKind::SlowPlayer, &mut NullHooks);
        f.power_ups.update(1.5, &mut f.entities, &mut NullHooks);
        assert_eq!(f.power_ups.label(), "Double Points (9s) | Slowed (4s)");
        assert!(f.power_ups.is_double_points());
    }

    #[test]
    fn test_instant_effects_move_round_clock() {
        let mut f = fixture();
        let mut table = crate::HighScoreTable::new();
        f.game.update(4.0, &mut table, &mut NullHooks);

        apply(&mut f, PowerUpKind::ExtendTime, &mut NullHooks);
        assert_eq!(f.game.elapsed(), 0.0);
        apply(&mut f, PowerUpKind::ReduceTime, &mut NullHooks);
        assert_eq!(f.game.elapsed(), REDUCE_TIME_SECONDS);
        assert!(!f.power_ups.is_active(PowerUpKind::ExtendTime));
        assert_eq!(f.power_ups.label(), "");
    }

    #[test]
    fn test_reset_reverts_everything() {
        let mut f = fixture();
        apply(&mut f, PowerUpKind::SlowPlayer, &mut NullHooks);
        apply(&mut f, PowerUpKind::InvertControls, &mut NullHooks);
        apply(&mut f, PowerUpKind::DoublePoints, &mut NullHooks);

        f.power_ups.reset_power_ups(&mut f.entities);
        assert_eq!(speed(&f), 200.0);
        assert!(!inverted(&f));
        assert!(!f.power_ups.is_double_points());
        assert_eq!(f.power_ups.state(), &EffectState::default());
    }

    #[test]
    fn test_collecting_spawns_label_entity() {
        let mut f = fixture();
        apply(&mut f, PowerUpKind::DoublePoints, &mut NullHooks);
        let labels: Vec<_> = f
            .entities
            .get_all()
            .into_iter()
            .filter_map(|e| match e.kind {
                EntityKind::Effect { label, .. } => Some(label),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["Double Points".to_string()]);
    }

    #[test]
    fn test_unknown_id_ignored() {
        let mut f = fixture();
        let mut log = EventLog::new();
        f.power_ups
            .process_power_up_id(42, Vec2::ZERO, &mut f.entities, &mut f.game, &mut log);
        assert!(log.events.is_empty());
        assert_eq!(f.power_ups.state(), &EffectState::default());

        f.power_ups
            .process_power_up_id(0, Vec2::ZERO, &mut f.entities, &mut f.game, &mut log);
        assert!(f.power_ups.is_double_points());
    }

    #[test]
    fn test_random_selection_covers_both_pools() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut buffs = 0;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let kind = PowerUpKind::random(&mut rng);
            seen.insert(kind);
            if kind.is_buff() {
                buffs += 1;
            }
        }
        assert_eq!(seen.len(), 5);
        assert!((850..1150).contains(&buffs), "buffs = {buffs}");
    }
}
