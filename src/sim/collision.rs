//! Collision detection and response
//!
//! Each frame every entity is visited once, by ID, from a snapshot taken
//! before any response runs. The subject's kind picks which rules apply:
//!
//! 1. Player vs tree: roll back, hazard sound once per continuous contact
//! 2. Player vs collectible: first overlap in insertion order is collected
//! 3. Collectible vs obstacle: collectible is lost
//! 4. Player vs power-up: effect applied
//! 5. Enemy vs obstacle / player: enemy bounces, player is rolled back

use serde::{Deserialize, Serialize};

use super::entities::EntityManager;
use super::entity::{EntityId, EntityKind, EntityTag, ObstacleKind};
use super::hooks::GameHooks;
use super::powerup::{PowerUpKind, PowerUpManager};
use super::state::GameStateManager;
use crate::audio::{SoundEffect, VisualEffect};

/// What happened during one collision pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    /// Collected collectible IDs with the points they awarded
    pub collected: Vec<(EntityId, u32)>,
    pub power_ups: Vec<PowerUpKind>,
    /// New hazard contacts (trees and enemies)
    pub hazard_hits: u32,
    /// Collectibles destroyed by obstacles
    pub collectibles_lost: u32,
}

/// Running totals for a round
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionTotals {
    pub collected: u32,
    pub points: u32,
    pub power_ups: u32,
    pub hazard_hits: u32,
    pub collectibles_lost: u32,
}

/// Resolves interactions between entities
#[derive(Debug, Clone, Default)]
pub struct CollisionManager {
    totals: CollisionTotals,
}

impl CollisionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_totals(totals: CollisionTotals) -> Self {
        Self { totals }
    }

    pub fn totals(&self) -> &CollisionTotals {
        &self.totals
    }

    pub fn reset(&mut self) {
        self.totals = CollisionTotals::default();
    }

    /// Run every collision rule once
    pub fn detect_collisions(
        &mut self,
        entities: &mut EntityManager,
        game: &mut GameStateManager,
        power_ups: &mut PowerUpManager,
        hooks: &mut dyn GameHooks,
    ) -> CollisionReport {
        let mut report = CollisionReport::default();

        for id in entities.ids() {
            // Earlier responses this frame may have deactivated the subject
            let Some(tag) = entities
                .get(id)
                .filter(|e| e.is_collidable())
                .map(|e| e.tag())
            else {
                continue;
            };

            match tag {
                EntityTag::Player => {
                    player_vs_trees(id, entities, hooks, &mut report);
                    player_vs_collectibles(id, entities, game, power_ups, hooks, &mut report);
                    player_vs_power_ups(id, entities, game, power_ups, hooks, &mut report);
                }
                EntityTag::Collectible => collectible_vs_obstacles(id, entities, &mut report),
                EntityTag::Enemy => enemy_vs_world(id, entities, hooks, &mut report),
                EntityTag::PowerUp | EntityTag::Obstacle | EntityTag::Effect => {}
            }
        }

        self.totals.collected += report.collected.len() as u32;
        self.totals.points += report.collected.iter().map(|(_, p)| p).sum::<u32>();
        self.totals.power_ups += report.power_ups.len() as u32;
        self.totals.hazard_hits += report.hazard_hits;
        self.totals.collectibles_lost += report.collectibles_lost;
        report
    }
}

fn player_vs_trees(
    id: EntityId,
    entities: &mut EntityManager,
    hooks: &mut dyn GameHooks,
    report: &mut CollisionReport,
) {
    let Some(player_box) = entities.get(id).map(|p| p.hitbox()) else {
        return;
    };
    let touching = entities
        .iter()
        .any(|e| e.active && e.is_obstacle(ObstacleKind::Tree) && e.hitbox().overlaps(&player_box));

    let Some(player) = entities.get_mut(id) else {
        return;
    };
    if touching {
        if !player.collided {
            player.collided = true;
            hooks.play_sound(SoundEffect::Hazard);
            hooks.spawn_visual_effect(VisualEffect::Impact, player.pos);
            report.hazard_hits += 1;
        }
        player.roll_back();
    } else {
        player.collided = false;
    }
}

fn player_vs_collectibles(
    id: EntityId,
    entities: &mut EntityManager,
    game: &mut GameStateManager,
    power_ups: &PowerUpManager,
    hooks: &mut dyn GameHooks,
    report: &mut CollisionReport,
) {
    let Some(player_box) = entities.get(id).map(|p| p.hitbox()) else {
        return;
    };
    // First match wins: one collection per player per frame
    let hit = entities.iter().find_map(|e| match &e.kind {
        EntityKind::Collectible(c) if e.active && e.hitbox().overlaps(&player_box) => {
            Some((e.id, e.pos, c.value, c.row))
        }
        _ => None,
    });
    let Some((collectible_id, pos, value, row)) = hit else {
        return;
    };

    if let Some(collectible) = entities.get_mut(collectible_id) {
        collectible.active = false;
    }
    let before = game.score();
    let gained = game.add_score(value, power_ups.is_double_points()) - before;

    entities.remove_row(row);
    entities.spawn_collectible_row();

    hooks.play_sound(SoundEffect::Collect);
    hooks.spawn_visual_effect(VisualEffect::Pop, pos);
    entities.spawn_effect(pos, format!("+{}", gained));
    log::debug!("Collected {} (+{}) from row {}", value, gained, row);

    report.collected.push((collectible_id, gained));
}

fn collectible_vs_obstacles(id: EntityId, entities: &mut EntityManager, report: &mut CollisionReport) {
    let Some(collectible_box) = entities.get(id).map(|c| c.hitbox()) else {
        return;
    };
    let blocked = entities
        .iter()
        .any(|e| e.active && e.tag() == EntityTag::Obstacle && e.hitbox().overlaps(&collectible_box));
    if blocked && let Some(collectible) = entities.get_mut(id) {
        collectible.active = false;
        report.collectibles_lost += 1;
    }
}

fn player_vs_power_ups(
    id: EntityId,
    entities: &mut EntityManager,
    game: &mut GameStateManager,
    power_ups: &mut PowerUpManager,
    hooks: &mut dyn GameHooks,
    report: &mut CollisionReport,
) {
    let Some(player_box) = entities.get(id).map(|p| p.hitbox()) else {
        return;
    };
    let touched: Vec<_> = entities
        .iter()
        .filter_map(|e| match e.kind {
            EntityKind::PowerUp { kind, .. } if e.active && e.hitbox().overlaps(&player_box) => {
                Some((e.id, kind, e.pos))
            }
            _ => None,
        })
        .collect();

    for (power_up_id, kind, pos) in touched {
        if let Some(power_up) = entities.get_mut(power_up_id) {
            power_up.active = false;
        }
        power_ups.process_power_up(kind, pos, entities, game, hooks);
        report.power_ups.push(kind);
    }
}

fn enemy_vs_world(
    id: EntityId,
    entities: &mut EntityManager,
    hooks: &mut dyn GameHooks,
    report: &mut CollisionReport,
) {
    let Some(enemy_box) = entities.get(id).map(|e| e.hitbox()) else {
        return;
    };
    let hits_obstacle = entities
        .iter()
        .any(|e| e.active && e.tag() == EntityTag::Obstacle && e.hitbox().overlaps(&enemy_box));
    let players: Vec<EntityId> = entities
        .iter()
        .filter(|e| e.active && e.is_player() && e.hitbox().overlaps(&enemy_box))
        .map(|e| e.id)
        .collect();

    for &player_id in &players {
        if let Some(player) = entities.get_mut(player_id) {
            player.roll_back();
        }
    }

    let Some(enemy) = entities.get_mut(id) else {
        return;
    };
    if !players.is_empty() {
        if !enemy.collided {
            enemy.collided = true;
            hooks.play_sound(SoundEffect::Hazard);
            hooks.spawn_visual_effect(VisualEffect::Impact, enemy.pos);
            report.hazard_hits += 1;
        }
    } else {
        enemy.collided = false;
    }
    if hits_obstacle || !players.is_empty() {
        enemy.bounce();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Difficulty, Settings};
    use crate::sim::entity::Entity;
    use crate::sim::hooks::{EventLog, NullHooks};
    use glam::Vec2;

    struct World {
        entities: EntityManager,
        game: GameStateManager,
        power_ups: PowerUpManager,
        collisions: CollisionManager,
        player: EntityId,
    }

    impl World {
        fn new() -> Self {
            let settings = Settings {
                seed: Some(77),
                ..Settings::default()
            };
            let mut entities = EntityManager::new(&settings);
            let player = entities.spawn_player(Vec2::new(100.0, 100.0), 200.0);
            Self {
                entities,
                game: GameStateManager::new(settings.round_duration, Difficulty::Easy),
                power_ups: PowerUpManager::new(),
                collisions: CollisionManager::new(),
                player,
            }
        }

        fn detect(&mut self, hooks: &mut dyn GameHooks) -> CollisionReport {
            self.collisions.detect_collisions(
                &mut self.entities,
                &mut self.game,
                &mut self.power_ups,
                hooks,
            )
        }

        /// Put the player at `pos`, having come from `prev`
        fn place_player(&mut self, pos: Vec2, prev: Vec2) {
            let player = self.entities.get_mut(self.player).unwrap();
            player.pos = pos;
            player.motion.prev_pos = prev;
        }

        fn row_members(&self, row: u32) -> Vec<EntityId> {
            self.entities
                .iter()
                .filter(|e| e.as_collectible().is_some_and(|c| c.row == row))
                .map(|e| e.id)
                .collect()
        }

        fn value_of(&self, id: EntityId) -> u32 {
            self.entities.get(id).unwrap().as_collectible().unwrap().value
        }
    }

    #[test]
    fn test_tree_rolls_back_and_sounds_once() {
        let mut w = World::new();
        let mut log = EventLog::new();
        w.entities
            .add(Entity::obstacle(100, Vec2::new(130.0, 100.0), ObstacleKind::Tree, None));

        w.place_player(Vec2::new(100.0, 100.0), Vec2::new(70.0, 100.0));
        w.detect(&mut log);
        assert_eq!(w.entities.get(w.player).unwrap().pos, Vec2::new(70.0, 100.0));
        assert!(w.entities.get(w.player).unwrap().collided);

        // Still pushing into the tree: no second sound
        w.place_player(Vec2::new(90.0, 100.0), Vec2::new(70.0, 100.0));
        w.detect(&mut log);
        assert_eq!(log.count_sound(SoundEffect::Hazard), 1);

        // Walk away, then come back
        w.place_player(Vec2::new(0.0, 100.0), Vec2::new(70.0, 100.0));
        w.detect(&mut log);
        assert!(!w.entities.get(w.player).unwrap().collided);
        w.place_player(Vec2::new(100.0, 100.0), Vec2::new(70.0, 100.0));
        w.detect(&mut log);
        assert_eq!(log.count_sound(SoundEffect::Hazard), 2);
    }

    #[test]
    fn test_tree_and_collectible_resolve_in_same_frame() {
        let mut w = World::new();
        let mut log = EventLog::new();
        w.entities
            .add(Entity::obstacle(100, Vec2::new(130.0, 100.0), ObstacleKind::Tree, None));
        let row = w.entities.spawn_collectible_row();
        let target = w.row_members(row)[0];
        let value = w.value_of(target);
        // Only reachable from the rolled-back position
        w.entities.get_mut(target).unwrap().pos = Vec2::new(40.0, 100.0);

        w.place_player(Vec2::new(100.0, 100.0), Vec2::new(70.0, 100.0));
        let report = w.detect(&mut log);

        assert_eq!(w.entities.get(w.player).unwrap().pos, Vec2::new(70.0, 100.0));
        assert_eq!(log.count_sound(SoundEffect::Hazard), 1);
        assert_eq!(report.hazard_hits, 1);
        assert_eq!(report.collected, vec![(target, value)]);
        assert_eq!(w.game.score(), value);
        assert_eq!(log.count_sound(SoundEffect::Collect), 1);
    }

    #[test]
    fn test_collecting_clears_row_and_spawns_next() {
        let mut w = World::new();
        let mut log = EventLog::new();
        let row = w.entities.spawn_collectible_row();
        let members = w.row_members(row);
        let target = members[3];
        let value = w.value_of(target);
        w.entities.get_mut(target).unwrap().pos = Vec2::new(110.0, 110.0);

        let report = w.detect(&mut log);
        assert_eq!(report.collected, vec![(target, value)]);
        assert_eq!(w.game.score(), value);
        assert!(members.iter().all(|id| !w.entities.get(*id).unwrap().active));
        assert_eq!(w.entities.count_active(EntityTag::Collectible), 8);
        assert_eq!(w.row_members(row + 1).len(), 8);
        assert_eq!(log.count_sound(SoundEffect::Collect), 1);
        assert!(w.entities.iter().any(|e| matches!(
            &e.kind,
            EntityKind::Effect { label, .. } if *label == format!("+{value}")
        )));
    }

    #[test]
    fn test_double_points_doubles_collection() {
        let mut w = World::new();
        w.power_ups.process_power_up(
            PowerUpKind::DoublePoints,
            Vec2::ZERO,
            &mut w.entities,
            &mut w.game,
            &mut NullHooks,
        );
        let row = w.entities.spawn_collectible_row();
        let target = w.row_members(row)[0];
        let value = w.value_of(target);
        w.entities.get_mut(target).unwrap().pos = Vec2::new(100.0, 100.0);

        let report = w.detect(&mut NullHooks);
        assert_eq!(report.collected, vec![(target, value * 2)]);
        assert_eq!(w.game.score(), value * 2);
        assert_eq!(w.collisions.totals().points, value * 2);
    }

    #[test]
    fn test_first_collectible_wins() {
        let mut w = World::new();
        let first_row = w.entities.spawn_collectible_row();
        let second_row = w.entities.spawn_collectible_row();
        let a = w.row_members(first_row)[0];
        let b = w.row_members(second_row)[0];
        w.entities.get_mut(a).unwrap().pos = Vec2::new(120.0, 100.0);
        w.entities.get_mut(b).unwrap().pos = Vec2::new(80.0, 100.0);

        let report = w.detect(&mut NullHooks);
        assert_eq!(report.collected.len(), 1);
        assert_eq!(report.collected[0].0, a);
        assert!(w.entities.get(b).unwrap().active);
        assert_eq!(w.game.score(), w.value_of(a));
    }

    #[test]
    fn test_obstacle_destroys_collectible_without_score() {
        let mut w = World::new();
        w.entities
            .add(Entity::obstacle(100, Vec2::new(400.0, 300.0), ObstacleKind::Spikes, None));
        let row = w.entities.spawn_collectible_row();
        let target = w.row_members(row)[2];
        w.entities.get_mut(target).unwrap().pos = Vec2::new(410.0, 320.0);

        let report = w.detect(&mut NullHooks);
        assert_eq!(report.collectibles_lost, 1);
        assert!(!w.entities.get(target).unwrap().active);
        assert_eq!(w.game.score(), 0);
        // The rest of the row stays in play
        assert_eq!(w.entities.count_active(EntityTag::Collectible), 7);
    }

    #[test]
    fn test_power_up_pickup_applies_effect() {
        let mut w = World::new();
        let mut log = EventLog::new();
        let id = w.entities.next_entity_id();
        w.entities.add(Entity::power_up(
            id,
            Vec2::new(110.0, 90.0),
            0.0,
            Vec2::ONE,
            PowerUpKind::SlowPlayer,
        ));

        let report = w.detect(&mut log);
        assert_eq!(report.power_ups, vec![PowerUpKind::SlowPlayer]);
        assert!(!w.entities.get(id).unwrap().active);
        assert!(w.power_ups.is_active(PowerUpKind::SlowPlayer));
        assert_eq!(w.entities.get(w.player).unwrap().motion.speed, 100.0);
        assert_eq!(log.count_sound(SoundEffect::PowerUpBad), 1);

        // Inactive power-ups are not collected twice
        let report = w.detect(&mut log);
        assert!(report.power_ups.is_empty());
    }

    #[test]
    fn test_enemy_bounces_off_tree() {
        let mut w = World::new();
        w.entities
            .add(Entity::obstacle(100, Vec2::new(500.0, 300.0), ObstacleKind::Tree, None));
        let mut enemy = Entity::enemy(101, Vec2::new(460.0, 290.0), 100.0, Vec2::new(1.0, 1.0));
        enemy.motion.prev_pos = Vec2::new(450.0, 288.0);
        w.entities.add(enemy);

        w.detect(&mut NullHooks);
        let enemy = w.entities.get(101).unwrap();
        assert_eq!(enemy.pos, Vec2::new(450.0, 288.0));
        assert_eq!(enemy.motion.dir, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_enemy_contact_pushes_player_back() {
        let mut w = World::new();
        let mut log = EventLog::new();
        w.place_player(Vec2::new(100.0, 100.0), Vec2::new(95.0, 100.0));
        let mut enemy = Entity::enemy(101, Vec2::new(140.0, 100.0), 100.0, Vec2::new(-1.0, 1.0));
        enemy.motion.prev_pos = Vec2::new(150.0, 98.0);
        w.entities.add(enemy);

        let report = w.detect(&mut log);
        assert_eq!(report.hazard_hits, 1);
        assert_eq!(w.entities.get(w.player).unwrap().pos, Vec2::new(95.0, 100.0));
        assert_eq!(w.entities.get(101).unwrap().pos, Vec2::new(150.0, 98.0));
        assert_eq!(log.count_sound(SoundEffect::Hazard), 1);
    }
}
