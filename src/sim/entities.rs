//! Entity collection and spawning
//!
//! The manager is the only owner of the live entity list. Removal happens
//! only in the purge sweep at the start of `update`; everything else either
//! flags entities inactive or reads through a snapshot.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Collectible, Entity, EntityId, EntityTag, ObstacleKind, Playfield};
use super::expression::expression_for;
use super::powerup::PowerUpKind;
use super::rect::Rect;
use crate::consts::*;
use crate::settings::Settings;

/// Spawner bookkeeping that must survive a pause/resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnState {
    /// Next entity ID
    pub next_id: EntityId,
    /// Next collectible row ID
    pub next_row: u32,
    /// Seconds since the last obstacle wave
    pub obstacle_timer: f32,
    /// Seconds since the last power-up roll
    pub power_up_timer: f32,
    pub rng: Pcg32,
}

impl SpawnState {
    pub fn new(seed: u64) -> Self {
        Self {
            next_id: 1,
            next_row: 0,
            obstacle_timer: 0.0,
            power_up_timer: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

/// Owns every live entity
#[derive(Debug, Clone)]
pub struct EntityManager {
    entities: Vec<Entity>,
    spawn: SpawnState,
    playfield: Playfield,
    settings: Settings,
}

impl EntityManager {
    /// Empty manager; the seed comes from settings or the OS
    pub fn new(settings: &Settings) -> Self {
        let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        log::info!("Entity spawner seed {}", seed);
        Self::from_parts(settings, Vec::new(), SpawnState::new(seed))
    }

    /// Rebuild from captured entities and spawner state
    pub fn from_parts(settings: &Settings, entities: Vec<Entity>, spawn: SpawnState) -> Self {
        Self {
            entities,
            spawn,
            playfield: Playfield {
                width: settings.playfield_width,
                height: settings.playfield_height,
            },
            settings: settings.clone(),
        }
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    pub fn spawn_state(&self) -> &SpawnState {
        &self.spawn
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.spawn.next_id;
        self.spawn.next_id += 1;
        id
    }

    // === Collection access ===

    /// Insert an entity; no-op if one with the same ID is already present
    pub fn add(&mut self, entity: Entity) -> bool {
        if self.entities.iter().any(|e| e.id == entity.id) {
            return false;
        }
        self.spawn.next_id = self.spawn.next_id.max(entity.id.saturating_add(1));
        self.entities.push(entity);
        true
    }

    /// Owned copy of every entity, safe to hold across mutations
    pub fn get_all(&self) -> Vec<Entity> {
        self.entities.clone()
    }

    /// Entity IDs in insertion order
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut().filter(|e| e.is_player())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Active entities of a kind
    pub fn count_active(&self, tag: EntityTag) -> usize {
        self.entities
            .iter()
            .filter(|e| e.active && e.tag() == tag)
            .count()
    }

    /// Drop every entity and restart the spawn timers. IDs and the RNG
    /// stream carry on.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.spawn.obstacle_timer = 0.0;
        self.spawn.power_up_timer = 0.0;
    }

    // === Per-frame ===

    /// Remove inactive entities. Returns the IDs that were disposed.
    pub fn purge_inactive(&mut self) -> Vec<EntityId> {
        let mut disposed = Vec::new();
        self.entities.retain(|e| {
            if e.active {
                true
            } else {
                log::trace!("Disposing entity {} ({:?})", e.id, e.tag());
                disposed.push(e.id);
                false
            }
        });
        disposed
    }

    /// Purge, move every entity, run spawn timers and keep a wave on screen
    pub fn update(&mut self, dt: f32) {
        self.purge_inactive();

        let playfield = self.playfield;
        for entity in &mut self.entities {
            entity.update(&playfield, dt);
        }

        self.advance_spawn_timers(dt);

        if self.count_active(EntityTag::Collectible) == 0 {
            self.spawn_collectible_row();
        }
    }

    fn advance_spawn_timers(&mut self, dt: f32) {
        self.spawn.obstacle_timer += dt;
        if self.spawn.obstacle_timer >= OBSTACLE_SPAWN_INTERVAL {
            self.spawn.obstacle_timer -= OBSTACLE_SPAWN_INTERVAL;
            let lifetime = self.settings.effective_spike_lifetime();
            self.spawn_obstacles(self.settings.spikes_per_wave, ObstacleKind::Spikes, lifetime);
        }

        self.spawn.power_up_timer += dt;
        if self.spawn.power_up_timer >= POWER_UP_SPAWN_INTERVAL {
            self.spawn.power_up_timer -= POWER_UP_SPAWN_INTERVAL;
            if self.spawn.rng.random_bool(POWER_UP_SPAWN_CHANCE) {
                self.spawn_power_up();
            }
        }
    }

    /// Move every player from the input vector, refusing steps into spikes
    pub fn move_player(&mut self, movement: Vec2, dt: f32) {
        let spikes: Vec<Rect> = self.spike_hitboxes().collect();
        let playfield = self.playfield;
        for player in self.players_mut() {
            player.move_user_controlled(movement, dt, &playfield, |candidate| {
                spikes.iter().any(|s| s.overlaps(candidate))
            });
        }
    }

    fn spike_hitboxes(&self) -> impl Iterator<Item = Rect> + '_ {
        self.entities
            .iter()
            .filter(|e| e.active && e.is_obstacle(ObstacleKind::Spikes))
            .map(|e| e.hitbox())
    }

    /// Whether a box at (x, y) of the given size would touch any spike hit box
    pub fn would_collide_with_spikes(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let candidate = Rect::new(x, y, width, height);
        self.spike_hitboxes().any(|s| s.overlaps(&candidate))
    }

    // === Spawning ===

    /// Populate a fresh round: player, trees, enemies and the first row
    pub fn populate_round(&mut self) -> EntityId {
        let player_pos = Vec2::new((self.playfield.width - ENTITY_SIZE) / 2.0, 0.0);
        let player = self.spawn_player(player_pos, self.settings.player_speed);

        self.spawn_obstacles(self.settings.initial_trees, ObstacleKind::Tree, None);
        for _ in 0..self.settings.effective_enemy_count() {
            self.spawn_enemy();
        }
        self.spawn_collectible_row();

        log::info!(
            "Round populated: {} entities on {}",
            self.entities.len(),
            self.settings.difficulty.as_str()
        );
        player
    }

    pub fn spawn_player(&mut self, pos: Vec2, speed: f32) -> EntityId {
        let id = self.next_entity_id();
        self.entities.push(Entity::player(id, pos, speed));
        id
    }

    /// Place a new row just above the top edge. Rows already in play drop
    /// by one tick's distance so consecutive rows never share a line.
    pub fn spawn_collectible_row(&mut self) -> u32 {
        let size = ENTITY_SIZE;
        let gap = size * ROW_GAP_RATIO;
        let fits = ((self.playfield.width + gap) / (size + gap)).floor().max(1.0) as usize;
        let count = self.settings.row_size.min(fits);
        let total = count as f32 * size + (count as f32 - 1.0) * gap;
        let start_x = (self.playfield.width - total) / 2.0;
        let y = self.playfield.height;

        let stagger = self.settings.collectible_speed * FRAME_DT;
        for entity in &mut self.entities {
            if entity.active && entity.tag() == EntityTag::Collectible {
                entity.pos.y -= stagger;
            }
        }

        let row = self.spawn.next_row;
        self.spawn.next_row += 1;
        let uses_math = self.settings.difficulty.uses_math_operations();

        for i in 0..count {
            let value = self
                .spawn
                .rng
                .random_range(COLLECTIBLE_MIN_VALUE..=COLLECTIBLE_MAX_VALUE);
            let display_text = if uses_math {
                expression_for(value, &mut self.spawn.rng)
            } else {
                value.to_string()
            };
            let id = self.next_entity_id();
            let pos = Vec2::new(start_x + i as f32 * (size + gap), y);
            self.entities.push(Entity::collectible(
                id,
                pos,
                self.settings.collectible_speed,
                Collectible {
                    value,
                    display_text,
                    uses_math,
                    row,
                },
            ));
        }

        log::debug!("Spawned row {} with {} collectibles", row, count);
        row
    }

    /// Deactivate every collectible in `row`. Returns how many were removed.
    pub fn remove_row(&mut self, row: u32) -> usize {
        let mut removed = 0;
        for entity in &mut self.entities {
            if entity.active && entity.as_collectible().is_some_and(|c| c.row == row) {
                entity.active = false;
                removed += 1;
            }
        }
        removed
    }

    /// Place up to `count` obstacles by rejection sampling inside the play
    /// area. Obstacles that find no room are skipped. Returns how many landed.
    pub fn spawn_obstacles(&mut self, count: usize, kind: ObstacleKind, lifetime: Option<f32>) -> usize {
        let size = Vec2::splat(ENTITY_SIZE);
        let mut placed = 0;
        for _ in 0..count {
            match self.find_free_spot(size) {
                Some(pos) => {
                    let id = self.next_entity_id();
                    self.entities.push(Entity::obstacle(id, pos, kind, lifetime));
                    placed += 1;
                }
                None => log::debug!("No room for {:?} after {} attempts", kind, SPAWN_ATTEMPTS),
            }
        }
        placed
    }

    /// Random free position for a hazard: clear of the player by
    /// `OBSTACLE_PLAYER_CLEARANCE` and not overlapping anything solid
    fn find_free_spot(&mut self, size: Vec2) -> Option<Vec2> {
        let max = self.playfield.play_area_max(size);
        for _ in 0..SPAWN_ATTEMPTS {
            let pos = Vec2::new(
                self.spawn.rng.random_range(0.0..=max.x),
                self.spawn.rng.random_range(0.0..=max.y),
            );
            let candidate = Rect::from_pos_size(pos, size);
            if self.is_clear(&candidate) {
                return Some(pos);
            }
        }
        None
    }

    fn is_clear(&self, candidate: &Rect) -> bool {
        self.entities.iter().filter(|e| e.active).all(|e| match e.tag() {
            EntityTag::Player => {
                !e.bounds().overlaps(candidate)
                    && e.bounds().center().distance(candidate.center()) >= OBSTACLE_PLAYER_CLEARANCE
            }
            EntityTag::Obstacle | EntityTag::Collectible | EntityTag::Enemy => {
                !e.bounds().overlaps(candidate)
            }
            EntityTag::PowerUp | EntityTag::Effect => true,
        })
    }

    fn random_diagonal(&mut self) -> Vec2 {
        let x = if self.spawn.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let y = if self.spawn.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        Vec2::new(x, y)
    }

    /// Spawn a random power-up somewhere free in the play area
    pub fn spawn_power_up(&mut self) -> Option<EntityId> {
        let kind = PowerUpKind::random(&mut self.spawn.rng);
        let pos = self.find_free_spot(Vec2::splat(ENTITY_SIZE))?;
        let dir = self.random_diagonal();
        let id = self.next_entity_id();
        self.entities.push(Entity::power_up(
            id,
            pos,
            self.settings.power_up_speed,
            dir,
            kind,
        ));
        log::debug!("Spawned {:?} power-up", kind);
        Some(id)
    }

    /// Spawn a bouncing enemy somewhere free in the play area
    pub fn spawn_enemy(&mut self) -> Option<EntityId> {
        let pos = self.find_free_spot(Vec2::splat(ENTITY_SIZE))?;
        let dir = self.random_diagonal();
        let id = self.next_entity_id();
        self.entities
            .push(Entity::enemy(id, pos, self.settings.enemy_speed, dir));
        Some(id)
    }

    /// Floating text label
    pub fn spawn_effect(&mut self, pos: Vec2, label: impl Into<String>) -> EntityId {
        let id = self.next_entity_id();
        self.entities.push(Entity::effect(id, pos, label));
        id
    }
}
