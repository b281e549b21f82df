//! Entity data and per-kind behaviour
//!
//! Entities share one struct with a closed `EntityKind` payload. Per-kind
//! update and hit box logic lives in a static behaviour table indexed by
//! `EntityTag`, so adding a kind means adding a variant and a table row.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::powerup::PowerUpKind;
use super::rect::Rect;
use crate::consts::*;
use crate::{clamp_unit, play_area_max_y};

/// Stable entity identifier, allocated by the entity manager
pub type EntityId = u32;

/// Playfield extents used for clamping and bouncing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
        }
    }
}

impl Playfield {
    /// Bounds an entity of `size` may occupy below the spawn band
    pub fn play_area_max(&self, size: Vec2) -> Vec2 {
        Vec2::new(
            (self.width - size.x).max(0.0),
            play_area_max_y(self.height, size.y),
        )
    }
}

/// Movement state shared by every kind (static kinds keep speed 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Pixels per second
    pub speed: f32,
    /// Position before this frame's movement
    pub prev_pos: Vec2,
    /// Travel direction, ±1 per axis for bouncing kinds
    pub dir: Vec2,
}

impl Motion {
    pub fn stationary(pos: Vec2) -> Self {
        Self {
            speed: 0.0,
            prev_pos: pos,
            dir: Vec2::ZERO,
        }
    }
}

/// Static hazard types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Blocks the player by roll-back
    Tree,
    /// Vetoes player moves before they happen
    Spikes,
}

/// Falling collectible payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub value: u32,
    pub display_text: String,
    pub uses_math: bool,
    /// Spawn wave this collectible belongs to
    pub row: u32,
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Player {
        invert_controls: bool,
    },
    Collectible(Collectible),
    Enemy,
    PowerUp {
        kind: PowerUpKind,
        /// Seconds left before it disappears
        ttl: f32,
    },
    Obstacle {
        kind: ObstacleKind,
        /// Seconds left, `None` for permanent obstacles
        lifetime: Option<f32>,
    },
    Effect {
        label: String,
        age: f32,
    },
}

/// Fieldless discriminant of [`EntityKind`], used for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTag {
    Player = 0,
    Collectible = 1,
    Enemy = 2,
    PowerUp = 3,
    Obstacle = 4,
    Effect = 5,
}

impl EntityKind {
    pub fn tag(&self) -> EntityTag {
        match self {
            EntityKind::Player { .. } => EntityTag::Player,
            EntityKind::Collectible(_) => EntityTag::Collectible,
            EntityKind::Enemy => EntityTag::Enemy,
            EntityKind::PowerUp { .. } => EntityTag::PowerUp,
            EntityKind::Obstacle { .. } => EntityTag::Obstacle,
            EntityKind::Effect { .. } => EntityTag::Effect,
        }
    }
}

/// Per-kind capabilities
pub struct KindBehavior {
    pub update: fn(&mut Entity, &Playfield, f32),
    pub hitbox: fn(&Entity) -> Rect,
    /// Whether the collision pass considers this kind at all
    pub collidable: bool,
}

static BEHAVIORS: [KindBehavior; 6] = [
    // Player: moved by input, not by the update pass
    KindBehavior {
        update: update_noop,
        hitbox: full_box,
        collidable: true,
    },
    KindBehavior {
        update: update_collectible,
        hitbox: full_box,
        collidable: true,
    },
    KindBehavior {
        update: update_bouncer,
        hitbox: full_box,
        collidable: true,
    },
    KindBehavior {
        update: update_power_up,
        hitbox: full_box,
        collidable: true,
    },
    KindBehavior {
        update: update_obstacle,
        hitbox: obstacle_box,
        collidable: true,
    },
    KindBehavior {
        update: update_effect,
        hitbox: full_box,
        collidable: false,
    },
];

/// Look up the behaviour row for a kind
pub fn behavior(tag: EntityTag) -> &'static KindBehavior {
    &BEHAVIORS[tag as usize]
}

/// A game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Bottom-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Cleared to schedule removal at the next sweep
    pub active: bool,
    /// Set while a one-shot collision response is latched
    pub collided: bool,
    pub motion: Motion,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, pos: Vec2, kind: EntityKind) -> Self {
        Self {
            id,
            pos,
            size: Vec2::splat(ENTITY_SIZE),
            active: true,
            collided: false,
            motion: Motion::stationary(pos),
            kind,
        }
    }

    pub fn player(id: EntityId, pos: Vec2, speed: f32) -> Self {
        let mut entity = Self::new(
            id,
            pos,
            EntityKind::Player {
                invert_controls: false,
            },
        );
        entity.motion.speed = speed;
        entity
    }

    pub fn collectible(id: EntityId, pos: Vec2, speed: f32, collectible: Collectible) -> Self {
        let mut entity = Self::new(id, pos, EntityKind::Collectible(collectible));
        entity.motion.speed = speed;
        entity.motion.dir = Vec2::NEG_Y;
        entity
    }

    pub fn enemy(id: EntityId, pos: Vec2, speed: f32, dir: Vec2) -> Self {
        let mut entity = Self::new(id, pos, EntityKind::Enemy);
        entity.motion.speed = speed;
        entity.motion.dir = dir;
        entity
    }

    pub fn power_up(id: EntityId, pos: Vec2, speed: f32, dir: Vec2, kind: PowerUpKind) -> Self {
        let mut entity = Self::new(
            id,
            pos,
            EntityKind::PowerUp {
                kind,
                ttl: POWER_UP_TTL,
            },
        );
        entity.motion.speed = speed;
        entity.motion.dir = dir;
        entity
    }

    pub fn obstacle(id: EntityId, pos: Vec2, kind: ObstacleKind, lifetime: Option<f32>) -> Self {
        Self::new(id, pos, EntityKind::Obstacle { kind, lifetime })
    }

    pub fn effect(id: EntityId, pos: Vec2, label: impl Into<String>) -> Self {
        let mut entity = Self::new(
            id,
            pos,
            EntityKind::Effect {
                label: label.into(),
                age: 0.0,
            },
        );
        entity.motion.speed = EFFECT_RISE_SPEED;
        entity.motion.dir = Vec2::Y;
        entity
    }

    #[inline]
    pub fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    /// Run this kind's per-frame update
    pub fn update(&mut self, playfield: &Playfield, dt: f32) {
        (behavior(self.tag()).update)(self, playfield, dt);
    }

    /// Full visual bounds
    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Collision box (may be smaller than the visual bounds)
    pub fn hitbox(&self) -> Rect {
        (behavior(self.tag()).hitbox)(self)
    }

    /// Active and taking part in collisions
    pub fn is_collidable(&self) -> bool {
        self.active && behavior(self.tag()).collidable
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player { .. })
    }

    pub fn is_obstacle(&self, kind: ObstacleKind) -> bool {
        matches!(self.kind, EntityKind::Obstacle { kind: k, .. } if k == kind)
    }

    pub fn as_collectible(&self) -> Option<&Collectible> {
        match &self.kind {
            EntityKind::Collectible(c) => Some(c),
            _ => None,
        }
    }

    /// Record the current position as this frame's roll-back point
    #[inline]
    pub fn snapshot_position(&mut self) {
        self.motion.prev_pos = self.pos;
    }

    /// Undo this frame's movement
    #[inline]
    pub fn roll_back(&mut self) {
        self.pos = self.motion.prev_pos;
    }

    /// Revert to the previous position and reverse the axis that moved least
    /// last frame (ties reverse vertical travel)
    pub fn bounce(&mut self) {
        let delta = (self.pos - self.motion.prev_pos).abs();
        self.roll_back();
        if delta.x < delta.y {
            self.motion.dir.x = -self.motion.dir.x;
        } else {
            self.motion.dir.y = -self.motion.dir.y;
        }
    }

    /// Move a player from a normalized input vector, one axis at a time.
    /// A step is dropped when `blocked` reports a hazard at the new position.
    pub fn move_user_controlled(
        &mut self,
        input: Vec2,
        dt: f32,
        playfield: &Playfield,
        blocked: impl Fn(&Rect) -> bool,
    ) {
        let EntityKind::Player { invert_controls } = self.kind else {
            return;
        };
        self.snapshot_position();

        let mut input = clamp_unit(input);
        if invert_controls {
            input = -input;
        }
        let step = input * self.motion.speed * dt;
        let max = playfield.play_area_max(self.size);

        if step.x != 0.0 {
            let x = (self.pos.x + step.x).clamp(0.0, max.x);
            let candidate = Rect::new(x, self.pos.y, self.size.x, self.size.y);
            if !blocked(&candidate) {
                self.pos.x = x;
            }
        }
        if step.y != 0.0 {
            let y = (self.pos.y + step.y).clamp(0.0, max.y);
            let candidate = Rect::new(self.pos.x, y, self.size.x, self.size.y);
            if !blocked(&candidate) {
                self.pos.y = y;
            }
        }
    }

    /// Opacity of a floating label, 1 at spawn fading to 0
    pub fn effect_alpha(&self) -> Option<f32> {
        match self.kind {
            EntityKind::Effect { age, .. } => Some((1.0 - age / EFFECT_LIFETIME).clamp(0.0, 1.0)),
            _ => None,
        }
    }
}

fn full_box(entity: &Entity) -> Rect {
    entity.bounds()
}

fn obstacle_box(entity: &Entity) -> Rect {
    match entity.kind {
        EntityKind::Obstacle {
            kind: ObstacleKind::Spikes,
            ..
        } => entity.bounds().inset(SPIKE_INSET),
        _ => entity.bounds(),
    }
}

fn update_noop(_entity: &mut Entity, _playfield: &Playfield, _dt: f32) {}

fn update_collectible(entity: &mut Entity, _playfield: &Playfield, dt: f32) {
    entity.snapshot_position();
    entity.pos.y -= entity.motion.speed * dt;
    // Fell out of the bottom of the screen
    if entity.pos.y + entity.size.y < 0.0 {
        entity.active = false;
    }
}

/// Straight-line travel that reflects off the play area walls
fn update_bouncer(entity: &mut Entity, playfield: &Playfield, dt: f32) {
    entity.snapshot_position();
    entity.pos += entity.motion.dir * entity.motion.speed * dt;

    let max = playfield.play_area_max(entity.size);
    if entity.pos.x < 0.0 || entity.pos.x > max.x {
        entity.pos.x = entity.pos.x.clamp(0.0, max.x);
        entity.motion.dir.x = -entity.motion.dir.x;
    }
    if entity.pos.y < 0.0 || entity.pos.y > max.y {
        entity.pos.y = entity.pos.y.clamp(0.0, max.y);
        entity.motion.dir.y = -entity.motion.dir.y;
    }
}

fn update_power_up(entity: &mut Entity, playfield: &Playfield, dt: f32) {
    update_bouncer(entity, playfield, dt);
    if let EntityKind::PowerUp { ref mut ttl, .. } = entity.kind {
        *ttl -= dt;
        if *ttl <= 0.0 {
            entity.active = false;
        }
    }
}

fn update_obstacle(entity: &mut Entity, _playfield: &Playfield, dt: f32) {
    if let EntityKind::Obstacle {
        lifetime: Some(ref mut remaining),
        ..
    } = entity.kind
    {
        *remaining -= dt;
        if *remaining <= 0.0 {
            entity.active = false;
        }
    }
}

fn update_effect(entity: &mut Entity, _playfield: &Playfield, dt: f32) {
    entity.snapshot_position();
    entity.pos += entity.motion.dir * entity.motion.speed * dt;
    if let EntityKind::Effect { ref mut age, .. } = entity.kind {
        *age += dt;
        if *age >= EFFECT_LIFETIME {
            entity.active = false;
        }
    }
}
