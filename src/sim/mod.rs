//! Round simulation
//!
//! All gameplay logic lives here. The host owns a [`Round`], feeds it an
//! [`InputSource`] and a [`GameHooks`] sink every tick, and never touches
//! the managers directly:
//! - Seeded RNG only, carried in snapshots
//! - Stable iteration order (entity insertion order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entities;
pub mod entity;
pub mod expression;
pub mod hooks;
pub mod powerup;
pub mod rect;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{CollisionManager, CollisionReport, CollisionTotals};
pub use entities::{EntityManager, SpawnState};
pub use entity::{Collectible, Entity, EntityId, EntityKind, EntityTag, ObstacleKind, Playfield};
pub use hooks::{Action, EventLog, GameEvent, GameHooks, InputSource, NullHooks};
pub use powerup::{EffectState, PowerUpKind, PowerUpManager};
pub use rect::Rect;
pub use snapshot::{RoundSnapshot, SnapshotError, SNAPSHOT_VERSION};
pub use state::{GamePhase, GameState, GameStateManager};
pub use tick::{Round, TickInput};
