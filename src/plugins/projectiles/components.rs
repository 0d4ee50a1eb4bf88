//! Bullet slot components and the reset/initialize contract.
//!
//! Two invariants live here so every write site shares them:
//! - a slot in the free queue is in the canonical poolable state
//!   (hidden, zero velocity, empty collision filters, `BulletState::Pooled`);
//! - a slot leaves the queue through `initialize` + `activate` only.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::Layer;

use super::pool::{PoolKey, PoolerId};

/// Which side fired the bullet. Decides collision routing and who takes damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    /// Layers for a live bullet of this faction.
    pub fn active_layers(self) -> CollisionLayers {
        match self {
            Faction::Player => {
                CollisionLayers::new(Layer::PlayerBullet, [Layer::World, Layer::Enemy])
            }
            Faction::Enemy => {
                CollisionLayers::new(Layer::EnemyBullet, [Layer::World, Layer::Player])
            }
        }
    }

    /// "Disabled" without structural changes: empty filters means the bullet
    /// collides with nothing and generates no collision events.
    pub fn inactive_layers(self) -> CollisionLayers {
        match self {
            Faction::Player => CollisionLayers::new(Layer::PlayerBullet, [] as [Layer; 0]),
            Faction::Enemy => CollisionLayers::new(Layer::EnemyBullet, [] as [Layer; 0]),
        }
    }
}

/// Pool membership metadata carried by every pooled entity.
///
/// Records which pool key the slot belongs to and which pooler instance
/// owns it, so a release can verify it is returning the slot to the right
/// queue (and destroy it otherwise).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PooledBy {
    pub key: PoolKey,
    pub pooler: PoolerId,
}

/// Bullet lifecycle.
///
/// `Pooled` slots sit in exactly one free queue; every other state means the
/// slot is held by exactly one live user. `Exiting` marks "return me" — the
/// commit system sweeps those back into the pool at a schedule boundary
/// instead of mutating the queue mid-collision-resolution.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulletState {
    #[default]
    Pooled,
    Initialized,
    Active,
    Exiting,
}

/// Per-slot bullet data.
///
/// `faction` and `damage` are fixed at slot construction from the archetype;
/// `lifetime` and `launch` are rewritten on every flight.
#[derive(Component, Debug, Clone)]
pub struct Bullet {
    pub faction: Faction,
    pub damage: i32,
    pub lifetime: Timer,
    /// Velocity to apply on activation, written by `initialize`.
    pub launch: Vec2,
}

/// Hit points for anything bullets can damage.
#[derive(Component, Debug, Clone)]
pub struct Health {
    pub hp: i32,
}

/// Query tuple for everything the slot contract touches.
pub type SlotComponents<'w> = (
    Mut<'w, BulletState>,
    Mut<'w, Bullet>,
    Mut<'w, Transform>,
    Mut<'w, LinearVelocity>,
    Mut<'w, Visibility>,
    Mut<'w, CollisionLayers>,
);

/// Borrowed view over one slot's components.
///
/// The contract points every poolable, emittable entity supports:
/// `initialize` (position/direction/speed, still dormant), `activate`
/// (movement + collision enabled) and `reset_to_poolable`.
pub struct BulletSlot<'w> {
    pub state: Mut<'w, BulletState>,
    pub bullet: Mut<'w, Bullet>,
    pub transform: Mut<'w, Transform>,
    pub velocity: Mut<'w, LinearVelocity>,
    pub visibility: Mut<'w, Visibility>,
    pub layers: Mut<'w, CollisionLayers>,
}

impl<'w> From<SlotComponents<'w>> for BulletSlot<'w> {
    fn from((state, bullet, transform, velocity, visibility, layers): SlotComponents<'w>) -> Self {
        Self { state, bullet, transform, velocity, visibility, layers }
    }
}

impl BulletSlot<'_> {
    /// `Pooled -> Initialized`: place and orient the slot, stage its launch
    /// velocity. The bullet stays hidden and non-colliding until `activate`.
    pub fn initialize(&mut self, pos: Vec2, dir: Vec2, speed: f32) {
        let dir = if dir.length_squared() > 1e-8 { dir.normalize() } else { Vec2::Y };

        self.transform.translation = pos.extend(2.0);
        self.transform.rotation = Quat::from_rotation_z(Vec2::Y.angle_to(dir));
        self.velocity.0 = Vec2::ZERO;
        self.bullet.launch = dir * speed;
        *self.state = BulletState::Initialized;
    }

    /// `Initialized -> Active`: movement and collision enabled.
    pub fn activate(&mut self) {
        debug_assert_eq!(*self.state, BulletState::Initialized);

        self.velocity.0 = self.bullet.launch;
        *self.visibility = Visibility::Visible;
        *self.layers = self.bullet.faction.active_layers();
        self.bullet.lifetime.reset();
        *self.state = BulletState::Active;
    }

    /// `-> Pooled`: the canonical inactive state every dequeued slot shows.
    pub fn reset_to_poolable(&mut self) {
        self.velocity.0 = Vec2::ZERO;
        self.bullet.launch = Vec2::ZERO;
        self.transform.translation = Vec3::new(0.0, 0.0, 2.0);
        self.transform.rotation = Quat::IDENTITY;
        *self.visibility = Visibility::Hidden;
        *self.layers = self.bullet.faction.inactive_layers();
        *self.state = BulletState::Pooled;
    }
}
