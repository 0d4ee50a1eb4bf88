//! Keyed bullet pool: pre-spawned slots, FIFO reuse, optional overflow growth.
//!
//! One `BulletPools` resource owns every bullet slot in the world, grouped by
//! `PoolKey` (one key per archetype). Slots keep their physics components for
//! their whole life; "inactive" is expressed as empty collision filters +
//! hidden visibility, never as structural changes.
//!
//! Ownership invariant: a slot is either in exactly one free queue
//! (`BulletState::Pooled`) or held by exactly one live user — never both.
//! `release` is the single point that restores the poolable state, so
//! `acquire` never resets: whatever it dequeues was cleaned by the previous
//! release, and overflow growth hands out freshly constructed slots.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use avian2d::prelude::*;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use thiserror::Error;

use super::components::{Bullet, BulletSlot, BulletState, Faction, PooledBy};

/// Stable identifier for one archetype's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolKey(pub &'static str);

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identity of one pooler instance, for verifying releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolerId(u32);

static NEXT_POOLER_ID: AtomicU32 = AtomicU32::new(0);

impl PoolerId {
    fn next() -> Self {
        Self(NEXT_POOLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Closed parameter set for constructing one kind of bullet slot.
///
/// This is the archetype constructor: registration pre-spawns from it, and
/// overflow growth builds new instances from it.
#[derive(Debug, Clone)]
pub struct BulletArchetype {
    pub name: &'static str,
    pub faction: Faction,
    pub color: Color,
    pub size: f32,
    pub collider_radius: f32,
    pub damage: i32,
    pub lifetime_secs: f32,
    /// Splitting behaviour, when this archetype detonates into a child ring.
    pub split: Option<SplitSpec>,
}

/// Parameters for bullets that split into a child ring at a given height.
#[derive(Debug, Clone, Copy)]
pub struct SplitSpec {
    pub child_key: PoolKey,
    pub trigger_y: f32,
    pub child_count: u32,
    pub child_speed: f32,
}

/// Marker for splitting bullets. Detonation fires at most once per flight
/// because it also marks the bullet `Exiting`.
#[derive(Component, Debug, Clone, Copy)]
pub struct Splitter(pub SplitSpec);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool key `{0}` is already registered")]
    DuplicateKey(PoolKey),
    #[error("pool key `{0}` was never registered")]
    UnknownKey(PoolKey),
    #[error("pool `{0}` is empty and overflow growth is disabled")]
    Exhausted(PoolKey),
    #[error("no pool here for the archetype of that instance (key `{0}`)")]
    UnregisteredArchetype(PoolKey),
}

/// A successful acquire. `fresh` slots come from overflow growth and were
/// spawned this frame, so the caller must configure them through `Commands`
/// instead of component queries.
#[derive(Debug, Clone, Copy)]
pub struct Acquired {
    pub entity: Entity,
    pub fresh: bool,
}

#[derive(Resource, Debug)]
pub struct BulletPools {
    id: PoolerId,
    allow_overflow: bool,
    free: HashMap<PoolKey, VecDeque<Entity>>,
    archetypes: HashMap<PoolKey, BulletArchetype>,
}

impl BulletPools {
    pub fn new(allow_overflow: bool) -> Self {
        Self {
            id: PoolerId::next(),
            allow_overflow,
            free: HashMap::default(),
            archetypes: HashMap::default(),
        }
    }

    pub fn id(&self) -> PoolerId {
        self.id
    }

    pub fn allow_overflow(&self) -> bool {
        self.allow_overflow
    }

    /// Register `key` and pre-spawn `initial_count` poolable slots.
    pub fn register(
        &mut self,
        commands: &mut Commands,
        key: PoolKey,
        archetype: BulletArchetype,
        initial_count: usize,
    ) -> Result<(), PoolError> {
        if self.archetypes.contains_key(&key) {
            return Err(PoolError::DuplicateKey(key));
        }

        let mut queue = VecDeque::with_capacity(initial_count);
        for _ in 0..initial_count {
            queue.push_back(spawn_slot(commands, key, self.id, &archetype));
        }
        self.free.insert(key, queue);
        self.archetypes.insert(key, archetype);
        Ok(())
    }

    /// Take one slot out of `key`'s queue, oldest release first.
    ///
    /// On an empty queue: grow via the archetype when overflow is allowed
    /// (the fresh slot is handed out directly, never enqueued), otherwise
    /// fail with `Exhausted`. Exhaustion is a capacity decision, not a bug —
    /// callers skip the emission.
    pub fn acquire(&mut self, commands: &mut Commands, key: PoolKey) -> Result<Acquired, PoolError> {
        let Some(archetype) = self.archetypes.get(&key) else {
            return Err(PoolError::UnknownKey(key));
        };

        let queue = self
            .free
            .get_mut(&key)
            .expect("registered key is missing its free queue");

        if let Some(entity) = queue.pop_front() {
            return Ok(Acquired { entity, fresh: false });
        }

        if !self.allow_overflow {
            return Err(PoolError::Exhausted(key));
        }

        let entity = spawn_slot(commands, key, self.id, archetype);
        Ok(Acquired { entity, fresh: true })
    }

    /// Acquire a sibling of a live pooled instance, resolving the key from
    /// its metadata. Fails when that archetype has no pool here — either the
    /// key is unknown or the instance belongs to a different pooler.
    pub fn acquire_like(
        &mut self,
        commands: &mut Commands,
        instance: &PooledBy,
    ) -> Result<Acquired, PoolError> {
        if instance.pooler != self.id || !self.archetypes.contains_key(&instance.key) {
            return Err(PoolError::UnregisteredArchetype(instance.key));
        }
        self.acquire(commands, instance.key)
    }

    /// Return a slot to its queue.
    ///
    /// Verification first: an entity with no metadata, or metadata from a
    /// different pooler, is destroyed rather than enqueued — returning an
    /// unverified entity to the wrong queue would break single ownership.
    /// Verified slots are reset here (the only reset point) and enqueued.
    pub fn release(
        &mut self,
        commands: &mut Commands,
        entity: Entity,
        tag: Option<&PooledBy>,
        slot: &mut BulletSlot,
    ) {
        let Some(tag) = tag else {
            warn!("released entity {entity} carries no pool metadata, destroying it");
            commands.entity(entity).despawn();
            return;
        };

        if tag.pooler != self.id {
            warn!(
                "released entity {entity} belongs to another pooler (key `{}`), destroying it",
                tag.key
            );
            commands.entity(entity).despawn();
            return;
        }

        let Some(queue) = self.free.get_mut(&tag.key) else {
            warn!("released entity {entity} names unknown pool `{}`, destroying it", tag.key);
            commands.entity(entity).despawn();
            return;
        };

        slot.reset_to_poolable();
        queue.push_back(entity);
    }

    pub fn archetype(&self, key: PoolKey) -> Option<&BulletArchetype> {
        self.archetypes.get(&key)
    }

    /// Free slots currently queued for `key`.
    pub fn free_count(&self, key: PoolKey) -> usize {
        self.free.get(&key).map_or(0, VecDeque::len)
    }
}

/// Spawn one slot in the canonical poolable state.
fn spawn_slot(
    commands: &mut Commands,
    key: PoolKey,
    pooler: PoolerId,
    archetype: &BulletArchetype,
) -> Entity {
    let mut entity = commands.spawn((
        Name::new(archetype.name),
        PooledBy { key, pooler },
        BulletState::Pooled,
        Bullet {
            faction: archetype.faction,
            damage: archetype.damage,
            lifetime: Timer::from_seconds(archetype.lifetime_secs, TimerMode::Once),
            launch: Vec2::ZERO,
        },
        Sprite {
            color: archetype.color,
            custom_size: Some(Vec2::splat(archetype.size)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 2.0),
        Visibility::Hidden,
        RigidBody::Dynamic,
        Collider::circle(archetype.collider_radius),
        archetype.faction.inactive_layers(),
        Friction::ZERO,
        LinearVelocity(Vec2::ZERO),
        // Always present; inactive bullets never collide anyway because
        // their filters are empty.
        CollisionEventsEnabled,
    ));

    if let Some(spec) = archetype.split {
        entity.insert(Splitter(spec));
    }

    entity.id()
}
