//! Projectiles plugin: **message-based producer → consumer** spawning over a
//! keyed, data-driven pool.
//!
//! # Philosophy: invariants first
//! Correctness checks are pushed to boundaries so hot paths (allocation,
//! collision resolve, return commit) stay as straight-line as possible.
//! In an ECS you can't make "this entity exists and has these components" a
//! compile-time fact. But you *can*:
//! - encode **meaning** with types (newtypes / enums),
//! - validate invariants once (registration / state transition),
//! - and then treat violations as bugs (fail-fast `expect()`).
//!
//! # Data flow (big picture)
//! ```text
//!   Update schedule (variable dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (A) Producers: pattern driver (patterns plugin), player fire input,       │
//!│      splitting bullets (fixed step)                                        │
//!│      - write: EmitRequest { key, pos, dir, speed }                         │
//!│                                                                            │
//!│  (B) Consumer: allocate_from_pool                                          │
//!│      - reads: EmitRequest messages                                         │
//!│      - mutates: BulletPools free queues (FIFO per key, overflow growth)    │
//!│      - mutates: BulletState, Bullet, Transform, Velocity, Visibility,      │
//!│                 CollisionLayers  (Pooled → Initialized → Active)           │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!FixedUpdate / FixedPostUpdate (fixed dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (C) Behaviours: lifetime budget, split detonation → BulletState::Exiting  │
//!│                                                                            │
//!│  (D) Physics emits CollisionStart messages (Avian)                         │
//!│                                                                            │
//!│  (E) Resolve collisions: process_bullet_collisions                         │
//!│      - walls absorb, opposing faction takes damage                         │
//!│      - mutates: BulletState → Exiting                                      │
//!│                                                                            │
//!│  (F) Commit returns: return_exiting_to_pool                                │
//!│      - resets slots to the canonical poolable state                        │
//!│      - mutates: free queue push_back (oldest-released-first reuse)         │
//!└────────────────────────────────────────────────────────────────────────────┘
//!
//! Feedback loop:
//!   commit pushes slots back into their free queue
//!   allocator pops slots from the front
//! ```
//!
//! # Why "Messages" instead of direct pool access?
//! Producers only enqueue intent; the allocator is the single writer that
//! mutates the pool. Many owners emit within one frame in arbitrary order
//! and none of them ever holds the pool borrow.
//!
//! # Where do we still branch?
//! - Capacity: a pool can be empty → the allocator drops the request
//!   (capacity decision, logged).
//! - Integrity: a release with foreign or missing metadata destroys the
//!   entity instead of enqueueing it.
//! Everything else is treated as an invariant violation.

pub mod components;
pub mod pool;
pub mod collision;

pub mod messages;
pub mod request;
pub mod allocator;
pub mod behaviors;
pub mod commit;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::ecs::message::Messages;
use bevy::prelude::*;

use crate::common::state::GameState;

use pool::{BulletArchetype, BulletPools, PoolKey, SplitSpec};

/// Pool keys for the stock archetypes.
pub mod keys {
    use super::PoolKey;

    pub const PLAYER_SHOT: PoolKey = PoolKey("player/shot");
    pub const ENEMY_ROUND: PoolKey = PoolKey("enemy/round");
    pub const ENEMY_SPLITTER: PoolKey = PoolKey("enemy/splitter");
    pub const ENEMY_SHARD: PoolKey = PoolKey("enemy/shard");
}

/// Pool configuration, loaded once at setup.
#[derive(Resource, Debug, Clone)]
pub struct PoolManifest {
    pub allow_overflow: bool,
    pub pools: Vec<(PoolKey, BulletArchetype, usize)>,
}

impl Default for PoolManifest {
    fn default() -> Self {
        use self::components::Faction;

        Self {
            allow_overflow: true,
            pools: vec![
                (
                    keys::PLAYER_SHOT,
                    BulletArchetype {
                        name: "PlayerShot",
                        faction: Faction::Player,
                        color: Color::srgb(1.0, 0.85, 0.3),
                        size: 8.0,
                        collider_radius: 4.0,
                        damage: 1,
                        lifetime_secs: 3.0,
                        split: None,
                    },
                    128,
                ),
                (
                    keys::ENEMY_ROUND,
                    BulletArchetype {
                        name: "EnemyRound",
                        faction: Faction::Enemy,
                        color: Color::srgb(0.95, 0.4, 0.5),
                        size: 10.0,
                        collider_radius: 5.0,
                        damage: 1,
                        lifetime_secs: 4.0,
                        split: None,
                    },
                    512,
                ),
                (
                    keys::ENEMY_SPLITTER,
                    BulletArchetype {
                        name: "EnemySplitter",
                        faction: Faction::Enemy,
                        color: Color::srgb(0.85, 0.3, 0.9),
                        size: 14.0,
                        collider_radius: 7.0,
                        damage: 1,
                        lifetime_secs: 6.0,
                        split: Some(SplitSpec {
                            child_key: keys::ENEMY_SHARD,
                            trigger_y: -120.0,
                            child_count: 6,
                            child_speed: 240.0,
                        }),
                    },
                    32,
                ),
                (
                    keys::ENEMY_SHARD,
                    BulletArchetype {
                        name: "EnemyShard",
                        faction: Faction::Enemy,
                        color: Color::srgb(1.0, 0.55, 0.7),
                        size: 6.0,
                        collider_radius: 3.0,
                        damage: 1,
                        lifetime_secs: 2.5,
                        split: None,
                    },
                    128,
                ),
            ],
        }
    }
}

/// Build the pools from the manifest.
///
/// Registration failures are configuration errors: fatal to that pool entry
/// (it is reported and skipped), never to the app.
pub fn init_pools(mut commands: Commands, manifest: Res<PoolManifest>) {
    let mut pools = BulletPools::new(manifest.allow_overflow);

    for (key, archetype, initial_count) in &manifest.pools {
        if let Err(err) = pools.register(&mut commands, *key, archetype.clone(), *initial_count) {
            error!("pool registration failed: {err}");
        }
    }

    commands.insert_resource(pools);
}

/// Maintain emission request message buffers.
///
/// Messages are double-buffered; `update()` advances buffers.
fn update_emit_messages(mut msgs: ResMut<Messages<messages::EmitRequest>>) {
    msgs.update();
}

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PoolManifest::default())
            .add_systems(Startup, init_pools);

        // Message storage for emission requests.
        app.init_resource::<Messages<messages::EmitRequest>>();
        app.add_systems(PostUpdate, update_emit_messages);

        // Update-phase pipeline: producers -> allocator.
        // The pattern driver (patterns plugin) orders itself before the
        // allocator too.
        app.add_systems(
            Update,
            (
                request::request_player_shots,
                allocator::allocate_from_pool.after(request::request_player_shots),
            )
                .run_if(in_state(GameState::InGame)),
        );

        // Fixed-step behaviours.
        app.add_systems(
            FixedUpdate,
            (behaviors::tick_lifetimes, behaviors::split_bullets)
                .run_if(in_state(GameState::InGame)),
        );

        // Fixed collision pipeline.
        app.add_systems(
            FixedPostUpdate,
            collision::process_bullet_collisions
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            commit::return_exiting_to_pool
                .after(collision::process_bullet_collisions)
                .run_if(in_state(GameState::InGame)),
        );
    }
}
