//! Spawn consumer: activate bullets from the keyed pool.
//!
//! # Fail-fast invariants
//! - A pool free queue contains only valid pooled slot entities.
//! - Therefore, a dequeued reused entity must match the slot query.
//!
//! If that is violated we `expect()` and crash loudly; it removes branches
//! from the hot loop and makes invariant violations obvious.
//!
//! Pool exhaustion is different: it is a capacity decision. The request is
//! logged and dropped, and later requests proceed — one starved emission
//! must not corrupt the rest of a pattern run.

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use super::components::{Bullet, BulletSlot, BulletState, PooledBy, SlotComponents};
use super::messages::EmitRequest;
use super::pool::{Acquired, BulletPools, PoolError};

pub fn allocate_from_pool(
    mut commands: Commands,
    mut pools: ResMut<BulletPools>,
    mut reader: MessageReader<EmitRequest>,
    mut q: Query<
        (
            &mut BulletState,
            &mut Bullet,
            &mut Transform,
            &mut LinearVelocity,
            &mut Visibility,
            &mut CollisionLayers,
        ),
        With<PooledBy>,
    >,
) {
    for req in reader.read() {
        match pools.acquire(&mut commands, req.key) {
            Ok(Acquired { entity, fresh: false }) => {
                let parts: SlotComponents = q
                    .get_mut(entity)
                    .expect("pool free queue contained an entity missing slot components");

                let mut slot = BulletSlot::from(parts);
                slot.initialize(req.pos, req.dir, req.speed);
                slot.activate();
            }
            Ok(Acquired { entity, fresh: true }) => {
                // Spawned this frame; queries can't see it yet, so stage the
                // same initialize + activate writes through Commands.
                activate_fresh(&mut commands, &pools, entity, req);
            }
            Err(err @ PoolError::Exhausted(_)) => {
                debug!("emission skipped: {err}");
            }
            Err(err) => {
                warn!("emission dropped: {err}");
            }
        }
    }
}

fn activate_fresh(commands: &mut Commands, pools: &BulletPools, entity: Entity, req: &EmitRequest) {
    let archetype = pools
        .archetype(req.key)
        .expect("acquire succeeded for an unregistered key");

    let dir = if req.dir.length_squared() > 1e-8 { req.dir.normalize() } else { Vec2::Y };

    commands.entity(entity).insert((
        Transform {
            translation: req.pos.extend(2.0),
            rotation: Quat::from_rotation_z(Vec2::Y.angle_to(dir)),
            ..default()
        },
        LinearVelocity(dir * req.speed),
        Visibility::Visible,
        archetype.faction.active_layers(),
        Bullet {
            faction: archetype.faction,
            damage: archetype.damage,
            lifetime: Timer::from_seconds(archetype.lifetime_secs, TimerMode::Once),
            launch: dir * req.speed,
        },
        BulletState::Active,
    ));
}
