//! Return commit: recycle `Exiting` bullets back into their pool.
//!
//! Centralizing the sweep here keeps pool mutation out of collision and
//! behaviour systems, and gives `BulletPools::release` one caller — the
//! reset-before-enqueue guarantee lives in exactly one code path.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::components::{Bullet, BulletSlot, BulletState, PooledBy, SlotComponents};
use super::pool::BulletPools;

pub fn return_exiting_to_pool(
    mut commands: Commands,
    mut pools: ResMut<BulletPools>,
    mut q: Query<(
        Entity,
        Option<&PooledBy>,
        &mut BulletState,
        &mut Bullet,
        &mut Transform,
        &mut LinearVelocity,
        &mut Visibility,
        &mut CollisionLayers,
    )>,
) {
    for (entity, tag, state, bullet, transform, velocity, visibility, layers) in &mut q {
        if *state != BulletState::Exiting {
            continue;
        }

        let parts: SlotComponents = (state, bullet, transform, velocity, visibility, layers);
        let mut slot = BulletSlot::from(parts);
        pools.release(&mut commands, entity, tag, &mut slot);
    }
}
