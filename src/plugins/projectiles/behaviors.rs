//! Bullet flight behaviours: lifetime budgets and splitting.
//!
//! Both run in the fixed step and only ever move bullets towards `Exiting`;
//! the actual return to the pool is the commit system's job.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use super::components::{Bullet, BulletState};
use super::messages::EmitRequest;
use super::pool::Splitter;

/// Tick per-bullet lifetime and retire expired bullets.
pub fn tick_lifetimes(
    time: Res<Time<Fixed>>,
    mut q: Query<(&mut Bullet, &mut BulletState)>,
) {
    for (mut bullet, mut state) in &mut q {
        if *state != BulletState::Active {
            continue;
        }

        bullet.lifetime.tick(time.delta());
        if bullet.lifetime.is_finished() {
            *state = BulletState::Exiting;
        }
    }
}

/// Detonate splitting bullets that crossed their trigger height.
///
/// The child ring goes back through the pool as ordinary emission requests;
/// the parent retires. Emitting children of the parent's own kind would
/// recurse, which the archetype configuration avoids by pointing
/// `child_key` at a plain archetype.
pub fn split_bullets(
    mut writer: MessageWriter<EmitRequest>,
    mut q: Query<(&Transform, &Splitter, &mut BulletState)>,
) {
    for (tf, splitter, mut state) in &mut q {
        if *state != BulletState::Active {
            continue;
        }

        let spec = splitter.0;
        if tf.translation.y > spec.trigger_y || spec.child_count == 0 {
            continue;
        }

        let pos = tf.translation.truncate();
        let step = std::f32::consts::TAU / spec.child_count as f32;
        for i in 0..spec.child_count {
            let angle = step * i as f32;
            writer.write(EmitRequest {
                key: spec.child_key,
                pos,
                dir: Vec2::new(angle.sin(), angle.cos()),
                speed: spec.child_speed,
            });
        }

        *state = BulletState::Exiting;
    }
}
