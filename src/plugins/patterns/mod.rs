//! Patterns plugin: drives every owner's attack sequence once per frame.
//!
//! The driver is a producer in the emission pipeline: it ticks each
//! sequence with a context assembled from the owner's transform and life
//! state, collects the emissions the interpreter decides on, and enqueues
//! them as `EmitRequest` messages. It never touches the pool.
//!
//! Owners interleave at frame granularity; each tick only mutates that
//! owner's own run state, so ordering between owners is irrelevant.

pub mod script;
pub mod run;
pub mod sequence;

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::plugins::enemies::EnemyLifeState;
use crate::plugins::player::Player;
use crate::plugins::projectiles::allocator;
use crate::plugins::projectiles::messages::EmitRequest;

use run::{Emission, EmitterContext};
use sequence::AttackSequence;

/// The owner's local "up", the base direction patterns shoot along.
pub fn facing_of(tf: &Transform) -> Vec2 {
    (tf.rotation * Vec3::Y).truncate()
}

/// Context for one owner's tick: liveness + geometry snapshot, emissions
/// collected for the message writer.
struct OwnerCtx {
    valid: bool,
    origin: Vec2,
    facing: Vec2,
    target: Option<Vec2>,
    emissions: Vec<Emission>,
}

impl EmitterContext for OwnerCtx {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn origin(&self) -> Vec2 {
        self.origin
    }

    fn facing(&self) -> Vec2 {
        self.facing
    }

    fn target(&self) -> Option<Vec2> {
        self.target
    }

    fn emit(&mut self, emission: Emission) {
        self.emissions.push(emission);
    }
}

pub fn drive_attack_sequences(
    time: Res<Time>,
    mut writer: MessageWriter<EmitRequest>,
    q_target: Query<&Transform, (With<Player>, Without<AttackSequence>)>,
    mut q: Query<(&Transform, &EnemyLifeState, &mut AttackSequence)>,
) {
    let dt = time.delta_secs();
    let target = q_target.iter().next().map(|tf| tf.translation.truncate());

    for (tf, life, mut seq) in &mut q {
        let mut ctx = OwnerCtx {
            valid: matches!(life, EnemyLifeState::Alive),
            origin: tf.translation.truncate(),
            facing: facing_of(tf),
            target,
            emissions: Vec::new(),
        };

        seq.tick(dt, &mut ctx);

        for emission in ctx.emissions {
            writer.write(EmitRequest {
                key: emission.key,
                pos: emission.pos,
                dir: emission.dir,
                speed: emission.speed,
            });
        }
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        drive_attack_sequences
            .before(allocator::allocate_from_pool)
            .run_if(in_state(GameState::InGame)),
    );
}
