//! Enemies plugin: attackers that own pattern sequences, plus a small death
//! lifecycle.
//!
//! Rules live in predictable places:
//! - collision resolution (projectiles plugin) updates `Health`;
//! - this module reads `Health` and transitions `EnemyLifeState`;
//! - the pattern driver polls `EnemyLifeState` as owner liveness, so a dying
//!   enemy's in-flight run cancels at its next yield point — this module
//!   never reaches into run state.
//!
//! Despawning is deferred: death marks `PendingDespawn` and a PostUpdate
//! system removes the entity, keeping structural changes out of the fixed
//! physics step.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::Occluder2d;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::patterns::script::{
    AimedParams, BurstParams, CircleParams, FanParams, PatternScript, SpiralParams, StarParams,
};
use crate::plugins::patterns::sequence::AttackSequence;
use crate::plugins::projectiles::components::Health;
use crate::plugins::projectiles::keys;

#[derive(Component)]
pub struct Enemy;

/// Enemy lifecycle state machine.
///
/// Alive enemies emit; Dying enemies stop interacting and animate out;
/// Dead is the terminal marker that stops further transitions.
#[derive(Component, Debug, Clone)]
pub enum EnemyLifeState {
    Alive,
    Dying { timer: Timer },
    Dead,
}

/// Marker: enemy should be removed from the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_attackers);

    // Fixed-step lifecycle: death trigger runs after collision resolution so
    // it sees updated Health.
    app.add_systems(
        FixedPostUpdate,
        enemy_death_trigger
            .after(crate::plugins::projectiles::collision::process_bullet_collisions)
            .run_if(in_state(GameState::InGame)),
    );

    app.add_systems(
        FixedPostUpdate,
        enemy_death_progress
            .after(enemy_death_trigger)
            .run_if(in_state(GameState::InGame)),
    );

    app.add_systems(
        PostUpdate,
        despawn_marked_enemies.run_if(in_state(GameState::InGame)),
    );
}

/// Collision layers for an enemy that should no longer interact with
/// anything: keep membership, clear filters (no structural changes).
#[inline]
fn non_interacting_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [] as [Layer; 0])
}

/// The stock attacker loadouts: ordered script lists, looped with a
/// one-second gap between patterns.
fn attacker_loadouts() -> [(&'static str, Vec2, Vec<PatternScript>); 3] {
    [
        (
            "AimedAttacker",
            Vec2::new(-260.0, 180.0),
            vec![
                PatternScript::Aimed(AimedParams {
                    key: keys::ENEMY_ROUND,
                    speed: 260.0,
                    count: 3,
                    shot_delay: 0.1,
                    loops: 3,
                    loop_delay: 0.5,
                }),
                PatternScript::Circle(CircleParams {
                    key: keys::ENEMY_ROUND,
                    speed: 220.0,
                    count: 12,
                    start_angle: 0.0,
                    angle_step_per_loop: 33.0,
                    loops: 3,
                    loop_delay: 0.1,
                }),
            ],
        ),
        (
            "SplitterAttacker",
            Vec2::new(0.0, 200.0),
            vec![
                PatternScript::Burst(BurstParams {
                    key: keys::ENEMY_SPLITTER,
                    speed: 180.0,
                    count: 1,
                    shot_delay: 0.0,
                    loops: 2,
                    loop_delay: 0.8,
                }),
                PatternScript::Star(StarParams {
                    key: keys::ENEMY_ROUND,
                    speed: 240.0,
                    points: 5,
                    bullets_per_edge: 3,
                    radius: 64.0,
                    center_offset: 24.0,
                    initial_rotation: 90.0,
                    spin: 30.0,
                }),
            ],
        ),
        (
            "FanAttacker",
            Vec2::new(260.0, 180.0),
            vec![
                PatternScript::Fan(FanParams {
                    key: keys::ENEMY_ROUND,
                    speed: 280.0,
                    count: 5,
                    total_angle: 60.0,
                    shot_delay: 0.0,
                    loops: 3,
                    loop_delay: 0.2,
                }),
                PatternScript::Spiral(SpiralParams {
                    key: keys::ENEMY_ROUND,
                    speed: 240.0,
                    count: 40,
                    angle_step: 10.0,
                    shot_delay: 0.02,
                    start_angle: 0.0,
                    clockwise: true,
                }),
            ],
        ),
    ]
}

/// Spawn the attackers, facing down towards the player.
///
/// A loadout that fails sequence validation spawns without an
/// `AttackSequence` — the enemy exists but its runner is disabled.
fn spawn_attackers(mut commands: Commands) {
    let enemy_layers = CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Player, Layer::PlayerBullet],
    );

    for (name, pos, scripts) in attacker_loadouts() {
        let mut enemy = commands.spawn((
            Name::new(name),
            Enemy,
            Health { hp: 8 },
            EnemyLifeState::Alive,
            Sprite {
                color: Color::srgb(0.9, 0.25, 0.25),
                custom_size: Some(Vec2::splat(32.0)),
                ..default()
            },
            Transform::from_translation(pos.extend(1.0))
                .with_rotation(Quat::from_rotation_z(std::f32::consts::PI)),
            RigidBody::Static,
            Collider::circle(16.0),
            enemy_layers,
            Occluder2d::circle(16.0),
            DespawnOnExit(GameState::InGame),
        ));

        match AttackSequence::new(scripts, true, 1.0) {
            Ok(sequence) => {
                enemy.insert(sequence);
            }
            Err(err) => error!("enemy `{name}` attack sequence disabled: {err}"),
        }
    }
}

/// Transition Alive -> Dying when HP drops to 0.
///
/// No despawn here; this only transitions state and enforces the dying
/// invariants (stop collision interaction, neutral tint).
fn enemy_death_trigger(
    mut q: Query<
        (
            &Health,
            &mut EnemyLifeState,
            &mut CollisionLayers,
            &mut Sprite,
            &mut Transform,
        ),
        (With<Enemy>, Without<PendingDespawn>),
    >,
) {
    for (hp, mut life, mut layers, mut sprite, mut tf) in &mut q {
        if !matches!(*life, EnemyLifeState::Alive) {
            continue;
        }

        if hp.hp <= 0 {
            *life = EnemyLifeState::Dying {
                timer: Timer::from_seconds(0.35, TimerMode::Once),
            };
            *layers = non_interacting_enemy_layers();

            sprite.color = Color::srgba(0.8, 0.8, 0.8, 1.0);
            tf.scale = Vec3::ONE;
        }
    }
}

/// Animate Dying and mark PendingDespawn once finished.
fn enemy_death_progress(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut q: Query<
        (Entity, &mut EnemyLifeState, &mut Sprite, &mut Transform),
        (With<Enemy>, Without<PendingDespawn>),
    >,
) {
    for (e, mut life, mut sprite, mut tf) in &mut q {
        let EnemyLifeState::Dying { timer } = &mut *life else {
            continue;
        };

        timer.tick(time.delta());

        let dur = timer.duration().as_secs_f32().max(0.0001);
        let t = (timer.elapsed_secs() / dur).clamp(0.0, 1.0);

        tf.scale = Vec3::splat(1.0 - t);

        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0 - t;
        sprite.color = c.into();

        if timer.is_finished() {
            *life = EnemyLifeState::Dead;
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

/// Despawn enemies marked for removal.
fn despawn_marked_enemies(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}

#[cfg(test)]
mod tests;
