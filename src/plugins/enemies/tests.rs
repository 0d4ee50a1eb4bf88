//! Unit tests for the enemies module.

#![cfg(test)]

use super::*;
use crate::common::test_utils::{fixed_time_with_delta, run_system_once};

#[test]
fn spawn_attaches_sequences_to_every_attacker() {
    let mut world = World::new();
    run_system_once(&mut world, spawn_attackers);

    let mut q = world.query::<(&Enemy, &AttackSequence, &EnemyLifeState, &Health)>();
    let mut count = 0;
    for (_, seq, life, hp) in q.iter(&world) {
        count += 1;
        assert!(!seq.scripts().is_empty());
        assert!(!seq.is_stopped());
        assert!(matches!(life, EnemyLifeState::Alive));
        assert!(hp.hp > 0);
    }
    assert_eq!(count, 3);
}

#[test]
fn attacker_loadouts_pass_sequence_validation() {
    for (name, _, scripts) in attacker_loadouts() {
        assert!(
            AttackSequence::new(scripts, true, 1.0).is_ok(),
            "loadout `{name}` should validate"
        );
    }
}

#[test]
fn death_trigger_transitions_alive_to_dying_and_disables_collisions() {
    let mut world = World::new();

    let e = world
        .spawn((
            Enemy,
            Health { hp: 0 },
            EnemyLifeState::Alive,
            Sprite { color: Color::srgba(0.1, 0.2, 0.3, 1.0), ..default() },
            Transform::from_scale(Vec3::splat(2.0)),
            CollisionLayers::new(Layer::Enemy, [Layer::World]),
        ))
        .id();

    run_system_once(&mut world, enemy_death_trigger);

    match world.get::<EnemyLifeState>(e).unwrap() {
        EnemyLifeState::Dying { timer } => assert!(timer.duration().as_secs_f32() > 0.0),
        _ => panic!("Expected enemy to enter Dying"),
    }

    let layers = world.get::<CollisionLayers>(e).unwrap();
    assert_eq!(*layers, non_interacting_enemy_layers());

    let tf = world.get::<Transform>(e).unwrap();
    assert_eq!(tf.scale, Vec3::ONE);
}

#[test]
fn death_progress_marks_pending_despawn_and_sets_dead() {
    let mut world = World::new();
    world.insert_resource(fixed_time_with_delta(1.0));

    let e = world
        .spawn((
            Enemy,
            EnemyLifeState::Dying { timer: Timer::from_seconds(0.1, TimerMode::Once) },
            Sprite::default(),
            Transform::default(),
        ))
        .id();

    run_system_once(&mut world, enemy_death_progress);

    assert!(world.get::<PendingDespawn>(e).is_some());
    assert!(matches!(world.get::<EnemyLifeState>(e).unwrap(), EnemyLifeState::Dead));
}

#[test]
fn marked_enemies_are_despawned() {
    let mut world = World::new();

    let doomed = world.spawn((Enemy, PendingDespawn)).id();
    let alive = world.spawn((Enemy,)).id();

    run_system_once(&mut world, despawn_marked_enemies);

    assert!(world.get_entity(doomed).is_err());
    assert!(world.get_entity(alive).is_ok());
}

#[test]
fn dying_owner_stops_emitting_at_the_next_tick() {
    use crate::common::test_utils::time_with_delta;
    use crate::plugins::patterns::drive_attack_sequences;
    use crate::plugins::projectiles::messages::EmitRequest;
    use bevy::ecs::message::Messages;

    let mut world = World::new();
    world.insert_resource(time_with_delta(0.0));
    world.init_resource::<Messages<EmitRequest>>();

    let scripts = vec![PatternScript::Burst(BurstParams {
        key: keys::ENEMY_ROUND,
        speed: 200.0,
        count: 1,
        shot_delay: 0.0,
        loops: 10,
        loop_delay: 0.0,
    })];
    let e = world
        .spawn((
            Transform::default(),
            EnemyLifeState::Alive,
            AttackSequence::new(scripts, false, 0.0).unwrap(),
        ))
        .id();

    run_system_once(&mut world, drive_attack_sequences);
    assert_eq!(world.resource::<Messages<EmitRequest>>().len(), 1);

    // The owner starts dying; the run cancels at its next yield point and
    // no further requests appear.
    *world.get_mut::<EnemyLifeState>(e).unwrap() =
        EnemyLifeState::Dying { timer: Timer::from_seconds(0.35, TimerMode::Once) };

    run_system_once(&mut world, drive_attack_sequences);
    run_system_once(&mut world, drive_attack_sequences);
    assert_eq!(world.resource::<Messages<EmitRequest>>().len(), 1);

    assert!(world.get::<AttackSequence>(e).unwrap().is_stopped());
}
