//! End-to-end emission flow: sequences drive the pool, owner death cancels
//! runs, expired bullets recycle.

mod common;

use std::time::Duration;

use barrage::plugins::enemies::{Enemy, EnemyLifeState};
use barrage::plugins::patterns::sequence::AttackSequence;
use barrage::plugins::projectiles::components::BulletState;
use barrage::plugins::projectiles::keys;
use barrage::plugins::projectiles::pool::BulletPools;
use barrage::plugins::projectiles::PoolManifest;
use bevy::prelude::*;

const FRAME: Duration = Duration::from_millis(50);

fn count_bullets_in(app: &mut App, wanted: BulletState) -> usize {
    app.world_mut()
        .query::<&BulletState>()
        .iter(app.world())
        .filter(|s| **s == wanted)
        .count()
}

#[test]
fn sequences_emit_through_the_pool() {
    let mut app = common::app_headless();
    app.update();

    for _ in 0..4 {
        common::step(&mut app, FRAME);
    }

    // Attackers have fired: live bullets exist and they came out of the
    // round pool's free queue.
    let active = count_bullets_in(&mut app, BulletState::Active);
    assert!(active > 0, "expected live bullets, found none");

    let registered = app
        .world()
        .resource::<PoolManifest>()
        .pools
        .iter()
        .find(|(key, _, _)| *key == keys::ENEMY_ROUND)
        .map(|(_, _, initial)| *initial)
        .expect("manifest registers the round pool");
    let free = app
        .world()
        .resource::<BulletPools>()
        .free_count(keys::ENEMY_ROUND);
    assert!(free < registered, "round pool should have handed out slots");
}

#[test]
fn dead_owners_stop_their_sequences() {
    let mut app = common::app_headless();
    app.update();

    for _ in 0..4 {
        common::step(&mut app, FRAME);
    }

    // Kill every attacker mid-sequence.
    let enemies: Vec<Entity> = app
        .world_mut()
        .query_filtered::<Entity, With<Enemy>>()
        .iter(app.world())
        .collect();
    assert!(!enemies.is_empty());
    for e in &enemies {
        *app.world_mut().get_mut::<EnemyLifeState>(*e).unwrap() =
            EnemyLifeState::Dying { timer: Timer::from_seconds(10.0, TimerMode::Once) };
    }

    // Every in-flight run cancels at its next yield point. Runs sitting in
    // a timed wait (loop delays up to 0.8s, pattern gaps of 1s) only notice
    // once that wait expires, so cover the longest one.
    for _ in 0..30 {
        common::step(&mut app, FRAME);
    }

    let live_sequences = app
        .world_mut()
        .query::<&AttackSequence>()
        .iter(app.world())
        .filter(|seq| !seq.is_stopped())
        .count();
    assert_eq!(live_sequences, 0);
}

#[test]
fn expired_bullets_recycle_back_into_their_pools() {
    let mut app = common::app_headless();
    app.update();

    for _ in 0..4 {
        common::step(&mut app, FRAME);
    }
    assert!(count_bullets_in(&mut app, BulletState::Active) > 0);

    // Stop all emission, then outlive the longest bullet lifetime.
    let enemies: Vec<Entity> = app
        .world_mut()
        .query_filtered::<Entity, With<Enemy>>()
        .iter(app.world())
        .collect();
    for e in &enemies {
        *app.world_mut().get_mut::<EnemyLifeState>(*e).unwrap() =
            EnemyLifeState::Dying { timer: Timer::from_seconds(60.0, TimerMode::Once) };
    }

    for _ in 0..140 {
        common::step(&mut app, FRAME);
    }

    assert_eq!(count_bullets_in(&mut app, BulletState::Active), 0);
    assert_eq!(count_bullets_in(&mut app, BulletState::Exiting), 0);
}
