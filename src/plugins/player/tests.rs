#![cfg(test)]

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::test_utils::run_system_once;
use crate::common::tunables::Tunables;

#[test]
fn spawn_creates_player_with_health() {
    let mut world = World::new();
    run_system_once(&mut world, super::spawn);

    let mut q = world.query::<(
        &super::Player,
        &crate::plugins::projectiles::components::Health,
    )>();
    let (_, hp) = q.single(&world).unwrap();
    assert!(hp.hp > 0);
}

#[test]
fn apply_movement_sets_velocity() {
    let mut world = World::new();
    world.insert_resource(Tunables { player_speed: 100.0, ..default() });
    world.insert_resource(super::PlayerInput { move_axis: Vec2::new(1.0, 0.0) });
    world.spawn((super::Player, LinearVelocity::ZERO));

    run_system_once(&mut world, super::apply_movement);

    let v = world.query::<&LinearVelocity>().iter(&world).next().unwrap();
    assert_eq!(v.0, Vec2::new(100.0, 0.0));
}
