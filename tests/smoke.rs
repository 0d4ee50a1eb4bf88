mod common;

use barrage::common::state::GameState;
use bevy::prelude::*;

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless();

    for _ in 0..3 {
        app.update();
    }
}

#[test]
fn world_is_populated_after_entering_ingame() {
    let mut app = common::app_headless();

    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::InGame);
    app.update();

    for _ in 0..5 {
        app.update();
    }

    let players = app
        .world_mut()
        .query::<&barrage::plugins::player::Player>()
        .iter(app.world())
        .count();
    assert_eq!(players, 1);

    let enemies = app
        .world_mut()
        .query::<(
            &barrage::plugins::enemies::Enemy,
            &barrage::plugins::patterns::sequence::AttackSequence,
        )>()
        .iter(app.world())
        .count();
    assert_eq!(enemies, 3);
}
