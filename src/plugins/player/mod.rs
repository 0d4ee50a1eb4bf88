//! Player plugin.
//!
//! Pipeline:
//! - Update: sample input, write PlayerInput resource
//! - FixedUpdate: apply velocity to kinematic rigid body
//!
//! The player is also the aim target for enemy patterns and the second
//! independent pool user (click-to-fire requests in `projectiles::request`).

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::{layers::Layer, state::GameState, tunables::Tunables};
use crate::plugins::projectiles::components::Health;

#[derive(Component)]
pub struct Player;

#[derive(Resource, Default, Debug)]
struct PlayerInput {
    move_axis: Vec2,
}

pub fn plugin(app: &mut App) {
    app.insert_resource(PlayerInput::default())
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(Update, gather_input)
        .add_systems(FixedUpdate, apply_movement);
}

fn spawn(mut commands: Commands) {
    let layers = CollisionLayers::new(
        Layer::Player,
        [Layer::World, Layer::Enemy, Layer::EnemyBullet],
    );

    commands.spawn((
        Name::new("Player"),
        Player,
        Health { hp: 20 },
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::splat(26.0)),
            ..default()
        },
        Transform::from_xyz(0.0, -220.0, 1.0),
        RigidBody::Kinematic,
        Collider::circle(13.0),
        layers,
        LinearVelocity::ZERO,
        DespawnOnExit(GameState::InGame),
    ));
}

fn gather_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut input: ResMut<PlayerInput>) {
    let Some(keys) = keys else { return };

    let mut axis = Vec2::ZERO;

    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }

    input.move_axis = if axis.length_squared() > 0.0 {
        axis.normalize()
    } else {
        Vec2::ZERO
    };
}

fn apply_movement(
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    mut q_player: Query<&mut LinearVelocity, With<Player>>,
) {
    let Ok(mut vel) = q_player.single_mut() else {
        return;
    };
    vel.0 = input.move_axis * tunables.player_speed;
}

#[cfg(test)]
mod tests;
