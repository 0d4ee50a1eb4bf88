//! Producer: player fire input → emission request.
//!
//! This system intentionally does **not** access `BulletPools`; it only
//! enqueues intent. It is also a no-op in headless apps where input,
//! window or camera don't exist.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::common::tunables::Tunables;
use crate::plugins::camera::MainCamera;
use crate::plugins::player::Player;

use super::keys;
use super::messages::EmitRequest;

pub fn request_player_shots(
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    windows: Query<&Window>,
    q_camera: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    q_player: Query<&Transform, With<Player>>,
    tunables: Res<Tunables>,
    mut writer: MessageWriter<EmitRequest>,
) {
    let Some(buttons) = buttons else { return };
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }

    let Ok(player_tf) = q_player.single() else { return };
    let Ok((camera, camera_tf)) = q_camera.single() else { return };
    let Ok(window) = windows.single() else { return };

    let Some(cursor) = window.cursor_position() else { return };
    let Ok(world_cursor) = camera.viewport_to_world_2d(camera_tf, cursor) else { return };

    let origin = player_tf.translation.truncate();
    let mut dir = world_cursor - origin;
    dir = if dir.length_squared() > 1e-4 { dir.normalize() } else { Vec2::Y };

    writer.write(EmitRequest {
        key: keys::PLAYER_SHOT,
        pos: origin + dir * tunables.player_shot_offset,
        dir,
        speed: tunables.player_shot_speed,
    });
}
