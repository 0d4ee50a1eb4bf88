//! Tunable gameplay constants.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub player_speed: f32,
    pub player_shot_speed: f32,
    /// Distance in front of the player at which shots appear.
    pub player_shot_offset: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            player_speed: 420.0,
            player_shot_speed: 900.0,
            player_shot_offset: 18.0,
        }
    }
}
