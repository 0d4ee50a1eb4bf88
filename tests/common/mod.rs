//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `barrage::game::configure_headless` to install gameplay plugins.

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use std::time::Duration;

pub fn app_headless() -> App {
    let mut app = App::new();

    // Core ECS + states.
    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));

    barrage::game::configure_headless(&mut app);
    app
}

/// Tick one frame with a deterministic amount of virtual time, so fixed-step
/// systems run predictably regardless of wall-clock speed.
#[allow(dead_code)]
pub fn step(app: &mut App, dt: Duration) {
    app.world_mut().resource_mut::<Time<Virtual>>().advance_by(dt);
    app.update();
}
