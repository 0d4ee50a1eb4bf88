//! Test helpers.
//!
//! Bevy provides `World::run_system_once` (via the `RunSystemOnce` trait) for quickly
//! executing a system in tests without building a full schedule.
//!
//! Systems that use `Commands` enqueue structural changes; applying them is normally
//! handled by `ApplyDeferred` / schedule boundaries. We call `world.flush()` after
//! running so queued commands are applied before assertions.

use std::time::Duration;

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// A `Time<Fixed>` whose delta is `dt` seconds, for single system runs.
pub fn fixed_time_with_delta(dt: f32) -> Time<Fixed> {
    let mut t = Time::<Fixed>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    t
}

/// A plain `Time` whose delta is `dt` seconds.
pub fn time_with_delta(dt: f32) -> Time {
    let mut t = Time::default();
    t.advance_by(Duration::from_secs_f32(dt));
    t
}
