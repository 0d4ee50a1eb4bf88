//! Buffered emission requests.
//!
//! Producers (the pattern driver, player input, splitting bullets) create
//! *intent*; the allocator consumer applies it (pool acquire + slot writes).
//! Producers never borrow `ResMut<BulletPools>` — the allocator is the
//! single writer that mutates the pool.

use bevy::prelude::*;

use super::pool::PoolKey;

#[derive(Message, Clone, Copy, Debug)]
pub struct EmitRequest {
    pub key: PoolKey,
    pub pos: Vec2,
    pub dir: Vec2,
    pub speed: f32,
}
