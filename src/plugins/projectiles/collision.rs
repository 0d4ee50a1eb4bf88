//! Collision resolution for live bullets.
//!
//! Walls absorb bullets; a bullet reaching the opposing side deals damage
//! and retires. This system only flips `BulletState` and `Health` — the
//! structural consequences (pool return, enemy death) happen downstream.

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::layers::Layer;

use super::components::{Bullet, BulletState, Faction, Health, PooledBy};

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget { collider: ev.collider1, body: ev.body1 },
        CollisionTarget { collider: ev.collider2, body: ev.body2 },
    )
}

#[inline]
fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

pub fn process_bullet_collisions(
    mut started: MessageReader<CollisionStart>,
    // Fast "is this a pooled bullet?" check
    q_is_bullet: Query<(), With<PooledBy>>,
    // Bullet data + state
    mut q_bullets: Query<(&Bullet, &mut BulletState), With<PooledBy>>,
    // Read layers from collider entities
    q_layers: Query<&CollisionLayers>,
    // Gameplay state
    mut q_health: Query<&mut Health>,
    // Per-frame dedupe
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        // Identify the bullet side without get_mut probing
        let b1 = q_is_bullet.contains(t1.collider);
        let b2 = q_is_bullet.contains(t2.collider);
        if !(b1 ^ b2) {
            continue; // must be exactly one bullet
        }
        let (bullet_side, other_side) = if b1 { (t1, t2) } else { (t2, t1) };

        // Deduplicate per bullet collider
        if !seen.insert(bullet_side.collider) {
            continue;
        }

        let Ok(other_layers) = q_layers.get(other_side.collider) else {
            continue;
        };

        let Ok((bullet, mut state)) = q_bullets.get_mut(bullet_side.collider) else {
            continue;
        };

        // Inactive slots have empty filters and shouldn't be here, but a
        // stale event from the frame of deactivation is possible.
        if *state != BulletState::Active {
            continue;
        }

        // WORLD: walls absorb
        if is_in_layer(other_layers, Layer::World) {
            *state = BulletState::Exiting;
            continue;
        }

        // Opposing side: damage + retire
        let hits_target = match bullet.faction {
            Faction::Player => is_in_layer(other_layers, Layer::Enemy),
            Faction::Enemy => is_in_layer(other_layers, Layer::Player),
        };

        if hits_target {
            if let Ok(mut hp) = q_health.get_mut(other_side.gameplay_owner()) {
                hp.hp -= bullet.damage;
            }
            *state = BulletState::Exiting;
        }
    }
}
