//! Declarative emission scripts.
//!
//! A script is pure data: the geometry + timing parameters of one pattern,
//! immutable after construction. Shapes are a closed set of tagged variants
//! dispatched by one interpreter (`PatternRun`), not a class hierarchy.
//!
//! Angle convention: degrees, counter-clockwise positive, `0°` along the
//! emitter's facing (ring angles are absolute, `0°` = world up, clockwise).

use bevy::prelude::*;
use thiserror::Error;

use crate::plugins::projectiles::pool::PoolKey;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScriptError {
    #[error("bullet speed must be positive and finite")]
    NonPositiveSpeed,
    #[error("a spiral with more than one bullet needs a non-zero angle step")]
    FlatSpiral,
}

/// Straight volley along the owner's facing: `count` shots `shot_delay`
/// apart, the whole burst repeated `loops` times with `loop_delay` between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstParams {
    pub key: PoolKey,
    pub speed: f32,
    pub count: u32,
    pub shot_delay: f32,
    pub loops: u32,
    pub loop_delay: f32,
}

/// Burst that re-aims at the current target position at the start of each
/// loop, falling back to the owner's facing when no target exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimedParams {
    pub key: PoolKey,
    pub speed: f32,
    pub count: u32,
    pub shot_delay: f32,
    pub loops: u32,
    pub loop_delay: f32,
}

/// N-way spread centered on the owner's facing. A count of one fires a
/// single shot straight ahead; `shot_delay` of zero fires the fan at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanParams {
    pub key: PoolKey,
    pub speed: f32,
    pub count: u32,
    pub total_angle: f32,
    pub shot_delay: f32,
    pub loops: u32,
    pub loop_delay: f32,
}

/// Full ring fired at once, rotated by `angle_step_per_loop` every loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleParams {
    pub key: PoolKey,
    pub speed: f32,
    pub count: u32,
    pub start_angle: f32,
    pub angle_step_per_loop: f32,
    pub loops: u32,
    pub loop_delay: f32,
}

/// One shot per step, rotating `angle_step` each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralParams {
    pub key: PoolKey,
    pub speed: f32,
    pub count: u32,
    pub angle_step: f32,
    pub shot_delay: f32,
    pub start_angle: f32,
    pub clockwise: bool,
}

/// Star formation aimed at the target: bullets placed along the star's
/// edges, each flying towards the target's current position. Skipped
/// entirely when no target exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarParams {
    pub key: PoolKey,
    pub speed: f32,
    pub points: u32,
    pub bullets_per_edge: u32,
    pub radius: f32,
    pub center_offset: f32,
    pub initial_rotation: f32,
    pub spin: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternScript {
    Burst(BurstParams),
    Aimed(AimedParams),
    Fan(FanParams),
    Circle(CircleParams),
    Spiral(SpiralParams),
    Star(StarParams),
}

impl PatternScript {
    pub fn key(&self) -> PoolKey {
        match self {
            Self::Burst(p) => p.key,
            Self::Aimed(p) => p.key,
            Self::Fan(p) => p.key,
            Self::Circle(p) => p.key,
            Self::Spiral(p) => p.key,
            Self::Star(p) => p.key,
        }
    }

    pub fn speed(&self) -> f32 {
        match self {
            Self::Burst(p) => p.speed,
            Self::Aimed(p) => p.speed,
            Self::Fan(p) => p.speed,
            Self::Circle(p) => p.speed,
            Self::Spiral(p) => p.speed,
            Self::Star(p) => p.speed,
        }
    }

    /// Configuration-time validation. Degenerate *counts* are not errors —
    /// a zero-count script simply completes without emitting — but
    /// parameters that can only be authoring mistakes are rejected here.
    pub fn validate(&self) -> Result<(), ScriptError> {
        let speed = self.speed();
        if !(speed > 0.0) || !speed.is_finite() {
            return Err(ScriptError::NonPositiveSpeed);
        }

        if let Self::Spiral(p) = self {
            if p.count > 1 && p.angle_step == 0.0 {
                return Err(ScriptError::FlatSpiral);
            }
        }

        Ok(())
    }
}

/// Rotate `v` by `deg` degrees counter-clockwise.
pub(crate) fn rotate_deg(v: Vec2, deg: f32) -> Vec2 {
    Vec2::from_angle(deg.to_radians()).rotate(v)
}
