//! The pattern interpreter: one script execution as a resumable state machine.
//!
//! There is no suspension primitive here. A run holds `(loop index, step
//! index, pending wait)` and is advanced by an external `advance(dt, ctx)`
//! tick — the frame driver. Within one tick a run emits until it reaches the
//! next wait boundary or finishes; waits are consumed across subsequent
//! ticks.
//!
//! Timing rules:
//! - A positive delay suspends for that duration (resumes on the first tick
//!   where the remainder reaches zero).
//! - A *zero* loop/step delay still suspends for exactly one tick, so a
//!   pattern author cannot create an unbounded same-frame cascade. Zero
//!   *intra-burst* delay is the exception: a burst is one discrete event and
//!   its shots share a quantum.
//!
//! Cancellation is polled, never signalled: `ctx.is_valid()` is re-checked
//! before every emission and after every wait. A cancelled run performs no
//! further emit calls.

use bevy::prelude::*;

use super::script::{rotate_deg, PatternScript, SpiralParams, StarParams};
use crate::plugins::projectiles::pool::PoolKey;

/// One emission command: where, which way, how fast, from which pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub key: PoolKey,
    pub pos: Vec2,
    pub dir: Vec2,
    pub speed: f32,
}

/// What a run needs from its owner, and where emissions go.
///
/// `is_valid` is the owner-liveness poll; `target` is resolved fresh on
/// every call so moving targets are tracked per-loop, not per-run.
pub trait EmitterContext {
    fn is_valid(&self) -> bool;
    fn origin(&self) -> Vec2;
    fn facing(&self) -> Vec2;
    fn target(&self) -> Option<Vec2>;
    fn emit(&mut self, emission: Emission);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Wait {
    /// Resume next tick regardless of dt.
    NextFrame,
    /// Resume once the remainder reaches zero.
    Timed(f32),
}

/// Looped-volley parameters shared by burst/aimed/fan/circle.
#[derive(Clone, Copy)]
struct Volley {
    key: PoolKey,
    speed: f32,
    count: u32,
    shot_delay: Option<f32>,
    loops: u32,
    loop_delay: f32,
    shape: Shape,
}

#[derive(Clone, Copy)]
enum Shape {
    /// Every shot along the loop direction.
    Straight,
    /// Spread of `total_angle` centered on the loop direction.
    Fan { total_angle: f32 },
    /// Absolute ring, all shots in one quantum.
    Ring,
}

#[derive(Debug, Clone)]
pub struct PatternRun {
    script: PatternScript,
    status: RunStatus,
    wait: Option<Wait>,
    loop_idx: u32,
    step_idx: u32,
    loop_primed: bool,
    /// Direction resolved at the start of the current loop.
    loop_dir: Vec2,
    /// Accumulated ring rotation (circle patterns).
    loop_offset: f32,
}

impl PatternRun {
    pub fn new(script: PatternScript) -> Self {
        let loop_offset = match script {
            PatternScript::Circle(p) => p.start_angle,
            _ => 0.0,
        };

        Self {
            script,
            status: RunStatus::Running,
            wait: None,
            loop_idx: 0,
            step_idx: 0,
            loop_primed: false,
            loop_dir: Vec2::Y,
            loop_offset,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Advance the run by `dt` seconds.
    ///
    /// Consumes at most one wait boundary per call; emission work happens
    /// only when no wait is pending.
    pub fn advance(&mut self, dt: f32, ctx: &mut dyn EmitterContext) -> RunStatus {
        if self.status != RunStatus::Running {
            return self.status;
        }

        match self.wait {
            Some(Wait::Timed(remaining)) => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.wait = Some(Wait::Timed(remaining));
                    return RunStatus::Running;
                }
                self.wait = None;
            }
            Some(Wait::NextFrame) => self.wait = None,
            None => {}
        }

        match self.script {
            PatternScript::Burst(p) => self.step_volley(
                ctx,
                Volley {
                    key: p.key,
                    speed: p.speed,
                    count: p.count,
                    shot_delay: Some(p.shot_delay),
                    loops: p.loops,
                    loop_delay: p.loop_delay,
                    shape: Shape::Straight,
                },
            ),
            PatternScript::Aimed(p) => self.step_volley(
                ctx,
                Volley {
                    key: p.key,
                    speed: p.speed,
                    count: p.count,
                    shot_delay: Some(p.shot_delay),
                    loops: p.loops,
                    loop_delay: p.loop_delay,
                    shape: Shape::Straight,
                },
            ),
            PatternScript::Fan(p) => self.step_volley(
                ctx,
                Volley {
                    key: p.key,
                    speed: p.speed,
                    count: p.count,
                    shot_delay: Some(p.shot_delay),
                    loops: p.loops,
                    loop_delay: p.loop_delay,
                    shape: Shape::Fan { total_angle: p.total_angle },
                },
            ),
            PatternScript::Circle(p) => self.step_volley(
                ctx,
                Volley {
                    key: p.key,
                    speed: p.speed,
                    count: p.count,
                    shot_delay: None,
                    loops: p.loops,
                    loop_delay: p.loop_delay,
                    shape: Shape::Ring,
                },
            ),
            PatternScript::Spiral(p) => self.step_spiral(ctx, p),
            PatternScript::Star(p) => self.step_star(ctx, p),
        }

        self.status
    }

    /// Direction for the current loop, resolved once at loop start.
    fn prime_direction(&self, ctx: &dyn EmitterContext) -> Vec2 {
        match self.script {
            PatternScript::Aimed(_) => match ctx.target() {
                Some(target) => {
                    let d = target - ctx.origin();
                    if d.length_squared() > 1e-8 { d.normalize() } else { ctx.facing() }
                }
                None => ctx.facing(),
            },
            _ => ctx.facing(),
        }
    }

    fn shot_dir(&self, volley: &Volley, i: u32) -> Vec2 {
        match volley.shape {
            Shape::Straight => self.loop_dir,
            Shape::Fan { total_angle } => {
                if volley.count == 1 {
                    self.loop_dir
                } else {
                    let step = total_angle / (volley.count - 1) as f32;
                    rotate_deg(self.loop_dir, -total_angle / 2.0 + step * i as f32)
                }
            }
            Shape::Ring => {
                let rad = ((360.0 / volley.count as f32) * i as f32 + self.loop_offset).to_radians();
                Vec2::new(rad.sin(), rad.cos())
            }
        }
    }

    fn step_volley(&mut self, ctx: &mut dyn EmitterContext, volley: Volley) {
        if volley.count == 0 || volley.loops == 0 {
            self.status = RunStatus::Completed;
            return;
        }

        loop {
            if !ctx.is_valid() {
                self.status = RunStatus::Cancelled;
                return;
            }

            if !self.loop_primed {
                self.loop_dir = self.prime_direction(ctx);
                self.step_idx = 0;
                self.loop_primed = true;
            }

            let origin = ctx.origin();
            match volley.shape {
                Shape::Ring => {
                    for i in 0..volley.count {
                        ctx.emit(Emission {
                            key: volley.key,
                            pos: origin,
                            dir: self.shot_dir(&volley, i),
                            speed: volley.speed,
                        });
                    }
                    self.step_idx = volley.count;
                }
                _ => {
                    ctx.emit(Emission {
                        key: volley.key,
                        pos: origin,
                        dir: self.shot_dir(&volley, self.step_idx),
                        speed: volley.speed,
                    });
                    self.step_idx += 1;
                }
            }

            if self.step_idx < volley.count {
                match volley.shot_delay {
                    Some(delay) if delay > 0.0 => {
                        self.wait = Some(Wait::Timed(delay));
                        return;
                    }
                    // Zero intra-burst delay: the burst shares one quantum.
                    _ => continue,
                }
            }

            // Loop finished.
            self.loop_idx += 1;
            self.loop_primed = false;
            if let PatternScript::Circle(p) = self.script {
                self.loop_offset += p.angle_step_per_loop;
            }

            if self.loop_idx < volley.loops {
                self.wait = Some(if volley.loop_delay > 0.0 {
                    Wait::Timed(volley.loop_delay)
                } else {
                    Wait::NextFrame
                });
                return;
            }

            self.status = RunStatus::Completed;
            return;
        }
    }

    fn step_spiral(&mut self, ctx: &mut dyn EmitterContext, p: SpiralParams) {
        // A flat spiral (no rotation, several shots) is an authoring mistake
        // caught by validation; at run time it degrades to nothing.
        if p.count == 0 || (p.count > 1 && p.angle_step == 0.0) {
            self.status = RunStatus::Completed;
            return;
        }

        if !ctx.is_valid() {
            self.status = RunStatus::Cancelled;
            return;
        }

        let sign = if p.clockwise { -1.0 } else { 1.0 };
        let angle = p.start_angle + p.angle_step * self.step_idx as f32 * sign;
        ctx.emit(Emission {
            key: p.key,
            pos: ctx.origin(),
            dir: rotate_deg(ctx.facing(), angle),
            speed: p.speed,
        });

        self.step_idx += 1;
        if self.step_idx >= p.count {
            self.status = RunStatus::Completed;
            return;
        }

        // Every spiral step is a suspension point, even at zero delay.
        self.wait = Some(if p.shot_delay > 0.0 {
            Wait::Timed(p.shot_delay)
        } else {
            Wait::NextFrame
        });
    }

    fn step_star(&mut self, ctx: &mut dyn EmitterContext, p: StarParams) {
        if p.points == 0 {
            self.status = RunStatus::Completed;
            return;
        }

        if !ctx.is_valid() {
            self.status = RunStatus::Cancelled;
            return;
        }

        // No target: skip the volley entirely (per-pattern policy).
        let Some(target) = ctx.target() else {
            self.status = RunStatus::Completed;
            return;
        };

        let facing = ctx.facing();
        let center = ctx.origin() + facing * p.center_offset;
        let rotation = p.initial_rotation + p.spin;
        let vertex_arc = 360.0 / p.points as f32;

        for point in 0..p.points {
            // Star stroke order: every second vertex (0, 2, 4, 1, 3 for a
            // five-pointed star).
            let v1 = (point * 2) % p.points;
            let v2 = ((point + 1) * 2) % p.points;
            let vert1 = center + rotate_deg(facing, rotation + vertex_arc * v1 as f32) * p.radius;
            let vert2 = center + rotate_deg(facing, rotation + vertex_arc * v2 as f32) * p.radius;

            for i in 0..=p.bullets_per_edge {
                let t = i as f32 / (p.bullets_per_edge + 1) as f32;
                let pos = vert1.lerp(vert2, t);
                let d = target - pos;
                let dir = if d.length_squared() > 1e-8 { d.normalize() } else { facing };

                ctx.emit(Emission { key: p.key, pos, dir, speed: p.speed });
            }
        }

        self.status = RunStatus::Completed;
    }
}
