//! Per-tick ball integration
//!
//! Semi-implicit Euler with gravity, vertical drag, horizontal speed loss,
//! ground bounces and settling. Each call is a pure transform of
//! the kinematics it is given.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::events::{BallEvent, Target};
use super::shot::stopping_deceleration;
use super::state::{BallKinematics, BallPhase};
use crate::consts::*;
use crate::{finite_or_zero, planar_distance};

/// Longest step the integrator will take; larger dt values are clamped
pub const MAX_STEP: f32 = 0.1;
/// Height tolerance for "resting on the ground"
const REST_EPSILON: f32 = 1e-4;

/// Physical constants for one kind of ball flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Vertical acceleration (m/s², negative is down)
    pub gravity: f32,
    /// Vertical speed retained per reference tick
    pub vertical_drag: f32,
    /// Vertical speed retained by a bounce
    pub restitution: f32,
    /// Horizontal speed retained by a bounce
    pub bounce_friction: f32,
    /// Horizontal deceleration while airborne (m/s²)
    pub air_deceleration: f32,
    /// Share of horizontal speed lost per second while airborne
    pub air_drag: f32,
    /// Horizontal deceleration while rolling (m/s²)
    pub rolling_deceleration: f32,
    /// Rebounds slower than this settle
    pub settle_speed: f32,
}

impl PhysicsParams {
    /// Deliveries follow real gravity so they match the trajectory calculator
    pub fn delivery() -> Self {
        Self {
            gravity: GRAVITY,
            vertical_drag: 1.0,
            restitution: BOUNCE_DAMPING,
            bounce_friction: BOUNCE_FRICTION,
            air_deceleration: 0.0,
            air_drag: 0.0,
            rolling_deceleration: 3.0,
            settle_speed: SETTLE_SPEED,
        }
    }

    /// Struck balls lose horizontal speed at the shot solver's stopping rate
    ///
    /// Used when the launch speed is unknown. The ball can run out of
    /// horizontal speed before it lands; prefer [`PhysicsParams::struck_at`].
    pub fn struck() -> Self {
        let decel = stopping_deceleration();
        Self {
            gravity: STRUCK_GRAVITY,
            vertical_drag: AIR_DRAG,
            restitution: BOUNCE_DAMPING,
            bounce_friction: 1.0,
            air_deceleration: decel,
            air_drag: 0.0,
            rolling_deceleration: decel,
            settle_speed: SETTLE_SPEED,
        }
    }

    /// Struck ball launched at `launch_speed` (horizontal, m/s)
    ///
    /// In the air the ball loses speed in proportion to its speed, at a rate
    /// of `2a / v0` for the stopping deceleration `a`. Its carry approaches
    /// `v0² / 2a`, the solved resting distance, without the horizontal speed
    /// reaching zero mid-flight. Once it rolls it decelerates at `a`.
    pub fn struck_at(launch_speed: f32) -> Self {
        if !launch_speed.is_finite() || launch_speed <= f32::EPSILON {
            return Self::struck();
        }
        let decel = stopping_deceleration();
        Self {
            air_deceleration: 0.0,
            air_drag: 2.0 * decel / launch_speed,
            ..Self::struck()
        }
    }

    /// Throws back to the keeper
    pub fn throw() -> Self {
        Self {
            gravity: GRAVITY,
            vertical_drag: 1.0,
            restitution: 0.5,
            bounce_friction: BOUNCE_FRICTION,
            air_deceleration: 0.0,
            air_drag: 0.0,
            rolling_deceleration: 6.0,
            settle_speed: SETTLE_SPEED,
        }
    }

    /// Profile for a ball sub-state, or `None` if the ball is held
    pub fn for_phase(phase: BallPhase) -> Option<Self> {
        match phase {
            BallPhase::Bowling | BallPhase::Bouncing => Some(Self::delivery()),
            BallPhase::Hit => Some(Self::struck()),
            BallPhase::Returning => Some(Self::throw()),
            BallPhase::WithBowler
            | BallPhase::Caught
            | BallPhase::WithFielder
            | BallPhase::WithKeeper => None,
        }
    }
}

/// Result of one integrator step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub ball: BallKinematics,
    /// In production order: bounce, targets, stop
    pub events: Vec<BallEvent>,
}

/// Advance the ball one step using the profile for its sub-state
///
/// Held balls (and balls that are not moving) come back unchanged.
pub fn step(ball: &BallKinematics, phase: BallPhase, dt: f32) -> StepOutcome {
    match PhysicsParams::for_phase(phase) {
        Some(params) => step_with(ball, phase, &params, dt),
        None => StepOutcome {
            ball: *ball,
            events: Vec::new(),
        },
    }
}

/// Advance the ball one step with explicit parameters
pub fn step_with(
    ball: &BallKinematics,
    phase: BallPhase,
    params: &PhysicsParams,
    dt: f32,
) -> StepOutcome {
    if !ball.is_moving {
        return StepOutcome {
            ball: *ball,
            events: Vec::new(),
        };
    }

    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_STEP) } else { 0.0 };
    let mut pos = finite_or_zero(ball.position);
    let mut vel = finite_or_zero(ball.velocity);
    let mut bounce_count = ball.bounce_count;
    let mut events = Vec::new();

    let grounded = pos.y <= GROUND_LEVEL + REST_EPSILON && vel.y.abs() <= f32::EPSILON;

    vel.y += params.gravity * dt;
    vel.y *= params.vertical_drag.powf(dt / SIM_DT);

    let planar = Vec2::new(vel.x, vel.z);
    let speed = planar.length();
    let decel = if grounded {
        params.rolling_deceleration
    } else {
        params.air_deceleration + params.air_drag * speed
    };
    if speed > 0.0 {
        let scale = (speed - decel * dt).max(0.0) / speed;
        vel.x *= scale;
        vel.z *= scale;
    }

    pos += vel * dt;

    if pos.y <= GROUND_LEVEL && vel.y < 0.0 {
        pos.y = GROUND_LEVEL;
        let rebound = vel.y.abs() * params.restitution;
        if rebound < params.settle_speed {
            vel.y = 0.0;
        } else {
            vel.y = rebound;
            vel.x *= params.bounce_friction;
            vel.z *= params.bounce_friction;
            bounce_count += 1;
            events.push(BallEvent::Bounced {
                position: pos,
                velocity: vel,
                bounce_count,
            });
        }
    }
    if pos.y < GROUND_LEVEL {
        pos.y = GROUND_LEVEL;
        vel.y = vel.y.max(0.0);
    }

    if phase.is_delivery() {
        let distance = planar_distance(pos, STRIKER_ANCHOR);
        if distance < BATSMAN_REACH {
            events.push(BallEvent::ReachedTarget {
                target: Target::Batsman,
                distance,
            });
        }
    }

    let from_centre = planar_distance(pos, Vec3::ZERO);
    if from_centre > BOUNDARY_RADIUS {
        let runs = if pos.y > SIX_HEIGHT { SIX_RUNS } else { FOUR_RUNS };
        events.push(BallEvent::ReachedTarget {
            target: Target::Boundary { runs },
            distance: from_centre,
        });
    }

    let mut is_moving = true;
    if vel.length() < STOP_SPEED && pos.y <= GROUND_LEVEL + REST_EPSILON {
        vel = Vec3::ZERO;
        is_moving = false;
        events.push(BallEvent::Stopped { position: pos });
    }

    StepOutcome {
        ball: BallKinematics {
            position: pos,
            velocity: vel,
            is_moving,
            bounce_count,
        },
        events,
    }
}
