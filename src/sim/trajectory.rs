//! Delivery trajectory calculation
//!
//! Turns a bowling configuration into three waypoints: release, bounce and the
//! target point at the batting end. The path between them is two ballistic
//! segments under real gravity, so the host can both integrate the delivery
//! and sample it analytically for previews.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{finite_or_zero, planar_distance};

/// How a delivery is specified
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BowlingConfig {
    /// Pitch-analysis grid values (0-100, centred on 50)
    PitchAnalysis {
        velocity_kmh: f32,
        /// Lateral position where the ball reaches the batter
        ball_axis_x: f32,
        /// Height where the ball reaches the batter
        ball_axis_y: f32,
        /// Lateral position of the bounce
        length_axis_x: f32,
        /// Length of the bounce, measured from the batting crease
        length_axis_z: f32,
        /// Lateral release position
        line_axis_x: f32,
        /// Kept with presets; release depth is always the bowling crease
        line_axis_z: f32,
    },
    /// World coordinates in metres, used as given
    Direct {
        velocity_kmh: f32,
        release: Vec3,
        bounce: Vec3,
        target: Vec3,
    },
}

impl Default for BowlingConfig {
    fn default() -> Self {
        BowlingConfig::PitchAnalysis {
            velocity_kmh: 133.5,
            ball_axis_x: 35.74,
            ball_axis_y: 18.40,
            length_axis_x: 55.89,
            length_axis_z: 8.07,
            line_axis_x: 39.04,
            line_axis_z: 50.0,
        }
    }
}

impl BowlingConfig {
    /// Delivery speed in km/h, clamped to the supported range
    pub fn velocity_kmh(&self) -> f32 {
        let raw = match self {
            BowlingConfig::PitchAnalysis { velocity_kmh, .. } => *velocity_kmh,
            BowlingConfig::Direct { velocity_kmh, .. } => *velocity_kmh,
        };
        if raw.is_finite() {
            raw.clamp(MIN_DELIVERY_KMH, MAX_DELIVERY_KMH)
        } else {
            DEFAULT_DELIVERY_KMH
        }
    }

    /// Same configuration with a different speed
    pub fn with_velocity(self, kmh: f32) -> Self {
        match self {
            BowlingConfig::PitchAnalysis {
                ball_axis_x,
                ball_axis_y,
                length_axis_x,
                length_axis_z,
                line_axis_x,
                line_axis_z,
                ..
            } => BowlingConfig::PitchAnalysis {
                velocity_kmh: kmh,
                ball_axis_x,
                ball_axis_y,
                length_axis_x,
                length_axis_z,
                line_axis_x,
                line_axis_z,
            },
            BowlingConfig::Direct {
                release,
                bounce,
                target,
                ..
            } => BowlingConfig::Direct {
                velocity_kmh: kmh,
                release,
                bounce,
                target,
            },
        }
    }
}

/// A point on the delivery path with the velocity leaving it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Where the delivery arrives at the batting end
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetPoint {
    pub position: Vec3,
}

/// Timing data for display and playback
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrajectoryMetadata {
    /// Release to target (seconds)
    pub total_time: f32,
    /// Release to bounce (seconds)
    pub bounce_time: f32,
    /// Release speed (m/s)
    pub speed_m_s: f32,
}

/// A computed delivery
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Trajectory {
    pub release: Waypoint,
    pub bounce: Waypoint,
    pub target: TargetPoint,
    pub metadata: TrajectoryMetadata,
}

impl Trajectory {
    /// Position and velocity `t` seconds after release
    ///
    /// Times past the target continue along the post-bounce segment.
    pub fn sample(&self, t: f32) -> (Vec3, Vec3) {
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        let (origin, time) = if t < self.metadata.bounce_time {
            (self.release, t)
        } else {
            (self.bounce, t - self.metadata.bounce_time)
        };
        let gravity = Vec3::new(0.0, GRAVITY, 0.0);
        let position = origin.position + origin.velocity * time + 0.5 * gravity * time * time;
        let velocity = origin.velocity + gravity * time;
        (position, velocity)
    }
}

/// Compute the three-waypoint trajectory for a bowling configuration
///
/// Total: every input produces a trajectory. Out-of-range values are clamped.
pub fn compute_trajectory(config: &BowlingConfig) -> Trajectory {
    let (release, bounce, target) = waypoints(config);
    let speed = config.velocity_kmh() / 3.6;

    let (release_velocity, bounce_time) = segment_velocity(release, bounce, speed);
    let (bounce_velocity, rebound_time) =
        segment_velocity(bounce, target, speed * POST_BOUNCE_SLOWDOWN);

    Trajectory {
        release: Waypoint {
            position: release,
            velocity: release_velocity,
        },
        bounce: Waypoint {
            position: bounce,
            velocity: bounce_velocity,
        },
        target: TargetPoint { position: target },
        metadata: TrajectoryMetadata {
            total_time: bounce_time + rebound_time,
            bounce_time,
            speed_m_s: speed,
        },
    }
}

fn waypoints(config: &BowlingConfig) -> (Vec3, Vec3, Vec3) {
    match *config {
        BowlingConfig::PitchAnalysis {
            ball_axis_x,
            ball_axis_y,
            length_axis_x,
            length_axis_z,
            line_axis_x,
            ..
        } => {
            let release = Vec3::new(lateral(line_axis_x), RELEASE_HEIGHT, RELEASE_Z);

            // Bounce must land strictly between the creases
            let bounce_z = (BATTING_CREASE_Z + axis(length_axis_z) * PITCH_SCALE)
                .clamp(BATTING_CREASE_Z + 0.5, RELEASE_Z - 0.5);
            let bounce = Vec3::new(lateral(length_axis_x), GROUND_LEVEL, bounce_z);

            let target = Vec3::new(
                lateral(ball_axis_x),
                (axis(ball_axis_y) * HEIGHT_SCALE).max(GROUND_LEVEL),
                BATTING_CREASE_Z,
            );
            (release, bounce, target)
        }
        BowlingConfig::Direct {
            release,
            bounce,
            target,
            ..
        } => (
            finite_or_zero(release),
            finite_or_zero(bounce),
            finite_or_zero(target),
        ),
    }
}

/// Clamp a pitch-analysis value into the grid
fn axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        PITCH_AXIS_CENTRE
    }
}

fn lateral(value: f32) -> f32 {
    (axis(value) - PITCH_AXIS_CENTRE) * PITCH_SCALE
}

/// Velocity that carries a ball from `from` to `to` at a planar `speed`
///
/// Returns the velocity and the segment time. Coincident points on the ground
/// plane produce a zero velocity and zero time.
fn segment_velocity(from: Vec3, to: Vec3, speed: f32) -> (Vec3, f32) {
    let planar = planar_distance(from, to);
    if planar <= f32::EPSILON || speed <= f32::EPSILON {
        return (Vec3::ZERO, 0.0);
    }
    let time = planar / speed;
    let vy = (to.y - from.y - 0.5 * GRAVITY * time * time) / time;
    let velocity = Vec3::new((to.x - from.x) / time, vy, (to.z - from.z) / time);
    (velocity, time)
}
