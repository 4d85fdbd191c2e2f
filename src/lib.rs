//! Crease - delivery physics and game-phase engine for a cricket simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (trajectories, shot solving, ball physics, game state)
//! - `settings`: Match rules and default controls loaded from JSON
//!
//! The engine never renders anything. A host loop owns one [`sim::GameState`],
//! feeds it player actions and calls [`sim::tick`] once per frame.

pub mod settings;
pub mod sim;

pub use settings::{MatchRules, Settings, SettingsError};
pub use sim::{
    Action, BallEvent, BowlingConfig, Event, GamePhase, GameState, ShotSolution, Trajectory,
    apply, compute_trajectory, handle_action, new_game, solve_shot, tick,
};

use glam::{Vec2, Vec3};

/// Engine configuration constants
///
/// Field coordinates are metres. X runs across the pitch, Y is up and Z runs
/// along the pitch from the batting end (negative) to the bowling end (positive).
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (60 Hz reference rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Real gravity, used for deliveries and throws (m/s²)
    pub const GRAVITY: f32 = -9.81;
    /// Weaker gravity for struck balls, coupled to the shot solver
    pub const STRUCK_GRAVITY: f32 = -4.5;
    /// Air drag retained per reference tick
    pub const AIR_DRAG: f32 = 0.99;
    /// Height of the ball centre when resting on the ground
    pub const GROUND_LEVEL: f32 = 0.05;
    /// Vertical speed retained by a bounce
    pub const BOUNCE_DAMPING: f32 = 0.7;
    /// Horizontal speed retained by a bounce
    pub const BOUNCE_FRICTION: f32 = 0.9;
    /// Rebounds slower than this settle into rolling (m/s)
    pub const SETTLE_SPEED: f32 = 1.0;
    /// Balls slower than this are at rest (m/s)
    pub const STOP_SPEED: f32 = 0.1;

    /// Pitch-analysis units to metres
    pub const PITCH_SCALE: f32 = 0.22;
    /// Pitch-analysis axis centre
    pub const PITCH_AXIS_CENTRE: f32 = 50.0;
    /// Pitch-analysis height units to metres
    pub const HEIGHT_SCALE: f32 = 0.05;
    pub const RELEASE_HEIGHT: f32 = 2.0;
    /// Bowling crease (release line)
    pub const RELEASE_Z: f32 = 11.0;
    /// Batting crease - every pitch-analysis delivery ends here
    pub const BATTING_CREASE_Z: f32 = -9.0;
    /// Horizontal speed retained after the ball pitches
    pub const POST_BOUNCE_SLOWDOWN: f32 = 0.7;
    pub const DEFAULT_DELIVERY_KMH: f32 = 120.0;
    pub const MIN_DELIVERY_KMH: f32 = 10.0;
    pub const MAX_DELIVERY_KMH: f32 = 180.0;

    /// Striker's fixed position; origin of all shot geometry
    pub const STRIKER_ANCHOR: Vec3 = Vec3::new(0.0, 0.0, BATTING_CREASE_Z);
    /// Height at which the bat meets the ball
    pub const BAT_CONTACT_HEIGHT: f32 = 0.8;
    /// Planar distance at which the striker can play the ball
    pub const BATSMAN_REACH: f32 = 4.0;

    /// Stumps at the batting end
    pub const STUMPS_Z: f32 = -10.0;
    pub const STUMPS_HALF_WIDTH: f32 = 0.115;
    pub const STUMPS_HEIGHT: f32 = 0.71;
    pub const BALL_RADIUS: f32 = 0.036;

    /// Wicket-keeper stands behind the stumps
    pub const KEEPER_POSITION: Vec3 = Vec3::new(0.0, 0.0, -12.0);
    /// Height of the keeper's gloves for returned throws
    pub const KEEPER_GLOVE_HEIGHT: f32 = 1.0;
    pub const BOWLER_POSITION: Vec3 = Vec3::new(0.5, 0.0, 14.0);
    pub const NON_STRIKER_POSITION: Vec3 = Vec3::new(1.2, 0.0, 11.0);
    pub const BOWLING_UMPIRE_POSITION: Vec3 = Vec3::new(-1.0, 0.0, 12.5);
    pub const SQUARE_LEG_UMPIRE_POSITION: Vec3 = Vec3::new(-16.0, 0.0, -9.0);

    /// Single authoritative boundary, measured from the field centre
    pub const BOUNDARY_RADIUS: f32 = 25.0;
    /// Boundary crossings above this height score six
    pub const SIX_HEIGHT: f32 = 1.0;
    pub const FOUR_RUNS: u32 = 4;
    pub const SIX_RUNS: u32 = 6;

    /// Shot solver: fraction of speed lost to air and ground friction
    pub const FRICTION_LOSS: f32 = 0.3;
    /// Shot solver: fraction of speed lost to bounces
    pub const BOUNCE_LOSS: f32 = 0.4;
    /// Shot solver: empirical time-to-stop scale, `t = sqrt(d / k)`
    pub const STOP_TIME_SCALE: f32 = 5.0;
    /// Shot solver: extra launch height per metre of requested distance
    pub const LOFT_PER_METRE: f32 = 0.1;
    pub const MIN_SHOT_DISTANCE: f32 = 0.1;
    pub const MAX_ELEVATION: f32 = 10.0;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Distance between two points on the ground plane (X, Z)
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Ground-plane unit direction for a shot angle (0° faces +X, 90° faces -Z)
#[inline]
pub fn shot_direction(angle_degrees: f32) -> Vec3 {
    let theta = angle_degrees.to_radians();
    Vec3::new(theta.cos(), 0.0, -theta.sin())
}

/// Replace non-finite components with zero
#[inline]
pub fn finite_or_zero(v: Vec3) -> Vec3 {
    Vec3::new(
        if v.x.is_finite() { v.x } else { 0.0 },
        if v.y.is_finite() { v.y } else { 0.0 },
        if v.z.is_finite() { v.z } else { 0.0 },
    )
}
