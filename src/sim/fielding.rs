//! Fielder proximity and throws

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::Player;
use crate::consts::*;
use crate::planar_distance;

/// Shortest flight time for a throw (s)
pub const MIN_THROW_TIME: f32 = 0.35;

/// Closest fielder to the ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nearest {
    pub fielder_index: usize,
    /// Planar distance to the ball (m)
    pub distance: f32,
}

/// Nearest fielder on the ground plane; ties go to the lowest index
pub fn nearest(ball_position: Vec3, fielders: &[Player]) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;
    for (fielder_index, fielder) in fielders.iter().enumerate() {
        let distance = planar_distance(ball_position, fielder.position);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Nearest {
                fielder_index,
                distance,
            });
        }
    }
    best
}

/// Launch velocity carrying a throw from `from` to `to`
///
/// Flight time is the planar distance over `speed`, never shorter than
/// [`MIN_THROW_TIME`]; the vertical component lands the ball at `to.y`.
pub fn throw_velocity(from: Vec3, to: Vec3, speed: f32, gravity: f32) -> Vec3 {
    let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
    let t = (planar_distance(from, to) / speed).max(MIN_THROW_TIME);
    let delta = to - from;
    Vec3::new(
        delta.x / t,
        (delta.y - 0.5 * gravity * t * t) / t,
        delta.z / t,
    )
}

/// Where throws to the keeper are aimed
pub fn keeper_gloves() -> Vec3 {
    KEEPER_POSITION + Vec3::Y * KEEPER_GLOVE_HEIGHT
}

/// Nine-fielder ring inside the boundary
pub fn default_field() -> Vec<Vec3> {
    vec![
        Vec3::new(3.0, 0.0, -14.0),   // slip
        Vec3::new(14.0, 0.0, -10.0),  // point
        Vec3::new(10.0, 0.0, 2.0),    // cover
        Vec3::new(-10.0, 0.0, 2.0),   // midwicket
        Vec3::new(5.0, 0.0, 18.0),    // mid-off
        Vec3::new(-5.0, 0.0, 18.0),   // mid-on
        Vec3::new(20.0, 0.0, -2.0),   // deep point
        Vec3::new(-20.0, 0.0, -2.0),  // deep square
        Vec3::new(-12.0, 0.0, -18.0), // fine leg
    ]
}
