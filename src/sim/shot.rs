//! Reverse-physics shot solving
//!
//! Picks the launch velocity that brings a struck ball to rest at a requested
//! distance from the striker. The speed comes from a lumped energy-loss model
//! rather than a literal flight solution; the struck-ball physics profile
//! decelerates at [`stopping_deceleration`] so the two agree.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{normalize_degrees, shot_direction};

/// A requested shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotRequest {
    /// Direction on the ground plane, 0° = +X
    pub angle_degrees: f32,
    /// Final resting distance from the striker (not the carry)
    pub target_distance_m: f32,
    /// Base vertical launch speed (m/s)
    pub elevation: f32,
    pub lofted: bool,
}

impl ShotRequest {
    /// Copy with every field clamped into its valid range
    pub fn clamped(&self) -> Self {
        let distance = if self.target_distance_m.is_finite() {
            self.target_distance_m.max(MIN_SHOT_DISTANCE)
        } else {
            MIN_SHOT_DISTANCE
        };
        let elevation = if self.elevation.is_finite() {
            self.elevation.clamp(0.0, MAX_ELEVATION)
        } else {
            0.0
        };
        Self {
            angle_degrees: normalize_degrees(self.angle_degrees),
            target_distance_m: distance,
            elevation,
            lofted: self.lofted,
        }
    }
}

/// Solver output, returned to the caller and kept on the game state for inspection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotSolution {
    pub initial_velocity: Vec3,
    /// Where the ball should come to rest (ground level)
    pub predicted_stop_position: Vec3,
    /// Modelled time until the ball stops (seconds)
    pub time_to_target: f32,
    /// Horizontal launch speed (m/s)
    pub required_speed: f32,
    /// The request after clamping
    pub request: ShotRequest,
}

/// Fraction of launch speed the lumped model keeps
#[inline]
pub fn retained_fraction() -> f32 {
    1.0 - (FRICTION_LOSS + BOUNCE_LOSS)
}

/// Horizontal deceleration that stops a solved shot at its target distance
///
/// The solver launches at `v = d / (r * sqrt(d / k))`, so `v² = d * k / r²`.
/// A ball decelerating at `k / (2 r²)` covers exactly `d` before stopping.
#[inline]
pub fn stopping_deceleration() -> f32 {
    let r = retained_fraction();
    STOP_TIME_SCALE / (2.0 * r * r)
}

/// Solve a shot from angle, resting distance and elevation
pub fn solve_shot(angle_degrees: f32, target_distance_m: f32, elevation: f32) -> ShotSolution {
    solve(&ShotRequest {
        angle_degrees,
        target_distance_m,
        elevation,
        lofted: false,
    })
}

/// Solve a full shot request
pub fn solve(request: &ShotRequest) -> ShotSolution {
    let request = request.clamped();
    let distance = request.target_distance_m;
    let direction = shot_direction(request.angle_degrees);

    let mut predicted_stop_position = STRIKER_ANCHOR + direction * distance;
    predicted_stop_position.y = GROUND_LEVEL;

    // Empirical, not a flight time
    let time_to_target = (distance / STOP_TIME_SCALE).sqrt();
    let required_speed = distance / (retained_fraction() * time_to_target);

    let horizontal = direction * required_speed;
    let vertical = request.elevation + distance * LOFT_PER_METRE;

    ShotSolution {
        initial_velocity: Vec3::new(horizontal.x, vertical, horizontal.z),
        predicted_stop_position,
        time_to_target,
        required_speed,
        request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planar_distance;

    #[test]
    fn test_straight_drive_points_east() {
        let solution = solve_shot(0.0, 30.0, 0.5);
        let v = solution.initial_velocity;
        let expected = 30.0 / (0.3 * (30.0f32 / 5.0).sqrt());
        assert!(v.x > 0.0);
        assert!(v.z.abs() < 1e-4);
        assert!((v.x - expected).abs() < 1e-3);
        assert!((v.y - (0.5 + 3.0)).abs() < 1e-5);
        assert!((solution.time_to_target - 6.0f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_stop_position_from_anchor() {
        for angle in [0.0f32, 90.0, 180.0, 270.0, 45.0] {
            let solution = solve_shot(angle, 15.0, 0.0);
            let d = planar_distance(solution.predicted_stop_position, STRIKER_ANCHOR);
            assert!((d - 15.0).abs() < 1e-3, "angle {angle}: {d}");
            assert_eq!(solution.predicted_stop_position.y, GROUND_LEVEL);
        }
        let square = solve_shot(90.0, 10.0, 0.0);
        assert!(square.predicted_stop_position.z < STRIKER_ANCHOR.z);
        assert!(square.initial_velocity.z < 0.0);
    }

    #[test]
    fn test_retained_fraction() {
        assert!((retained_fraction() - 0.3).abs() < 1e-6);
        assert!((stopping_deceleration() - 5.0 / 0.18).abs() < 1e-3);
    }

    #[test]
    fn test_inputs_are_clamped() {
        let solution = solve_shot(-90.0, -5.0, f32::NAN);
        assert_eq!(solution.request.target_distance_m, MIN_SHOT_DISTANCE);
        assert!((solution.request.angle_degrees - 270.0).abs() < 1e-4);
        assert_eq!(solution.request.elevation, 0.0);
        assert!(solution.initial_velocity.is_finite());

        let nan = solve_shot(f32::NAN, f32::INFINITY, 1.0);
        assert_eq!(nan.request.angle_degrees, 0.0);
        assert_eq!(nan.request.target_distance_m, MIN_SHOT_DISTANCE);
    }

    #[test]
    fn test_longer_shots_launch_faster_and_higher() {
        let short = solve_shot(0.0, 5.0, 0.5);
        let long = solve_shot(0.0, 50.0, 0.5);
        assert!(long.required_speed > short.required_speed);
        assert!(long.initial_velocity.y > short.initial_velocity.y);
    }

    #[test]
    fn test_decelerating_at_solver_rate_covers_distance() {
        for d in [5.0f32, 15.0, 30.0, 50.0] {
            let v = solve_shot(0.0, d, 0.0).required_speed;
            let covered = v * v / (2.0 * stopping_deceleration());
            assert!((covered - d).abs() / d < 1e-3);
        }
    }
}
