//! Engine events
//!
//! [`BallEvent`]s come out of the physics integrator each tick. [`Event`]s go
//! into the state machine; they are raised by the input layer, by the host
//! tick, or wrap a ball event.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::shot::ShotSolution;
use super::state::{BallKinematics, ControlUpdate, PlayerRef, ScoreDelta, ShotMeta};
use super::trajectory::Trajectory;

/// A named place the ball can reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// Within playing reach of the striker
    Batsman,
    /// Over the boundary rope
    Boundary { runs: u32 },
}

/// Something that happened to the ball during one integrator step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallEvent {
    Bounced {
        position: Vec3,
        velocity: Vec3,
        bounce_count: u32,
    },
    ReachedTarget { target: Target, distance: f32 },
    Stopped { position: Vec3 },
}

/// Why an operator reset the ball
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetReason {
    /// Player pressed reset
    Requested,
    /// The host gave up waiting on a stuck ball
    Timeout,
    Other(String),
}

/// Input to [`super::apply`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    StartBowling,
    BallBowled { trajectory: Trajectory },
    BallReachedBatsman,
    BallHit { solution: ShotSolution, meta: ShotMeta },
    BallFielded { position: Vec3, fielder: usize },
    BallCaught { fielder: usize },
    BallThrown { velocity: Vec3 },
    BallWithKeeper,
    Bowled,
    Boundary { runs: u32 },
    RunCompleted,
    EndCelebration,
    UpdateScore { delta: ScoreDelta },
    UpdatePlayerPosition { player: PlayerRef, position: Vec3 },
    UpdateControls(ControlUpdate),
    ManualReset { reason: ResetReason },
    /// Integrated kinematics for the live ball
    BallAdvanced { ball: BallKinematics },
    /// Wall-clock progress for timed transitions
    ClockAdvanced { dt: f32 },
    Physics(BallEvent),
}
