//! Deterministic simulation module
//!
//! All engine logic lives here. This module must be pure and deterministic:
//! - Game state changes only through `apply`
//! - Fixed timestep at the host, no wall clock inside
//! - No I/O, no rendering, no global state

pub mod events;
pub mod fielding;
pub mod input;
pub mod machine;
pub mod physics;
pub mod shot;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use events::{BallEvent, Event, ResetReason, Target};
pub use fielding::{Nearest, nearest, throw_velocity};
pub use input::{Action, handle_action};
pub use machine::apply;
pub use physics::{PhysicsParams, StepOutcome, step};
pub use shot::{ShotRequest, ShotSolution, solve, solve_shot};
pub use state::{
    BallKinematics, BallPhase, ControlUpdate, Controls, DeliveryOutcome, Entities, GamePhase,
    GameState, Player, PlayerRef, PlayerState, Score, ScoreDelta, ShotControls, ShotMeta,
    ShotType, new_game,
};
pub use tick::tick;
pub use trajectory::{BowlingConfig, Trajectory, compute_trajectory};
