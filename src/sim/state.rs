//! Game state and core simulation types
//!
//! Everything the state machine reads or writes lives here. All of it is plain
//! serializable data; the only way to change a [`GameState`] is
//! [`super::apply`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::shot::{ShotRequest, ShotSolution};
use super::trajectory::{BowlingConfig, Trajectory};
use crate::consts::*;
use crate::normalize_degrees;
use crate::settings::{MatchRules, Settings};

/// Defensive shots never travel further than this (m)
pub const DEFENSIVE_MAX_DISTANCE: f32 = 3.0;
/// Extra vertical launch speed for lofted shots (m/s)
pub const LOFT_ELEVATION: f32 = 4.0;

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball dead, ready for the next delivery
    WaitingForBall,
    /// Bowler in the delivery stride
    Bowling,
    /// Delivery or struck ball in flight
    BallInPlay,
    /// A fielder holds the ball
    Fielding,
    /// Ball on its way back to the keeper
    ThrowingBack,
    /// Wicket celebration overlay
    Celebration,
}

impl GamePhase {
    /// Phases in which a delivery is live and can still be completed
    pub fn is_active(self) -> bool {
        matches!(
            self,
            GamePhase::Bowling | GamePhase::BallInPlay | GamePhase::Fielding | GamePhase::ThrowingBack
        )
    }
}

/// Where the ball is, independent of the game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallPhase {
    WithBowler,
    /// Delivered, not yet pitched
    Bowling,
    /// Delivered and pitched
    Bouncing,
    /// Struck by the batsman
    Hit,
    Caught,
    WithFielder,
    /// Thrown back to the keeper
    Returning,
    WithKeeper,
}

impl BallPhase {
    /// A bowled ball that has not been struck
    pub fn is_delivery(self) -> bool {
        matches!(self, BallPhase::Bowling | BallPhase::Bouncing)
    }

    /// Sub-states the physics integrator moves
    pub fn is_integrated(self) -> bool {
        matches!(
            self,
            BallPhase::Bowling | BallPhase::Bouncing | BallPhase::Hit | BallPhase::Returning
        )
    }
}

/// Ball position and motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallKinematics {
    pub position: Vec3,
    pub velocity: Vec3,
    pub is_moving: bool,
    /// Bounces since the ball was last released, bowled or struck
    pub bounce_count: u32,
}

impl BallKinematics {
    /// A moving ball
    pub fn launched(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            is_moving: true,
            bounce_count: 0,
        }
    }

    /// A ball held (or resting) at `position`
    pub fn held_at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            is_moving: false,
            bounce_count: 0,
        }
    }

    /// Resting in the keeper's gloves
    pub fn with_keeper() -> Self {
        Self::held_at(KEEPER_POSITION + Vec3::Y * KEEPER_GLOVE_HEIGHT)
    }
}

/// Match score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub runs: u32,
    pub wickets: u32,
    /// Completed overs
    pub overs: u32,
    /// Balls bowled in the current over
    pub balls: u32,
}

/// Additive change to a [`Score`]
///
/// Unsigned fields make a lowering delta unrepresentable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub runs: u32,
    pub wickets: u32,
    pub balls: u32,
}

impl ScoreDelta {
    pub fn runs(runs: u32) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// One legal ball bowled
    pub fn ball() -> Self {
        Self {
            balls: 1,
            ..Self::default()
        }
    }
}

impl Score {
    /// Merge a delta, rolling balls over into overs
    pub fn merge(&self, delta: &ScoreDelta, balls_per_over: u32) -> Self {
        let per_over = balls_per_over.max(1);
        let total_balls = self
            .total_balls(per_over)
            .saturating_add(delta.balls);
        Self {
            runs: self.runs.saturating_add(delta.runs),
            wickets: self.wickets.saturating_add(delta.wickets),
            overs: total_balls / per_over,
            balls: total_balls % per_over,
        }
    }

    /// Balls bowled in the whole innings
    pub fn total_balls(&self, balls_per_over: u32) -> u32 {
        self.overs
            .saturating_mul(balls_per_over.max(1))
            .saturating_add(self.balls)
    }
}

/// What a player is doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Ready,
    Running,
    Bowling,
    Fielding,
    Throwing,
    Celebrating,
}

/// A player (or umpire) on the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec3,
    /// Where the player stands between deliveries
    pub home: Vec3,
    pub state: PlayerState,
}

impl Player {
    pub fn at(home: Vec3, state: PlayerState) -> Self {
        Self {
            position: home,
            home,
            state,
        }
    }

    fn restore(&mut self, state: PlayerState) {
        self.position = self.home;
        self.state = state;
    }
}

/// Addresses one entity on the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRef {
    Striker,
    NonStriker,
    Bowler,
    Keeper,
    Umpire(usize),
    Fielder(usize),
}

/// Everyone on the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    pub striker: Player,
    pub non_striker: Player,
    pub bowler: Player,
    pub keeper: Player,
    pub umpires: [Player; 2],
    pub fielders: Vec<Player>,
}

impl Entities {
    /// Standard positions with fielders at `field`
    pub fn new(field: &[Vec3]) -> Self {
        Self {
            striker: Player::at(STRIKER_ANCHOR, PlayerState::Ready),
            non_striker: Player::at(NON_STRIKER_POSITION, PlayerState::Ready),
            bowler: Player::at(BOWLER_POSITION, PlayerState::Idle),
            keeper: Player::at(KEEPER_POSITION, PlayerState::Ready),
            umpires: [
                Player::at(BOWLING_UMPIRE_POSITION, PlayerState::Idle),
                Player::at(SQUARE_LEG_UMPIRE_POSITION, PlayerState::Idle),
            ],
            fielders: field
                .iter()
                .map(|&home| Player::at(home, PlayerState::Idle))
                .collect(),
        }
    }

    pub fn get(&self, player: PlayerRef) -> Option<&Player> {
        match player {
            PlayerRef::Striker => Some(&self.striker),
            PlayerRef::NonStriker => Some(&self.non_striker),
            PlayerRef::Bowler => Some(&self.bowler),
            PlayerRef::Keeper => Some(&self.keeper),
            PlayerRef::Umpire(i) => self.umpires.get(i),
            PlayerRef::Fielder(i) => self.fielders.get(i),
        }
    }

    pub fn get_mut(&mut self, player: PlayerRef) -> Option<&mut Player> {
        match player {
            PlayerRef::Striker => Some(&mut self.striker),
            PlayerRef::NonStriker => Some(&mut self.non_striker),
            PlayerRef::Bowler => Some(&mut self.bowler),
            PlayerRef::Keeper => Some(&mut self.keeper),
            PlayerRef::Umpire(i) => self.umpires.get_mut(i),
            PlayerRef::Fielder(i) => self.fielders.get_mut(i),
        }
    }

    /// Everyone back to their marks, ready for the next ball
    pub fn restore(&mut self) {
        self.striker.restore(PlayerState::Ready);
        self.non_striker.restore(PlayerState::Ready);
        self.bowler.restore(PlayerState::Idle);
        self.keeper.restore(PlayerState::Ready);
        for umpire in &mut self.umpires {
            umpire.restore(PlayerState::Idle);
        }
        for fielder in &mut self.fielders {
            fielder.restore(PlayerState::Idle);
        }
    }

    /// Batters running between the wickets
    pub fn batters_running(&self) -> bool {
        self.striker.state == PlayerState::Running
    }
}

/// Kind of stroke the batsman plays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotType {
    /// Blocked into the ground; no run
    Defensive,
    #[default]
    Drive,
    /// In the air; can be caught
    Loft,
}

impl ShotType {
    pub fn meta(self) -> ShotMeta {
        ShotMeta {
            shot_type: self,
            lofted: self == ShotType::Loft,
            is_runnable: self != ShotType::Defensive,
        }
    }

    /// Cycle Defensive -> Drive -> Loft -> Defensive
    pub fn next(self) -> Self {
        match self {
            ShotType::Defensive => ShotType::Drive,
            ShotType::Drive => ShotType::Loft,
            ShotType::Loft => ShotType::Defensive,
        }
    }
}

/// Shot details that travel with a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotMeta {
    pub shot_type: ShotType,
    pub lofted: bool,
    pub is_runnable: bool,
}

/// Player-adjustable shot settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotControls {
    pub angle_degrees: f32,
    pub distance_m: f32,
    pub elevation: f32,
    pub shot_type: ShotType,
}

impl Default for ShotControls {
    fn default() -> Self {
        Self {
            angle_degrees: 45.0,
            distance_m: 20.0,
            elevation: 0.5,
            shot_type: ShotType::Drive,
        }
    }
}

impl ShotControls {
    /// Turn the aim, keeping it in [0, 360)
    pub fn rotated(&self, delta_degrees: f32) -> Self {
        let delta = if delta_degrees.is_finite() { delta_degrees } else { 0.0 };
        Self {
            angle_degrees: normalize_degrees(self.angle_degrees + delta),
            ..*self
        }
    }

    /// Solver request for a shot of `shot_type` along `angle_degrees`
    pub fn request(&self, angle_degrees: f32, shot_type: ShotType) -> ShotRequest {
        let (distance, elevation) = match shot_type {
            ShotType::Defensive => (self.distance_m.min(DEFENSIVE_MAX_DISTANCE), 0.0),
            ShotType::Drive => (self.distance_m, self.elevation),
            ShotType::Loft => (self.distance_m, self.elevation + LOFT_ELEVATION),
        };
        ShotRequest {
            angle_degrees,
            target_distance_m: distance,
            elevation,
            lofted: shot_type == ShotType::Loft,
        }
        .clamped()
    }
}

/// Current player controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    pub bowling: BowlingConfig,
    pub shot: ShotControls,
}

/// Whole-value replacement of one control group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlUpdate {
    Bowling(BowlingConfig),
    Shot(ShotControls),
}

/// How the previous delivery ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    DotBall,
    Runs(u32),
    Boundary(u32),
    Caught { fielder: usize },
    Bowled,
    /// Abandoned by a manual reset
    Reset,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub ball_phase: BallPhase,
    pub score: Score,
    pub entities: Entities,
    pub ball: BallKinematics,
    pub controls: Controls,
    /// The striker may play the ball
    pub can_bat: bool,
    /// Live delivery, used to pitch the ball on its bounce waypoint
    pub delivery: Option<Trajectory>,
    /// Most recent shot solution, for inspection
    pub last_shot: Option<ShotSolution>,
    /// Shot type of the ball in play, cleared when the ball is dead
    pub shot_meta: Option<ShotMeta>,
    /// Seconds since the phase or ball sub-state last changed
    pub phase_clock: f32,
    /// Seconds into the current run
    pub run_clock: f32,
    /// Runs completed off the current delivery, added to the score when the ball is dead
    pub runs_this_ball: u32,
    pub last_outcome: Option<DeliveryOutcome>,
    pub rules: MatchRules,
}

impl Default for GameState {
    fn default() -> Self {
        Self::with_settings(&Settings::default())
    }
}

impl GameState {
    /// Fresh match from loaded settings
    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            phase: GamePhase::WaitingForBall,
            ball_phase: BallPhase::WithBowler,
            score: Score::default(),
            entities: Entities::new(&settings.fielders),
            ball: BallKinematics::held_at(BOWLER_POSITION + Vec3::Y * RELEASE_HEIGHT),
            controls: Controls {
                bowling: settings.bowling,
                shot: settings.shot,
            },
            can_bat: false,
            delivery: None,
            last_shot: None,
            shot_meta: None,
            phase_clock: 0.0,
            run_clock: 0.0,
            runs_this_ball: 0,
            last_outcome: None,
            rules: settings.rules,
        }
    }

    /// Index of the fielder holding or throwing the ball
    pub fn fielder_with_ball(&self) -> Option<usize> {
        self.entities
            .fielders
            .iter()
            .position(|f| matches!(f.state, PlayerState::Fielding | PlayerState::Throwing))
    }
}

/// New match with default settings
pub fn new_game() -> GameState {
    GameState::default()
}
