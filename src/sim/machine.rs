//! Game phase state machine
//!
//! [`apply`] is the only way game state changes. It is total: an event that is
//! not legal in the current phase returns an unchanged copy. It never logs;
//! callers decide what is worth reporting.

use glam::Vec3;

use super::events::{BallEvent, Event, Target};
use super::shot::ShotSolution;
use super::state::{
    BallKinematics, BallPhase, ControlUpdate, DeliveryOutcome, GamePhase, GameState, PlayerState,
    ScoreDelta, ShotMeta,
};
use super::trajectory::Trajectory;
use crate::consts::*;
use crate::{finite_or_zero, planar_distance};

/// An integrated first bounce this close to the bounce waypoint is pitched on it
const BOUNCE_SNAP_DISTANCE: f32 = 1.0;
/// Waypoints higher than this above the ground are never snapped to
const BOUNCE_SNAP_HEIGHT: f32 = 0.1;

/// Apply one event, returning the next state
pub fn apply(state: &GameState, event: &Event) -> GameState {
    let mut next = state.clone();
    match event {
        Event::StartBowling => start_bowling(&mut next),
        Event::BallBowled { trajectory } => ball_bowled(&mut next, trajectory),
        Event::BallReachedBatsman => reached_batsman(&mut next),
        Event::BallHit { solution, meta } => ball_hit(&mut next, solution, meta),
        Event::BallFielded { position, fielder } => ball_fielded(&mut next, *position, *fielder),
        Event::BallCaught { fielder } => ball_caught(&mut next, *fielder),
        Event::BallThrown { velocity } => ball_thrown(&mut next, *velocity),
        Event::BallWithKeeper => ball_with_keeper(&mut next),
        Event::Bowled => bowled(&mut next),
        Event::Boundary { runs } => boundary(&mut next, *runs),
        Event::RunCompleted => run_completed(&mut next),
        Event::EndCelebration => {
            if next.phase == GamePhase::Celebration {
                return_to_keeper(&mut next);
            }
        }
        Event::UpdateScore { delta } => {
            next.score = next.score.merge(delta, next.rules.balls_per_over);
        }
        Event::UpdatePlayerPosition { player, position } => {
            if let Some(p) = next.entities.get_mut(*player) {
                if position.is_finite() {
                    p.position = *position;
                }
            }
        }
        Event::UpdateControls(update) => match update {
            ControlUpdate::Bowling(config) => next.controls.bowling = *config,
            ControlUpdate::Shot(shot) => next.controls.shot = *shot,
        },
        Event::ManualReset { .. } => {
            return_to_keeper(&mut next);
            next.last_outcome = Some(DeliveryOutcome::Reset);
        }
        Event::BallAdvanced { ball } => {
            if next.ball_phase.is_integrated() {
                next.ball = *ball;
                if next.ball_phase.is_delivery() && past_batsman(ball.position) {
                    next.can_bat = false;
                }
            }
        }
        Event::ClockAdvanced { dt } => {
            if dt.is_finite() && *dt > 0.0 {
                next.phase_clock += dt;
                if next.entities.batters_running() {
                    next.run_clock += dt;
                }
            }
        }
        Event::Physics(ball_event) => physics(&mut next, ball_event),
    }

    if next.phase != state.phase || next.ball_phase != state.ball_phase {
        next.phase_clock = 0.0;
    }
    next
}

fn start_bowling(s: &mut GameState) {
    if s.phase != GamePhase::WaitingForBall {
        return;
    }
    s.phase = GamePhase::Bowling;
    s.ball_phase = BallPhase::Bowling;
    s.can_bat = false;
    s.entities.bowler.state = PlayerState::Bowling;
    s.entities.striker.state = PlayerState::Ready;
}

fn ball_bowled(s: &mut GameState, trajectory: &Trajectory) {
    if s.phase != GamePhase::Bowling {
        return;
    }
    s.phase = GamePhase::BallInPlay;
    s.ball_phase = BallPhase::Bowling;
    s.ball = BallKinematics::launched(trajectory.release.position, trajectory.release.velocity);
    s.delivery = Some(*trajectory);
    s.can_bat = false;
    s.run_clock = 0.0;
    s.runs_this_ball = 0;
}

/// Behind the stumps, or carried out of reach beyond the striker
fn past_batsman(position: Vec3) -> bool {
    position.z <= STUMPS_Z
        || (position.z < STRIKER_ANCHOR.z
            && planar_distance(position, STRIKER_ANCHOR) >= BATSMAN_REACH)
}

fn reached_batsman(s: &mut GameState) {
    if s.phase == GamePhase::BallInPlay
        && s.ball_phase.is_delivery()
        && !s.can_bat
        && !past_batsman(s.ball.position)
    {
        s.can_bat = true;
    }
}

fn ball_hit(s: &mut GameState, solution: &ShotSolution, meta: &ShotMeta) {
    if s.phase != GamePhase::BallInPlay
        || !s.can_bat
        || !s.ball_phase.is_delivery()
        || past_batsman(s.ball.position)
    {
        return;
    }
    let contact = STRIKER_ANCHOR + Vec3::Y * BAT_CONTACT_HEIGHT;
    s.ball_phase = BallPhase::Hit;
    s.can_bat = false;
    s.ball = BallKinematics::launched(contact, finite_or_zero(solution.initial_velocity));
    s.delivery = None;
    s.last_shot = Some(*solution);
    s.shot_meta = Some(*meta);
    if meta.is_runnable {
        s.entities.striker.state = PlayerState::Running;
        s.entities.non_striker.state = PlayerState::Running;
        s.run_clock = 0.0;
    }
}

fn ball_fielded(s: &mut GameState, position: Vec3, fielder: usize) {
    if s.ball_phase != BallPhase::Hit || fielder >= s.entities.fielders.len() {
        return;
    }
    let position = finite_or_zero(position);
    s.phase = GamePhase::Fielding;
    s.ball_phase = BallPhase::WithFielder;
    s.ball = BallKinematics::held_at(Vec3::new(position.x, GROUND_LEVEL, position.z));
    let player = &mut s.entities.fielders[fielder];
    player.position = Vec3::new(position.x, 0.0, position.z);
    player.state = PlayerState::Fielding;
}

fn ball_caught(s: &mut GameState, fielder: usize) {
    if s.ball_phase != BallPhase::Hit || fielder >= s.entities.fielders.len() {
        return;
    }
    s.score = s.score.merge(
        &ScoreDelta {
            wickets: 1,
            balls: 1,
            ..ScoreDelta::default()
        },
        s.rules.balls_per_over,
    );
    s.phase = GamePhase::Celebration;
    s.ball_phase = BallPhase::Caught;
    s.ball = BallKinematics::held_at(s.ball.position);
    s.can_bat = false;
    s.delivery = None;
    s.shot_meta = None;
    s.runs_this_ball = 0;
    s.entities.striker.state = PlayerState::Idle;
    s.entities.non_striker.state = PlayerState::Idle;
    s.entities.fielders[fielder].state = PlayerState::Celebrating;
    s.last_outcome = Some(DeliveryOutcome::Caught { fielder });
}

fn ball_thrown(s: &mut GameState, velocity: Vec3) {
    if s.phase != GamePhase::Fielding {
        return;
    }
    if let Some(i) = s.fielder_with_ball() {
        s.entities.fielders[i].state = PlayerState::Throwing;
    }
    s.phase = GamePhase::ThrowingBack;
    s.ball_phase = BallPhase::Returning;
    s.ball = BallKinematics::launched(s.ball.position, finite_or_zero(velocity));
}

fn ball_with_keeper(s: &mut GameState) {
    if !s.phase.is_active() {
        return;
    }
    let outcome = match s.runs_this_ball {
        0 => DeliveryOutcome::DotBall,
        n => DeliveryOutcome::Runs(n),
    };
    s.score = s.score.merge(
        &ScoreDelta {
            runs: s.runs_this_ball,
            balls: 1,
            ..ScoreDelta::default()
        },
        s.rules.balls_per_over,
    );
    return_to_keeper(s);
    s.last_outcome = Some(outcome);
}

fn bowled(s: &mut GameState) {
    if s.phase != GamePhase::BallInPlay || !s.ball_phase.is_delivery() {
        return;
    }
    s.score = s.score.merge(
        &ScoreDelta {
            wickets: 1,
            balls: 1,
            ..ScoreDelta::default()
        },
        s.rules.balls_per_over,
    );
    s.phase = GamePhase::Celebration;
    s.ball_phase = BallPhase::WithKeeper;
    s.ball = BallKinematics::with_keeper();
    s.can_bat = false;
    s.delivery = None;
    s.entities.striker.state = PlayerState::Idle;
    s.entities.bowler.state = PlayerState::Celebrating;
    s.entities.keeper.state = PlayerState::Celebrating;
    s.last_outcome = Some(DeliveryOutcome::Bowled);
}

fn boundary(s: &mut GameState, runs: u32) {
    if s.ball_phase != BallPhase::Hit {
        return;
    }
    // Boundary allowance replaces runs already run, unless more were run
    s.score = s.score.merge(
        &ScoreDelta {
            runs: runs.max(s.runs_this_ball),
            balls: 1,
            ..ScoreDelta::default()
        },
        s.rules.balls_per_over,
    );
    return_to_keeper(s);
    s.last_outcome = Some(DeliveryOutcome::Boundary(runs));
}

fn run_completed(s: &mut GameState) {
    let running_phase = matches!(
        s.phase,
        GamePhase::BallInPlay | GamePhase::Fielding | GamePhase::ThrowingBack
    );
    if !running_phase || !s.entities.batters_running() {
        return;
    }
    // Banked on the ball: counted when it is dead, lost if it is caught
    s.runs_this_ball += 1;
    s.run_clock = (s.run_clock - s.rules.run_seconds).max(0.0);
}

fn physics(s: &mut GameState, event: &BallEvent) {
    match *event {
        BallEvent::Bounced {
            position,
            velocity,
            bounce_count,
        } => {
            // First bounce of a delivery pitches on the bounce waypoint when it
            // landed there; otherwise the integrated contact stands
            if s.phase == GamePhase::BallInPlay && s.ball_phase == BallPhase::Bowling {
                let (position, velocity) = match &s.delivery {
                    Some(d)
                        if d.bounce.position.y <= GROUND_LEVEL + BOUNCE_SNAP_HEIGHT
                            && planar_distance(position, d.bounce.position)
                                <= BOUNCE_SNAP_DISTANCE =>
                    {
                        (d.bounce.position, d.bounce.velocity)
                    }
                    _ => (position, velocity),
                };
                s.ball = BallKinematics {
                    position,
                    velocity,
                    is_moving: true,
                    bounce_count,
                };
                s.ball_phase = BallPhase::Bouncing;
            }
        }
        BallEvent::ReachedTarget {
            target: Target::Batsman,
            ..
        } => reached_batsman(s),
        BallEvent::ReachedTarget {
            target: Target::Boundary { runs },
            ..
        } => boundary(s, runs),
        BallEvent::Stopped { .. } => {
            if s.ball_phase.is_delivery() || s.ball_phase == BallPhase::Returning {
                ball_with_keeper(s);
            }
        }
    }
}

/// Dead ball: everyone back to their marks, keeper holding the ball
fn return_to_keeper(s: &mut GameState) {
    s.phase = GamePhase::WaitingForBall;
    s.ball_phase = BallPhase::WithKeeper;
    s.can_bat = false;
    s.ball = BallKinematics::with_keeper();
    s.delivery = None;
    s.shot_meta = None;
    s.run_clock = 0.0;
    s.runs_this_ball = 0;
    s.entities.restore();
}
