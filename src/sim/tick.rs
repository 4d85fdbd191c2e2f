//! Fixed timestep simulation tick
//!
//! Advances the ball, feeds what happened through the state machine, then
//! settles proximity checks and timed transitions.

use glam::Vec3;

use super::events::{BallEvent, Event};
use super::fielding::nearest;
use super::input::throw_to_keeper;
use super::machine::apply;
use super::physics::{self, MAX_STEP, PhysicsParams};
use super::state::{BallPhase, GamePhase, GameState};
use crate::consts::*;
use crate::planar_distance;

/// Advance the game by `dt` seconds
///
/// Returns the new state and the integrator events for this tick, in the
/// order they were produced.
pub fn tick(state: &GameState, dt: f32) -> (GameState, Vec<BallEvent>) {
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_STEP) } else { 0.0 };
    let mut next = apply(state, &Event::ClockAdvanced { dt });
    let previous = next.ball.position;
    let mut ball_events = Vec::new();

    if next.ball.is_moving && next.ball_phase.is_integrated() {
        let params = match (next.ball_phase, next.last_shot) {
            (BallPhase::Hit, Some(shot)) => Some(PhysicsParams::struck_at(shot.required_speed)),
            (phase, _) => PhysicsParams::for_phase(phase),
        };
        let outcome = match params {
            Some(params) => physics::step_with(&next.ball, next.ball_phase, &params, dt),
            None => physics::step(&next.ball, next.ball_phase, dt),
        };
        next = apply(&next, &Event::BallAdvanced { ball: outcome.ball });
        for event in &outcome.events {
            next = fire(next, Event::Physics(*event));
        }
        ball_events = outcome.events;
    }

    next = resolve_proximity(next, previous);
    next = run_timers(next);

    let per_over = next.rules.balls_per_over;
    if next.score.total_balls(per_over) != state.score.total_balls(per_over) {
        if let Some(outcome) = next.last_outcome {
            log::info!(
                "{:?}: {}/{} after {}.{} overs",
                outcome,
                next.score.runs,
                next.score.wickets,
                next.score.overs,
                next.score.balls
            );
        }
    }

    (next, ball_events)
}

/// Apply an event, noting any phase change
fn fire(state: GameState, event: Event) -> GameState {
    let next = apply(&state, &event);
    if next.phase != state.phase || next.ball_phase != state.ball_phase {
        log::debug!(
            "{:?} / {:?} -> {:?} / {:?}",
            state.phase,
            state.ball_phase,
            next.phase,
            next.ball_phase
        );
    }
    next
}

/// Stumps, keeper and fielder checks against the ball's new position
fn resolve_proximity(state: GameState, previous: Vec3) -> GameState {
    if state.phase != GamePhase::BallInPlay && state.phase != GamePhase::ThrowingBack {
        return state;
    }
    let ball = state.ball;

    if state.ball_phase.is_delivery() {
        if hits_stumps(previous, ball.position) {
            return fire(state, Event::Bowled);
        }
        if ball.position.z <= KEEPER_POSITION.z {
            return fire(state, Event::BallWithKeeper);
        }
        return state;
    }

    match state.ball_phase {
        BallPhase::Returning => {
            if planar_distance(ball.position, KEEPER_POSITION) <= state.rules.keeper_reach {
                return fire(state, Event::BallWithKeeper);
            }
            state
        }
        BallPhase::Hit => resolve_fielding(state),
        _ => state,
    }
}

fn resolve_fielding(state: GameState) -> GameState {
    let ball = state.ball;
    let rules = state.rules;
    let Some(near) = nearest(ball.position, &state.entities.fielders) else {
        // Nobody in the field; the keeper fetches it
        if !ball.is_moving {
            return fire(state, Event::BallWithKeeper);
        }
        return state;
    };
    let fielder = near.fielder_index;
    let lofted = state.shot_meta.is_some_and(|m| m.lofted);

    if ball.is_moving {
        if lofted
            && ball.bounce_count == 0
            && near.distance <= rules.catch_radius
            && ball.position.y <= rules.catch_height
        {
            log::debug!("Caught by fielder {fielder} at {:?}", ball.position);
            return fire(state, Event::BallCaught { fielder });
        }
        if near.distance <= rules.fielding_radius && ball.position.y <= rules.fielding_height {
            log::debug!("Fielded by fielder {fielder} at {:?}", ball.position);
            return fire(
                state,
                Event::BallFielded {
                    position: ball.position,
                    fielder,
                },
            );
        }
        return state;
    }

    log::debug!(
        "Ball stopped {:.1} m from fielder {fielder}",
        near.distance
    );
    fire(
        state,
        Event::BallFielded {
            position: ball.position,
            fielder,
        },
    )
}

/// Whether the ball passed through the stumps between two positions
fn hits_stumps(from: Vec3, to: Vec3) -> bool {
    if !(from.z > STUMPS_Z && to.z <= STUMPS_Z) {
        return false;
    }
    let f = (from.z - STUMPS_Z) / (from.z - to.z);
    let at = from.lerp(to, f);
    at.x.abs() <= STUMPS_HALF_WIDTH + BALL_RADIUS && at.y <= STUMPS_HEIGHT + BALL_RADIUS
}

fn run_timers(mut state: GameState) -> GameState {
    let rules = state.rules;

    if state.entities.batters_running() && state.run_clock >= rules.run_seconds {
        state = fire(state, Event::RunCompleted);
    }

    match state.phase {
        GamePhase::Fielding if rules.auto_throw && state.phase_clock >= rules.field_hold_seconds => {
            if let Some(event) = throw_to_keeper(&state) {
                state = fire(state, event);
            }
        }
        GamePhase::Celebration if state.phase_clock >= rules.celebration_seconds => {
            state = fire(state, Event::EndCelebration);
        }
        GamePhase::Bowling | GamePhase::BallInPlay | GamePhase::ThrowingBack
            if state.phase_clock >= rules.dead_ball_seconds =>
        {
            log::warn!(
                "Dead ball after {:.1}s in {:?}",
                state.phase_clock,
                state.ball_phase
            );
            state = fire(state, Event::BallWithKeeper);
        }
        _ => {}
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::events::Target;
    use crate::sim::input::{Action, handle_action};
    use crate::sim::shot::solve_shot;
    use crate::sim::state::{BallKinematics, DeliveryOutcome, ShotType, new_game};
    use crate::sim::trajectory::BowlingConfig;

    const MAX_TICKS: usize = 60 * 60;

    fn run_until<F: Fn(&GameState) -> bool>(mut state: GameState, done: F) -> GameState {
        for _ in 0..MAX_TICKS {
            if done(&state) {
                return state;
            }
            state = tick(&state, SIM_DT).0;
        }
        panic!("condition not reached; ended in {:?}", state.phase);
    }

    /// A struck ball in flight with custom kinematics
    fn struck(settings: &Settings, shot_type: ShotType, ball: BallKinematics) -> GameState {
        let state = handle_action(&GameState::with_settings(settings), &Action::Bowl);
        let state = apply(&state, &Event::BallReachedBatsman);
        let state = apply(
            &state,
            &Event::BallHit {
                solution: solve_shot(0.0, 10.0, 0.5),
                meta: shot_type.meta(),
            },
        );
        apply(&state, &Event::BallAdvanced { ball })
    }

    #[test]
    fn test_full_delivery_counts_one_ball() {
        let mut state = handle_action(&new_game(), &Action::Bowl);
        let mut swung = false;
        for _ in 0..MAX_TICKS {
            if state.can_bat && !swung {
                state = handle_action(
                    &state,
                    &Action::Swing {
                        angle_degrees: state.controls.shot.angle_degrees,
                        shot_type: ShotType::Drive,
                    },
                );
                assert_eq!(state.ball_phase, BallPhase::Hit);
                swung = true;
            }
            if state.phase == GamePhase::WaitingForBall {
                break;
            }
            state = tick(&state, SIM_DT).0;
        }
        assert!(swung);
        assert_eq!(state.phase, GamePhase::WaitingForBall);
        assert_eq!(state.ball_phase, BallPhase::WithKeeper);
        assert_eq!(state.score.total_balls(6), 1);
        assert_eq!(state.score.wickets, 0);
    }

    #[test]
    fn test_delivery_reaches_batsman_then_keeper() {
        let state = handle_action(&new_game(), &Action::Bowl);
        let state = run_until(state, |s| s.can_bat);
        assert!(state.ball_phase.is_delivery());

        let state = run_until(state, |s| s.phase == GamePhase::WaitingForBall);
        assert_eq!(state.score.total_balls(6), 1);
        assert_eq!(state.last_outcome, Some(DeliveryOutcome::DotBall));
    }

    #[test]
    fn test_first_bounce_reported() {
        let mut state = handle_action(&new_game(), &Action::Bowl);
        let bounce = state.delivery.unwrap().bounce;
        for _ in 0..MAX_TICKS {
            let (next, events) = tick(&state, SIM_DT);
            state = next;
            if events
                .iter()
                .any(|e| matches!(e, BallEvent::Bounced { .. }))
            {
                break;
            }
        }
        assert_eq!(state.ball_phase, BallPhase::Bouncing);
        assert_eq!(state.ball.position, bounce.position);
    }

    #[test]
    fn test_straight_delivery_is_bowled() {
        let settings = Settings {
            bowling: BowlingConfig::Direct {
                velocity_kmh: 120.0,
                release: Vec3::new(0.0, 2.0, 11.0),
                bounce: Vec3::new(0.0, GROUND_LEVEL, -5.0),
                target: Vec3::new(0.0, 0.5, -10.5),
            },
            ..Settings::default()
        };
        let state = handle_action(&GameState::with_settings(&settings), &Action::Bowl);
        let state = run_until(state, |s| s.phase != GamePhase::BallInPlay);
        assert_eq!(state.phase, GamePhase::Celebration);
        assert_eq!(state.last_outcome, Some(DeliveryOutcome::Bowled));
        assert_eq!(state.score.wickets, 1);

        let state = run_until(state, |s| s.phase == GamePhase::WaitingForBall);
        assert_eq!(state.score.total_balls(6), 1);
    }

    #[test]
    fn test_boundary_six() {
        let ball = BallKinematics::launched(Vec3::new(24.9, 3.0, 0.0), Vec3::new(10.0, 0.0, 0.0));
        let state = struck(&Settings::default(), ShotType::Loft, ball);
        let (next, events) = tick(&state, SIM_DT);
        assert!(events.iter().any(|e| matches!(e, BallEvent::ReachedTarget { .. })));
        assert_eq!(next.phase, GamePhase::WaitingForBall);
        assert_eq!(next.score.runs, SIX_RUNS);
        assert_eq!(next.last_outcome, Some(DeliveryOutcome::Boundary(SIX_RUNS)));
    }

    #[test]
    fn test_lofted_ball_caught() {
        let settings = Settings {
            fielders: vec![Vec3::new(10.0, 0.0, -9.0)],
            ..Settings::default()
        };
        let ball = BallKinematics::launched(Vec3::new(9.5, 2.0, -9.0), Vec3::new(5.0, -1.0, 0.0));
        let state = struck(&settings, ShotType::Loft, ball);
        let next = tick(&state, SIM_DT).0;
        assert_eq!(next.phase, GamePhase::Celebration);
        assert_eq!(next.last_outcome, Some(DeliveryOutcome::Caught { fielder: 0 }));

        // A low drive to the same fielder is only fielded
        let low = BallKinematics::launched(Vec3::new(9.5, 0.5, -9.0), Vec3::new(5.0, -1.0, 0.0));
        let grounded = struck(&settings, ShotType::Drive, low);
        let next = tick(&grounded, SIM_DT).0;
        assert_eq!(next.phase, GamePhase::Fielding);
        assert_eq!(next.score.wickets, 0);
    }

    #[test]
    fn test_fielded_ball_thrown_back() {
        let settings = Settings {
            fielders: vec![Vec3::new(10.0, 0.0, -9.0)],
            ..Settings::default()
        };
        let ball = BallKinematics::launched(Vec3::new(9.5, 0.5, -9.0), Vec3::new(5.0, 0.0, 0.0));
        let state = tick(&struck(&settings, ShotType::Drive, ball), SIM_DT).0;
        assert_eq!(state.phase, GamePhase::Fielding);

        let state = run_until(state, |s| s.phase == GamePhase::ThrowingBack);
        let state = run_until(state, |s| s.phase == GamePhase::WaitingForBall);
        assert_eq!(state.score.total_balls(6), 1);
    }

    #[test]
    fn test_no_auto_throw_waits_for_player() {
        let mut settings = Settings {
            fielders: vec![Vec3::new(10.0, 0.0, -9.0)],
            ..Settings::default()
        };
        settings.rules.auto_throw = false;
        let ball = BallKinematics::launched(Vec3::new(9.5, 0.5, -9.0), Vec3::new(5.0, 0.0, 0.0));
        let mut state = tick(&struck(&settings, ShotType::Drive, ball), SIM_DT).0;
        for _ in 0..120 {
            state = tick(&state, SIM_DT).0;
        }
        assert_eq!(state.phase, GamePhase::Fielding);

        let state = handle_action(&state, &Action::ThrowToKeeper);
        let state = run_until(state, |s| s.phase == GamePhase::WaitingForBall);
        assert_eq!(state.score.total_balls(6), 1);
    }

    #[test]
    fn test_stopped_ball_gathered_by_nearest() {
        let settings = Settings {
            fielders: vec![Vec3::new(-20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 0.0)],
            ..Settings::default()
        };
        let ball = BallKinematics::launched(Vec3::new(5.0, GROUND_LEVEL, -9.0), Vec3::ZERO);
        let next = tick(&struck(&settings, ShotType::Drive, ball), SIM_DT).0;
        assert_eq!(next.phase, GamePhase::Fielding);
        assert_eq!(next.entities.fielders[1].position, Vec3::new(5.0, 0.0, -9.0));
    }

    #[test]
    fn test_dead_ball_timeout() {
        let mut settings = Settings::default();
        settings.rules.dead_ball_seconds = 0.2;
        let mut state = handle_action(&GameState::with_settings(&settings), &Action::Bowl);
        for _ in 0..20 {
            state = tick(&state, SIM_DT).0;
        }
        assert_eq!(state.phase, GamePhase::WaitingForBall);
        assert_eq!(state.score.total_balls(6), 1);
    }

    #[test]
    fn test_runs_while_ball_in_field() {
        let mut settings = Settings {
            fielders: vec![Vec3::new(10.0, 0.0, -9.0)],
            ..Settings::default()
        };
        settings.rules.auto_throw = false;
        let ball = BallKinematics::launched(Vec3::new(9.5, 0.5, -9.0), Vec3::new(5.0, 0.0, 0.0));
        let mut state = tick(&struck(&settings, ShotType::Drive, ball), SIM_DT).0;
        // Two full runs at the default pace
        for _ in 0..((settings.rules.run_seconds * 2.0 / SIM_DT) as usize + 2) {
            state = tick(&state, SIM_DT).0;
        }
        // Not on the board until the ball is dead
        assert_eq!(state.runs_this_ball, 2);
        assert_eq!(state.score.runs, 0);

        let state = handle_action(&state, &Action::ThrowToKeeper);
        let state = run_until(state, |s| s.phase == GamePhase::WaitingForBall);
        assert_eq!(state.score.runs, 2);
        assert_eq!(state.score.total_balls(6), 1);
        assert_eq!(state.last_outcome, Some(DeliveryOutcome::Runs(2)));
    }

    #[test]
    fn test_runs_lost_when_lofted_ball_caught() {
        let settings = Settings {
            fielders: vec![Vec3::new(10.0, 0.0, -9.0)],
            ..Settings::default()
        };
        // Skied straight above the fielder; the batters finish a run first
        let ball = BallKinematics::launched(Vec3::new(10.0, 20.0, -9.0), Vec3::ZERO);
        let mut state = struck(&settings, ShotType::Loft, ball);
        let mut runs_run = 0;
        for _ in 0..MAX_TICKS {
            if state.phase != GamePhase::BallInPlay {
                break;
            }
            state = tick(&state, SIM_DT).0;
            runs_run = runs_run.max(state.runs_this_ball);
        }
        assert!(runs_run >= 1);
        assert_eq!(state.last_outcome, Some(DeliveryOutcome::Caught { fielder: 0 }));
        assert_eq!(state.score.runs, 0);
        assert_eq!(state.score.wickets, 1);
        assert_eq!(state.score.total_balls(6), 1);
    }

    #[test]
    fn test_bounce_and_boundary_on_same_step() {
        let ball =
            BallKinematics::launched(Vec3::new(24.95, 0.06, 0.0), Vec3::new(10.0, -5.0, 0.0));
        let state = struck(&Settings::default(), ShotType::Drive, ball);
        let (next, events) = tick(&state, SIM_DT);
        assert_eq!(events.len(), 2, "{events:?}");
        assert!(matches!(events[0], BallEvent::Bounced { .. }));
        assert!(matches!(
            events[1],
            BallEvent::ReachedTarget {
                target: Target::Boundary { runs: FOUR_RUNS },
                ..
            }
        ));
        assert_eq!(next.phase, GamePhase::WaitingForBall);
        assert_eq!(next.score.runs, FOUR_RUNS);
        assert_eq!(next.score.total_balls(6), 1);
        assert_eq!(next.last_outcome, Some(DeliveryOutcome::Boundary(FOUR_RUNS)));

        // Nothing left to score on the next tick
        let (after, events) = tick(&next, SIM_DT);
        assert!(events.is_empty());
        assert_eq!(after.score, next.score);
    }

    #[test]
    fn test_swing_after_ball_passes_stumps_is_ignored() {
        let state = handle_action(&new_game(), &Action::Bowl);
        let state = run_until(state, |s| s.can_bat);
        let state = run_until(state, |s| s.ball.position.z <= STUMPS_Z);
        assert_eq!(state.phase, GamePhase::BallInPlay);
        assert!(!state.can_bat);

        let swing = Action::Swing {
            angle_degrees: 0.0,
            shot_type: ShotType::Drive,
        };
        assert_eq!(handle_action(&state, &swing), state);

        // Still inside the batsman's radius, but it stays unplayable
        let next = tick(&state, SIM_DT).0;
        assert!(!next.can_bat);
        assert_eq!(handle_action(&next, &swing), next);
    }

    #[test]
    fn test_raised_bounce_has_no_backward_jump() {
        let settings = Settings {
            bowling: BowlingConfig::Direct {
                velocity_kmh: 120.0,
                release: Vec3::new(2.0, 2.0, 11.0),
                bounce: Vec3::new(2.0, 1.0, 0.0),
                target: Vec3::new(2.0, 0.8, -9.0),
            },
            ..Settings::default()
        };
        let mut state = handle_action(&GameState::with_settings(&settings), &Action::Bowl);
        let mut bounced = false;
        for _ in 0..MAX_TICKS {
            let before = state.ball.position;
            let (next, events) = tick(&state, SIM_DT);
            if let Some(BallEvent::Bounced { position, .. }) = events
                .iter()
                .find(|e| matches!(e, BallEvent::Bounced { .. }))
                .copied()
            {
                assert_eq!(next.ball_phase, BallPhase::Bouncing);
                assert_eq!(next.ball.position, position);
                assert!(
                    next.ball.position.z < before.z,
                    "moved from {before:?} to {:?}",
                    next.ball.position
                );
                bounced = true;
                break;
            }
            state = next;
        }
        assert!(bounced);
    }

    #[test]
    fn test_idle_state_is_stable() {
        let state = new_game();
        let (next, events) = tick(&state, SIM_DT);
        assert!(events.is_empty());
        assert_eq!(next.phase, state.phase);
        assert_eq!(next.ball, state.ball);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut state = handle_action(&new_game(), &Action::Bowl);
            let mut all_events = Vec::new();
            for i in 0..400 {
                if state.can_bat {
                    state = handle_action(
                        &state,
                        &Action::Swing {
                            angle_degrees: 200.0,
                            shot_type: ShotType::Loft,
                        },
                    );
                }
                if state.phase == GamePhase::WaitingForBall && i > 0 {
                    state = handle_action(&state, &Action::Bowl);
                }
                let (next, events) = tick(&state, SIM_DT);
                state = next;
                all_events.extend(events);
            }
            (state, all_events)
        };
        assert_eq!(run(), run());
    }
}
