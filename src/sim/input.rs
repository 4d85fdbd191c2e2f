//! Player actions
//!
//! Maps discrete player requests onto engine events. Actions that are not legal
//! in the current phase are dropped here, with a debug log, before they reach
//! the state machine.

use serde::{Deserialize, Serialize};

use super::events::{Event, ResetReason};
use super::fielding::{keeper_gloves, throw_velocity};
use super::machine::apply;
use super::shot::solve;
use super::state::{ControlUpdate, GamePhase, GameState, ShotControls, ShotType};
use super::trajectory::compute_trajectory;
use crate::consts::GRAVITY;

/// A discrete request from the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Bowl,
    Swing {
        angle_degrees: f32,
        shot_type: ShotType,
    },
    ThrowToKeeper,
    ResetBall,
    RotateAim { delta_degrees: f32 },
    SelectShotType(ShotType),
}

/// Apply a player action, returning the next state
pub fn handle_action(state: &GameState, action: &Action) -> GameState {
    match *action {
        Action::Bowl => {
            if state.phase != GamePhase::WaitingForBall {
                log::debug!("Bowl ignored in {:?}", state.phase);
                return state.clone();
            }
            let trajectory = compute_trajectory(&state.controls.bowling);
            log::debug!(
                "Bowling at {:.1} m/s, pitching at {:?}",
                trajectory.metadata.speed_m_s,
                trajectory.bounce.position
            );
            let next = apply(state, &Event::StartBowling);
            apply(&next, &Event::BallBowled { trajectory })
        }
        Action::Swing {
            angle_degrees,
            shot_type,
        } => {
            if state.phase != GamePhase::BallInPlay || !state.can_bat {
                log::debug!(
                    "Swing ignored in {:?} (can_bat = {})",
                    state.phase,
                    state.can_bat
                );
                return state.clone();
            }
            let solution = solve(&state.controls.shot.request(angle_degrees, shot_type));
            apply(
                state,
                &Event::BallHit {
                    solution,
                    meta: shot_type.meta(),
                },
            )
        }
        Action::ThrowToKeeper => match throw_to_keeper(state) {
            Some(event) => apply(state, &event),
            None => {
                log::debug!("Throw ignored in {:?}", state.phase);
                state.clone()
            }
        },
        Action::ResetBall => apply(
            state,
            &Event::ManualReset {
                reason: ResetReason::Requested,
            },
        ),
        Action::RotateAim { delta_degrees } => apply(
            state,
            &Event::UpdateControls(ControlUpdate::Shot(
                state.controls.shot.rotated(delta_degrees),
            )),
        ),
        Action::SelectShotType(shot_type) => apply(
            state,
            &Event::UpdateControls(ControlUpdate::Shot(ShotControls {
                shot_type,
                ..state.controls.shot
            })),
        ),
    }
}

/// Throw from the fielder holding the ball to the keeper's gloves
pub(crate) fn throw_to_keeper(state: &GameState) -> Option<Event> {
    if state.phase != GamePhase::Fielding {
        return None;
    }
    let velocity = throw_velocity(
        state.ball.position,
        keeper_gloves(),
        state.rules.throw_speed,
        GRAVITY,
    );
    Some(Event::BallThrown { velocity })
}
