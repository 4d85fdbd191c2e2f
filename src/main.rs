//! Crease entry point
//!
//! Headless driver: bowls a seeded sequence of deliveries through the engine
//! at a fixed frame rate and reports each outcome.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crease::consts::*;
use crease::settings::Settings;
use crease::sim::{
    Action, ControlUpdate, Event, GamePhase, GameState, ShotControls, ShotType, apply,
    handle_action, tick,
};

#[derive(Parser, Debug)]
#[command(about = "Simulate deliveries with the crease engine", version)]
struct Args {
    /// Settings JSON (defaults are used when omitted)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Overs to bowl
    #[arg(long, default_value_t = 1)]
    overs: u32,
    /// Seed for shot selection (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,
    /// Host frame time in milliseconds
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f32,
    /// Print the effective settings as JSON and exit
    #[arg(long)]
    dump_settings: bool,
}

/// Host loop state
struct Game {
    state: GameState,
    accumulator: f32,
    rng: Pcg32,
}

impl Game {
    fn new(settings: &Settings) -> Self {
        Self {
            state: GameState::with_settings(settings),
            accumulator: 0.0,
            rng: Pcg32::seed_from_u64(settings.seed),
        }
    }

    /// Run simulation ticks for one host frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.play();
            let (next, _events) = tick(&self.state, SIM_DT);
            self.state = next;
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    /// Stand-in for a player: bowl when the ball is dead, swing when able
    fn play(&mut self) {
        match self.state.phase {
            GamePhase::WaitingForBall => {
                let shot = ShotControls {
                    angle_degrees: self.rng.random_range(0.0..360.0),
                    distance_m: self.rng.random_range(5.0..40.0),
                    elevation: self.rng.random_range(0.0..2.0),
                    shot_type: match self.rng.random_range(0..3) {
                        0 => ShotType::Defensive,
                        1 => ShotType::Drive,
                        _ => ShotType::Loft,
                    },
                };
                let speed = self.rng.random_range(100.0..145.0);
                let bowling = self.state.controls.bowling.with_velocity(speed);
                self.state = apply(&self.state, &Event::UpdateControls(ControlUpdate::Shot(shot)));
                self.state = apply(
                    &self.state,
                    &Event::UpdateControls(ControlUpdate::Bowling(bowling)),
                );
                self.state = handle_action(&self.state, &Action::Bowl);
            }
            GamePhase::BallInPlay if self.state.can_bat => {
                let shot = self.state.controls.shot;
                self.state = handle_action(
                    &self.state,
                    &Action::Swing {
                        angle_degrees: shot.angle_degrees,
                        shot_type: shot.shot_type,
                    },
                );
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if args.dump_settings {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    log::info!("Crease starting (seed {}, {} overs)", settings.seed, args.overs);
    let balls_per_over = settings.rules.balls_per_over;
    let target_balls = args.overs.saturating_mul(balls_per_over);
    let frame_dt = (args.frame_ms / 1000.0).max(SIM_DT);

    let mut game = Game::new(&settings);
    let mut reported = 0;
    // Generous cap; a delivery resolves within the dead-ball timeout
    let max_frames = (target_balls as f32 + 1.0)
        * (settings.rules.dead_ball_seconds * 3.0 + settings.rules.celebration_seconds)
        / frame_dt;

    let mut frames = 0.0;
    while game.state.score.total_balls(balls_per_over) < target_balls && frames < max_frames {
        game.update(frame_dt);
        frames += 1.0;

        let bowled = game.state.score.total_balls(balls_per_over);
        if bowled != reported {
            reported = bowled;
            let score = game.state.score;
            println!(
                "{}.{}  {:<14} {}/{}",
                score.overs,
                score.balls,
                game.state
                    .last_outcome
                    .map(|o| format!("{o:?}"))
                    .unwrap_or_default(),
                score.runs,
                score.wickets
            );
        }
    }

    let score = game.state.score;
    println!(
        "Final: {}/{} from {}.{} overs",
        score.runs, score.wickets, score.overs, score.balls
    );
    Ok(())
}
