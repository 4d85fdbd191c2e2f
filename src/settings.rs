//! Match settings
//!
//! Rules, default controls and the field layout, read from a JSON file.
//! Missing fields fall back to their defaults.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_ELEVATION;
use crate::sim::fielding::default_field;
use crate::sim::state::ShotControls;
use crate::sim::trajectory::BowlingConfig;
use crate::{finite_or_zero, normalize_degrees};

/// Failure to read or write a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Rules and timings for the state machine and host tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    pub balls_per_over: u32,

    // === Fielding ===
    /// A fielder this close (planar) stops the ball
    pub fielding_radius: f32,
    /// Highest ball a fielder can stop (m)
    pub fielding_height: f32,
    /// A fielder this close to an unbounced lofted ball catches it
    pub catch_radius: f32,
    /// Highest ball a fielder can catch (m)
    pub catch_height: f32,
    /// Keeper collects returns within this planar distance
    pub keeper_reach: f32,
    /// Horizontal throw speed (m/s)
    pub throw_speed: f32,

    // === Timers (seconds) ===
    /// Fielder holds the ball this long before an automatic throw
    pub field_hold_seconds: f32,
    pub celebration_seconds: f32,
    /// Time for the batters to complete one run
    pub run_seconds: f32,
    /// A delivery or return unresolved after this long is called dead
    pub dead_ball_seconds: f32,
    /// Throw to the keeper without waiting for input
    pub auto_throw: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            balls_per_over: 6,

            fielding_radius: 2.0,
            fielding_height: 1.5,
            catch_radius: 2.5,
            catch_height: 2.5,
            keeper_reach: 2.0,
            throw_speed: 25.0,

            field_hold_seconds: 0.5,
            celebration_seconds: 2.0,
            run_seconds: 2.5,
            dead_ball_seconds: 10.0,
            auto_throw: true,
        }
    }
}

impl MatchRules {
    /// Copy with every value forced into a usable range
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let positive = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 { value } else { fallback }
        };
        Self {
            balls_per_over: self.balls_per_over.max(1),
            fielding_radius: positive(self.fielding_radius, defaults.fielding_radius),
            fielding_height: positive(self.fielding_height, defaults.fielding_height),
            catch_radius: positive(self.catch_radius, defaults.catch_radius),
            catch_height: positive(self.catch_height, defaults.catch_height),
            keeper_reach: positive(self.keeper_reach, defaults.keeper_reach),
            throw_speed: positive(self.throw_speed, defaults.throw_speed),
            field_hold_seconds: positive(self.field_hold_seconds, defaults.field_hold_seconds),
            celebration_seconds: positive(self.celebration_seconds, defaults.celebration_seconds),
            run_seconds: positive(self.run_seconds, defaults.run_seconds),
            dead_ball_seconds: positive(self.dead_ball_seconds, defaults.dead_ball_seconds),
            auto_throw: self.auto_throw,
        }
    }
}

/// Everything a match needs before the first ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rules: MatchRules,
    /// Initial bowling controls
    pub bowling: BowlingConfig,
    /// Initial shot controls
    pub shot: ShotControls,
    /// Fielder home positions
    pub fielders: Vec<Vec3>,
    /// Seed for anything random the host does (demo shot selection)
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: MatchRules::default(),
            bowling: BowlingConfig::default(),
            shot: ShotControls::default(),
            fielders: default_field(),
            seed: 0,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings.sanitized())
    }

    /// Read settings, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Copy with nonsense values clamped or replaced
    pub fn sanitized(&self) -> Self {
        let defaults = ShotControls::default();
        let distance = if self.shot.distance_m.is_finite() && self.shot.distance_m > 0.0 {
            self.shot.distance_m
        } else {
            defaults.distance_m
        };
        let elevation = if self.shot.elevation.is_finite() {
            self.shot.elevation.clamp(0.0, MAX_ELEVATION)
        } else {
            defaults.elevation
        };
        Self {
            rules: self.rules.sanitized(),
            bowling: self.bowling,
            shot: ShotControls {
                angle_degrees: normalize_degrees(self.shot.angle_degrees),
                distance_m: distance,
                elevation,
                shot_type: self.shot.shot_type,
            },
            fielders: self
                .fielders
                .iter()
                .map(|&p| {
                    let p = finite_or_zero(p);
                    Vec3::new(p.x, 0.0, p.z)
                })
                .collect(),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ShotType;
    use std::io::Write;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "rules": { "balls_per_over": 8 }, "seed": 42 }"#).unwrap();
        assert_eq!(settings.rules.balls_per_over, 8);
        assert_eq!(settings.rules.run_seconds, MatchRules::default().run_seconds);
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.fielders, default_field());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "bowling": {{ "mode": "direct", "velocity_kmh": 100.0,
                    "release": [0.0, 2.0, 11.0], "bounce": [0.0, 0.05, -5.0],
                    "target": [0.0, 0.8, -9.0] }},
                "shot": {{ "angle_degrees": 400.0, "shot_type": "Loft" }},
                "fielders": [[5.0, 3.0, 5.0]]
            }}"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert!(matches!(settings.bowling, BowlingConfig::Direct { .. }));
        assert!((settings.shot.angle_degrees - 40.0).abs() < 1e-4);
        assert_eq!(settings.shot.shot_type, ShotType::Loft);
        assert_eq!(settings.fielders, vec![Vec3::new(5.0, 0.0, 5.0)]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.rules.auto_throw = false;
        settings.seed = 7;
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            Settings::load(&missing),
            Err(SettingsError::Io { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            Settings::load(&bad),
            Err(SettingsError::Parse { .. })
        ));
        assert_eq!(Settings::load_or_default(&bad), Settings::default());
    }

    #[test]
    fn test_sanitized_rules() {
        let rules = MatchRules {
            balls_per_over: 0,
            throw_speed: -3.0,
            run_seconds: f32::NAN,
            ..MatchRules::default()
        }
        .sanitized();
        assert_eq!(rules.balls_per_over, 1);
        assert_eq!(rules.throw_speed, MatchRules::default().throw_speed);
        assert_eq!(rules.run_seconds, MatchRules::default().run_seconds);
    }
}
