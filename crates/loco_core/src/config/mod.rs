//! Locomotion configuration.
//!
//! The movement model (the per-(rotation mode, stance) settings table) is
//! authored as YAML. A default model ships embedded in the crate and is
//! parsed once on first access; user-supplied YAML goes through the same
//! validated path and returns `ConfigError` instead of panicking.
//!
//! Tuning that the original exposes per character (ragdoll polarity, landing
//! thresholds, input timings) lives in `RagdollConfig` / `InputConfig`.

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::engine::curve::{FloatCurve, VectorCurve};
use crate::engine::settings::{MovementProfileTable, MovementSettings};
use crate::engine::types::{RotationMode, Stance};
use crate::error::{ConfigError, Result};

const DEFAULT_MOVEMENT_MODEL_YAML: &str = include_str!("movement_model.yaml");

static DEFAULT_MOVEMENT_MODEL: OnceCell<MovementProfileTable> = OnceCell::new();

/// The embedded default movement model.
///
/// The embedded YAML is part of the crate; failing to parse it is a build
/// content error, not a runtime condition.
pub fn default_movement_model() -> &'static MovementProfileTable {
    DEFAULT_MOVEMENT_MODEL.get_or_init(|| {
        movement_model_from_yaml(DEFAULT_MOVEMENT_MODEL_YAML)
            .expect("embedded movement model YAML invalid")
    })
}

/// Parse and validate a movement model from YAML.
pub fn movement_model_from_yaml(yaml: &str) -> Result<MovementProfileTable> {
    let file: MovementModelFile = serde_yaml::from_str(yaml)?;
    MovementProfileTable::try_from(file)
}

// ---------------------------------------------------------------------------
// Raw file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MovementModelFile {
    #[allow(unused)]
    pub version: u32,
    pub profiles: BTreeMap<String, BTreeMap<String, MovementRowFile>>,
}

#[derive(Debug, Deserialize)]
pub struct MovementRowFile {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub sprint_speed: f32,
    pub movement_curve: Vec<(f32, [f32; 3])>,
    pub rotation_rate_curve: Vec<(f32, f32)>,
}

fn mode_from_key(key: &str) -> Option<RotationMode> {
    match key {
        "velocity_direction" => Some(RotationMode::VelocityDirection),
        "looking_direction" => Some(RotationMode::LookingDirection),
        "aiming" => Some(RotationMode::Aiming),
        _ => None,
    }
}

fn stance_from_key(key: &str) -> Option<Stance> {
    match key {
        "standing" => Some(Stance::Standing),
        "crouching" => Some(Stance::Crouching),
        _ => None,
    }
}

fn mode_key(mode: RotationMode) -> &'static str {
    match mode {
        RotationMode::VelocityDirection => "velocity_direction",
        RotationMode::LookingDirection => "looking_direction",
        RotationMode::Aiming => "aiming",
    }
}

fn stance_key(stance: Stance) -> &'static str {
    match stance {
        Stance::Standing => "standing",
        Stance::Crouching => "crouching",
    }
}

impl MovementRowFile {
    fn into_settings(self, profile: &str) -> Result<MovementSettings> {
        let invalid = |reason: &str| ConfigError::InvalidProfile {
            profile: profile.to_string(),
            reason: reason.to_string(),
        };

        if self.walk_speed <= 0.0 {
            return Err(invalid("walk_speed must be positive"));
        }
        if self.run_speed < self.walk_speed {
            return Err(invalid("run_speed must be >= walk_speed"));
        }
        if self.sprint_speed < self.run_speed {
            return Err(invalid("sprint_speed must be >= run_speed"));
        }
        if self.movement_curve.is_empty() {
            return Err(invalid("movement_curve needs at least one key"));
        }
        if self.rotation_rate_curve.is_empty() {
            return Err(invalid("rotation_rate_curve needs at least one key"));
        }

        Ok(MovementSettings {
            walk_speed: self.walk_speed,
            run_speed: self.run_speed,
            sprint_speed: self.sprint_speed,
            movement_curve: VectorCurve::new(self.movement_curve),
            rotation_rate_curve: FloatCurve::new(self.rotation_rate_curve),
        })
    }
}

impl TryFrom<MovementModelFile> for MovementProfileTable {
    type Error = ConfigError;

    fn try_from(file: MovementModelFile) -> Result<Self> {
        // Reject unknown keys first so typos surface as themselves rather
        // than as a missing-row error.
        for (mode_key, stances) in &file.profiles {
            if mode_from_key(mode_key).is_none() {
                return Err(ConfigError::UnknownKey { key: mode_key.clone() });
            }
            for stance_key in stances.keys() {
                if stance_from_key(stance_key).is_none() {
                    return Err(ConfigError::UnknownKey {
                        key: format!("{mode_key}.{stance_key}"),
                    });
                }
            }
        }

        let mut rows: BTreeMap<(usize, usize), MovementSettings> = BTreeMap::new();
        for (mk, stances) in file.profiles {
            let mode = mode_from_key(&mk).unwrap();
            for (sk, row) in stances {
                let stance = stance_from_key(&sk).unwrap();
                let profile = format!("{mk}.{sk}");
                rows.insert(
                    (mode as usize, stance as usize),
                    row.into_settings(&profile)?,
                );
            }
        }

        let modes = [
            RotationMode::VelocityDirection,
            RotationMode::LookingDirection,
            RotationMode::Aiming,
        ];
        let stances = [Stance::Standing, Stance::Crouching];
        for mode in modes {
            for stance in stances {
                if !rows.contains_key(&(mode as usize, stance as usize)) {
                    return Err(ConfigError::MissingProfile {
                        mode: mode_key(mode).to_string(),
                        stance: stance_key(stance).to_string(),
                    });
                }
            }
        }

        Ok(MovementProfileTable::from_fn(|mode, stance| {
            rows[&(mode as usize, stance as usize)].clone()
        }))
    }
}

// ---------------------------------------------------------------------------
// Per-character tuning
// ---------------------------------------------------------------------------

/// Ragdoll tuning knobs the original exposes per character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagdollConfig {
    /// Mirrored skeletons report the opposite pelvis roll sign.
    pub reversed_pelvis: bool,
    /// Enter ragdoll when landing faster than `ragdoll_on_land_velocity`.
    pub ragdoll_on_land: bool,
    pub ragdoll_on_land_velocity: f32,
    /// Roll out of fast landings instead of a hard stop.
    pub breakfall_on_land: bool,
    pub breakfall_on_land_velocity: f32,
}

impl Default for RagdollConfig {
    fn default() -> Self {
        Self {
            reversed_pelvis: false,
            ragdoll_on_land: false,
            ragdoll_on_land_velocity: 1000.0,
            breakfall_on_land: true,
            breakfall_on_land_velocity: 600.0,
        }
    }
}

/// Input timing knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Second stance press within this window rolls instead of toggling.
    pub roll_double_tap_timeout: f32,
    /// Holding the camera action this long switches view mode; releasing
    /// earlier swaps shoulders.
    pub view_mode_hold_time: f32,
    /// How long the rolling action runs before the stance is restored.
    pub roll_duration: f32,
    pub look_yaw_rate: f32,
    pub look_pitch_rate: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            roll_double_tap_timeout: 0.3,
            view_mode_hold_time: 0.2,
            roll_duration: 0.93,
            look_yaw_rate: 1.25,
            look_pitch_rate: 1.25,
        }
    }
}

/// Complete per-character locomotion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocomotionConfig {
    pub movement_model: MovementProfileTable,
    pub ragdoll: RagdollConfig,
    pub input: InputConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_model_parses_and_covers_all_rows() {
        let table = default_movement_model();
        // Every combination resolves; aiming caps sprint at run speed.
        let aiming = table.settings(RotationMode::Aiming, Stance::Standing);
        assert_eq!(aiming.sprint_speed, aiming.run_speed);

        let standing = table.settings(RotationMode::LookingDirection, Stance::Standing);
        assert_eq!(standing.walk_speed, 165.0);
        assert_eq!(standing.run_speed, 375.0);
        assert_eq!(standing.sprint_speed, 600.0);
    }

    #[test]
    fn missing_row_is_rejected() {
        let yaml = r#"
version: 1
profiles:
  velocity_direction:
    standing:
      walk_speed: 165.0
      run_speed: 375.0
      sprint_speed: 600.0
      movement_curve: [[0.0, [2000.0, 2000.0, 8.0]]]
      rotation_rate_curve: [[0.0, 5.0]]
"#;
        let err = movement_model_from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingProfile { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let yaml = r#"
version: 1
profiles:
  strafing:
    standing:
      walk_speed: 165.0
      run_speed: 375.0
      sprint_speed: 600.0
      movement_curve: [[0.0, [2000.0, 2000.0, 8.0]]]
      rotation_rate_curve: [[0.0, 5.0]]
"#;
        let err = movement_model_from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { key } if key == "strafing"));
    }

    #[test]
    fn unordered_speeds_are_rejected() {
        let yaml = r#"
version: 1
profiles:
  velocity_direction:
    standing: &row
      walk_speed: 400.0
      run_speed: 375.0
      sprint_speed: 600.0
      movement_curve: [[0.0, [2000.0, 2000.0, 8.0]]]
      rotation_rate_curve: [[0.0, 5.0]]
    crouching: *row
  looking_direction:
    standing: *row
    crouching: *row
  aiming:
    standing: *row
    crouching: *row
"#;
        let err = movement_model_from_yaml(yaml).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidProfile { ref reason, .. } if reason.contains("run_speed")),
            "got {err:?}"
        );
    }

    #[test]
    fn config_defaults_match_input_timings() {
        let config = LocomotionConfig::default();
        assert_eq!(config.input.roll_double_tap_timeout, 0.3);
        assert_eq!(config.input.view_mode_hold_time, 0.2);
        assert!(!config.ragdoll.reversed_pelvis);
        assert_eq!(config.ragdoll.ragdoll_on_land_velocity, 1000.0);
    }
}
