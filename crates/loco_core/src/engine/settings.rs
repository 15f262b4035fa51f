//! Movement settings rows and the per-(RotationMode × Stance) profile table.
//!
//! This module is the single authority for gait speeds and the speed-indexed
//! tuning curves. Rows are immutable after load; runtime code looks them up
//! and samples them, never mutates them.

use serde::{Deserialize, Serialize};

use crate::engine::curve::{FloatCurve, VectorCurve};
use crate::engine::math::map_range_clamped;
use crate::engine::types::{Gait, RotationMode, Stance};

/// One movement tuning row.
///
/// `movement_curve` is sampled at the mapped speed and yields
/// x = max acceleration, y = braking deceleration, z = ground friction.
/// `rotation_rate_curve` yields the base grounded rotation rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSettings {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub sprint_speed: f32,
    pub movement_curve: VectorCurve,
    pub rotation_rate_curve: FloatCurve,
}

impl MovementSettings {
    /// Configured speed for a gait tier.
    pub fn speed_for_gait(&self, gait: Gait) -> f32 {
        match gait {
            Gait::Walking => self.walk_speed,
            Gait::Running => self.run_speed,
            Gait::Sprinting => self.sprint_speed,
        }
    }

    /// Map a horizontal speed onto the 0..3 range against this row's
    /// thresholds: 0 = stopped, 1 = walk speed, 2 = run speed, 3 = sprint
    /// speed. Tuning curves are sampled in this range so rows with different
    /// absolute speeds behave consistently.
    pub fn mapped_speed(&self, speed: f32) -> f32 {
        if speed > self.run_speed {
            return map_range_clamped(speed, self.run_speed, self.sprint_speed, 2.0, 3.0);
        }
        if speed > self.walk_speed {
            return map_range_clamped(speed, self.walk_speed, self.run_speed, 1.0, 2.0);
        }
        map_range_clamped(speed, 0.0, self.walk_speed, 0.0, 1.0)
    }
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            walk_speed: 165.0,
            run_speed: 375.0,
            sprint_speed: 600.0,
            movement_curve: VectorCurve::new(vec![
                (0.0, [2000.0, 2000.0, 8.0]),
                (1.0, [1500.0, 1500.0, 7.0]),
                (2.0, [1000.0, 1000.0, 6.0]),
                (3.0, [800.0, 800.0, 5.0]),
            ]),
            rotation_rate_curve: FloatCurve::new(vec![
                (0.0, 5.0),
                (1.0, 5.0),
                (2.0, 6.5),
                (3.0, 8.0),
            ]),
        }
    }
}

/// Dense lookup of movement settings by rotation mode and stance.
///
/// Construction happens in `config`; every combination is guaranteed present,
/// so lookups are infallible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementProfileTable {
    rows: [[MovementSettings; 2]; 3],
}

fn mode_index(mode: RotationMode) -> usize {
    match mode {
        RotationMode::VelocityDirection => 0,
        RotationMode::LookingDirection => 1,
        RotationMode::Aiming => 2,
    }
}

fn stance_index(stance: Stance) -> usize {
    match stance {
        Stance::Standing => 0,
        Stance::Crouching => 1,
    }
}

impl MovementProfileTable {
    /// Build from a closure producing the row for each combination.
    pub fn from_fn(mut row: impl FnMut(RotationMode, Stance) -> MovementSettings) -> Self {
        let mut pair = |mode: RotationMode| {
            [row(mode, Stance::Standing), row(mode, Stance::Crouching)]
        };
        Self {
            rows: [
                pair(RotationMode::VelocityDirection),
                pair(RotationMode::LookingDirection),
                pair(RotationMode::Aiming),
            ],
        }
    }

    pub fn settings(&self, mode: RotationMode, stance: Stance) -> &MovementSettings {
        &self.rows[mode_index(mode)][stance_index(stance)]
    }
}

impl Default for MovementProfileTable {
    fn default() -> Self {
        crate::config::default_movement_model().clone()
    }
}
