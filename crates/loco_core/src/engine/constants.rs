//! Fixed locomotion constants.
//!
//! Values the rotation, gait and ragdoll logic treats as invariants. Anything
//! a designer is expected to tune lives in `config` instead; these are the
//! rates and thresholds the algorithms were built around.
//!
//! Units: centimeters, seconds, degrees.

pub mod rotation {
    /// Constant-rate step (deg/s) of the intermediate target heading while
    /// grounded, per rotation mode.
    pub const TARGET_RATE_VELOCITY: f32 = 800.0;
    pub const TARGET_RATE_LOOKING: f32 = 500.0;
    pub const TARGET_RATE_AIMING: f32 = 1000.0;

    /// Actor ease rate while aiming (grounded, moving).
    pub const AIMING_ACTOR_RATE: f32 = 20.0;

    /// Stationary torso clamp window relative to the aim yaw, and the
    /// corrective ease rate once the window is exceeded.
    pub const LIMIT_YAW_MIN: f32 = -100.0;
    pub const LIMIT_YAW_MAX: f32 = 100.0;
    pub const LIMIT_INTERP_RATE: f32 = 20.0;

    /// In-air ease rates: cached heading vs. live aim yaw.
    pub const IN_AIR_RATE: f32 = 5.0;
    pub const IN_AIR_AIMING_RATE: f32 = 15.0;

    /// Rolling turns toward the last input heading at this reduced rate.
    pub const ROLLING_RATE: f32 = 2.0;

    /// Above this horizontal speed the moving-rotation branch runs even
    /// without movement input (momentum keeps steering the body).
    pub const MOVING_SPEED_THRESHOLD: f32 = 150.0;

    /// The turn-in-place rotation-amount curve is authored against 30 fps
    /// animation evaluation; per-frame samples are rescaled by
    /// `dt / (1 / TURN_CURVE_FRAME_RATE)`.
    pub const TURN_CURVE_FRAME_RATE: f32 = 30.0;

    /// Rotation-amount samples below this are treated as no turn.
    pub const TURN_CURVE_DEADZONE: f32 = 0.001;

    /// Aim-yaw angular velocity window mapped into a rotation-rate scale.
    pub const AIM_YAW_RATE_MAX: f32 = 300.0;
    pub const AIM_YAW_RATE_SCALE_MIN: f32 = 1.0;
    pub const AIM_YAW_RATE_SCALE_MAX: f32 = 3.0;

    /// Smoothing rate of the aim rotation toward the raw control rotation.
    pub const AIM_SMOOTH_RATE: f32 = 30.0;
}

pub mod gait {
    /// Hysteresis band (speed units) around the walk/run thresholds that
    /// prevents gait flicker at the boundaries.
    pub const SPEED_HYSTERESIS: f32 = 10.0;

    /// Sprinting requires near-maximal analog input.
    pub const SPRINT_INPUT_THRESHOLD: f32 = 0.9;

    /// In looking-direction mode, sprinting also requires the input heading
    /// to stay within this cone of the aim yaw.
    pub const SPRINT_AIM_CONE_DEG: f32 = 50.0;

    /// Horizontal speed above which the character counts as moving.
    pub const MOVING_SPEED_EPSILON: f32 = 1.0;

    /// Jumping above this speed seeds the in-air heading from the velocity
    /// heading instead of the current facing.
    pub const JUMP_HEADING_SEED_SPEED: f32 = 100.0;
}

pub mod ragdoll {
    /// Ragdoll speed to joint-motor-strength mapping.
    pub const SPRING_SPEED_MAX: f32 = 1000.0;
    pub const SPRING_MAX: f32 = 25000.0;

    /// Gravity is disabled once falling faster than this (negative z).
    pub const GRAVITY_CUTOFF_FALL_SPEED: f32 = -4000.0;

    /// Lift padding above the measured floor penetration when re-seating the
    /// actor over a grounded ragdoll.
    pub const GROUND_LIFT_PADDING: f32 = 2.0;

    /// Remote-pull force ramp: eased toward this strength at this rate.
    pub const PULL_STRENGTH_MAX: f32 = 750.0;
    pub const PULL_EASE_RATE: f32 = 0.6;

    /// Above this horizontal ragdoll speed the pull anchors at the spine
    /// instead of the pelvis.
    pub const PULL_ANCHOR_SPEED: f32 = 300.0;

    /// Blend-out time of any active montage on ragdoll entry.
    pub const MONTAGE_STOP_BLEND: f32 = 0.2;
}

pub mod movement {
    /// Gait speed multipliers applied to the character's base move speed.
    pub const SPRINT_MULTIPLIER: f32 = 1.4;
    pub const ADS_MULTIPLIER: f32 = 0.8;
    pub const KNOCKED_DOWN_MULTIPLIER: f32 = 0.4;

    /// Integrator fallbacks when off the ground or without a movement curve.
    pub const FALLBACK_MAX_ACCELERATION: f32 = 2048.0;
    pub const FALLBACK_BRAKING_DECELERATION: f32 = 2048.0;
}

pub mod landing {
    /// Braking-friction factor right after landing, with and without
    /// movement input held.
    pub const BRAKING_FACTOR_WITH_INPUT: f32 = 0.5;
    pub const BRAKING_FACTOR_NO_INPUT: f32 = 3.0;

    /// Seconds until the landing friction factor resets to zero.
    pub const FRICTION_RESET_TIME: f32 = 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_mapping_endpoints_are_consistent() {
        assert!(ragdoll::SPRING_SPEED_MAX > 0.0);
        assert!(ragdoll::SPRING_MAX > ragdoll::SPRING_SPEED_MAX);
    }

    #[test]
    fn gait_multiplier_ordering() {
        assert!(movement::SPRINT_MULTIPLIER > 1.0);
        assert!(movement::ADS_MULTIPLIER < 1.0);
        assert!(movement::KNOCKED_DOWN_MULTIPLIER < movement::ADS_MULTIPLIER);
    }

    #[test]
    fn limit_window_is_symmetric() {
        assert_eq!(rotation::LIMIT_YAW_MIN, -rotation::LIMIT_YAW_MAX);
    }
}
