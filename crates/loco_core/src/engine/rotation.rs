//! Procedural heading calculation.
//!
//! Smoothing is two-stage: a constant-rate interpolation walks an
//! intermediate target heading toward the policy goal (so goal flips never
//! snap), then the actor heading eases exponentially toward that target at a
//! second, usually higher, rate. Turn-in-place bypasses both stages because
//! its per-frame rotation amount is authored into the animation itself.

use crate::engine::constants::rotation::*;
use crate::engine::curve::FloatCurve;
use crate::engine::interfaces::{AnimationLink, CurveName};
use crate::engine::math::{
    interp_yaw_constant, interp_yaw_to, map_range_clamped, normalize_yaw, yaw_delta,
};
use crate::engine::types::{Gait, MovementAction, RotationMode, ViewMode};

/// Per-frame view of everything the solver reads.
pub struct RotationInputs<'a> {
    pub dt: f32,
    pub rotation_mode: RotationMode,
    pub gait: Gait,
    pub view_mode: ViewMode,
    pub movement_action: MovementAction,
    pub has_movement_input: bool,
    pub is_moving: bool,
    pub speed: f32,
    pub mapped_speed: f32,
    pub aim_yaw: f32,
    /// Recent aim-yaw angular velocity (deg/s).
    pub aim_yaw_rate: f32,
    pub last_velocity_yaw: f32,
    pub last_input_yaw: f32,
    pub rotation_rate_curve: &'a FloatCurve,
    /// Roll steering is disabled in networked games.
    pub networked: bool,
    pub anim: Option<&'a dyn AnimationLink>,
}

#[derive(Debug, Clone, Copy)]
pub struct RotationSolver {
    /// Intermediate smoothed target heading.
    target_yaw: f32,
    /// Heading captured on air entry; the in-air goal for non-aiming modes.
    in_air_yaw: f32,
}

impl RotationSolver {
    pub fn new(initial_yaw: f32) -> Self {
        let yaw = normalize_yaw(initial_yaw);
        Self { target_yaw: yaw, in_air_yaw: yaw }
    }

    pub fn target_yaw(&self) -> f32 {
        self.target_yaw
    }

    pub fn in_air_yaw(&self) -> f32 {
        self.in_air_yaw
    }

    /// Re-anchor the intermediate target on the actual heading (teleports,
    /// ragdoll exit, direct rotation writes).
    pub fn sync(&mut self, actor_yaw: f32) {
        self.target_yaw = normalize_yaw(actor_yaw);
    }

    /// Capture the heading to hold while airborne.
    pub fn set_in_air_yaw(&mut self, yaw: f32) {
        self.in_air_yaw = normalize_yaw(yaw);
    }

    /// Jump heading seed: keep steering along the velocity when jumping at
    /// speed, otherwise hold the current facing.
    pub fn seed_in_air_from_jump(&mut self, speed: f32, last_velocity_yaw: f32, actor_yaw: f32) {
        self.in_air_yaw = if speed > crate::engine::constants::gait::JUMP_HEADING_SEED_SPEED {
            normalize_yaw(last_velocity_yaw)
        } else {
            normalize_yaw(actor_yaw)
        };
    }

    /// Two-stage smoothing step. Returns the new actor heading.
    pub fn smooth(
        &mut self,
        actor_yaw: f32,
        goal_yaw: f32,
        target_rate: f32,
        actor_rate: f32,
        dt: f32,
    ) -> f32 {
        self.target_yaw = interp_yaw_constant(self.target_yaw, goal_yaw, dt, target_rate);
        interp_yaw_to(actor_yaw, self.target_yaw, dt, actor_rate)
    }

    /// Grounded per-frame update. Returns the new actor heading.
    pub fn update_grounded(&mut self, actor_yaw: f32, inputs: &RotationInputs) -> f32 {
        match inputs.movement_action {
            MovementAction::Rolling => {
                if !inputs.networked && inputs.has_movement_input {
                    return self.smooth(
                        actor_yaw,
                        inputs.last_input_yaw,
                        0.0,
                        ROLLING_RATE,
                        inputs.dt,
                    );
                }
                return actor_yaw;
            }
            MovementAction::None => {}
        }

        let moving = (inputs.is_moving && inputs.has_movement_input)
            || inputs.speed > MOVING_SPEED_THRESHOLD;

        if moving {
            let rate = grounded_rotation_rate(
                inputs.rotation_rate_curve,
                inputs.mapped_speed,
                inputs.aim_yaw_rate,
            );
            return match inputs.rotation_mode {
                RotationMode::VelocityDirection => self.smooth(
                    actor_yaw,
                    inputs.last_velocity_yaw,
                    TARGET_RATE_VELOCITY,
                    rate,
                    inputs.dt,
                ),
                RotationMode::LookingDirection => {
                    let goal = if inputs.gait.is_sprinting() {
                        inputs.last_velocity_yaw
                    } else {
                        // Walking or running: decouple the visual foot yaw
                        // from the camera yaw with the animation offset.
                        let yaw_offset = inputs
                            .anim
                            .map(|anim| anim.curve_value(CurveName::YawOffset))
                            .unwrap_or(0.0);
                        inputs.aim_yaw + yaw_offset
                    };
                    self.smooth(actor_yaw, goal, TARGET_RATE_LOOKING, rate, inputs.dt)
                }
                RotationMode::Aiming => self.smooth(
                    actor_yaw,
                    inputs.aim_yaw,
                    TARGET_RATE_AIMING,
                    AIMING_ACTOR_RATE,
                    inputs.dt,
                ),
            };
        }

        // Stationary.
        let mut yaw = actor_yaw;

        let clamp_to_aim = (inputs.view_mode == ViewMode::ThirdPerson
            && inputs.rotation_mode.is_aiming())
            || inputs.view_mode.is_first_person();
        if clamp_to_aim {
            yaw = self.limit_rotation(
                yaw,
                inputs.aim_yaw,
                LIMIT_YAW_MIN,
                LIMIT_YAW_MAX,
                LIMIT_INTERP_RATE,
                inputs.dt,
            );
        }

        // Turn in place: the rotation-amount curve is already a per-frame
        // rotation tuned for 30 fps evaluation, so it is rescaled to the real
        // dt and applied directly, outside the smoothing pipeline.
        let rotation_amount = inputs
            .anim
            .map(|anim| anim.curve_value(CurveName::RotationAmount))
            .unwrap_or(0.0);
        if rotation_amount.abs() > TURN_CURVE_DEADZONE {
            yaw = normalize_yaw(yaw + rotation_amount * (inputs.dt * TURN_CURVE_FRAME_RATE));
            self.target_yaw = yaw;
        }

        yaw
    }

    /// In-air per-frame update. Returns the new actor heading.
    pub fn update_in_air(&mut self, actor_yaw: f32, inputs: &RotationInputs) -> f32 {
        match inputs.rotation_mode {
            RotationMode::VelocityDirection | RotationMode::LookingDirection => {
                self.smooth(actor_yaw, self.in_air_yaw, 0.0, IN_AIR_RATE, inputs.dt)
            }
            RotationMode::Aiming => {
                let yaw =
                    self.smooth(actor_yaw, inputs.aim_yaw, 0.0, IN_AIR_AIMING_RATE, inputs.dt);
                // Keep the cached heading current so releasing aim holds the
                // latest facing instead of an old one.
                self.in_air_yaw = yaw;
                yaw
            }
        }
    }

    /// Keep the torso within a yaw window around the aim direction; once the
    /// window is exceeded, turn back toward its nearest edge.
    fn limit_rotation(
        &mut self,
        actor_yaw: f32,
        aim_yaw: f32,
        yaw_min: f32,
        yaw_max: f32,
        interp_rate: f32,
        dt: f32,
    ) -> f32 {
        let range = yaw_delta(aim_yaw, actor_yaw);
        if range < yaw_min || range > yaw_max {
            let goal = aim_yaw + if range > 0.0 { yaw_min } else { yaw_max };
            return self.smooth(actor_yaw, goal, 0.0, interp_rate, dt);
        }
        actor_yaw
    }
}

/// Grounded actor ease rate: the settings curve sampled at the mapped speed,
/// scaled up when the camera is turning quickly so the body keeps up.
pub fn grounded_rotation_rate(curve: &FloatCurve, mapped_speed: f32, aim_yaw_rate: f32) -> f32 {
    let scale = map_range_clamped(
        aim_yaw_rate,
        0.0,
        AIM_YAW_RATE_MAX,
        AIM_YAW_RATE_SCALE_MIN,
        AIM_YAW_RATE_SCALE_MAX,
    );
    curve.value_at(mapped_speed) * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::interfaces::Montage;

    struct CurveAnim {
        yaw_offset: f32,
        rotation_amount: f32,
    }

    impl AnimationLink for CurveAnim {
        fn curve_value(&self, curve: CurveName) -> f32 {
            match curve {
                CurveName::YawOffset => self.yaw_offset,
                CurveName::RotationAmount => self.rotation_amount,
            }
        }
        fn play_montage(&mut self, _montage: Montage, _play_rate: f32) {}
        fn stop_montage(&mut self, _blend_out: f32) {}
        fn save_pose_snapshot(&mut self, _name: &str) {}
    }

    fn curve() -> FloatCurve {
        FloatCurve::new(vec![(0.0, 5.0), (3.0, 8.0)])
    }

    fn inputs<'a>(rate_curve: &'a FloatCurve) -> RotationInputs<'a> {
        RotationInputs {
            dt: 1.0 / 60.0,
            rotation_mode: RotationMode::VelocityDirection,
            gait: Gait::Running,
            view_mode: ViewMode::ThirdPerson,
            movement_action: MovementAction::None,
            has_movement_input: true,
            is_moving: true,
            speed: 300.0,
            mapped_speed: 1.5,
            aim_yaw: 0.0,
            aim_yaw_rate: 0.0,
            last_velocity_yaw: 0.0,
            last_input_yaw: 0.0,
            rotation_rate_curve: rate_curve,
            networked: false,
            anim: None,
        }
    }

    #[test]
    fn smooth_two_stage_never_snaps_on_goal_flip() {
        let mut solver = RotationSolver::new(0.0);
        // Goal 90 degrees away, modest target rate: the intermediate target
        // moves a bounded step, the actor trails it.
        let yaw = solver.smooth(0.0, 90.0, 300.0, 10.0, 1.0 / 60.0);
        assert!((solver.target_yaw() - 5.0).abs() < 1e-3);
        assert!(yaw > 0.0 && yaw < 5.0);
    }

    #[test]
    fn grounded_velocity_mode_turns_toward_velocity_heading() {
        let rate_curve = curve();
        let mut ctx = inputs(&rate_curve);
        ctx.last_velocity_yaw = 45.0;

        let mut solver = RotationSolver::new(0.0);
        let mut yaw = 0.0;
        for _ in 0..120 {
            yaw = solver.update_grounded(yaw, &ctx);
        }
        assert!((yaw - 45.0).abs() < 1.0, "yaw should converge on velocity heading, got {yaw}");
    }

    #[test]
    fn looking_mode_applies_yaw_offset_below_sprint() {
        let rate_curve = curve();
        let anim = CurveAnim { yaw_offset: -8.0, rotation_amount: 0.0 };
        let mut ctx = inputs(&rate_curve);
        ctx.rotation_mode = RotationMode::LookingDirection;
        ctx.aim_yaw = 30.0;
        ctx.anim = Some(&anim);

        let mut solver = RotationSolver::new(0.0);
        let mut yaw = 0.0;
        for _ in 0..240 {
            yaw = solver.update_grounded(yaw, &ctx);
        }
        assert!((yaw - 22.0).abs() < 1.0, "expected aim+offset, got {yaw}");
    }

    #[test]
    fn looking_mode_sprint_follows_velocity_not_aim() {
        let rate_curve = curve();
        let mut ctx = inputs(&rate_curve);
        ctx.rotation_mode = RotationMode::LookingDirection;
        ctx.gait = Gait::Sprinting;
        ctx.aim_yaw = 90.0;
        ctx.last_velocity_yaw = 10.0;

        let mut solver = RotationSolver::new(0.0);
        let mut yaw = 0.0;
        for _ in 0..240 {
            yaw = solver.update_grounded(yaw, &ctx);
        }
        assert!((yaw - 10.0).abs() < 1.0, "sprint should track velocity, got {yaw}");
    }

    #[test]
    fn stationary_within_window_holds_still() {
        let rate_curve = curve();
        let mut ctx = inputs(&rate_curve);
        ctx.rotation_mode = RotationMode::Aiming;
        ctx.is_moving = false;
        ctx.has_movement_input = false;
        ctx.speed = 0.0;
        ctx.aim_yaw = 50.0; // within +-100 of actor

        let mut solver = RotationSolver::new(0.0);
        let yaw = solver.update_grounded(0.0, &ctx);
        assert_eq!(yaw, 0.0);
    }

    #[test]
    fn stationary_beyond_window_corrects_toward_edge() {
        let rate_curve = curve();
        let mut ctx = inputs(&rate_curve);
        ctx.rotation_mode = RotationMode::Aiming;
        ctx.is_moving = false;
        ctx.has_movement_input = false;
        ctx.speed = 0.0;
        ctx.aim_yaw = 120.0; // 120 > +100 window

        let mut solver = RotationSolver::new(0.0);
        let mut yaw = 0.0;
        for _ in 0..240 {
            yaw = solver.update_grounded(yaw, &ctx);
        }
        // Settles at aim_yaw + LIMIT_YAW_MIN = 20.
        assert!((yaw - 20.0).abs() < 1.0, "expected clamp correction to 20, got {yaw}");
    }

    #[test]
    fn turn_in_place_scales_curve_to_frame_rate() {
        let rate_curve = curve();
        let anim = CurveAnim { yaw_offset: 0.0, rotation_amount: 2.0 };
        let mut ctx = inputs(&rate_curve);
        ctx.is_moving = false;
        ctx.has_movement_input = false;
        ctx.speed = 0.0;
        ctx.anim = Some(&anim);

        let mut solver = RotationSolver::new(0.0);
        // dt of exactly one 30fps frame applies the raw curve amount.
        ctx.dt = 1.0 / 30.0;
        let yaw = solver.update_grounded(0.0, &ctx);
        assert!((yaw - 2.0).abs() < 1e-4);
        // Turn-in-place writes through to the smoothing target as well.
        assert_eq!(solver.target_yaw(), yaw);
    }

    #[test]
    fn in_air_holds_cached_heading_and_aiming_refreshes_it() {
        let rate_curve = curve();
        let mut ctx = inputs(&rate_curve);

        let mut solver = RotationSolver::new(0.0);
        solver.set_in_air_yaw(60.0);
        let mut yaw = 0.0;
        for _ in 0..600 {
            yaw = solver.update_in_air(yaw, &ctx);
        }
        assert!((yaw - 60.0).abs() < 1.0, "should converge on cached heading, got {yaw}");

        ctx.rotation_mode = RotationMode::Aiming;
        ctx.aim_yaw = -30.0;
        for _ in 0..600 {
            yaw = solver.update_in_air(yaw, &ctx);
        }
        assert!((yaw + 30.0).abs() < 1.0);
        assert!((solver.in_air_yaw() + 30.0).abs() < 1.0, "aiming must refresh the cached heading");
    }

    #[test]
    fn jump_seed_uses_velocity_heading_only_at_speed() {
        let mut solver = RotationSolver::new(0.0);
        solver.seed_in_air_from_jump(250.0, 75.0, 10.0);
        assert_eq!(solver.in_air_yaw(), 75.0);

        solver.seed_in_air_from_jump(50.0, 75.0, 10.0);
        assert_eq!(solver.in_air_yaw(), 10.0);
    }

    #[test]
    fn rolling_steers_toward_input_at_reduced_rate() {
        let rate_curve = curve();
        let mut ctx = inputs(&rate_curve);
        ctx.movement_action = MovementAction::Rolling;
        ctx.last_input_yaw = 90.0;

        let mut solver = RotationSolver::new(0.0);
        let yaw = solver.update_grounded(0.0, &ctx);
        assert!(yaw > 0.0 && yaw < 5.0, "roll turn should be slow, got {yaw}");

        // Networked games skip roll steering entirely.
        ctx.networked = true;
        let mut solver = RotationSolver::new(0.0);
        assert_eq!(solver.update_grounded(0.0, &ctx), 0.0);
    }

    #[test]
    fn aim_yaw_rate_scales_rotation_rate_into_1_to_3() {
        let rate_curve = FloatCurve::constant(5.0);
        assert_eq!(grounded_rotation_rate(&rate_curve, 0.0, 0.0), 5.0);
        assert_eq!(grounded_rotation_rate(&rate_curve, 0.0, 150.0), 10.0);
        assert_eq!(grounded_rotation_rate(&rate_curve, 0.0, 300.0), 15.0);
        // Clamped above the window.
        assert_eq!(grounded_rotation_rate(&rate_curve, 0.0, 900.0), 15.0);
    }
}
