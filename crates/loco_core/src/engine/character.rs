//! The per-character locomotion aggregate.
//!
//! `Character` composes the state machine, the rotation solver, the ragdoll
//! controller and the prediction core, and orchestrates one simulation step:
//! intent capture, essential-value derivation, state update, then rotation or
//! ragdoll reconciliation. The physics integrator consumes the resulting
//! movement caps and actor transform.
//!
//! Replication model: exactly one `Authority` instance is the source of
//! truth. A locally controlled `AutonomousProxy` predicts ahead and forwards
//! every intent change as a request; the authority applies it and confirms
//! the committed value to the mirrors. The authority's value always wins.

use std::sync::Arc;

use log::{debug, trace};

use crate::config::LocomotionConfig;
use crate::engine::constants::{gait as gait_consts, landing, rotation as rot_consts};
use crate::engine::debug_settings::DebugSettings;
use crate::engine::events::{EventQueue, LocomotionEvent};
use crate::engine::input::{DoubleTapTracker, HoldRelease, HoldTracker};
use crate::engine::interfaces::{
    AnimFeed, AnimationLink, CameraBehavior, Montage, PhysicsLink, RagdollBody,
};
use crate::engine::math::{
    horizontal_speed, interp_yaw_to, normalize_yaw, yaw_delta, yaw_from_vector, Vec3,
};
use crate::engine::ragdoll::{RagdollController, RagdollExit};
use crate::engine::rotation::{RotationInputs, RotationSolver};
use crate::engine::settings::MovementSettings;
use crate::engine::types::{
    Gait, MoveMode, MovementAction, MovementState, OverlayState, RotationMode, Stance, ViewMode,
};
use crate::models::CharacterStatus;
use crate::prediction::move_record::{MoveHistory, SavedMove};
use crate::prediction::movement_core::MovementCore;
use crate::prediction::replication::{NetRole, ReplicationCall, ReplicationLink};

/// External collaborators, lent to the character for one call.
pub struct Links<'a> {
    pub physics: &'a mut dyn PhysicsLink,
    pub body: Option<&'a mut dyn RagdollBody>,
    pub anim: Option<&'a mut dyn AnimationLink>,
    pub replication: &'a mut dyn ReplicationLink,
}

/// Movement caps the physics integrator reads every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementCaps {
    pub max_speed: f32,
    pub max_acceleration: f32,
    pub braking_deceleration: f32,
    pub ground_friction: f32,
}

/// Spawn-time parameters.
#[derive(Debug, Clone)]
pub struct CharacterParams {
    pub config: LocomotionConfig,
    pub debug: Arc<DebugSettings>,
    pub role: NetRole,
    pub locally_controlled: bool,
    /// True in any networked session; gates the roll-steering path and the
    /// confirm broadcasts.
    pub networked: bool,
    pub status: CharacterStatus,
    pub desired_gait: Gait,
    pub desired_stance: Stance,
    pub desired_rotation_mode: RotationMode,
    pub view_mode: ViewMode,
    pub overlay_state: OverlayState,
    pub location: Vec3,
    pub yaw: f32,
}

impl Default for CharacterParams {
    fn default() -> Self {
        Self {
            config: LocomotionConfig::default(),
            debug: Arc::new(DebugSettings::default()),
            role: NetRole::Authority,
            locally_controlled: true,
            networked: false,
            status: CharacterStatus::default(),
            desired_gait: Gait::Running,
            desired_stance: Stance::Standing,
            desired_rotation_mode: RotationMode::LookingDirection,
            view_mode: ViewMode::ThirdPerson,
            overlay_state: OverlayState::default(),
            location: Vec3::zeros(),
            yaw: 0.0,
        }
    }
}

pub struct Character {
    config: LocomotionConfig,
    debug: Arc<DebugSettings>,
    role: NetRole,
    locally_controlled: bool,
    networked: bool,

    status: CharacterStatus,

    // State machine.
    movement_state: MovementState,
    prev_movement_state: MovementState,
    movement_action: MovementAction,
    stance: Stance,
    desired_stance: Stance,
    gait: Gait,
    desired_gait: Gait,
    rotation_mode: RotationMode,
    desired_rotation_mode: RotationMode,
    view_mode: ViewMode,
    overlay_state: OverlayState,

    // Actor pose.
    location: Vec3,
    yaw: f32,

    // Essential per-frame values.
    sim_time: f32,
    acceleration: Vec3,
    replicated_acceleration: Vec3,
    replicated_control_yaw: f32,
    control_yaw: f32,
    control_pitch: f32,
    eased_max_acceleration: f32,
    aim_yaw: f32,
    prev_aim_yaw: f32,
    aim_yaw_rate: f32,
    previous_velocity: Vec3,
    speed: f32,
    is_moving: bool,
    has_movement_input: bool,
    movement_input_amount: f32,
    last_velocity_yaw: f32,
    last_input_yaw: f32,

    // Components.
    movement: MovementCore,
    rotation: RotationSolver,
    ragdoll: RagdollController,
    history: MoveHistory,

    // Write-only mirrors.
    camera: CameraBehavior,
    anim_feed: AnimFeed,

    events: EventQueue,

    // Input state.
    move_forward: f32,
    move_right: f32,
    stance_tap: DoubleTapTracker,
    camera_hold: HoldTracker,
    right_shoulder: bool,

    // Simulation-time countdowns.
    roll_remaining: f32,
    land_friction_remaining: f32,

    observed_move_mode: MoveMode,

    /// Set while applying an inbound replication call, so setters do not
    /// forward the change back out.
    applying_remote: bool,
}

impl Character {
    pub fn new(params: CharacterParams) -> Self {
        let settings = params
            .config
            .movement_model
            .settings(params.desired_rotation_mode, params.desired_stance)
            .clone();
        let yaw = normalize_yaw(params.yaw);
        Self {
            movement: MovementCore::new(settings),
            rotation: RotationSolver::new(yaw),
            ragdoll: RagdollController::new(params.config.ragdoll.reversed_pelvis),
            history: MoveHistory::default(),
            stance_tap: DoubleTapTracker::new(params.config.input.roll_double_tap_timeout),
            camera_hold: HoldTracker::new(params.config.input.view_mode_hold_time),
            status: params.status,
            role: params.role,
            locally_controlled: params.locally_controlled,
            networked: params.networked,
            movement_state: MovementState::None,
            prev_movement_state: MovementState::None,
            movement_action: MovementAction::None,
            stance: params.desired_stance,
            desired_stance: params.desired_stance,
            gait: params.desired_gait,
            desired_gait: params.desired_gait,
            rotation_mode: params.desired_rotation_mode,
            desired_rotation_mode: params.desired_rotation_mode,
            view_mode: params.view_mode,
            overlay_state: params.overlay_state,
            location: params.location,
            yaw,
            sim_time: 0.0,
            acceleration: Vec3::zeros(),
            replicated_acceleration: Vec3::zeros(),
            replicated_control_yaw: yaw,
            control_yaw: yaw,
            control_pitch: 0.0,
            eased_max_acceleration: 0.0,
            aim_yaw: yaw,
            prev_aim_yaw: yaw,
            aim_yaw_rate: 0.0,
            previous_velocity: Vec3::zeros(),
            speed: 0.0,
            is_moving: false,
            has_movement_input: false,
            movement_input_amount: 0.0,
            last_velocity_yaw: yaw,
            last_input_yaw: yaw,
            camera: CameraBehavior::default(),
            anim_feed: AnimFeed::default(),
            events: EventQueue::new(),
            move_forward: 0.0,
            move_right: 0.0,
            right_shoulder: true,
            roll_remaining: 0.0,
            land_friction_remaining: 0.0,
            observed_move_mode: MoveMode::None,
            applying_remote: false,
            debug: params.debug,
            config: params.config,
        }
    }

    /// One-time startup: force every state through its change hook so the
    /// mirrors and settings match the desired values, then seed rotation.
    pub fn begin_play(&mut self, links: &mut Links) {
        self.resync(links);
        self.rotation.sync(self.yaw);
        self.movement.set_movement_settings(self.target_movement_settings());
        self.observe_move_mode(links);
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn movement_state(&self) -> MovementState {
        self.movement_state
    }

    pub fn movement_action(&self) -> MovementAction {
        self.movement_action
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn desired_stance(&self) -> Stance {
        self.desired_stance
    }

    pub fn gait(&self) -> Gait {
        self.gait
    }

    pub fn desired_gait(&self) -> Gait {
        self.desired_gait
    }

    pub fn rotation_mode(&self) -> RotationMode {
        self.rotation_mode
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.overlay_state
    }

    pub fn role(&self) -> NetRole {
        self.role
    }

    pub fn is_locally_controlled(&self) -> bool {
        self.locally_controlled
    }

    pub fn is_networked(&self) -> bool {
        self.networked
    }

    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn aim_yaw(&self) -> f32 {
        self.aim_yaw
    }

    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    pub fn is_ragdolling(&self) -> bool {
        self.ragdoll.is_active()
    }

    pub fn right_shoulder(&self) -> bool {
        self.right_shoulder
    }

    pub fn status(&self) -> &CharacterStatus {
        &self.status
    }

    pub fn set_status(&mut self, status: CharacterStatus) {
        self.status = status;
    }

    pub fn camera_behavior(&self) -> &CameraBehavior {
        &self.camera
    }

    pub fn anim_feed(&self) -> &AnimFeed {
        &self.anim_feed
    }

    pub fn movement_core(&self) -> &MovementCore {
        &self.movement
    }

    pub fn ragdoll_controller(&self) -> &RagdollController {
        &self.ragdoll
    }

    pub fn move_history(&self) -> &MoveHistory {
        &self.history
    }

    /// Drain pending notifications; call exactly once per simulation step.
    pub fn drain_events(&mut self) -> Vec<LocomotionEvent> {
        self.events.drain()
    }

    /// The caps the physics integrator applies this step.
    pub fn movement_caps(&self) -> MovementCaps {
        let on_ground = self.observed_move_mode == MoveMode::Walking;
        MovementCaps {
            max_speed: self.movement.max_speed(Some(&self.status)),
            max_acceleration: self.movement.max_acceleration(self.speed, on_ground),
            braking_deceleration: self.movement.braking_deceleration(self.speed, on_ground),
            ground_friction: self.movement.ground_friction(self.speed),
        }
    }

    // -----------------------------------------------------------------
    // Simulation step
    // -----------------------------------------------------------------

    pub fn tick(&mut self, dt: f32, links: &mut Links) {
        if dt <= 0.0 {
            return;
        }
        self.sim_time += dt;

        self.update_timers(dt, links);
        self.observe_move_mode(links);
        self.update_essential_values(dt, links);

        match self.movement_state {
            MovementState::Grounded => {
                self.update_character_movement(links);
                self.update_grounded_rotation(dt, links);
            }
            MovementState::InAir => {
                self.update_in_air_rotation(dt, links);
            }
            MovementState::Ragdoll => {
                if let Some(body) = links.body.as_deref_mut() {
                    let pose = self.ragdoll.update(
                        dt,
                        self.locally_controlled,
                        self.role,
                        links.physics,
                        body,
                        links.replication,
                    );
                    self.location = pose.location;
                    self.yaw = pose.yaw;
                    self.rotation.sync(self.yaw);
                }
            }
            MovementState::None => {}
        }

        // Capture the move before the pending-settings flag is consumed so
        // the authority replays from the same state.
        if self.locally_controlled && self.role.is_autonomous_proxy() {
            let saved =
                self.movement
                    .make_move(self.sim_time, dt, self.replicated_acceleration);
            self.history.record(saved);
        }
        self.movement.on_movement_updated();

        self.previous_velocity = links.physics.velocity();
        self.prev_aim_yaw = self.aim_yaw;
        self.sync_anim_feed();
    }

    fn update_timers(&mut self, dt: f32, links: &mut Links) {
        if self.camera_hold.poll(self.sim_time) {
            let next = match self.view_mode {
                ViewMode::FirstPerson => ViewMode::ThirdPerson,
                ViewMode::ThirdPerson => ViewMode::FirstPerson,
            };
            self.set_view_mode(next, false, links);
        }

        if self.roll_remaining > 0.0 {
            self.roll_remaining -= dt;
            if self.roll_remaining <= 0.0 {
                self.roll_remaining = 0.0;
                if self.movement_action == MovementAction::Rolling {
                    self.set_movement_action(MovementAction::None, false, links);
                }
            }
        }

        if self.land_friction_remaining > 0.0 {
            self.land_friction_remaining -= dt;
            if self.land_friction_remaining <= 0.0 {
                self.land_friction_remaining = 0.0;
                links.physics.set_braking_friction_factor(0.0);
            }
        }
    }

    /// Map the integrator's movement-mode signal onto the movement state.
    fn observe_move_mode(&mut self, links: &mut Links) {
        let mode = links.physics.move_mode();
        if mode == self.observed_move_mode {
            return;
        }
        let previous = self.observed_move_mode;
        self.observed_move_mode = mode;

        match mode {
            MoveMode::Walking => {
                self.set_movement_state(MovementState::Grounded, false, links);
                if previous == MoveMode::Falling {
                    self.on_landed(links);
                }
            }
            MoveMode::Falling => {
                self.set_movement_state(MovementState::InAir, false, links);
            }
            // Ragdoll entry clears the mode itself; nothing to map.
            MoveMode::None => {}
        }
    }

    fn update_essential_values(&mut self, dt: f32, links: &mut Links) {
        let on_ground = self.observed_move_mode == MoveMode::Walking;

        if !self.role.is_simulated_proxy() {
            self.replicated_acceleration = links.physics.input_acceleration();
            self.replicated_control_yaw = self.control_yaw;
            self.eased_max_acceleration = self.movement.max_acceleration(self.speed, on_ground);
        } else {
            // Mirrors see replicated values; a transient zero from the
            // network decays instead of snapping.
            let max_acceleration = self.movement.max_acceleration(self.speed, on_ground);
            self.eased_max_acceleration = if max_acceleration != 0.0 {
                max_acceleration
            } else {
                self.eased_max_acceleration / 2.0
            };
        }

        self.aim_yaw = interp_yaw_to(
            self.aim_yaw,
            self.replicated_control_yaw,
            dt,
            rot_consts::AIM_SMOOTH_RATE,
        );

        let current_velocity = links.physics.velocity();

        let observed = (current_velocity - self.previous_velocity) / dt;
        self.acceleration = if observed != Vec3::zeros() || self.locally_controlled {
            observed
        } else {
            self.acceleration / 2.0
        };

        self.speed = horizontal_speed(&current_velocity);
        self.is_moving = self.speed > gait_consts::MOVING_SPEED_EPSILON;
        if self.is_moving {
            self.last_velocity_yaw = yaw_from_vector(&current_velocity);
        }

        self.movement_input_amount = if self.eased_max_acceleration > 0.0 {
            self.replicated_acceleration.norm() / self.eased_max_acceleration
        } else {
            0.0
        };
        self.has_movement_input = self.movement_input_amount > 0.0;
        if self.has_movement_input {
            self.last_input_yaw = yaw_from_vector(&self.replicated_acceleration);
        }

        self.aim_yaw_rate = (yaw_delta(self.aim_yaw, self.prev_aim_yaw) / dt).abs();
    }

    /// Grounded gait resolution: allowed gait from policy, actual gait from
    /// true speed, and the allowed-gait cap pushed into the movement core.
    fn update_character_movement(&mut self, links: &mut Links) {
        let allowed = self.allowed_gait();
        let actual = self.actual_gait(allowed);
        if actual != self.gait {
            self.set_gait(actual, false, links);
        }

        if self.locally_controlled {
            if self.movement.request_allowed_gait(allowed) && self.role.is_autonomous_proxy() {
                links.replication.request(ReplicationCall::SetAllowedGait(allowed));
            }
        } else if !self.role.is_authority() {
            self.movement.apply_allowed_gait(allowed);
        }
    }

    fn update_grounded_rotation(&mut self, dt: f32, links: &mut Links) {
        if self.debug.trace_rotation {
            trace!(
                "grounded rotation: yaw={:.1} target={:.1} mode={}",
                self.yaw,
                self.rotation.target_yaw(),
                self.rotation_mode.name()
            );
        }
        let settings = self.movement.settings();
        let inputs = RotationInputs {
            dt,
            rotation_mode: self.rotation_mode,
            gait: self.gait,
            view_mode: self.view_mode,
            movement_action: self.movement_action,
            has_movement_input: self.has_movement_input,
            is_moving: self.is_moving,
            speed: self.speed,
            mapped_speed: settings.mapped_speed(self.speed),
            aim_yaw: self.aim_yaw,
            aim_yaw_rate: self.aim_yaw_rate,
            last_velocity_yaw: self.last_velocity_yaw,
            last_input_yaw: self.last_input_yaw,
            rotation_rate_curve: &settings.rotation_rate_curve,
            networked: self.networked,
            anim: links.anim.as_deref(),
        };
        self.yaw = self.rotation.update_grounded(self.yaw, &inputs);
    }

    fn update_in_air_rotation(&mut self, dt: f32, links: &mut Links) {
        let settings = self.movement.settings();
        let inputs = RotationInputs {
            dt,
            rotation_mode: self.rotation_mode,
            gait: self.gait,
            view_mode: self.view_mode,
            movement_action: self.movement_action,
            has_movement_input: self.has_movement_input,
            is_moving: self.is_moving,
            speed: self.speed,
            mapped_speed: settings.mapped_speed(self.speed),
            aim_yaw: self.aim_yaw,
            aim_yaw_rate: self.aim_yaw_rate,
            last_velocity_yaw: self.last_velocity_yaw,
            last_input_yaw: self.last_input_yaw,
            rotation_rate_curve: &settings.rotation_rate_curve,
            networked: self.networked,
            anim: links.anim.as_deref(),
        };
        self.yaw = self.rotation.update_in_air(self.yaw, &inputs);
    }

    fn sync_anim_feed(&mut self) {
        self.anim_feed.speed = self.speed;
        self.anim_feed.is_moving = self.is_moving;
        self.anim_feed.has_movement_input = self.has_movement_input;
        self.anim_feed.movement_input_amount = self.movement_input_amount;
        self.anim_feed.aim_yaw = self.aim_yaw;
        self.anim_feed.aim_pitch = self.control_pitch;
        self.anim_feed.aim_yaw_rate = self.aim_yaw_rate;
        self.anim_feed.acceleration = self.acceleration;
        self.anim_feed.overlay_raw = self.overlay_state.0;
    }

    // -----------------------------------------------------------------
    // Gait resolution
    // -----------------------------------------------------------------

    /// The maximum gait policy currently permits.
    pub fn allowed_gait(&self) -> Gait {
        if self.stance == Stance::Standing && !self.rotation_mode.is_aiming() {
            if self.desired_gait == Gait::Sprinting {
                return if self.can_sprint() { Gait::Sprinting } else { Gait::Running };
            }
            return self.desired_gait;
        }

        // Crouching and aiming share a sprint-less ceiling.
        if self.desired_gait == Gait::Sprinting {
            Gait::Running
        } else {
            self.desired_gait
        }
    }

    /// The gait the character is physically exhibiting, with a hysteresis
    /// band so speeds hovering at a threshold do not flicker.
    pub fn actual_gait(&self, allowed: Gait) -> Gait {
        actual_gait_for(self.movement.settings(), self.speed, allowed)
    }

    /// Sprinting needs near-full stick and, in looking-direction mode, input
    /// roughly aligned with the camera.
    pub fn can_sprint(&self) -> bool {
        if !self.has_movement_input || self.rotation_mode.is_aiming() {
            return false;
        }

        let valid_input = self.movement_input_amount > gait_consts::SPRINT_INPUT_THRESHOLD;

        match self.rotation_mode {
            RotationMode::VelocityDirection => valid_input,
            RotationMode::LookingDirection => {
                let input_yaw = yaw_from_vector(&self.replicated_acceleration);
                valid_input
                    && yaw_delta(input_yaw, self.aim_yaw).abs() < gait_consts::SPRINT_AIM_CONE_DEG
            }
            RotationMode::Aiming => false,
        }
    }

    fn target_movement_settings(&self) -> MovementSettings {
        self.config
            .movement_model
            .settings(self.rotation_mode, self.stance)
            .clone()
    }

    // -----------------------------------------------------------------
    // State setters
    // -----------------------------------------------------------------

    pub fn set_movement_state(&mut self, new_state: MovementState, force: bool, links: &mut Links) {
        if force || self.movement_state != new_state {
            self.prev_movement_state = self.movement_state;
            self.movement_state = new_state;
            self.on_movement_state_changed(links);
        }
    }

    fn on_movement_state_changed(&mut self, links: &mut Links) {
        let previous = self.prev_movement_state;
        if self.debug.trace_transitions {
            trace!("movement state {} -> {}", previous.name(), self.movement_state.name());
        }

        self.anim_feed.prev_movement_state = previous;
        self.anim_feed.movement_state = self.movement_state;

        if self.movement_state == MovementState::InAir {
            match self.movement_action {
                MovementAction::None => {
                    // Entering the air: hold the current heading and stand up.
                    self.rotation.set_in_air_yaw(self.yaw);
                    if self.stance == Stance::Crouching {
                        self.un_crouch(links);
                    }
                }
                MovementAction::Rolling => {
                    // A roll interrupted by a fall becomes a ragdoll.
                    self.ragdoll_start_replicated(links);
                }
            }
        }

        self.camera.movement_state = self.movement_state;
        self.events.push(LocomotionEvent::MovementStateChanged {
            previous,
            current: self.movement_state,
        });
    }

    pub fn set_movement_action(
        &mut self,
        new_action: MovementAction,
        force: bool,
        links: &mut Links,
    ) {
        if force || self.movement_action != new_action {
            let previous = self.movement_action;
            self.movement_action = new_action;
            self.on_movement_action_changed(previous, links);
        }
    }

    fn on_movement_action_changed(&mut self, previous: MovementAction, links: &mut Links) {
        self.anim_feed.movement_action = self.movement_action;

        if self.movement_action == MovementAction::Rolling {
            self.crouch(links);
        }

        if previous == MovementAction::Rolling {
            match self.desired_stance {
                Stance::Standing => self.un_crouch(links),
                Stance::Crouching => self.crouch(links),
            }
        }

        self.camera.movement_action = self.movement_action;
        self.events.push(LocomotionEvent::MovementActionChanged {
            previous,
            current: self.movement_action,
        });
    }

    pub fn set_stance(&mut self, new_stance: Stance, force: bool, links: &mut Links) {
        if force || self.stance != new_stance {
            let previous = self.stance;
            self.stance = new_stance;
            self.on_stance_changed(previous, links);
        }
    }

    fn on_stance_changed(&mut self, previous: Stance, _links: &mut Links) {
        self.anim_feed.stance = self.stance;
        self.camera.stance = self.stance;
        self.movement.set_movement_settings(self.target_movement_settings());
        self.events.push(LocomotionEvent::StanceChanged { previous, current: self.stance });
    }

    pub fn set_gait(&mut self, new_gait: Gait, force: bool, links: &mut Links) {
        if force || self.gait != new_gait {
            let previous = self.gait;
            self.gait = new_gait;
            self.on_gait_changed(previous, links);
        }
    }

    fn on_gait_changed(&mut self, previous: Gait, _links: &mut Links) {
        self.anim_feed.gait = self.gait;
        self.camera.gait = self.gait;
        self.events.push(LocomotionEvent::GaitChanged { previous, current: self.gait });
    }

    pub fn set_rotation_mode(&mut self, new_mode: RotationMode, force: bool, links: &mut Links) {
        if force || self.rotation_mode != new_mode {
            let previous = self.rotation_mode;
            self.rotation_mode = new_mode;
            self.on_rotation_mode_changed(previous, links);
            self.forward(links, ReplicationCall::SetRotationMode { mode: new_mode, force });
        }
    }

    fn on_rotation_mode_changed(&mut self, previous: RotationMode, links: &mut Links) {
        self.anim_feed.rotation_mode = self.rotation_mode;

        if self.rotation_mode.is_velocity_direction() && self.view_mode.is_first_person() {
            // First-person locomotion never uses velocity-direction facing.
            self.set_view_mode(ViewMode::ThirdPerson, false, links);
        }

        self.camera.rotation_mode = self.rotation_mode;
        self.movement.set_movement_settings(self.target_movement_settings());
        self.events.push(LocomotionEvent::RotationModeChanged {
            previous,
            current: self.rotation_mode,
        });
    }

    pub fn set_view_mode(&mut self, new_mode: ViewMode, force: bool, links: &mut Links) {
        if force || self.view_mode != new_mode {
            let previous = self.view_mode;
            self.view_mode = new_mode;
            self.on_view_mode_changed(previous, links);
            self.forward(links, ReplicationCall::SetViewMode { mode: new_mode, force });
        }
    }

    fn on_view_mode_changed(&mut self, previous: ViewMode, links: &mut Links) {
        self.anim_feed.view_mode = self.view_mode;

        match self.view_mode {
            ViewMode::ThirdPerson => {
                if matches!(
                    self.rotation_mode,
                    RotationMode::VelocityDirection | RotationMode::LookingDirection
                ) {
                    // Back in third person: re-assert the desired mode.
                    self.set_rotation_mode(self.desired_rotation_mode, false, links);
                }
            }
            ViewMode::FirstPerson => {
                if self.rotation_mode.is_velocity_direction() {
                    self.set_rotation_mode(RotationMode::LookingDirection, false, links);
                }
            }
        }

        self.camera.view_mode = self.view_mode;
        self.events
            .push(LocomotionEvent::ViewModeChanged { previous, current: self.view_mode });
    }

    pub fn set_overlay_state(&mut self, new_state: OverlayState, force: bool, links: &mut Links) {
        if force || self.overlay_state != new_state {
            let previous = self.overlay_state;
            self.overlay_state = new_state;
            self.anim_feed.overlay_raw = new_state.0;
            self.events
                .push(LocomotionEvent::OverlayStateChanged { previous, current: new_state });
            self.forward(links, ReplicationCall::SetOverlayState { state: new_state, force });
        }
    }

    pub fn set_desired_stance(&mut self, stance: Stance, links: &mut Links) {
        self.desired_stance = stance;
        self.forward(links, ReplicationCall::SetDesiredStance(stance));
    }

    pub fn set_desired_gait(&mut self, gait: Gait, links: &mut Links) {
        self.desired_gait = gait;
        self.forward(links, ReplicationCall::SetDesiredGait(gait));
    }

    pub fn set_desired_rotation_mode(&mut self, mode: RotationMode, links: &mut Links) {
        self.desired_rotation_mode = mode;
        self.forward(links, ReplicationCall::SetDesiredRotationMode(mode));
    }

    /// Re-apply every state through its change hook. Used at spawn and when
    /// a late-joining mirror needs a full resync.
    pub fn resync(&mut self, links: &mut Links) {
        self.set_gait(self.desired_gait, true, links);
        self.set_stance(self.desired_stance, true, links);
        self.set_rotation_mode(self.desired_rotation_mode, true, links);
        self.set_view_mode(self.view_mode, true, links);
        self.set_overlay_state(self.overlay_state, true, links);
        self.set_movement_state(self.movement_state, true, links);
        self.set_movement_action(self.movement_action, true, links);
    }

    /// Route an intent change to the peers that need it: proxies request,
    /// the authority confirms.
    fn forward(&mut self, links: &mut Links, call: ReplicationCall) {
        if self.applying_remote && !self.role.is_authority() {
            return;
        }
        match self.role {
            NetRole::AutonomousProxy => links.replication.request(call),
            NetRole::Authority => {
                if self.networked {
                    links.replication.confirm(call);
                }
            }
            NetRole::SimulatedProxy => {}
        }
    }

    // -----------------------------------------------------------------
    // Input intents
    // -----------------------------------------------------------------

    pub fn set_movement_input(&mut self, forward: f32, right: f32) {
        self.move_forward = forward.clamp(-1.0, 1.0);
        self.move_right = right.clamp(-1.0, 1.0);
    }

    pub fn add_look_input(&mut self, yaw: f32, pitch: f32) {
        self.control_yaw =
            normalize_yaw(self.control_yaw + yaw * self.config.input.look_yaw_rate);
        self.control_pitch =
            (self.control_pitch + pitch * self.config.input.look_pitch_rate).clamp(-90.0, 90.0);
    }

    pub fn set_control_rotation(&mut self, yaw: f32, pitch: f32) {
        self.control_yaw = normalize_yaw(yaw);
        self.control_pitch = pitch.clamp(-90.0, 90.0);
    }

    /// World-space movement intent, relative to the aim yaw.
    pub fn movement_input_world(&self) -> Vec3 {
        let forward = crate::engine::math::vector_from_yaw(self.aim_yaw) * self.move_forward;
        let right = crate::engine::math::right_from_yaw(self.aim_yaw) * self.move_right;
        let combined = forward + right;
        let len = combined.norm();
        if len > 1.0 {
            combined / len
        } else {
            combined
        }
    }

    pub fn jump_pressed(&mut self, links: &mut Links) {
        self.events.push(LocomotionEvent::JumpPressed);

        if !self.movement_action.is_none() {
            return;
        }

        match self.movement_state {
            MovementState::Grounded => match self.stance {
                Stance::Standing => {
                    links.physics.jump();
                    self.on_jumped();
                }
                Stance::Crouching => self.un_crouch(links),
            },
            MovementState::Ragdoll => self.ragdoll_end_replicated(links),
            _ => {}
        }
    }

    pub fn jump_released(&mut self, links: &mut Links) {
        links.physics.stop_jump();
    }

    fn on_jumped(&mut self) {
        self.rotation
            .seed_in_air_from_jump(self.speed, self.last_velocity_yaw, self.yaw);
        self.events.push(LocomotionEvent::Jumped);
    }

    pub fn sprint_pressed(&mut self, links: &mut Links) {
        self.set_desired_gait(Gait::Sprinting, links);
        self.movement.start_sprint();
    }

    pub fn sprint_released(&mut self, links: &mut Links) {
        self.set_desired_gait(Gait::Running, links);
        self.movement.stop_sprint();
    }

    pub fn aim_pressed(&mut self, links: &mut Links) {
        self.set_rotation_mode(RotationMode::Aiming, false, links);
        self.movement.start_aim_down_sights();
    }

    pub fn aim_released(&mut self, links: &mut Links) {
        match self.view_mode {
            ViewMode::ThirdPerson => {
                self.set_rotation_mode(self.desired_rotation_mode, false, links)
            }
            ViewMode::FirstPerson => {
                self.set_rotation_mode(RotationMode::LookingDirection, false, links)
            }
        }
        self.movement.stop_aim_down_sights();
    }

    /// Stance action: toggle standing/crouching, double-tap to roll.
    pub fn stance_pressed(&mut self, links: &mut Links) {
        if !self.movement_action.is_none() {
            return;
        }

        if self.stance_tap.press(self.sim_time) {
            // Capture the stance before the roll crouches the character.
            let stance_at_press = self.stance;
            self.roll(1.15, links);
            self.set_desired_stance(stance_at_press.toggled(), links);
            return;
        }

        if self.movement_state.is_grounded() {
            match self.stance {
                Stance::Standing => {
                    self.set_desired_stance(Stance::Crouching, links);
                    self.crouch(links);
                }
                Stance::Crouching => {
                    self.set_desired_stance(Stance::Standing, links);
                    self.un_crouch(links);
                }
            }
        }
    }

    /// Walk action: toggle between walking and running desired gaits.
    pub fn walk_pressed(&mut self, links: &mut Links) {
        match self.desired_gait {
            Gait::Walking => self.set_desired_gait(Gait::Running, links),
            Gait::Running => self.set_desired_gait(Gait::Walking, links),
            Gait::Sprinting => {}
        }
    }

    pub fn ragdoll_pressed(&mut self, links: &mut Links) {
        if self.movement_state.is_ragdoll() {
            self.ragdoll_end_replicated(links);
        } else {
            self.ragdoll_start_replicated(links);
        }
    }

    pub fn velocity_direction_pressed(&mut self, links: &mut Links) {
        self.set_desired_rotation_mode(RotationMode::VelocityDirection, links);
        self.set_rotation_mode(RotationMode::VelocityDirection, false, links);
    }

    pub fn looking_direction_pressed(&mut self, links: &mut Links) {
        self.set_desired_rotation_mode(RotationMode::LookingDirection, links);
        self.set_rotation_mode(RotationMode::LookingDirection, false, links);
    }

    /// Camera action: hold to switch view mode, tap to swap shoulders.
    pub fn camera_pressed(&mut self) {
        self.camera_hold.press(self.sim_time);
    }

    pub fn camera_released(&mut self) {
        if self.view_mode.is_first_person() {
            // No shoulder to swap in first person.
            self.camera_hold.release(self.sim_time);
            return;
        }
        if self.camera_hold.release(self.sim_time) == HoldRelease::Tap {
            self.right_shoulder = !self.right_shoulder;
            self.camera.right_shoulder = self.right_shoulder;
        }
    }

    fn crouch(&mut self, links: &mut Links) {
        self.set_stance(Stance::Crouching, false, links);
    }

    fn un_crouch(&mut self, links: &mut Links) {
        self.set_stance(Stance::Standing, false, links);
    }

    // -----------------------------------------------------------------
    // Rolling, landing
    // -----------------------------------------------------------------

    fn roll(&mut self, play_rate: f32, links: &mut Links) {
        self.play_montage_replicated(Montage::Roll, play_rate, links);
        self.set_movement_action(MovementAction::Rolling, false, links);
        self.roll_remaining = self.config.input.roll_duration;
    }

    fn play_montage_replicated(&mut self, montage: Montage, play_rate: f32, links: &mut Links) {
        if let Some(anim) = links.anim.as_deref_mut() {
            anim.play_montage(montage, play_rate);
        }
        self.forward(links, ReplicationCall::PlayMontage { montage, play_rate });
    }

    fn on_landed(&mut self, links: &mut Links) {
        let vertical_speed = links.physics.velocity().z.abs();
        self.events.push(LocomotionEvent::Landed { vertical_speed });

        if self.config.ragdoll.ragdoll_on_land
            && vertical_speed > self.config.ragdoll.ragdoll_on_land_velocity
        {
            self.ragdoll_start_replicated(links);
        } else if self.config.ragdoll.breakfall_on_land
            && self.has_movement_input
            && vertical_speed >= self.config.ragdoll.breakfall_on_land_velocity
        {
            self.events.push(LocomotionEvent::Breakfall);
            self.roll(1.35, links);
        } else {
            links.physics.set_braking_friction_factor(if self.has_movement_input {
                landing::BRAKING_FACTOR_WITH_INPUT
            } else {
                landing::BRAKING_FACTOR_NO_INPUT
            });
            self.land_friction_remaining = landing::FRICTION_RESET_TIME;
        }
    }

    // -----------------------------------------------------------------
    // Ragdoll lifecycle
    // -----------------------------------------------------------------

    /// Route a ragdoll entry through the authority: the authority starts and
    /// confirms; proxies only request and wait for the confirm.
    pub fn ragdoll_start_replicated(&mut self, links: &mut Links) {
        if self.role.is_authority() {
            if self.networked {
                links.replication.confirm(ReplicationCall::RagdollStart);
            }
            self.ragdoll_start(links);
        } else if !self.applying_remote {
            links.replication.request(ReplicationCall::RagdollStart);
        }
    }

    pub fn ragdoll_end_replicated(&mut self, links: &mut Links) {
        if self.role.is_authority() {
            if self.networked {
                links
                    .replication
                    .confirm(ReplicationCall::RagdollEnd { location: self.location });
            }
            self.ragdoll_end(links);
        } else if !self.applying_remote {
            links
                .replication
                .request(ReplicationCall::RagdollEnd { location: self.location });
        }
    }

    fn ragdoll_start(&mut self, links: &mut Links) {
        if self.ragdoll.is_active() {
            return;
        }
        let Some(body) = links.body.as_deref_mut() else {
            // No simulated skeleton on this peer yet; skip this frame.
            debug!("ragdoll start skipped: no body");
            return;
        };

        if self.debug.trace_ragdoll {
            trace!("ragdoll start: state={} speed={:.0}", self.movement_state.name(), self.speed);
        }
        self.events.push(LocomotionEvent::RagdollStateChanged { active: true });

        // The skeleton now carries position implicitly; stop replicating the
        // actor transform.
        links.replication.set_movement_replication(false);

        self.ragdoll.begin(links.physics, body, links.anim.as_deref_mut());
        self.observed_move_mode = MoveMode::None;
        self.set_movement_state(MovementState::Ragdoll, false, links);

        // A ragdoll entry cancels any in-flight roll.
        if self.movement_action == MovementAction::Rolling {
            self.roll_remaining = 0.0;
            self.set_movement_action(MovementAction::None, false, links);
        }
    }

    fn ragdoll_end(&mut self, links: &mut Links) {
        if !self.ragdoll.is_active() {
            return;
        }
        let Some(body) = links.body.as_deref_mut() else {
            debug!("ragdoll end skipped: no body");
            return;
        };

        let exit = self.ragdoll.end(links.physics, body, links.anim.as_deref_mut());
        links.replication.set_movement_replication(true);

        self.observed_move_mode = links.physics.move_mode();
        match exit {
            RagdollExit::GetUp { .. } => {
                self.set_movement_state(MovementState::Grounded, false, links)
            }
            RagdollExit::Falling => self.set_movement_state(MovementState::InAir, false, links),
        }
        self.rotation.sync(self.yaw);

        self.events.push(LocomotionEvent::RagdollStateChanged { active: false });
    }

    // -----------------------------------------------------------------
    // Replication in
    // -----------------------------------------------------------------

    /// Apply an inbound call from the transport. On the authority this is a
    /// proxy's request (apply, then confirm via the setters); on mirrors and
    /// the controlling peer it is an authority confirm and is applied without
    /// being forwarded again.
    pub fn apply_replication_call(&mut self, call: ReplicationCall, links: &mut Links) {
        self.applying_remote = true;
        match call {
            ReplicationCall::SetDesiredStance(stance) => self.set_desired_stance(stance, links),
            ReplicationCall::SetDesiredGait(gait) => self.set_desired_gait(gait, links),
            ReplicationCall::SetDesiredRotationMode(mode) => {
                self.set_desired_rotation_mode(mode, links)
            }
            ReplicationCall::SetRotationMode { mode, force } => {
                self.set_rotation_mode(mode, force, links)
            }
            ReplicationCall::SetViewMode { mode, force } => self.set_view_mode(mode, force, links),
            ReplicationCall::SetOverlayState { state, force } => {
                self.set_overlay_state(state, force, links)
            }
            ReplicationCall::SetAllowedGait(gait) => {
                self.movement.apply_allowed_gait(gait);
                if self.role.is_authority() && self.networked {
                    links.replication.confirm(ReplicationCall::SetAllowedGait(gait));
                }
            }
            ReplicationCall::PlayMontage { montage, play_rate } => {
                if !self.locally_controlled {
                    if let Some(anim) = links.anim.as_deref_mut() {
                        anim.play_montage(montage, play_rate);
                    }
                }
                if self.role.is_authority() && self.networked {
                    links
                        .replication
                        .confirm(ReplicationCall::PlayMontage { montage, play_rate });
                }
            }
            ReplicationCall::RagdollStart => {
                if self.role.is_authority() {
                    self.ragdoll_start_replicated(links);
                } else {
                    self.ragdoll_start(links);
                }
            }
            ReplicationCall::RagdollEnd { location } => {
                if self.role.is_authority() {
                    self.ragdoll_end_replicated(links);
                } else {
                    let _ = location;
                    self.ragdoll_end(links);
                }
            }
            ReplicationCall::SetRagdollTarget { location } => {
                self.ragdoll.set_target_location(location);
                if self.role.is_authority() && self.networked {
                    links
                        .replication
                        .confirm(ReplicationCall::SetRagdollTarget { location });
                }
            }
        }
        self.applying_remote = false;
    }

    /// Mirrors receive the controlling side's input acceleration and control
    /// rotation as replicated values.
    pub fn set_replicated_movement_values(&mut self, acceleration: Vec3, control_yaw: f32) {
        // A transient zero acceleration from replication decays rather than
        // snapping the mirror's animation.
        self.replicated_acceleration =
            if acceleration != Vec3::zeros() || self.locally_controlled {
                acceleration
            } else {
                self.replicated_acceleration / 2.0
            };
        self.replicated_control_yaw = normalize_yaw(control_yaw);
    }

    // -----------------------------------------------------------------
    // Authority-side move replay
    // -----------------------------------------------------------------

    /// Re-simulate a decoded move on the authority: restore the intent state
    /// the move was made with, then recompute the caps deterministically.
    pub fn apply_saved_move(&mut self, saved: &SavedMove, _links: &mut Links) {
        self.movement.apply_intents(saved.intents);
        self.movement.apply_allowed_gait(saved.allowed_gait);
        self.replicated_acceleration = saved.acceleration;
        self.movement.on_movement_updated();
    }

    /// Drop acknowledged moves from the prediction history.
    pub fn acknowledge_moves(&mut self, timestamp: f32) {
        self.history.acknowledge(timestamp);
    }
}

/// Actual-gait resolution against a settings row. True speed decides; the
/// +hysteresis bands keep a speed hovering at a threshold from flickering
/// between gaits, and `allowed` caps the top tier.
pub fn actual_gait_for(settings: &MovementSettings, speed: f32, allowed: Gait) -> Gait {
    if speed > settings.run_speed + gait_consts::SPEED_HYSTERESIS {
        return if allowed == Gait::Sprinting { Gait::Sprinting } else { Gait::Running };
    }
    if speed >= settings.walk_speed + gait_consts::SPEED_HYSTERESIS {
        return Gait::Running;
    }
    Gait::Walking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scenario::ScenarioPeer;

    const DT: f32 = 1.0 / 60.0;

    fn peer() -> ScenarioPeer {
        let mut peer = ScenarioPeer::spawn_default();
        // Settle the move-mode mapping and discard spawn-time events.
        peer.tick(DT);
        peer.character.drain_events();
        peer
    }

    #[test]
    fn setters_are_idempotent_without_force() {
        let mut peer = peer();
        let gait = peer.character.gait();

        peer.with_links(|character, links| character.set_gait(gait, false, links));
        assert!(peer.character.drain_events().is_empty());

        peer.with_links(|character, links| character.set_gait(gait, true, links));
        let events = peer.character.drain_events();
        assert_eq!(events, vec![LocomotionEvent::GaitChanged { previous: gait, current: gait }]);
    }

    #[test]
    fn stance_change_reselects_movement_settings() {
        let mut peer = peer();
        let standing_walk = peer.character.movement_core().settings().walk_speed;

        peer.with_links(|character, links| character.set_stance(Stance::Crouching, false, links));
        let crouch_walk = peer.character.movement_core().settings().walk_speed;
        assert_ne!(standing_walk, crouch_walk);
    }

    #[test]
    fn first_person_forces_looking_direction() {
        let mut peer = peer();
        peer.with_links(|character, links| {
            character.set_desired_rotation_mode(RotationMode::VelocityDirection, links);
            character.set_rotation_mode(RotationMode::VelocityDirection, false, links);
        });
        assert_eq!(peer.character.rotation_mode(), RotationMode::VelocityDirection);

        peer.with_links(|character, links| {
            character.set_view_mode(ViewMode::FirstPerson, false, links)
        });
        assert_eq!(peer.character.rotation_mode(), RotationMode::LookingDirection);

        // Back in third person the desired mode re-asserts.
        peer.with_links(|character, links| {
            character.set_view_mode(ViewMode::ThirdPerson, false, links)
        });
        assert_eq!(peer.character.rotation_mode(), RotationMode::VelocityDirection);
    }

    #[test]
    fn velocity_direction_in_first_person_flips_to_third() {
        let mut peer = peer();
        peer.with_links(|character, links| {
            character.set_view_mode(ViewMode::FirstPerson, false, links)
        });
        assert_eq!(peer.character.view_mode(), ViewMode::FirstPerson);

        peer.with_links(|character, links| {
            character.set_rotation_mode(RotationMode::VelocityDirection, false, links)
        });
        assert_eq!(peer.character.view_mode(), ViewMode::ThirdPerson);
    }

    #[test]
    fn can_sprint_requires_near_full_input() {
        let mut peer = peer();
        peer.with_links(|character, links| {
            character.set_desired_rotation_mode(RotationMode::VelocityDirection, links);
            character.set_rotation_mode(RotationMode::VelocityDirection, false, links);
        });

        peer.character.set_movement_input(1.0, 0.0);
        peer.tick(DT);
        peer.tick(DT);
        assert!(peer.character.can_sprint());

        peer.character.set_movement_input(0.5, 0.0);
        peer.tick(DT);
        assert!(!peer.character.can_sprint(), "half stick must not sprint");
    }

    #[test]
    fn can_sprint_false_while_aiming() {
        let mut peer = peer();
        peer.character.set_movement_input(1.0, 0.0);
        peer.tick(DT);
        peer.with_links(|character, links| character.aim_pressed(links));
        peer.tick(DT);
        assert!(!peer.character.can_sprint());
    }

    #[test]
    fn can_sprint_looking_direction_needs_aligned_input() {
        let mut peer = peer();
        assert_eq!(peer.character.rotation_mode(), RotationMode::LookingDirection);

        // Forward input is aligned with the aim yaw.
        peer.character.set_movement_input(1.0, 0.0);
        peer.tick(DT);
        peer.tick(DT);
        assert!(peer.character.can_sprint());

        // Pure strafe points 90 degrees off the aim yaw, outside the cone.
        peer.character.set_movement_input(0.0, 1.0);
        peer.tick(DT);
        peer.tick(DT);
        assert!(!peer.character.can_sprint());
    }

    #[test]
    fn crouching_caps_allowed_gait_at_running() {
        let mut peer = peer();
        peer.with_links(|character, links| {
            character.set_desired_gait(Gait::Sprinting, links);
            character.set_stance(Stance::Crouching, false, links);
        });
        assert_eq!(peer.character.allowed_gait(), Gait::Running);
    }

    #[test]
    fn gait_hysteresis_bands() {
        let peer = peer();
        let settings = peer.character.movement_core().settings().clone();

        // walk 165 / run 375: bands sit at 175 and 385.
        assert_eq!(actual_gait_for(&settings, 170.0, Gait::Sprinting), Gait::Walking);
        assert_eq!(actual_gait_for(&settings, 176.0, Gait::Sprinting), Gait::Running);
        assert_eq!(actual_gait_for(&settings, 384.0, Gait::Sprinting), Gait::Running);
        assert_eq!(actual_gait_for(&settings, 386.0, Gait::Sprinting), Gait::Sprinting);
        assert_eq!(actual_gait_for(&settings, 386.0, Gait::Running), Gait::Running);
    }

    #[test]
    fn double_tap_stance_rolls_and_flips_desired_stance() {
        let mut peer = peer();

        peer.with_links(|character, links| character.stance_pressed(links));
        assert_eq!(peer.character.stance(), Stance::Crouching);
        assert_eq!(peer.character.desired_stance(), Stance::Crouching);

        // Stand back up, then double-tap within the window.
        peer.tick(DT * 30.0); // 0.5s: outside the double-tap window
        peer.with_links(|character, links| character.stance_pressed(links));
        assert_eq!(peer.character.stance(), Stance::Standing);

        peer.tick(DT);
        peer.with_links(|character, links| character.stance_pressed(links));

        assert_eq!(peer.character.movement_action(), MovementAction::Rolling);
        assert_eq!(peer.character.desired_stance(), Stance::Crouching);
        assert!(peer.anim.montages.contains(&(Montage::Roll, 1.15)));
        // Rolling crouches for the duration.
        assert_eq!(peer.character.stance(), Stance::Crouching);
    }

    #[test]
    fn roll_ends_after_duration_and_restores_desired_stance() {
        let mut peer = peer();
        peer.with_links(|character, links| {
            character.stance_pressed(links);
        });
        peer.tick(DT);
        peer.with_links(|character, links| character.stance_pressed(links));
        assert_eq!(peer.character.movement_action(), MovementAction::Rolling);

        // Run past the roll duration.
        for _ in 0..70 {
            peer.tick(DT);
        }
        assert_eq!(peer.character.movement_action(), MovementAction::None);
        // First press toggled desired to Crouching, the double tap flipped it
        // back to Standing; the roll restores that.
        assert_eq!(peer.character.stance(), peer.character.desired_stance());
    }

    #[test]
    fn falling_while_rolling_becomes_ragdoll_once() {
        let mut peer = peer();
        peer.character.set_movement_input(0.0, 0.0);
        peer.tick(DT);
        peer.with_links(|character, links| character.stance_pressed(links));
        peer.tick(DT);
        peer.with_links(|character, links| character.stance_pressed(links));
        assert_eq!(peer.character.movement_action(), MovementAction::Rolling);
        peer.character.drain_events();

        // The floor drops away mid-roll.
        peer.physics.set_move_mode(MoveMode::Falling);
        peer.tick(DT);

        assert_eq!(peer.character.movement_state(), MovementState::Ragdoll);
        assert!(peer.character.is_ragdolling());
        assert!(peer.body.simulating);
        // The roll was cancelled by the ragdoll entry.
        assert_eq!(peer.character.movement_action(), MovementAction::None);

        let ragdoll_entries = peer
            .character
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, LocomotionEvent::RagdollStateChanged { active: true }))
            .count();
        assert_eq!(ragdoll_entries, 1);
    }

    #[test]
    fn entering_air_uncrouches_and_caches_heading() {
        let mut peer = peer();
        peer.with_links(|character, links| character.stance_pressed(links));
        assert_eq!(peer.character.stance(), Stance::Crouching);

        peer.physics.set_move_mode(MoveMode::Falling);
        peer.tick(DT);

        assert_eq!(peer.character.movement_state(), MovementState::InAir);
        assert_eq!(peer.character.stance(), Stance::Standing);
    }

    #[test]
    fn jump_while_crouched_stands_instead() {
        let mut peer = peer();
        peer.with_links(|character, links| character.stance_pressed(links));
        assert_eq!(peer.character.stance(), Stance::Crouching);

        peer.with_links(|character, links| character.jump_pressed(links));
        assert_eq!(peer.character.stance(), Stance::Standing);
        assert_eq!(peer.character.movement_state(), MovementState::Grounded);
    }

    #[test]
    fn landing_sets_then_resets_braking_friction() {
        let mut peer = peer();
        peer.with_links(|character, links| character.jump_pressed(links));
        peer.tick(DT);
        assert_eq!(peer.character.movement_state(), MovementState::InAir);

        let mut landed = false;
        for _ in 0..120 {
            peer.tick(DT);
            if peer.character.movement_state() == MovementState::Grounded {
                landed = true;
                break;
            }
        }
        assert!(landed);
        // Landed without input held: heavy braking.
        assert_eq!(peer.physics.braking_friction_factor, landing::BRAKING_FACTOR_NO_INPUT);

        // Resets half a second later.
        for _ in 0..32 {
            peer.tick(DT);
        }
        assert_eq!(peer.physics.braking_friction_factor, 0.0);
    }

    #[test]
    fn ragdoll_toggle_round_trip_selects_get_up_by_facing() {
        let mut peer = peer();
        peer.with_links(|character, links| character.ragdoll_pressed(links));
        assert_eq!(peer.character.movement_state(), MovementState::Ragdoll);
        assert!(!peer.physics.capsule_collision);

        // Face-down pelvis (positive roll with normal polarity).
        peer.body.pelvis_roll = 20.0;
        for _ in 0..30 {
            peer.tick(DT);
        }
        assert!(peer.character.is_ragdolling());

        peer.with_links(|character, links| character.ragdoll_pressed(links));
        assert!(!peer.character.is_ragdolling());
        assert_eq!(peer.character.movement_state(), MovementState::Grounded);
        assert!(peer.physics.capsule_collision);
        assert!(peer.anim.montages.contains(&(Montage::GetUpFaceDown, 1.0)));
        assert!(peer.anim.snapshots.contains(&"ragdoll_pose".to_string()));
    }

    #[test]
    fn camera_tap_swaps_shoulder_and_hold_switches_view() {
        let mut peer = peer();
        assert!(peer.character.right_shoulder());

        peer.character.camera_pressed();
        peer.tick(DT);
        peer.character.camera_released();
        assert!(!peer.character.right_shoulder());
        assert_eq!(peer.character.view_mode(), ViewMode::ThirdPerson);

        peer.character.camera_pressed();
        for _ in 0..20 {
            peer.tick(DT);
        }
        assert_eq!(peer.character.view_mode(), ViewMode::FirstPerson);
        peer.character.camera_released();
        assert_eq!(peer.character.view_mode(), ViewMode::FirstPerson);
    }

    #[test]
    fn walk_toggle_switches_between_walking_and_running() {
        let mut peer = peer();
        assert_eq!(peer.character.desired_gait(), Gait::Running);

        peer.with_links(|character, links| character.walk_pressed(links));
        assert_eq!(peer.character.desired_gait(), Gait::Walking);

        peer.with_links(|character, links| character.walk_pressed(links));
        assert_eq!(peer.character.desired_gait(), Gait::Running);
    }

    #[test]
    fn dead_character_caps_speed_at_zero() {
        let mut peer = peer();
        let mut status = peer.character.status().clone();
        status.health = 0.0;
        peer.character.set_status(status);
        assert_eq!(peer.character.movement_caps().max_speed, 0.0);
    }
}

