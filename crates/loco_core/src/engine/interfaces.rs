//! Collaborator interfaces.
//!
//! The locomotion core drives and reads from three external systems through
//! narrow traits: the rigid-body integrator (`PhysicsLink`), the simulated
//! skeleton (`RagdollBody`) and the animation engine (`AnimationLink`).
//! The camera system gets a plain write-only mirror (`CameraBehavior`).
//!
//! Every optional collaborator is null-tolerated: call sites skip the
//! dependent behavior when it is absent instead of failing.

use serde::{Deserialize, Serialize};

use crate::engine::math::Vec3;
use crate::engine::types::{
    Gait, MoveMode, MovementAction, MovementState, RotationMode, Stance, ViewMode,
};

/// Result of a single ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    pub impact_point: Vec3,
}

/// The rigid-body/collision integrator, as seen by this core.
pub trait PhysicsLink {
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);

    /// The acceleration the integrator is currently applying from movement
    /// input (intent, not the observed velocity delta).
    fn input_acceleration(&self) -> Vec3;

    fn move_mode(&self) -> MoveMode;
    fn set_move_mode(&mut self, mode: MoveMode);

    /// Launch into the integrator's jump arc.
    fn jump(&mut self);

    /// Release the jump (ends any variable-height jump hold).
    fn stop_jump(&mut self);

    fn capsule_half_height(&self) -> f32;
    fn set_capsule_collision(&mut self, enabled: bool);

    fn set_braking_friction_factor(&mut self, factor: f32);

    /// Single downward/line cast; `None` when nothing was hit.
    fn line_trace(&self, start: Vec3, end: Vec3) -> Option<TraceHit>;
}

/// Bones the ragdoll logic addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bone {
    Root,
    Pelvis,
    Spine,
}

/// The physically simulated skeleton during ragdoll.
pub trait RagdollBody {
    fn bone_location(&self, bone: Bone) -> Vec3;
    fn bone_linear_velocity(&self, bone: Bone) -> Vec3;

    fn pelvis_roll(&self) -> f32;
    fn pelvis_yaw(&self) -> f32;

    fn set_simulate_below_pelvis(&mut self, enabled: bool);
    fn set_motor_drive_strength(&mut self, spring: f32);
    fn set_gravity_enabled(&mut self, enabled: bool);

    /// Apply an acceleration-change force at a bone (mass-independent).
    fn add_force_at_bone(&mut self, bone: Bone, force: Vec3);
}

/// Animation curves this core samples by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveName {
    /// Foot-yaw offset relative to the aim yaw at low speeds.
    YawOffset,
    /// Per-frame turn-in-place rotation amount (authored at 30 fps).
    RotationAmount,
}

/// Full-body clips this core triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Montage {
    Roll,
    GetUpFaceUp,
    GetUpFaceDown,
}

/// The skeletal-animation evaluation engine, as seen by this core.
pub trait AnimationLink {
    fn curve_value(&self, curve: CurveName) -> f32;
    fn play_montage(&mut self, montage: Montage, play_rate: f32);
    fn stop_montage(&mut self, blend_out: f32);
    /// Capture the current pose under a name for blend-out.
    fn save_pose_snapshot(&mut self, name: &str);
}

/// Write-only mirror for the camera system.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraBehavior {
    pub movement_state: MovementState,
    pub movement_action: MovementAction,
    pub rotation_mode: RotationMode,
    pub gait: Gait,
    pub stance: Stance,
    pub view_mode: ViewMode,
    pub right_shoulder: bool,
}

/// Write-only mirror for the animation engine: everything a data-driven
/// animation graph reads each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimFeed {
    pub movement_state: MovementState,
    pub prev_movement_state: MovementState,
    pub movement_action: MovementAction,
    pub stance: Stance,
    pub gait: Gait,
    pub rotation_mode: RotationMode,
    pub view_mode: ViewMode,
    pub overlay_raw: u16,
    pub speed: f32,
    pub is_moving: bool,
    pub has_movement_input: bool,
    pub movement_input_amount: f32,
    pub aim_yaw: f32,
    pub aim_pitch: f32,
    pub aim_yaw_rate: f32,
    pub acceleration: Vec3,
}
