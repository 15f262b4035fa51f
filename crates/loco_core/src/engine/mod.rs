//! The locomotion decision engine.
//!
//! Per-character state machine, rotation solving and ragdoll handoff, all
//! frame-stepped and deterministic. Networking-side prediction lives in
//! `crate::prediction`.

pub mod character; // Character aggregate: state machine + tick orchestration
pub mod constants; // Fixed rates/thresholds the algorithms are built around
pub mod curve; // Keyframed tuning curves
pub mod debug_settings; // Injected shared debug trace gating
pub mod events; // Notification queue drained once per step
pub mod input; // Double-tap / press-and-hold intent timing
pub mod interfaces; // Collaborator traits (physics, skeleton, animation)
pub mod math; // Yaw helpers and interpolators
pub mod ragdoll; // Full-body simulation handoff and reconcile
pub mod rotation; // Two-stage procedural heading solver
pub mod scenario; // Deterministic harness for tests and the CLI
pub mod settings; // Movement settings rows + profile table
pub mod types; // State vocabulary

pub use character::{Character, CharacterParams, Links, MovementCaps};
pub use debug_settings::DebugSettings;
pub use events::{EventQueue, LocomotionEvent};
pub use interfaces::{
    AnimFeed, AnimationLink, Bone, CameraBehavior, CurveName, Montage, PhysicsLink, RagdollBody,
    TraceHit,
};
pub use ragdoll::{RagdollController, RagdollExit, RagdollPose};
pub use rotation::{RotationInputs, RotationSolver};
pub use settings::{MovementProfileTable, MovementSettings};
pub use types::{
    Gait, MoveMode, MovementAction, MovementState, OverlayState, RotationMode, Stance, ViewMode,
};
