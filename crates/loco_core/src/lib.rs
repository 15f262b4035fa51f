//! # loco_core - Networked Character Locomotion Core
//!
//! The locomotion decision layer of a networked character controller: a
//! per-character state machine (movement state, stance, gait, rotation mode),
//! a client-side-prediction protocol over compact move records, a per-frame
//! procedural rotation solver and a ragdoll handoff controller.
//!
//! ## Design
//! - Deterministic, frame-stepped, single-threaded per character; no wall
//!   clock, no I/O in the simulation path.
//! - The physics integrator, skeletal animation engine and transport are
//!   external collaborators behind narrow traits.
//! - Exactly one authority instance per character; predicting peers accept
//!   authority corrections by overwrite, never by user-visible rollback.

// Game engine APIs often require many parameters for physics, state, etc.
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod prediction;

pub use config::{InputConfig, LocomotionConfig, RagdollConfig};
pub use engine::{
    Character, CharacterParams, DebugSettings, Gait, Links, LocomotionEvent, MoveMode,
    MovementAction, MovementCaps, MovementProfileTable, MovementSettings, MovementState,
    OverlayState, RotationMode, Stance, ViewMode,
};
pub use error::{ConfigError, Result};
pub use models::CharacterStatus;
pub use prediction::{
    MoveHistory, MoveIntents, MovementCore, NetRole, ReplicationCall, ReplicationLink, SavedMove,
};
