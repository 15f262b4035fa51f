//! Locomotion notifications.
//!
//! Events are pushed after the state they describe is fully committed and
//! drained exactly once per simulation step by whoever owns the character.
//! They are fire-and-forget notifications, not shared mutable state.

use serde::{Deserialize, Serialize};

use crate::engine::types::{
    Gait, MovementAction, MovementState, OverlayState, RotationMode, Stance, ViewMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LocomotionEvent {
    MovementStateChanged { previous: MovementState, current: MovementState },
    MovementActionChanged { previous: MovementAction, current: MovementAction },
    StanceChanged { previous: Stance, current: Stance },
    GaitChanged { previous: Gait, current: Gait },
    RotationModeChanged { previous: RotationMode, current: RotationMode },
    ViewModeChanged { previous: ViewMode, current: ViewMode },
    OverlayStateChanged { previous: OverlayState, current: OverlayState },
    RagdollStateChanged { active: bool },
    JumpPressed,
    Jumped,
    Landed { vertical_speed: f32 },
    Breakfall,
}

/// Per-character event buffer.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<LocomotionEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LocomotionEvent) {
        self.events.push(event);
    }

    /// Take all pending events, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<LocomotionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
