//! Locomotion state vocabulary.
//!
//! ## State axes
//! ```text
//! MovementState : None | Grounded | InAir | Ragdoll   (exactly one active)
//! MovementAction: None | Rolling                      (orthogonal to state)
//! Stance        : Standing | Crouching
//! Gait          : Walking < Running < Sprinting       (desired / allowed / actual)
//! RotationMode  : VelocityDirection | LookingDirection | Aiming
//! ViewMode      : ThirdPerson | FirstPerson
//! ```

use serde::{Deserialize, Serialize};

/// Coarse locomotion state, driven by the physics integrator's movement mode
/// or by explicit ragdoll requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MovementState {
    #[default]
    None,
    Grounded,
    InAir,
    Ragdoll,
}

impl MovementState {
    pub fn is_grounded(&self) -> bool {
        matches!(self, MovementState::Grounded)
    }

    pub fn is_in_air(&self) -> bool {
        matches!(self, MovementState::InAir)
    }

    pub fn is_ragdoll(&self) -> bool {
        matches!(self, MovementState::Ragdoll)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MovementState::None => "None",
            MovementState::Grounded => "Grounded",
            MovementState::InAir => "InAir",
            MovementState::Ragdoll => "Ragdoll",
        }
    }
}

/// Action overlay on top of the movement state. Rolling suspends rotation and
/// gait logic while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MovementAction {
    #[default]
    None,
    Rolling,
}

impl MovementAction {
    pub fn is_none(&self) -> bool {
        matches!(self, MovementAction::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MovementAction::None => "None",
            MovementAction::Rolling => "Rolling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
}

impl Stance {
    pub fn is_crouching(&self) -> bool {
        matches!(self, Stance::Crouching)
    }

    /// The other stance; used by the stance-toggle input.
    pub fn toggled(&self) -> Stance {
        match self {
            Stance::Standing => Stance::Crouching,
            Stance::Crouching => Stance::Standing,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stance::Standing => "Standing",
            Stance::Crouching => "Crouching",
        }
    }
}

/// Movement speed tier. Ordered: Walking < Running < Sprinting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Gait {
    #[default]
    Walking,
    Running,
    Sprinting,
}

impl Gait {
    pub fn is_sprinting(&self) -> bool {
        matches!(self, Gait::Sprinting)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Gait::Walking => "Walking",
            Gait::Running => "Running",
            Gait::Sprinting => "Sprinting",
        }
    }
}

/// How the character chooses its facing while grounded or airborne.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationMode {
    VelocityDirection,
    #[default]
    LookingDirection,
    Aiming,
}

impl RotationMode {
    pub fn is_aiming(&self) -> bool {
        matches!(self, RotationMode::Aiming)
    }

    pub fn is_velocity_direction(&self) -> bool {
        matches!(self, RotationMode::VelocityDirection)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RotationMode::VelocityDirection => "VelocityDirection",
            RotationMode::LookingDirection => "LookingDirection",
            RotationMode::Aiming => "Aiming",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ViewMode {
    #[default]
    ThirdPerson,
    FirstPerson,
}

impl ViewMode {
    pub fn is_first_person(&self) -> bool {
        matches!(self, ViewMode::FirstPerson)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::ThirdPerson => "ThirdPerson",
            ViewMode::FirstPerson => "FirstPerson",
        }
    }
}

/// Opaque animation-selection tag. The locomotion core stores and replicates
/// it but never interprets the value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
pub struct OverlayState(pub u16);

/// Movement mode signal from the physics integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MoveMode {
    #[default]
    None,
    Walking,
    Falling,
}
