//! Read-only ability-system view.
//!
//! The locomotion core never runs abilities or effects; it only asks a small
//! set of questions about the character's condition when computing movement
//! caps. The owning gameplay layer keeps this view current.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterStatus {
    pub health: f32,
    /// Base move speed attribute (cm/s), before gait multipliers.
    pub move_speed: f32,
    pub knocked_down: bool,
    /// Count of active "interacting" tags (reviving someone, being revived).
    pub interacting_count: u32,
    /// Count of active interaction-removal tags; an interaction only blocks
    /// movement while it outnumbers its removals.
    pub interacting_removal_count: u32,
}

impl CharacterStatus {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// True while an interaction is pinning the character in place.
    pub fn is_interaction_blocked(&self) -> bool {
        self.interacting_count > self.interacting_removal_count
    }
}

impl Default for CharacterStatus {
    fn default() -> Self {
        Self {
            health: 100.0,
            move_speed: 600.0,
            knocked_down: false,
            interacting_count: 0,
            interacting_removal_count: 0,
        }
    }
}
