//! Saved moves: the client-side-prediction replay unit.
//!
//! Each simulated step on the controlling side captures one `SavedMove`.
//! Continuous values (acceleration, dt) ride along for local replay; only
//! the compressed boolean intents cross the wire to the authority, which
//! re-runs the deterministic cap logic from them and never trusts
//! client-submitted continuous values.
//!
//! Each intent owns an independent flag bit. (The source this was rebuilt
//! from overloaded one bit slot between the sprint and settings-change
//! intents; the slot collision made them indistinguishable on decode and is
//! not reproduced here.)

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::math::Vec3;
use crate::engine::types::Gait;

/// Compressed-flag bit assignments.
pub mod flags {
    pub const SPRINT: u8 = 1 << 0;
    pub const AIM_DOWN_SIGHTS: u8 = 1 << 1;
    pub const SETTINGS_CHANGE: u8 = 1 << 2;
}

/// Boolean intents carried by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MoveIntents {
    pub sprint: bool,
    pub aim_down_sights: bool,
    pub settings_change: bool,
}

impl MoveIntents {
    pub fn compress(&self) -> u8 {
        let mut result = 0u8;
        if self.sprint {
            result |= flags::SPRINT;
        }
        if self.aim_down_sights {
            result |= flags::AIM_DOWN_SIGHTS;
        }
        if self.settings_change {
            result |= flags::SETTINGS_CHANGE;
        }
        result
    }

    pub fn decompress(bits: u8) -> Self {
        Self {
            sprint: bits & flags::SPRINT != 0,
            aim_down_sights: bits & flags::AIM_DOWN_SIGHTS != 0,
            settings_change: bits & flags::SETTINGS_CHANGE != 0,
        }
    }
}

/// One quantum of captured input + intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMove {
    /// Simulation time at the end of the move.
    pub timestamp: f32,
    /// Simulated duration covered by this move (grows when moves combine).
    pub dt: f32,
    /// Input acceleration applied during the move.
    pub acceleration: Vec3,
    pub intents: MoveIntents,
    /// Allowed-gait snapshot so the authority replays the same cap.
    pub allowed_gait: Gait,
}

impl SavedMove {
    /// Two consecutive moves can be treated as one larger step only when
    /// every boolean intent and the gait snapshot match exactly.
    pub fn can_combine_with(&self, next: &SavedMove) -> bool {
        self.intents == next.intents && self.allowed_gait == next.allowed_gait
    }

    fn combine(&mut self, next: &SavedMove) {
        self.timestamp = next.timestamp;
        self.dt += next.dt;
        self.acceleration = next.acceleration;
    }
}

/// Rolling history of not-yet-acknowledged moves.
#[derive(Debug, Clone)]
pub struct MoveHistory {
    moves: VecDeque<SavedMove>,
    capacity: usize,
}

impl MoveHistory {
    pub fn new(capacity: usize) -> Self {
        Self { moves: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a move, combining it into the previous one when compatible.
    /// When the buffer is full the oldest move falls off.
    pub fn record(&mut self, new_move: SavedMove) {
        if let Some(last) = self.moves.back_mut() {
            if last.can_combine_with(&new_move) {
                last.combine(&new_move);
                return;
            }
        }
        if self.moves.len() == self.capacity {
            self.moves.pop_front();
        }
        self.moves.push_back(new_move);
    }

    /// Drop every move at or before the acknowledged timestamp.
    pub fn acknowledge(&mut self, timestamp: f32) {
        while self
            .moves
            .front()
            .is_some_and(|m| m.timestamp <= timestamp)
        {
            self.moves.pop_front();
        }
    }

    /// Moves still awaiting authority confirmation, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &SavedMove> {
        self.moves.iter()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }
}

impl Default for MoveHistory {
    fn default() -> Self {
        // Roughly two seconds of uncombinable 60 Hz moves.
        Self::new(128)
    }
}

#[derive(Error, Debug)]
pub enum WireError {
    #[error("move encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("move decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Compact wire encoding of a move batch.
pub fn encode_moves(moves: &[SavedMove]) -> Result<Vec<u8>, WireError> {
    Ok(rmp_serde::to_vec(moves)?)
}

pub fn decode_moves(bytes: &[u8]) -> Result<Vec<SavedMove>, WireError> {
    Ok(rmp_serde::from_slice(bytes)?)
}
