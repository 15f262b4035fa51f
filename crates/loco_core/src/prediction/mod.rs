//! Client-side prediction and reconciliation.
//!
//! The controlling peer simulates immediately, captures each step as a
//! `SavedMove`, and forwards only compressed boolean intents; the authority
//! replays them through the same deterministic cap logic and remains the
//! final arbiter.

pub mod move_record;
pub mod movement_core;
pub mod replication;

pub use move_record::{
    decode_moves, encode_moves, MoveHistory, MoveIntents, SavedMove, WireError,
};
pub use movement_core::MovementCore;
pub use replication::{
    BufferedReplication, NetRole, NullReplication, ReplicationCall, ReplicationLink,
};
