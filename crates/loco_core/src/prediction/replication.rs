//! Replication roles and the transport-facing call surface.
//!
//! The state machine never talks to a socket. Every replicated action is a
//! value (`ReplicationCall`) pushed into a `ReplicationLink` owned by the
//! host, which routes it however it likes. A proxy `request`s a change from
//! the authority; the authority applies it and `confirm`s the committed value
//! to the other peers. The authority's value always wins on conflict.

use serde::{Deserialize, Serialize};

use crate::engine::interfaces::Montage;
use crate::engine::math::Vec3;
use crate::engine::types::{Gait, OverlayState, RotationMode, Stance, ViewMode};

/// Which kind of simulation instance this character is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NetRole {
    /// The single instance whose decisions are final.
    #[default]
    Authority,
    /// The controlling peer, allowed to predict ahead of the authority.
    AutonomousProxy,
    /// A passively mirroring observer.
    SimulatedProxy,
}

impl NetRole {
    pub fn is_authority(&self) -> bool {
        matches!(self, NetRole::Authority)
    }

    pub fn is_autonomous_proxy(&self) -> bool {
        matches!(self, NetRole::AutonomousProxy)
    }

    pub fn is_simulated_proxy(&self) -> bool {
        matches!(self, NetRole::SimulatedProxy)
    }
}

/// One replicated action, as a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReplicationCall {
    SetDesiredStance(Stance),
    SetDesiredGait(Gait),
    SetDesiredRotationMode(RotationMode),
    SetRotationMode { mode: RotationMode, force: bool },
    SetViewMode { mode: ViewMode, force: bool },
    SetOverlayState { state: OverlayState, force: bool },
    SetAllowedGait(Gait),
    PlayMontage { montage: Montage, play_rate: f32 },
    RagdollStart,
    RagdollEnd { location: Vec3 },
    SetRagdollTarget { location: Vec3 },
}

/// Transport sink. Implemented by the host's networking layer; the test and
/// CLI harnesses implement it with plain vectors.
pub trait ReplicationLink {
    /// Proxy-side: ask the authority to apply a change.
    fn request(&mut self, call: ReplicationCall);

    /// Authority-side: broadcast a committed change to the other peers.
    fn confirm(&mut self, call: ReplicationCall);

    /// Toggle transform replication (off while a ragdoll's skeleton carries
    /// position implicitly).
    fn set_movement_replication(&mut self, enabled: bool);
}

/// Standalone play: every call is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReplication;

impl ReplicationLink for NullReplication {
    fn request(&mut self, _call: ReplicationCall) {}
    fn confirm(&mut self, _call: ReplicationCall) {}
    fn set_movement_replication(&mut self, _enabled: bool) {}
}

/// Buffering link: records calls for the host to ship, and remembers the
/// last movement-replication toggle.
#[derive(Debug, Clone, Default)]
pub struct BufferedReplication {
    pub requests: Vec<ReplicationCall>,
    pub confirms: Vec<ReplicationCall>,
    pub movement_replication: Option<bool>,
}

impl BufferedReplication {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_requests(&mut self) -> Vec<ReplicationCall> {
        std::mem::take(&mut self.requests)
    }

    pub fn take_confirms(&mut self) -> Vec<ReplicationCall> {
        std::mem::take(&mut self.confirms)
    }
}

impl ReplicationLink for BufferedReplication {
    fn request(&mut self, call: ReplicationCall) {
        self.requests.push(call);
    }

    fn confirm(&mut self, call: ReplicationCall) {
        self.confirms.push(call);
    }

    fn set_movement_replication(&mut self, enabled: bool) {
        self.movement_replication = Some(enabled);
    }
}
