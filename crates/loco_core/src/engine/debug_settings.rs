//! Debug trace gating.
//!
//! One `DebugSettings` value is built by the host (typically from the
//! environment) and shared read-only across every character instance it
//! spawns. The simulation never mutates it.

use std::sync::Arc;

fn env_flag_enabled(name: &str) -> bool {
    std::env::var(name)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugSettings {
    /// Trace state-machine transitions.
    pub trace_transitions: bool,
    /// Trace per-frame rotation solving.
    pub trace_rotation: bool,
    /// Trace ragdoll entry/exit and the per-frame ground probe.
    pub trace_ragdoll: bool,
}

impl DebugSettings {
    /// Read flags from `LOCO_DEBUG_TRANSITIONS` / `LOCO_DEBUG_ROTATION` /
    /// `LOCO_DEBUG_RAGDOLL`. Debug traces are compiled out of release builds.
    pub fn from_env() -> Self {
        if !cfg!(debug_assertions) {
            return Self::default();
        }
        Self {
            trace_transitions: env_flag_enabled("LOCO_DEBUG_TRANSITIONS"),
            trace_rotation: env_flag_enabled("LOCO_DEBUG_ROTATION"),
            trace_ragdoll: env_flag_enabled("LOCO_DEBUG_RAGDOLL"),
        }
    }

    pub fn shared(self) -> Arc<DebugSettings> {
        Arc::new(self)
    }
}
