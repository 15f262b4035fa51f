//! Movement caps and the predicted-intent state.
//!
//! `MovementCore` owns the per-character movement configuration (current
//! settings row, allowed gait, pending intent flags) and produces the
//! authoritative speed/acceleration/deceleration/friction values the physics
//! integrator consumes every step. The same logic runs on the controlling
//! peer (prediction) and on the authority (replay from decoded flags), so the
//! two converge without trusting client-submitted continuous values.

use crate::engine::constants::movement;
use crate::engine::math::Vec3;
use crate::engine::settings::MovementSettings;
use crate::engine::types::Gait;
use crate::models::CharacterStatus;
use crate::prediction::move_record::{MoveIntents, SavedMove};

#[derive(Debug, Clone)]
pub struct MovementCore {
    settings: MovementSettings,
    allowed_gait: Gait,
    /// Gait-selected walk-speed cap, refreshed when a settings change lands.
    max_walk_speed: f32,
    request_sprint: bool,
    request_aim_down_sights: bool,
    request_settings_change: bool,
}

impl MovementCore {
    pub fn new(settings: MovementSettings) -> Self {
        let max_walk_speed = settings.speed_for_gait(Gait::Running);
        Self {
            settings,
            allowed_gait: Gait::Running,
            max_walk_speed,
            request_sprint: false,
            request_aim_down_sights: false,
            request_settings_change: false,
        }
    }

    pub fn settings(&self) -> &MovementSettings {
        &self.settings
    }

    pub fn allowed_gait(&self) -> Gait {
        self.allowed_gait
    }

    pub fn max_walk_speed(&self) -> f32 {
        self.max_walk_speed
    }

    /// Swap in a new settings row (stance/rotation-mode change). The speed
    /// cap refreshes on the next movement update, inside the simulated step,
    /// so prediction and replay see it at the same point.
    pub fn set_movement_settings(&mut self, settings: MovementSettings) {
        self.settings = settings;
        self.request_settings_change = true;
    }

    /// Controlling side: adopt a new allowed gait and queue the cap refresh.
    /// Returns true when the gait actually changed (the caller forwards the
    /// change to the authority).
    pub fn request_allowed_gait(&mut self, gait: Gait) -> bool {
        if self.allowed_gait == gait {
            return false;
        }
        self.allowed_gait = gait;
        self.request_settings_change = true;
        true
    }

    /// Authority/mirror side: adopt a confirmed allowed gait and refresh the
    /// cap immediately.
    pub fn apply_allowed_gait(&mut self, gait: Gait) {
        if self.allowed_gait != gait {
            self.allowed_gait = gait;
            self.max_walk_speed = self.settings.speed_for_gait(gait);
        }
    }

    pub fn start_sprint(&mut self) {
        self.request_sprint = true;
    }

    pub fn stop_sprint(&mut self) {
        self.request_sprint = false;
    }

    pub fn start_aim_down_sights(&mut self) {
        self.request_aim_down_sights = true;
    }

    pub fn stop_aim_down_sights(&mut self) {
        self.request_aim_down_sights = false;
    }

    pub fn sprint_requested(&self) -> bool {
        self.request_sprint
    }

    pub fn aim_down_sights_requested(&self) -> bool {
        self.request_aim_down_sights
    }

    /// Current intent snapshot, as captured into a saved move.
    pub fn intents(&self) -> MoveIntents {
        MoveIntents {
            sprint: self.request_sprint,
            aim_down_sights: self.request_aim_down_sights,
            settings_change: self.request_settings_change,
        }
    }

    /// Reset intent state from a decoded move's flags, so the authority can
    /// simulate from the state the move was made in.
    pub fn apply_intents(&mut self, intents: MoveIntents) {
        self.request_sprint = intents.sprint;
        self.request_aim_down_sights = intents.aim_down_sights;
        self.request_settings_change = intents.settings_change;
    }

    /// Capture one saved move for the rolling history.
    pub fn make_move(&self, timestamp: f32, dt: f32, acceleration: Vec3) -> SavedMove {
        SavedMove {
            timestamp,
            dt,
            acceleration,
            intents: self.intents(),
            allowed_gait: self.allowed_gait,
        }
    }

    /// End-of-step settings application: a pending settings change updates
    /// the walk-speed cap exactly once.
    pub fn on_movement_updated(&mut self) {
        if self.request_settings_change {
            self.max_walk_speed = self.settings.speed_for_gait(self.allowed_gait);
            self.request_settings_change = false;
        }
    }

    /// Map a horizontal speed to 0..3 against the current settings row.
    pub fn mapped_speed(&self, speed: f32) -> f32 {
        self.settings.mapped_speed(speed)
    }

    /// Authoritative speed cap.
    ///
    /// Policy gates first (dead, pinned by an interaction, knocked down),
    /// then the sprint multiplier wins over the aim-down-sights multiplier
    /// when both are requested. Without a status view (no owner), fall back
    /// to the gait-selected cap.
    pub fn max_speed(&self, status: Option<&CharacterStatus>) -> f32 {
        let Some(status) = status else {
            return self.max_walk_speed;
        };

        if !status.is_alive() {
            return 0.0;
        }

        // Don't move while interacting or being interacted on (revived).
        if status.is_interaction_blocked() {
            return 0.0;
        }

        if status.knocked_down {
            return status.move_speed * movement::KNOCKED_DOWN_MULTIPLIER;
        }

        if self.request_sprint {
            return status.move_speed * movement::SPRINT_MULTIPLIER;
        }

        if self.request_aim_down_sights {
            return status.move_speed * movement::ADS_MULTIPLIER;
        }

        status.move_speed
    }

    /// Max acceleration at the current speed, from the movement curve while
    /// on the ground.
    pub fn max_acceleration(&self, speed: f32, on_ground: bool) -> f32 {
        if !on_ground || self.settings.movement_curve.is_empty() {
            return movement::FALLBACK_MAX_ACCELERATION;
        }
        self.settings.movement_curve.value_at(self.mapped_speed(speed))[0]
    }

    /// Braking deceleration at the current speed.
    pub fn braking_deceleration(&self, speed: f32, on_ground: bool) -> f32 {
        if !on_ground || self.settings.movement_curve.is_empty() {
            return movement::FALLBACK_BRAKING_DECELERATION;
        }
        self.settings.movement_curve.value_at(self.mapped_speed(speed))[1]
    }

    /// Ground friction at the current speed.
    pub fn ground_friction(&self, speed: f32) -> f32 {
        self.settings.movement_curve.value_at(self.mapped_speed(speed))[2]
    }
}

impl Default for MovementCore {
    fn default() -> Self {
        Self::new(MovementSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> MovementCore {
        MovementCore::default()
    }

    fn status() -> CharacterStatus {
        CharacterStatus { move_speed: 500.0, ..Default::default() }
    }

    #[test]
    fn max_speed_zero_when_dead() {
        let core = core();
        let dead = CharacterStatus { health: 0.0, ..status() };
        assert_eq!(core.max_speed(Some(&dead)), 0.0);
    }

    #[test]
    fn max_speed_zero_while_interaction_blocked() {
        let core = core();
        let pinned = CharacterStatus { interacting_count: 2, interacting_removal_count: 1, ..status() };
        assert_eq!(core.max_speed(Some(&pinned)), 0.0);

        let released =
            CharacterStatus { interacting_count: 2, interacting_removal_count: 2, ..status() };
        assert_eq!(core.max_speed(Some(&released)), 500.0);
    }

    #[test]
    fn knocked_down_overrides_sprint() {
        let mut core = core();
        core.start_sprint();
        let knocked = CharacterStatus { knocked_down: true, ..status() };
        assert_eq!(core.max_speed(Some(&knocked)), 500.0 * 0.4);
    }

    #[test]
    fn sprint_wins_over_aim_down_sights() {
        let mut core = core();
        core.start_aim_down_sights();
        assert_eq!(core.max_speed(Some(&status())), 500.0 * 0.8);

        core.start_sprint();
        assert_eq!(core.max_speed(Some(&status())), 500.0 * 1.4);

        core.stop_sprint();
        core.stop_aim_down_sights();
        assert_eq!(core.max_speed(Some(&status())), 500.0);
    }

    #[test]
    fn max_speed_without_status_falls_back_to_gait_cap() {
        let mut core = core();
        assert_eq!(core.max_speed(None), 375.0);
        core.apply_allowed_gait(Gait::Sprinting);
        assert_eq!(core.max_speed(None), 600.0);
    }

    #[test]
    fn settings_change_applies_on_movement_update() {
        let mut core = core();
        assert!(core.request_allowed_gait(Gait::Sprinting));
        // Cap not refreshed until the simulated step runs.
        assert_eq!(core.max_walk_speed(), 375.0);

        core.on_movement_updated();
        assert_eq!(core.max_walk_speed(), 600.0);
        assert!(!core.intents().settings_change);
    }

    #[test]
    fn request_allowed_gait_reports_changes_only() {
        let mut core = core();
        assert!(!core.request_allowed_gait(Gait::Running));
        assert!(core.request_allowed_gait(Gait::Walking));
    }

    #[test]
    fn intents_round_trip_through_apply() {
        let mut sender = core();
        sender.start_sprint();
        sender.request_allowed_gait(Gait::Sprinting);

        let captured = sender.intents();
        let mut receiver = core();
        receiver.apply_intents(captured);

        assert!(receiver.sprint_requested());
        assert_eq!(receiver.intents(), captured);
    }

    #[test]
    fn curve_caps_track_mapped_speed() {
        let core = core();
        // Stopped: top of the acceleration curve.
        assert_eq!(core.max_acceleration(0.0, true), 2000.0);
        // At run speed (mapped 2.0) the curve has tapered.
        assert_eq!(core.max_acceleration(375.0, true), 1000.0);
        // Airborne falls back to the integrator default.
        assert_eq!(core.max_acceleration(0.0, false), movement::FALLBACK_MAX_ACCELERATION);

        assert_eq!(core.ground_friction(0.0), 8.0);
        assert!(core.ground_friction(600.0) < 8.0);
    }
}
