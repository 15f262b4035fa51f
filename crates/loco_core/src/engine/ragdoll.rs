//! Full-body physical simulation handoff.
//!
//! While active, the skeleton owns the character's motion; this controller
//! reconciles the actor transform against the simulated pelvis every frame
//! (ground probe, face-up detection, penetration lift) and, on peers that do
//! not control the character, pulls the local simulation toward the
//! authoritative target location instead of fighting it with corrections.

use log::debug;

use crate::engine::constants::ragdoll::*;
use crate::engine::interfaces::{AnimationLink, Bone, PhysicsLink, RagdollBody};
use crate::engine::math::{horizontal_speed, interp_to, map_range_clamped, normalize_yaw, Vec3};
use crate::engine::types::MoveMode;
use crate::prediction::replication::{NetRole, ReplicationCall, ReplicationLink};

/// Actor transform produced by one reconcile step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RagdollPose {
    pub location: Vec3,
    pub yaw: f32,
}

/// How the character resumes after the ragdoll ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RagdollExit {
    /// Grounded: get-up sequence, selected by the recorded facing.
    GetUp { face_up: bool },
    /// Airborne: resume falling with the last ragdoll velocity.
    Falling,
}

#[derive(Debug, Clone)]
pub struct RagdollController {
    active: bool,
    last_velocity: Vec3,
    target_location: Vec3,
    face_up: bool,
    on_ground: bool,
    pull_strength: f32,
    reversed_pelvis: bool,
}

impl RagdollController {
    pub fn new(reversed_pelvis: bool) -> Self {
        Self {
            active: false,
            last_velocity: Vec3::zeros(),
            target_location: Vec3::zeros(),
            face_up: false,
            on_ground: false,
            pull_strength: 0.0,
            reversed_pelvis,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn face_up(&self) -> bool {
        self.face_up
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn last_velocity(&self) -> Vec3 {
        self.last_velocity
    }

    pub fn target_location(&self) -> Vec3 {
        self.target_location
    }

    /// Adopt the authoritative target location (replicated onto peers that
    /// do not control the character).
    pub fn set_target_location(&mut self, location: Vec3) {
        self.target_location = location;
    }

    /// Enter full physical simulation.
    pub fn begin(
        &mut self,
        physics: &mut dyn PhysicsLink,
        body: &mut dyn RagdollBody,
        mut anim: Option<&mut (dyn AnimationLink + '_)>,
    ) {
        physics.set_move_mode(MoveMode::None);
        physics.set_velocity(Vec3::zeros());
        physics.set_capsule_collision(false);
        body.set_simulate_below_pelvis(true);

        if let Some(anim) = anim.as_deref_mut() {
            anim.stop_montage(MONTAGE_STOP_BLEND);
        }

        self.target_location = body.bone_location(Bone::Pelvis);
        self.pull_strength = 0.0;
        self.active = true;
        debug!("ragdoll begin at {:?}", self.target_location);
    }

    /// Leave physical simulation. Returns the resumption path taken.
    pub fn end(
        &mut self,
        physics: &mut dyn PhysicsLink,
        body: &mut dyn RagdollBody,
        mut anim: Option<&mut (dyn AnimationLink + '_)>,
    ) -> RagdollExit {
        // Snapshot the final pose first so the animation graph can blend out
        // of it.
        if let Some(anim) = anim.as_deref_mut() {
            anim.save_pose_snapshot("ragdoll_pose");
        }

        let exit = if self.on_ground {
            physics.set_move_mode(MoveMode::Walking);
            if let Some(anim) = anim.as_deref_mut() {
                let montage = if self.face_up {
                    crate::engine::interfaces::Montage::GetUpFaceUp
                } else {
                    crate::engine::interfaces::Montage::GetUpFaceDown
                };
                anim.play_montage(montage, 1.0);
            }
            RagdollExit::GetUp { face_up: self.face_up }
        } else {
            physics.set_move_mode(MoveMode::Falling);
            physics.set_velocity(self.last_velocity);
            RagdollExit::Falling
        };

        physics.set_capsule_collision(true);
        body.set_simulate_below_pelvis(false);

        debug!("ragdoll end ({exit:?})");

        // The snapshot is per-ragdoll state; reset it for the next entry.
        self.active = false;
        self.pull_strength = 0.0;
        self.on_ground = false;
        self.face_up = false;
        self.last_velocity = Vec3::zeros();

        exit
    }

    /// Per-frame reconcile while active. Returns the actor transform to
    /// apply.
    pub fn update(
        &mut self,
        dt: f32,
        locally_controlled: bool,
        role: NetRole,
        physics: &mut dyn PhysicsLink,
        body: &mut dyn RagdollBody,
        replication: &mut dyn ReplicationLink,
    ) -> RagdollPose {
        // A momentary zero read on a mirroring peer is replication jitter,
        // not a real stop; decay the retained velocity instead of snapping.
        let new_velocity = body.bone_linear_velocity(Bone::Root);
        self.last_velocity = if new_velocity != Vec3::zeros() || locally_controlled {
            new_velocity
        } else {
            self.last_velocity / 2.0
        };

        // Faster ragdolls resist harder.
        let spring = map_range_clamped(
            self.last_velocity.norm(),
            0.0,
            SPRING_SPEED_MAX,
            0.0,
            SPRING_MAX,
        );
        body.set_motor_drive_strength(spring);

        // Terminal-velocity guard; also keeps the body from tunnelling
        // through geometry.
        body.set_gravity_enabled(self.last_velocity.z > GRAVITY_CUTOFF_FALL_SPEED);

        if locally_controlled {
            self.target_location = body.bone_location(Bone::Pelvis);
            if !role.is_authority() {
                replication.request(ReplicationCall::SetRagdollTarget {
                    location: self.target_location,
                });
            }
        }

        let pelvis_roll = body.pelvis_roll();
        self.face_up = if self.reversed_pelvis {
            pelvis_roll > 0.0
        } else {
            pelvis_roll < 0.0
        };
        let yaw = normalize_yaw(if self.face_up {
            body.pelvis_yaw() - 180.0
        } else {
            body.pelvis_yaw()
        });

        // Probe straight down from the pelvis to one capsule half-height
        // below it.
        let half_height = physics.capsule_half_height();
        let trace_end = self.target_location - Vec3::new(0.0, 0.0, half_height);
        let hit = physics.line_trace(self.target_location, trace_end);
        self.on_ground = hit.is_some();

        let mut location = self.target_location;
        if let Some(hit) = hit {
            // Lift by the measured penetration so re-enabling the capsule
            // does not intersect the floor.
            let impact_dz = (hit.impact_point.z - self.target_location.z).abs();
            location.z += half_height - impact_dz + GROUND_LIFT_PADDING;
        }

        if !locally_controlled {
            // Ramp the pull in over roughly half a second so a fresh ragdoll
            // is not yanked across the world.
            self.pull_strength = interp_to(self.pull_strength, PULL_STRENGTH_MAX, dt, PULL_EASE_RATE);
            let anchor = if horizontal_speed(&self.last_velocity) > PULL_ANCHOR_SPEED {
                Bone::Spine
            } else {
                Bone::Pelvis
            };
            let to_target = self.target_location - body.bone_location(anchor);
            body.add_force_at_bone(anchor, to_target * self.pull_strength);
        }

        RagdollPose {
            location: if self.on_ground { location } else { self.target_location },
            yaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::interfaces::{Montage, TraceHit};
    use crate::prediction::replication::BufferedReplication;

    #[derive(Default)]
    struct TestPhysics {
        velocity: Vec3,
        mode: MoveMode,
        capsule_collision: bool,
        half_height: f32,
        floor_z: Option<f32>,
    }

    impl PhysicsLink for TestPhysics {
        fn velocity(&self) -> Vec3 {
            self.velocity
        }
        fn set_velocity(&mut self, velocity: Vec3) {
            self.velocity = velocity;
        }
        fn input_acceleration(&self) -> Vec3 {
            Vec3::zeros()
        }
        fn move_mode(&self) -> MoveMode {
            self.mode
        }
        fn set_move_mode(&mut self, mode: MoveMode) {
            self.mode = mode;
        }
        fn jump(&mut self) {}
        fn stop_jump(&mut self) {}
        fn capsule_half_height(&self) -> f32 {
            self.half_height
        }
        fn set_capsule_collision(&mut self, enabled: bool) {
            self.capsule_collision = enabled;
        }
        fn set_braking_friction_factor(&mut self, _factor: f32) {}
        fn line_trace(&self, start: Vec3, end: Vec3) -> Option<TraceHit> {
            let floor_z = self.floor_z?;
            if end.z <= floor_z && start.z >= floor_z {
                Some(TraceHit { impact_point: Vec3::new(start.x, start.y, floor_z) })
            } else {
                None
            }
        }
    }

    #[derive(Default)]
    struct TestBody {
        pelvis: Vec3,
        root_velocity: Vec3,
        pelvis_roll: f32,
        pelvis_yaw: f32,
        simulating: bool,
        motor_strength: f32,
        gravity_enabled: bool,
        forces: Vec<(Bone, Vec3)>,
    }

    impl RagdollBody for TestBody {
        fn bone_location(&self, _bone: Bone) -> Vec3 {
            self.pelvis
        }
        fn bone_linear_velocity(&self, _bone: Bone) -> Vec3 {
            self.root_velocity
        }
        fn pelvis_roll(&self) -> f32 {
            self.pelvis_roll
        }
        fn pelvis_yaw(&self) -> f32 {
            self.pelvis_yaw
        }
        fn set_simulate_below_pelvis(&mut self, enabled: bool) {
            self.simulating = enabled;
        }
        fn set_motor_drive_strength(&mut self, spring: f32) {
            self.motor_strength = spring;
        }
        fn set_gravity_enabled(&mut self, enabled: bool) {
            self.gravity_enabled = enabled;
        }
        fn add_force_at_bone(&mut self, bone: Bone, force: Vec3) {
            self.forces.push((bone, force));
        }
    }

    #[derive(Default)]
    struct TestAnim {
        montages: Vec<(Montage, f32)>,
        stopped: Vec<f32>,
        snapshots: Vec<String>,
    }

    impl AnimationLink for TestAnim {
        fn curve_value(&self, _curve: crate::engine::interfaces::CurveName) -> f32 {
            0.0
        }
        fn play_montage(&mut self, montage: Montage, play_rate: f32) {
            self.montages.push((montage, play_rate));
        }
        fn stop_montage(&mut self, blend_out: f32) {
            self.stopped.push(blend_out);
        }
        fn save_pose_snapshot(&mut self, name: &str) {
            self.snapshots.push(name.to_string());
        }
    }

    fn setup() -> (RagdollController, TestPhysics, TestBody, TestAnim, BufferedReplication) {
        let controller = RagdollController::new(false);
        let physics = TestPhysics {
            capsule_collision: true,
            half_height: 88.0,
            ..Default::default()
        };
        let body = TestBody { pelvis: Vec3::new(0.0, 0.0, 100.0), ..Default::default() };
        (controller, physics, body, TestAnim::default(), BufferedReplication::new())
    }

    #[test]
    fn begin_hands_the_body_to_physics() {
        let (mut controller, mut physics, mut body, mut anim, _link) = setup();
        physics.velocity = Vec3::new(300.0, 0.0, -200.0);

        controller.begin(&mut physics, &mut body, Some(&mut anim));

        assert!(controller.is_active());
        assert_eq!(physics.mode, MoveMode::None);
        assert_eq!(physics.velocity, Vec3::zeros());
        assert!(!physics.capsule_collision);
        assert!(body.simulating);
        assert_eq!(anim.stopped, vec![MONTAGE_STOP_BLEND]);
        assert_eq!(controller.target_location(), body.pelvis);
    }

    #[test]
    fn ground_probe_lifts_by_penetration_depth() {
        let (mut controller, mut physics, mut body, _anim, mut link) = setup();
        // Floor 50 units below the pelvis, capsule half-height 88.
        physics.floor_z = Some(50.0);
        controller.begin(&mut physics, &mut body, None);

        let pose = controller.update(
            1.0 / 60.0,
            true,
            NetRole::Authority,
            &mut physics,
            &mut body,
            &mut link,
        );

        assert!(controller.on_ground());
        // Raised by 88 - 50 + 2 = 40 above the pelvis height.
        assert!((pose.location.z - 140.0).abs() < 1e-4, "got {}", pose.location.z);
    }

    #[test]
    fn airborne_probe_misses_and_location_tracks_pelvis() {
        let (mut controller, mut physics, mut body, _anim, mut link) = setup();
        physics.floor_z = None;
        controller.begin(&mut physics, &mut body, None);

        let pose = controller.update(
            1.0 / 60.0,
            true,
            NetRole::Authority,
            &mut physics,
            &mut body,
            &mut link,
        );

        assert!(!controller.on_ground());
        assert_eq!(pose.location, body.pelvis);
    }

    #[test]
    fn spring_maps_velocity_and_gravity_cuts_off() {
        let (mut controller, mut physics, mut body, _anim, mut link) = setup();
        controller.begin(&mut physics, &mut body, None);

        body.root_velocity = Vec3::new(500.0, 0.0, 0.0);
        controller.update(1.0 / 60.0, true, NetRole::Authority, &mut physics, &mut body, &mut link);
        assert_eq!(body.motor_strength, 12500.0);
        assert!(body.gravity_enabled);

        body.root_velocity = Vec3::new(0.0, 0.0, -5000.0);
        controller.update(1.0 / 60.0, true, NetRole::Authority, &mut physics, &mut body, &mut link);
        assert!(!body.gravity_enabled);
    }

    #[test]
    fn face_detection_follows_roll_sign_and_polarity() {
        let (mut controller, mut physics, mut body, _anim, mut link) = setup();
        controller.begin(&mut physics, &mut body, None);

        body.pelvis_roll = -10.0;
        body.pelvis_yaw = 40.0;
        let pose = controller.update(
            1.0 / 60.0,
            true,
            NetRole::Authority,
            &mut physics,
            &mut body,
            &mut link,
        );
        assert!(controller.face_up());
        assert!((pose.yaw - (40.0 - 180.0)).abs() < 1e-4);

        // Mirrored skeleton flips the polarity.
        let mut mirrored = RagdollController::new(true);
        mirrored.begin(&mut physics, &mut body, None);
        mirrored.update(1.0 / 60.0, true, NetRole::Authority, &mut physics, &mut body, &mut link);
        assert!(!mirrored.face_up());
    }

    #[test]
    fn remote_peer_ramps_pull_and_picks_anchor_by_speed() {
        let (mut controller, mut physics, mut body, _anim, mut link) = setup();
        controller.begin(&mut physics, &mut body, None);
        controller.set_target_location(Vec3::new(100.0, 0.0, 100.0));

        body.root_velocity = Vec3::new(50.0, 0.0, 0.0);
        controller.update(
            0.1,
            false,
            NetRole::SimulatedProxy,
            &mut physics,
            &mut body,
            &mut link,
        );
        let (anchor, force) = body.forces[0];
        assert_eq!(anchor, Bone::Pelvis);
        assert!(force.x > 0.0);

        // Fast ragdoll anchors at the spine.
        body.root_velocity = Vec3::new(500.0, 0.0, 0.0);
        controller.update(
            0.1,
            false,
            NetRole::SimulatedProxy,
            &mut physics,
            &mut body,
            &mut link,
        );
        assert_eq!(body.forces[1].0, Bone::Spine);

        // Pull strength keeps ramping toward the cap.
        let mut previous = 0.0;
        for _ in 0..50 {
            controller.update(
                0.1,
                false,
                NetRole::SimulatedProxy,
                &mut physics,
                &mut body,
                &mut link,
            );
            let strength = controller.pull_strength;
            assert!(strength >= previous);
            assert!(strength <= PULL_STRENGTH_MAX);
            previous = strength;
        }
    }

    #[test]
    fn remote_zero_velocity_decays_instead_of_snapping() {
        let (mut controller, mut physics, mut body, _anim, mut link) = setup();
        controller.begin(&mut physics, &mut body, None);

        body.root_velocity = Vec3::new(400.0, 0.0, 0.0);
        controller.update(
            1.0 / 60.0,
            false,
            NetRole::SimulatedProxy,
            &mut physics,
            &mut body,
            &mut link,
        );
        assert_eq!(controller.last_velocity().x, 400.0);

        body.root_velocity = Vec3::zeros();
        controller.update(
            1.0 / 60.0,
            false,
            NetRole::SimulatedProxy,
            &mut physics,
            &mut body,
            &mut link,
        );
        assert_eq!(controller.last_velocity().x, 200.0);
    }

    #[test]
    fn controlled_non_authority_replicates_target() {
        let (mut controller, mut physics, mut body, _anim, mut link) = setup();
        controller.begin(&mut physics, &mut body, None);

        controller.update(
            1.0 / 60.0,
            true,
            NetRole::AutonomousProxy,
            &mut physics,
            &mut body,
            &mut link,
        );
        assert_eq!(
            link.requests,
            vec![ReplicationCall::SetRagdollTarget { location: body.pelvis }]
        );
    }

    #[test]
    fn end_on_ground_plays_get_up_for_facing() {
        let (mut controller, mut physics, mut body, mut anim, mut link) = setup();
        physics.floor_z = Some(50.0);
        controller.begin(&mut physics, &mut body, Some(&mut anim));
        body.pelvis_roll = -10.0; // face up
        controller.update(1.0 / 60.0, true, NetRole::Authority, &mut physics, &mut body, &mut link);

        let exit = controller.end(&mut physics, &mut body, Some(&mut anim));

        assert_eq!(exit, RagdollExit::GetUp { face_up: true });
        assert_eq!(physics.mode, MoveMode::Walking);
        assert!(physics.capsule_collision);
        assert!(!body.simulating);
        assert_eq!(anim.snapshots, vec!["ragdoll_pose".to_string()]);
        assert_eq!(anim.montages, vec![(Montage::GetUpFaceUp, 1.0)]);
        assert!(!controller.is_active());
    }

    #[test]
    fn end_airborne_resumes_falling_with_last_velocity() {
        let (mut controller, mut physics, mut body, _anim, mut link) = setup();
        physics.floor_z = None;
        controller.begin(&mut physics, &mut body, None);
        body.root_velocity = Vec3::new(120.0, 0.0, -340.0);
        controller.update(1.0 / 60.0, true, NetRole::Authority, &mut physics, &mut body, &mut link);

        let exit = controller.end(&mut physics, &mut body, None);

        assert_eq!(exit, RagdollExit::Falling);
        assert_eq!(physics.mode, MoveMode::Falling);
        assert_eq!(physics.velocity, Vec3::new(120.0, 0.0, -340.0));
    }
}
