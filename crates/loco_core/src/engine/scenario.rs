//! Deterministic scenario harness.
//!
//! Minimal in-memory implementations of the collaborator interfaces plus a
//! per-peer bundle, so integration tests and the CLI can run a full
//! authority/proxy simulation without a real physics or animation engine.
//! Everything steps on fixed dt; no wall clock, no randomness.

use crate::config::LocomotionConfig;
use crate::engine::character::{Character, CharacterParams, Links};
use crate::engine::interfaces::{
    AnimationLink, Bone, CurveName, Montage, PhysicsLink, RagdollBody, TraceHit,
};
use crate::engine::math::{horizontal, Vec3};
use crate::engine::types::MoveMode;
use crate::prediction::replication::BufferedReplication;

/// Flat-floor kinematic integrator.
#[derive(Debug, Clone)]
pub struct ScenarioPhysics {
    pub location: Vec3,
    velocity: Vec3,
    input_acceleration: Vec3,
    mode: MoveMode,
    capsule_half_height: f32,
    pub capsule_collision: bool,
    pub braking_friction_factor: f32,
    pub floor_z: f32,
    pub gravity_z: f32,
    pub jump_velocity: f32,
}

impl ScenarioPhysics {
    pub fn new(floor_z: f32) -> Self {
        let half_height = 88.0;
        Self {
            location: Vec3::new(0.0, 0.0, floor_z + half_height),
            velocity: Vec3::zeros(),
            input_acceleration: Vec3::zeros(),
            mode: MoveMode::Walking,
            capsule_half_height: half_height,
            capsule_collision: true,
            braking_friction_factor: 0.0,
            floor_z,
            gravity_z: -980.0,
            jump_velocity: 420.0,
        }
    }

    pub fn set_input_acceleration(&mut self, acceleration: Vec3) {
        self.input_acceleration = acceleration;
    }

    fn standing_z(&self) -> f32 {
        self.floor_z + self.capsule_half_height
    }

    /// Integrate one step under the character's movement caps.
    pub fn step(&mut self, dt: f32, caps: &crate::engine::character::MovementCaps) {
        match self.mode {
            MoveMode::Walking => {
                let input = horizontal(&self.input_acceleration);
                let mut vel = horizontal(&self.velocity);
                if input.norm() > 1e-3 && caps.max_acceleration > 0.0 {
                    let scale = (input.norm() / caps.max_acceleration).min(1.0);
                    let desired = input / input.norm() * caps.max_speed * scale;
                    let delta = desired - vel;
                    let max_step = caps.max_acceleration * dt;
                    vel += if delta.norm() <= max_step {
                        delta
                    } else {
                        delta / delta.norm() * max_step
                    };
                } else {
                    let speed = vel.norm();
                    let drop = caps.braking_deceleration * dt;
                    vel = if speed <= drop { Vec3::zeros() } else { vel / speed * (speed - drop) };
                }
                self.velocity = vel;
                self.location += self.velocity * dt;
                self.location.z = self.standing_z();
            }
            MoveMode::Falling => {
                self.velocity.z += self.gravity_z * dt;
                self.location += self.velocity * dt;
                if self.location.z <= self.standing_z() && self.velocity.z <= 0.0 {
                    self.location.z = self.standing_z();
                    self.mode = MoveMode::Walking;
                }
            }
            MoveMode::None => {}
        }
    }
}

impl PhysicsLink for ScenarioPhysics {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn input_acceleration(&self) -> Vec3 {
        self.input_acceleration
    }

    fn move_mode(&self) -> MoveMode {
        self.mode
    }

    fn set_move_mode(&mut self, mode: MoveMode) {
        self.mode = mode;
    }

    fn jump(&mut self) {
        if self.mode == MoveMode::Walking {
            self.velocity.z = self.jump_velocity;
            self.mode = MoveMode::Falling;
        }
    }

    fn stop_jump(&mut self) {}

    fn capsule_half_height(&self) -> f32 {
        self.capsule_half_height
    }

    fn set_capsule_collision(&mut self, enabled: bool) {
        self.capsule_collision = enabled;
    }

    fn set_braking_friction_factor(&mut self, factor: f32) {
        self.braking_friction_factor = factor;
    }

    fn line_trace(&self, start: Vec3, end: Vec3) -> Option<TraceHit> {
        if start.z >= self.floor_z && end.z <= self.floor_z {
            Some(TraceHit { impact_point: Vec3::new(start.x, start.y, self.floor_z) })
        } else {
            None
        }
    }
}

/// Puppet skeleton: follows the actor until simulation is enabled, then
/// falls under gravity onto the floor.
#[derive(Debug, Clone)]
pub struct ScenarioBody {
    pub pelvis: Vec3,
    pub pelvis_roll: f32,
    pub pelvis_yaw: f32,
    pub root_velocity: Vec3,
    pub simulating: bool,
    pub motor_strength: f32,
    pub gravity_enabled: bool,
    pub forces: Vec<(Bone, Vec3)>,
    /// Resting height of a collapsed pelvis above the floor.
    pub rest_height: f32,
}

impl ScenarioBody {
    pub fn new(pelvis: Vec3) -> Self {
        Self {
            pelvis,
            pelvis_roll: 0.0,
            pelvis_yaw: 0.0,
            root_velocity: Vec3::zeros(),
            simulating: false,
            motor_strength: 0.0,
            gravity_enabled: true,
            forces: Vec::new(),
            rest_height: 30.0,
        }
    }

    pub fn step(&mut self, dt: f32, floor_z: f32) {
        if !self.simulating {
            return;
        }
        if self.gravity_enabled {
            self.root_velocity.z -= 980.0 * dt;
        }
        self.pelvis += self.root_velocity * dt;
        let rest = floor_z + self.rest_height;
        if self.pelvis.z <= rest {
            self.pelvis.z = rest;
            // Collapsed on the floor: kill the fall, bleed sideways motion.
            self.root_velocity = horizontal(&self.root_velocity) * 0.5;
        }
    }

    /// Snap the puppet to the actor while animation drives it.
    pub fn follow(&mut self, actor_location: Vec3, actor_yaw: f32) {
        if !self.simulating {
            self.pelvis = actor_location;
            self.pelvis_yaw = actor_yaw;
        }
    }
}

impl RagdollBody for ScenarioBody {
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

/// Scripted animation engine: curve values are plain fields, montage calls
/// are recorded.
#[derive(Debug, Clone, Default)]
pub struct ScenarioAnim {
    pub yaw_offset: f32,
    pub rotation_amount: f32,
    pub montages: Vec<(Montage, f32)>,
    pub stops: Vec<f32>,
    pub snapshots: Vec<String>,
}

impl AnimationLink for ScenarioAnim {
    fn curve_value(&self, curve: CurveName) -> f32 {
        match curve {
            CurveName::YawOffset => self.yaw_offset,
            CurveName::RotationAmount => self.rotation_amount,
        }
    }

    fn play_montage(&mut self, montage: Montage, play_rate: f32) {
        self.montages.push((montage, play_rate));
    }

    fn stop_montage(&mut self, blend_out: f32) {
        self.stops.push(blend_out);
    }

    fn save_pose_snapshot(&mut self, name: &str) {
        self.snapshots.push(name.to_string());
    }
}

/// One simulation instance: a character plus its collaborators.
pub struct ScenarioPeer {
    pub character: Character,
    pub physics: ScenarioPhysics,
    pub body: ScenarioBody,
    pub anim: ScenarioAnim,
    pub replication: BufferedReplication,
}

impl ScenarioPeer {
    pub fn spawn(params: CharacterParams) -> Self {
        let physics = ScenarioPhysics::new(0.0);
        let body = ScenarioBody::new(physics.location);
        let mut peer = Self {
            character: Character::new(params),
            physics,
            body,
            anim: ScenarioAnim::default(),
            replication: BufferedReplication::new(),
        };
        peer.with_links(|character, links| character.begin_play(links));
        peer
    }

    pub fn spawn_default() -> Self {
        Self::spawn(CharacterParams { config: LocomotionConfig::default(), ..Default::default() })
    }

    /// Borrow the collaborators as a `Links` bundle for one call.
    pub fn with_links<R>(&mut self, f: impl FnOnce(&mut Character, &mut Links) -> R) -> R {
        let Self { character, physics, body, anim, replication } = self;
        let mut links = Links {
            physics,
            body: Some(body),
            anim: Some(anim),
            replication,
        };
        f(character, &mut links)
    }

    /// One full step: intent into the integrator, character update,
    /// integration under the updated caps.
    pub fn tick(&mut self, dt: f32) {
        let caps = self.character.movement_caps();
        let direction = if self.character.is_locally_controlled() {
            self.character.movement_input_world()
        } else {
            Vec3::zeros()
        };
        self.physics.set_input_acceleration(direction * caps.max_acceleration);

        self.with_links(|character, links| character.tick(dt, links));

        let caps = self.character.movement_caps();
        self.physics.step(dt, &caps);
        let floor_z = self.physics.floor_z;
        self.body.step(dt, floor_z);
        self.body.follow(self.physics.location, self.character.yaw());
    }
}

/// Ship one peer's pending requests to another (usually proxy → authority).
pub fn deliver_requests(from: &mut ScenarioPeer, to: &mut ScenarioPeer) {
    for call in from.replication.take_requests() {
        to.with_links(|character, links| character.apply_replication_call(call, links));
    }
}

/// Ship one peer's pending confirms to another (authority → proxy/mirror).
pub fn deliver_confirms(from: &mut ScenarioPeer, to: &mut ScenarioPeer) {
    let calls = from.replication.take_confirms();
    for call in &calls {
        to.with_links(|character, links| character.apply_replication_call(*call, links));
    }
    // Re-buffer for additional recipients.
    from.replication.confirms = calls;
}

/// Drop the buffered confirms once every recipient has them.
pub fn clear_confirms(peer: &mut ScenarioPeer) {
    peer.replication.confirms.clear();
}
