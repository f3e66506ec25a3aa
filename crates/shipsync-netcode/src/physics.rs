//! Physics collaborator for the locally predicted ship
//!
//! The netcode never integrates motion itself. It drives a [`ShipBody`]
//! through two capabilities:
//!
//! - [`ShipBody::advance_physics_step`] runs the full step, including
//!   collision response, for live prediction
//! - [`ShipBody::advance_kinematics`] integrates motion only, and is what
//!   reconciliation replays history through
//!
//! Keeping these separate lets replay stay independent of the physics
//! backend. [`SimpleShip`] is a small deterministic implementation used by the
//! demo client and the tests.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use shipsync_core::{CruiseState, Pose, RawControls};

/// The local player's simulated body
pub trait ShipBody {
    /// Current pose
    fn pose(&self) -> Pose;

    /// Teleport to a pose
    fn set_pose(&mut self, pose: Pose);

    /// World-space linear velocity
    fn linear_velocity(&self) -> Vec3;

    /// Set the world-space linear velocity
    fn set_linear_velocity(&mut self, velocity: Vec3);

    /// World-space angular velocity
    fn angular_velocity(&self) -> Vec3;

    /// Set the world-space angular velocity
    fn set_angular_velocity(&mut self, velocity: Vec3);

    /// Cruise engine progress
    fn cruise(&self) -> CruiseState;

    /// Overwrite cruise engine progress
    fn set_cruise(&mut self, cruise: CruiseState);

    /// Blend cruise progress toward an authoritative value
    ///
    /// `authoritative` was true `elapsed` seconds ago; the body extrapolates
    /// it forward by its own charge and acceleration rates.
    fn resync_cruise(&mut self, authoritative: CruiseState, elapsed: f32);

    /// Integrate one step of motion without collision response
    fn advance_kinematics(&mut self, dt: f32, controls: &RawControls) -> Pose;

    /// Run one full physics step
    fn advance_physics_step(&mut self, dt: f32, controls: &RawControls) -> Pose;

    /// Current speed
    fn speed(&self) -> f32 {
        self.linear_velocity().length()
    }
}

/// Performance figures for [`SimpleShip`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipParams {
    /// Speed at full throttle
    pub max_speed: f32,
    /// Fraction of `max_speed` available in reverse
    pub reverse_fraction: f32,
    /// Extra forward speed while thrusting
    pub thrust_speed: f32,
    /// Lateral speed while strafing
    pub strafe_speed: f32,
    /// Maximum turn rate per axis in radians per second
    pub turn_rate: f32,
    /// Speed once cruise is fully accelerated
    pub cruise_speed: f32,
    /// Seconds to charge the cruise engine
    pub cruise_charge_time: f32,
    /// Seconds from cruise engage to full cruise speed
    pub cruise_accel_time: f32,
    /// Radius of the playable sphere, enforced by the full physics step
    pub arena_radius: f32,
}

impl Default for ShipParams {
    fn default() -> Self {
        Self {
            max_speed: 80.0,
            reverse_fraction: 0.3,
            thrust_speed: 40.0,
            strafe_speed: 20.0,
            turn_rate: 1.5,
            cruise_speed: 300.0,
            cruise_charge_time: 5.0,
            cruise_accel_time: 3.0,
            arena_radius: 50_000.0,
        }
    }
}

/// Deterministic velocity-model ship
///
/// Velocity is derived directly from the controls each step, so identical
/// control sequences from identical poses always produce identical results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleShip {
    pub params: ShipParams,
    pose: Pose,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    cruise: CruiseState,
}

impl SimpleShip {
    /// Create a ship at rest
    pub fn new(params: ShipParams, pose: Pose) -> Self {
        Self {
            params,
            pose,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            cruise: CruiseState::default(),
        }
    }

    /// Check if the cruise engine is fully charged
    pub fn is_cruising(&self) -> bool {
        self.cruise.charge_pct >= 1.0
    }

    fn update_cruise(&mut self, dt: f32, engaged: bool) {
        if !engaged {
            self.cruise = CruiseState::default();
            return;
        }
        if self.cruise.charge_pct < 1.0 {
            self.cruise.charge_pct =
                (self.cruise.charge_pct + dt / self.params.cruise_charge_time).min(1.0);
        } else {
            self.cruise.accel_pct =
                (self.cruise.accel_pct + dt / self.params.cruise_accel_time).min(1.0);
        }
    }

    fn forward_speed(&self, controls: &RawControls) -> f32 {
        let p = &self.params;
        if self.is_cruising() {
            return p.max_speed + (p.cruise_speed - p.max_speed) * self.cruise.accel_pct;
        }
        let throttle = controls.throttle.clamp(-p.reverse_fraction, 1.0);
        let mut speed = throttle * p.max_speed;
        if controls.thrust {
            speed += p.thrust_speed;
        }
        speed
    }
}

impl Default for SimpleShip {
    fn default() -> Self {
        Self::new(ShipParams::default(), Pose::IDENTITY)
    }
}

impl ShipBody for SimpleShip {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    fn cruise(&self) -> CruiseState {
        self.cruise
    }

    fn set_cruise(&mut self, cruise: CruiseState) {
        self.cruise = cruise;
    }

    fn resync_cruise(&mut self, authoritative: CruiseState, elapsed: f32) {
        if self.cruise.charge_pct <= 0.0 && self.cruise.accel_pct <= 0.0 {
            // Not charging locally; nothing to blend
            return;
        }
        let charge = authoritative.charge_pct + elapsed / self.params.cruise_charge_time;
        self.cruise.charge_pct = charge.min(1.0);
        if self.cruise.charge_pct >= 1.0 {
            let accel = authoritative.accel_pct + elapsed / self.params.cruise_accel_time;
            self.cruise.accel_pct = accel.min(1.0);
        }
    }

    fn advance_kinematics(&mut self, dt: f32, controls: &RawControls) -> Pose {
        self.update_cruise(dt, controls.cruise);

        let steering = controls.steering.clamp(Vec3::splat(-1.0), Vec3::splat(1.0));
        self.angular_velocity = self.pose.orientation * (steering * self.params.turn_rate);
        let orientation =
            (Quat::from_scaled_axis(self.angular_velocity * dt) * self.pose.orientation).normalize();

        let forward = orientation * Vec3::NEG_Z;
        let mut velocity = forward * self.forward_speed(controls);
        if !self.is_cruising() {
            let strafe = controls.strafe.direction().normalize_or_zero();
            velocity += orientation * strafe * self.params.strafe_speed;
        }
        self.linear_velocity = velocity;

        self.pose = Pose::new(self.pose.position + velocity * dt, orientation);
        self.pose
    }

    fn advance_physics_step(&mut self, dt: f32, controls: &RawControls) -> Pose {
        self.advance_kinematics(dt, controls);

        // Arena boundary is the only collider
        let radius = self.params.arena_radius;
        let distance = self.pose.position.length();
        if distance > radius {
            let normal = self.pose.position / distance;
            self.pose.position = normal * radius;
            let outward = self.linear_velocity.dot(normal);
            if outward > 0.0 {
                self.linear_velocity -= normal * outward;
            }
        }
        self.pose
    }
}
