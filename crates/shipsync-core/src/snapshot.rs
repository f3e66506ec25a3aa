//! Authoritative server state
//!
//! A [`Snapshot`] is the full server view for one tick: the local player's
//! authoritative state and the latest updates for other objects.

use crate::{Pose, Tick};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identifier of a world object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Engine mode reported for remote ships
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CruiseThrustState {
    #[default]
    None,
    Cruising,
    CruiseCharging,
    Thrusting,
}

/// Reputation of an object towards the local player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepAttitude {
    #[default]
    Neutral,
    Friendly,
    Hostile,
}

/// Discrete state flags of a remote object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectFlags {
    pub tradelane: bool,
    pub engine_kill: bool,
    pub cruise_thrust: CruiseThrustState,
    pub rep_to_player: RepAttitude,
}

/// Turret orientation on a hardpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GunOrient {
    pub hardpoint: String,
    pub pitch: f32,
    pub rotation: f32,
}

/// Reported state of a non-player object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectUpdate {
    pub id: ObjectId,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub flags: ObjectFlags,
    pub throttle: f32,
    pub hull: f32,
    pub shield: f32,
    pub guns: Vec<GunOrient>,
}

impl ObjectUpdate {
    /// All-default update for an object, the base for newly seen objects
    pub fn blank(id: ObjectId) -> Self {
        Self {
            id,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            flags: ObjectFlags::default(),
            throttle: 0.0,
            hull: 0.0,
            shield: 0.0,
            guns: Vec::new(),
        }
    }

    /// Reported pose
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }
}

/// Cruise engine progress, both values in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CruiseState {
    pub charge_pct: f32,
    pub accel_pct: f32,
}

impl CruiseState {
    /// Check if the cruise engine is charging or engaged
    pub fn is_active(&self) -> bool {
        self.charge_pct > 0.0 || self.accel_pct > 0.0
    }
}

/// Authoritative state of the local player's ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerAuthState {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub health: f32,
    pub shield: f32,
    pub cruise_charge_pct: f32,
    pub cruise_accel_pct: f32,
}

impl PlayerAuthState {
    /// Authoritative pose
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }

    /// Authoritative cruise progress
    pub fn cruise(&self) -> CruiseState {
        CruiseState {
            charge_pct: self.cruise_charge_pct,
            accel_pct: self.cruise_accel_pct,
        }
    }
}

impl Default for PlayerAuthState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            health: 0.0,
            shield: 0.0,
            cruise_charge_pct: 0.0,
            cruise_accel_pct: 0.0,
        }
    }
}

/// Full authoritative server state for one tick
///
/// Wire name: `SPUpdatePacket`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: Tick,
    /// Latest client input tick the server had consumed for this snapshot
    pub input_sequence: Tick,
    pub player: PlayerAuthState,
    pub updates: Vec<ObjectUpdate>,
}

impl Snapshot {
    /// `input_sequence - tick`, positive when the server holds buffered input
    pub fn tick_offset(&self) -> i64 {
        i64::from(self.input_sequence) - i64::from(self.tick)
    }

    /// Find the update for an object
    pub fn update_for(&self, id: ObjectId) -> Option<&ObjectUpdate> {
        self.updates.iter().find(|u| u.id == id)
    }
}
