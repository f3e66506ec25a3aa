//! ShipSync Core - Shared types for tick-synchronized ship netcode
//!
//! This crate provides the data model used by both ends of the connection:
//! - Tick counter and fixed-step scheduling (`Tick`, `FixedStepScheduler`)
//! - Poses and the quaternion error metric (`Pose`, `quat_error`)
//! - Raw controls and per-tick move records (`RawControls`, `MoveState`)
//! - Outbound input packets with redundant history and update acks
//! - Authoritative snapshots, full and delta-encoded
//! - Session configuration loaded from RON (`SyncConfig`)
//!
//! ## Wire Types
//!
//! Packets are plain serde types. The transport decides how they are encoded;
//! the types only fix the information each packet carries.
//!
//! | Type | Direction |
//! |------|-----------|
//! | [`InputUpdatePacket`] | client to server, every tick |
//! | [`Snapshot`] | server to client, full state |
//! | [`DeltaSnapshot`] | server to client, changes against an acked baseline |

mod config;
mod controls;
mod delta;
mod error;
mod input;
mod math;
mod snapshot;
pub mod time;

pub use config::SyncConfig;
pub use controls::{FireCommand, MoveState, RawControls, StrafeControls};
pub use delta::{DeltaSnapshot, InboundUpdate, ObjectDelta, PlayerAuthDelta};
pub use error::{Error, Result};
pub use input::{InputUpdatePacket, NetInputControls, UpdateAck, ACK_WINDOW};
pub use math::{quat_error, Pose};
pub use snapshot::{
    CruiseState, CruiseThrustState, GunOrient, ObjectFlags, ObjectId, ObjectUpdate,
    PlayerAuthState, RepAttitude, Snapshot,
};
pub use time::{FixedStepScheduler, Tick};

pub use glam::{Quat, Vec3};
