//! Raw ship control inputs and the per-tick move record

use crate::{Pose, Tick};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Strafe direction flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrafeControls(u8);

impl StrafeControls {
    pub const NONE: StrafeControls = StrafeControls(0);
    pub const LEFT: StrafeControls = StrafeControls(1);
    pub const RIGHT: StrafeControls = StrafeControls(1 << 1);
    pub const UP: StrafeControls = StrafeControls(1 << 2);
    pub const DOWN: StrafeControls = StrafeControls(1 << 3);

    const ALL: u8 = 0b1111;

    /// Build from raw bits, ignoring unknown ones
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    /// Raw bits
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Check if every flag in `other` is set
    pub fn contains(&self, other: StrafeControls) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the flags in `other`
    pub fn insert(&mut self, other: StrafeControls) {
        self.0 |= other.0;
    }

    /// Clear the flags in `other`
    pub fn remove(&mut self, other: StrafeControls) {
        self.0 &= !other.0;
    }

    /// Check if no direction is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Unnormalized local-space strafe direction
    ///
    /// Opposite flags cancel out.
    pub fn direction(&self) -> Vec3 {
        let mut dir = Vec3::ZERO;
        if self.contains(Self::LEFT) {
            dir.x -= 1.0;
        }
        if self.contains(Self::RIGHT) {
            dir.x += 1.0;
        }
        if self.contains(Self::UP) {
            dir.y += 1.0;
        }
        if self.contains(Self::DOWN) {
            dir.y -= 1.0;
        }
        dir
    }
}

impl BitOr for StrafeControls {
    type Output = StrafeControls;

    fn bitor(self, rhs: StrafeControls) -> StrafeControls {
        StrafeControls(self.0 | rhs.0)
    }
}

/// A queued weapon fire request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireCommand {
    /// World-space target point
    pub target: Vec3,
    /// Bit per hardpoint that should fire
    pub gun_mask: u32,
}

/// Control inputs sampled for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawControls {
    /// Desired angular rate per local axis, each in [-1, 1]
    pub steering: Vec3,
    /// World-space point the guns are aimed at
    pub aim_point: Vec3,
    /// Engine power in [-1, 1]
    pub throttle: f32,
    pub strafe: StrafeControls,
    /// Afterburner
    pub thrust: bool,
    pub cruise: bool,
    pub fire_command: Option<FireCommand>,
}

/// Predicted pose plus the controls that produced it, for one tick
///
/// The pose is the state after the tick's controls were applied. It is
/// rewritten in place when reconciliation replays history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveState {
    pub tick: Tick,
    pub pose: Pose,
    pub controls: RawControls,
}

impl MoveState {
    /// Create a new move record
    pub fn new(tick: Tick, pose: Pose, controls: RawControls) -> Self {
        Self {
            tick,
            pose,
            controls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strafe_flags() {
        let mut strafe = StrafeControls::LEFT | StrafeControls::UP;
        assert!(strafe.contains(StrafeControls::LEFT));
        assert!(!strafe.contains(StrafeControls::RIGHT));

        strafe.remove(StrafeControls::LEFT);
        strafe.insert(StrafeControls::DOWN);
        assert_eq!(strafe.bits(), StrafeControls::UP.bits() | StrafeControls::DOWN.bits());
        assert!(!strafe.is_empty());
    }

    #[test]
    fn test_strafe_direction_cancels() {
        let strafe = StrafeControls::LEFT | StrafeControls::RIGHT | StrafeControls::UP;
        assert_eq!(strafe.direction(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(StrafeControls::NONE.direction(), Vec3::ZERO);
    }

    #[test]
    fn test_from_bits_truncate() {
        assert_eq!(StrafeControls::from_bits_truncate(0xff).bits(), 0b1111);
    }
}
