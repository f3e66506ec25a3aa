//! Visual smoothing of prediction corrections
//!
//! A correction moves the simulated body instantly. To hide the pop, the
//! difference between the old and new pose is kept as an offset that the
//! render layer adds back and that decays to nothing over a few ticks. The
//! offset never feeds back into physics or reconciliation.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use shipsync_core::{quat_error, Pose, SyncConfig};

/// Decaying render-only offset between the pre- and post-correction pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingOffset {
    /// Added to the simulated position when rendering
    pub position: Vec3,
    /// Applied after the simulated orientation when rendering
    pub orientation: Quat,
    position_decay: f32,
    orientation_slerp: f32,
    epsilon: f32,
}

impl SmoothingOffset {
    /// Create an idle offset with the config's decay rates
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            position_decay: config.smoothing_position_decay,
            orientation_slerp: config.smoothing_orientation_slerp,
            epsilon: config.smoothing_epsilon,
        }
    }

    /// Store the offset that makes `after` render as `before`
    pub fn record(&mut self, before: Pose, after: Pose) {
        self.position = before.position - after.position;
        self.orientation = (after.orientation.inverse() * before.orientation).normalize();
    }

    /// Drop any pending offset
    pub fn clear(&mut self) {
        self.position = Vec3::ZERO;
        self.orientation = Quat::IDENTITY;
    }

    /// Shrink the offset by one tick's worth
    pub fn decay(&mut self) {
        self.position *= self.position_decay;
        if self.position.length() < self.epsilon {
            self.position = Vec3::ZERO;
        }

        self.orientation = self
            .orientation
            .slerp(Quat::IDENTITY, self.orientation_slerp)
            .normalize();
        if quat_error(self.orientation, Quat::IDENTITY) < self.epsilon {
            self.orientation = Quat::IDENTITY;
        }
    }

    /// Pose to draw for a simulated pose
    pub fn render_pose(&self, body: Pose) -> Pose {
        Pose::new(
            body.position + self.position,
            body.orientation * self.orientation,
        )
    }

    /// Check if there is nothing left to smooth
    pub fn is_idle(&self) -> bool {
        self.position == Vec3::ZERO && self.orientation == Quat::IDENTITY
    }
}

impl Default for SmoothingOffset {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}
