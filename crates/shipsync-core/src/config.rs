//! Tunable constants for prediction, reconciliation and clock sync
//!
//! Every field has a default matching the tuned values of the live game, so
//! a RON file only needs to name what it changes:
//!
//! ```ron
//! (
//!     tick_rate: 30,
//!     position_tolerance: 0.25,
//! )
//! ```

use crate::{time, Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for a client sync session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Simulation rate in ticks per second
    pub tick_rate: u32,
    /// Predicted move states kept for reconciliation
    pub move_history_capacity: usize,
    /// Decoded snapshots kept as delta baselines
    pub snapshot_cache_capacity: usize,
    /// Samples in the tick offset moving average
    pub offset_window: usize,
    /// Single-snapshot offset strictly below which the client time-warps forward
    pub warp_threshold: i32,
    /// Ticks simulated by one time-warp
    pub warp_ticks: u32,
    /// Snapshots after a time-warp during which another one is blocked
    pub warp_cooldown: u32,
    /// Playback interval forced while a time-warp is in progress
    pub warp_interval: f64,
    /// Position divergence (world units) that triggers a correction
    pub position_tolerance: f32,
    /// Orientation divergence (quat error) that triggers a correction
    pub orientation_tolerance: f32,
    /// Corrections longer than `speed * fraction` snap instead of smoothing
    pub teleport_speed_fraction: f32,
    /// Per-tick multiplier applied to the position smoothing offset
    pub smoothing_position_decay: f32,
    /// Per-tick slerp factor towards identity for the orientation offset
    pub smoothing_orientation_slerp: f32,
    /// Offsets below this are cleared
    pub smoothing_epsilon: f32,
    /// Disables the 3-tick band, which only suits an in-process server
    pub multiplayer: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_rate: time::DEFAULT_TICK_RATE,
            move_history_capacity: 128,
            snapshot_cache_capacity: 1000,
            offset_window: 90,
            warp_threshold: -50,
            warp_ticks: 32,
            warp_cooldown: 10,
            warp_interval: 0.9687,
            position_tolerance: 0.1,
            orientation_tolerance: 0.1,
            teleport_speed_fraction: 0.33,
            smoothing_position_decay: 0.95,
            smoothing_orientation_slerp: 0.05,
            smoothing_epsilon: 0.001,
            multiplayer: true,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: SyncConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(Error::InvalidConfig("tick_rate must be positive".into()));
        }
        if self.move_history_capacity == 0 {
            return Err(Error::InvalidConfig(
                "move_history_capacity must be positive".into(),
            ));
        }
        if self.snapshot_cache_capacity == 0 {
            return Err(Error::InvalidConfig(
                "snapshot_cache_capacity must be positive".into(),
            ));
        }
        if self.offset_window == 0 {
            return Err(Error::InvalidConfig("offset_window must be positive".into()));
        }
        if !(self.warp_interval > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "warp_interval must be positive, got {}",
                self.warp_interval
            )));
        }
        if !(self.position_tolerance >= 0.0) || !(self.orientation_tolerance >= 0.0) {
            return Err(Error::InvalidConfig(
                "tolerances must be non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_position_decay)
            || !(0.0..=1.0).contains(&self.smoothing_orientation_slerp)
        {
            return Err(Error::InvalidConfig(
                "smoothing factors must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Duration of one tick in seconds
    pub fn tick_seconds(&self) -> f32 {
        time::tick_seconds(self.tick_rate)
    }
}
