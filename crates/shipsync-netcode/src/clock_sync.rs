//! Tick drift control loop
//!
//! The server consumes exactly one client input per tick. The gap between
//! the newest input it had consumed (`input_sequence`) and the tick it was
//! simulating tells the client whether its input stream runs ahead or behind.
//! The controller smooths that offset and turns it into a playback interval
//! for the fixed-step scheduler:
//!
//! ```text
//! offset = input_sequence - tick
//!
//!   avg <= -16 ──▶ 0.75     (client far behind: run fast)
//!   avg <  0   ──▶ 0.9687
//!   avg == 0   ──▶ 1.0
//!   avg >= 16  ──▶ 1.205    (client far ahead: run slow)
//! ```
//!
//! When the client falls behind by more than the warp threshold it jumps
//! its tick counter forward instead of waiting for the bands to catch up.

use serde::{Deserialize, Serialize};
use shipsync_core::{Snapshot, SyncConfig};
use shipsync_ring_buffer::MovingAverage;
use tracing::info;

/// Every interval [`interval_for_offset`] can produce, in ascending order
///
/// Multiplayer sessions never see the 1.0050 band.
pub const INTERVAL_BANDS: [f64; 10] = [
    0.75, 0.875, 0.92, 0.9687, 1.0, 1.0050, 1.0070, 1.0312, 1.085, 1.205,
];

/// Map an averaged tick offset to a playback interval
///
/// Non-decreasing in `average_offset`. The 3-tick band only applies to
/// single-player sessions, where the server runs in-process.
pub fn interval_for_offset(average_offset: i32, multiplayer: bool) -> f64 {
    match average_offset {
        i32::MIN..=-16 => 0.75,
        -15..=-8 => 0.875,
        -7..=-4 => 0.92,
        -3..=-1 => 0.9687,
        16.. => 1.205,
        8..=15 => 1.085,
        6..=7 => 1.0312,
        4..=5 => 1.0070,
        3 if !multiplayer => 1.0050,
        _ => 1.0,
    }
}

/// Result of processing one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockAdjustment {
    /// Ticks to add to the local tick counter (0 unless time-warping)
    pub warp_ticks: u32,
    /// Playback interval to use from now on
    pub adjusted_interval: f64,
}

impl ClockAdjustment {
    /// Check if this adjustment is an emergency time-warp
    pub fn is_warp(&self) -> bool {
        self.warp_ticks > 0
    }
}

/// Diagnostic view of the controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockStats {
    pub last_offset: i32,
    pub average_offset: i32,
    pub adjusted_interval: f64,
    pub dropped_inputs: u32,
    pub time_warps: u32,
}

/// Offset smoothing and playback interval controller
#[derive(Debug, Clone)]
pub struct ClockSyncController {
    offsets: MovingAverage,
    last_offset: i32,
    adjusted_interval: f64,
    warp_cooldown: u32,
    dropped_inputs: u32,
    time_warps: u32,
    warp_threshold: i32,
    warp_ticks: u32,
    warp_cooldown_ticks: u32,
    warp_interval: f64,
    multiplayer: bool,
}

impl ClockSyncController {
    /// Create a controller from session config
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            offsets: MovingAverage::new(config.offset_window),
            last_offset: 0,
            adjusted_interval: 1.0,
            warp_cooldown: 0,
            dropped_inputs: 0,
            time_warps: 0,
            warp_threshold: config.warp_threshold,
            warp_ticks: config.warp_ticks,
            warp_cooldown_ticks: config.warp_cooldown,
            warp_interval: config.warp_interval,
            multiplayer: config.multiplayer,
        }
    }

    /// Process the newest snapshot of a frame
    pub fn update(&mut self, snapshot: &Snapshot) -> ClockAdjustment {
        let offset = snapshot
            .tick_offset()
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        self.last_offset = offset;
        let warp_ready = self.warp_cooldown == 0;
        self.warp_cooldown = self.warp_cooldown.saturating_sub(1);

        if offset < self.warp_threshold && warp_ready {
            // Outlier: leave the average alone
            self.warp_cooldown = self.warp_cooldown_ticks;
            self.adjusted_interval = self.warp_interval;
            self.time_warps += 1;
            info!(
                offset,
                tick = snapshot.tick,
                warp_ticks = self.warp_ticks,
                "Client fell behind, time-warping forward"
            );
            return ClockAdjustment {
                warp_ticks: self.warp_ticks,
                adjusted_interval: self.adjusted_interval,
            };
        }

        self.offsets.add_value(offset);
        if offset < 0 {
            // Server missed an input; react now instead of averaging it away
            self.offsets.force_set_average(offset);
            self.dropped_inputs += 1;
        }

        self.adjusted_interval = interval_for_offset(self.offsets.average(), self.multiplayer);
        ClockAdjustment {
            warp_ticks: 0,
            adjusted_interval: self.adjusted_interval,
        }
    }

    /// Offset of the last processed snapshot
    pub fn last_offset(&self) -> i32 {
        self.last_offset
    }

    /// Smoothed offset
    pub fn average_offset(&self) -> i32 {
        self.offsets.average()
    }

    /// Current playback interval
    pub fn adjusted_interval(&self) -> f64 {
        self.adjusted_interval
    }

    /// Snapshots that reported a negative offset
    pub fn dropped_inputs(&self) -> u32 {
        self.dropped_inputs
    }

    /// Snapshots left before another time-warp is allowed
    pub fn warp_cooldown(&self) -> u32 {
        self.warp_cooldown
    }

    /// Get statistics
    pub fn stats(&self) -> ClockStats {
        ClockStats {
            last_offset: self.last_offset,
            average_offset: self.average_offset(),
            adjusted_interval: self.adjusted_interval,
            dropped_inputs: self.dropped_inputs,
            time_warps: self.time_warps,
        }
    }
}

impl Default for ClockSyncController {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}
