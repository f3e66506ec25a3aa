//! Time system for tick-based simulation
//!
//! Provides discrete time management for the predicted simulation:
//! - `Tick` - Fixed-size simulation step counter since session start
//! - `FixedStepScheduler` - Turns wall-clock frame time into whole ticks,
//!   stretched or squeezed by the clock-sync playback multiplier
//!
//! Ticks are plain `u32` values compared without wraparound handling.
//! At 60Hz a session would need to run for about 2.27 years to overflow.

use serde::{Deserialize, Serialize};

/// A discrete tick identifier (one fixed simulation step)
pub type Tick = u32;

/// Default simulation rate in ticks per second
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Default cap on ticks run in one frame
pub const DEFAULT_MAX_TICKS_PER_FRAME: u32 = 8;

/// Duration of one tick in seconds for the given rate
pub fn tick_seconds(tick_rate: u32) -> f32 {
    1.0 / tick_rate as f32
}

/// Fixed-step accumulator driving the simulation loop
///
/// Each call to [`FixedStepScheduler::advance`] adds elapsed wall-clock time
/// and reports how many ticks are due. The effective tick duration is the
/// nominal one multiplied by the adjusted interval from clock sync, so values
/// above 1.0 slow the local tick rate and values below 1.0 speed it up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedStepScheduler {
    /// Nominal tick duration in seconds
    tick_seconds: f64,
    /// Unconsumed wall-clock time
    accumulator: f64,
    /// Upper bound on ticks per frame
    max_ticks_per_frame: u32,
}

impl FixedStepScheduler {
    /// Create a scheduler for the given tick rate
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_seconds: 1.0 / f64::from(tick_rate.max(1)),
            accumulator: 0.0,
            max_ticks_per_frame: DEFAULT_MAX_TICKS_PER_FRAME,
        }
    }

    /// Set the per-frame tick cap (at least 1)
    pub fn with_max_ticks_per_frame(mut self, max: u32) -> Self {
        self.max_ticks_per_frame = max.max(1);
        self
    }

    /// Add frame time and return the number of ticks to simulate
    ///
    /// If the cap is hit, the remaining backlog is discarded so a slow frame
    /// cannot snowball into ever longer ones.
    pub fn advance(&mut self, elapsed_seconds: f64, adjusted_interval: f64) -> u32 {
        let step = self.step_seconds(adjusted_interval);
        self.accumulator += elapsed_seconds.max(0.0);

        let mut ticks = 0;
        while self.accumulator >= step && ticks < self.max_ticks_per_frame {
            self.accumulator -= step;
            ticks += 1;
        }
        if ticks == self.max_ticks_per_frame && self.accumulator >= step {
            self.accumulator = 0.0;
        }
        ticks
    }

    /// Fraction of the next tick already accumulated (0.0 to 1.0)
    ///
    /// Used by the render layer to interpolate between ticks.
    pub fn alpha(&self, adjusted_interval: f64) -> f32 {
        (self.accumulator / self.step_seconds(adjusted_interval)).clamp(0.0, 1.0) as f32
    }

    /// Effective tick duration for an adjusted interval
    pub fn step_seconds(&self, adjusted_interval: f64) -> f64 {
        self.tick_seconds * adjusted_interval.max(f64::EPSILON)
    }

    /// Nominal tick duration
    pub fn tick_seconds(&self) -> f64 {
        self.tick_seconds
    }

    /// Drop any accumulated time
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Default for FixedStepScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_seconds() {
        assert!((tick_seconds(60) - 1.0 / 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nominal_rate() {
        let mut scheduler = FixedStepScheduler::new(60);

        // One second of frames at 60fps yields 60 ticks
        let total: u32 = (0..60).map(|_| scheduler.advance(1.0 / 60.0 + 1e-9, 1.0)).sum();
        assert_eq!(total, 60);
    }

    #[test]
    fn test_adjusted_interval_changes_rate() {
        let mut slow = FixedStepScheduler::new(60);
        let mut fast = FixedStepScheduler::new(60);

        let slow_ticks: u32 = (0..100).map(|_| slow.advance(0.05, 1.205)).sum();
        let fast_ticks: u32 = (0..100).map(|_| fast.advance(0.05, 0.75)).sum();

        // 5 seconds: 300 nominal ticks
        assert!(slow_ticks < 300);
        assert!(fast_ticks > 300);
    }

    #[test]
    fn test_max_ticks_per_frame() {
        let mut scheduler = FixedStepScheduler::new(60).with_max_ticks_per_frame(4);

        assert_eq!(scheduler.advance(1.0, 1.0), 4);
        // Backlog was discarded
        assert_eq!(scheduler.alpha(1.0), 0.0);
        assert_eq!(scheduler.advance(0.0, 1.0), 0);
        assert_eq!(scheduler.advance(0.001, 1.0), 0);
    }

    #[test]
    fn test_cap_keeps_partial_tick() {
        let mut scheduler = FixedStepScheduler::new(10).with_max_ticks_per_frame(2);

        // Exactly two ticks plus half of one: nothing over the cap
        assert_eq!(scheduler.advance(0.25, 1.0), 2);
        assert!((scheduler.alpha(1.0) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_alpha() {
        let mut scheduler = FixedStepScheduler::new(10);
        assert_eq!(scheduler.advance(0.15, 1.0), 1);
        assert!((scheduler.alpha(1.0) - 0.5).abs() < 1e-4);

        scheduler.reset();
        assert_eq!(scheduler.alpha(1.0), 0.0);
    }
}
